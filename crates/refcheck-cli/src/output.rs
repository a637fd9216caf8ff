use std::io::Write;

use owo_colors::OwoColorize;
use refcheck_core::{
    Reference, StatusSummary, StepStatus, Verification, VerificationStatus,
};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

const STATUS_W: usize = 25;
const TITLE_W: usize = 48;
const AUTHORS_W: usize = 28;
const YEAR_W: usize = 4;
const PUBLISHER_W: usize = 20;

/// Print a step message ("Reading PDF...").
pub fn print_step(w: &mut dyn Write, message: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", message.bold())
    } else {
        writeln!(w, "{}", message)
    }
}

pub fn print_warning(w: &mut dyn Write, message: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "WARNING:".yellow(), message)
    } else {
        writeln!(w, "WARNING: {}", message)
    }
}

/// Status name padded to the column width, colored by outcome.
fn status_cell(status: VerificationStatus, color: ColorMode) -> String {
    let padded = format!("{:<STATUS_W$}", status.as_str());
    if !color.enabled() {
        return padded;
    }
    match status {
        VerificationStatus::NotChecked => padded.dimmed().to_string(),
        VerificationStatus::Ok => padded.green().to_string(),
        VerificationStatus::LikelyFoundGoogleBooks
        | VerificationStatus::LikelyFoundCrossref
        | VerificationStatus::LikelyFoundOpenalex => padded.yellow().to_string(),
        VerificationStatus::Nok | VerificationStatus::NotFound => padded.red().to_string(),
    }
}

/// The references table, one row per record in list order.
///
/// `statuses` is indexed like `references`; missing entries show as
/// `NOT_CHECKED`.
pub fn print_reference_table(
    w: &mut dyn Write,
    references: &[Reference],
    statuses: &[VerificationStatus],
    color: ColorMode,
) -> std::io::Result<()> {
    let num_w = references.len().to_string().len().max(1);
    let header = format!(
        "{:>num_w$}  {:<STATUS_W$}  {:<TITLE_W$}  {:<AUTHORS_W$}  {:<YEAR_W$}  {:<PUBLISHER_W$}  {}",
        "#", "Status", "Title", "Authors", "Year", "Publisher", "Link"
    );
    if color.enabled() {
        writeln!(w, "{}", header.bold())?;
    } else {
        writeln!(w, "{}", header)?;
    }
    writeln!(w, "{}", "-".repeat(header.chars().count()))?;

    for (i, reference) in references.iter().enumerate() {
        let status = statuses.get(i).copied().unwrap_or_default();
        let authors = reference.author_names().collect::<Vec<_>>().join(", ");
        let year = reference.year.map(|y| y.to_string()).unwrap_or_default();
        writeln!(
            w,
            "{:>num_w$}  {}  {:<TITLE_W$}  {:<AUTHORS_W$}  {:<YEAR_W$}  {:<PUBLISHER_W$}  {}",
            i + 1,
            status_cell(status, color),
            truncate(reference.title().unwrap_or(""), TITLE_W),
            truncate(&authors, AUTHORS_W),
            year,
            truncate(reference.publisher().unwrap_or(""), PUBLISHER_W),
            reference.display_link().unwrap_or_default(),
        )?;
    }
    writeln!(w)?;
    Ok(())
}

/// One line per resolved reference, printed as results arrive.
pub fn progress_line(
    index: usize,
    total: usize,
    reference: &Reference,
    verification: &Verification,
    color: ColorMode,
) -> String {
    let title = truncate(reference.title().unwrap_or("(untitled)"), 50);
    let status = verification.status.as_str();
    let status = if color.enabled() {
        match verification.status {
            VerificationStatus::Ok => status.green().to_string(),
            s if s.is_likely_found() => status.yellow().to_string(),
            _ => status.red().to_string(),
        }
    } else {
        status.to_string()
    };
    format!(
        "[{}/{}] {} -> {} ({})",
        index + 1,
        total,
        title,
        status,
        verification.strategy
    )
}

/// Per-step results for every resolved reference.
pub fn print_details(
    w: &mut dyn Write,
    references: &[Reference],
    verifications: &[Option<Verification>],
    color: ColorMode,
) -> std::io::Result<()> {
    for (i, (reference, verification)) in references.iter().zip(verifications).enumerate() {
        let Some(v) = verification else {
            continue;
        };
        let heading = format!(
            "[{}] {}",
            i + 1,
            truncate(reference.title().unwrap_or("(untitled)"), 70)
        );
        if color.enabled() {
            writeln!(w, "{}", heading.bold())?;
        } else {
            writeln!(w, "{}", heading)?;
        }
        writeln!(
            w,
            "  {} via {} in {:.2}s",
            v.status,
            v.strategy,
            v.elapsed.as_secs_f64()
        )?;
        for step in &v.steps {
            let outcome = match &step.status {
                StepStatus::Found => "found".to_string(),
                StepStatus::NotFound => "not found".to_string(),
                StepStatus::Timeout => "timed out".to_string(),
                StepStatus::Error(e) => format!("error: {}", e),
                StepStatus::Skipped => "skipped".to_string(),
            };
            match step.elapsed {
                Some(d) => writeln!(
                    w,
                    "    {:<14} {} ({}ms)",
                    step.backend,
                    outcome,
                    d.as_millis()
                )?,
                None => writeln!(w, "    {:<14} {}", step.backend, outcome)?,
            }
        }
    }
    writeln!(w)?;
    Ok(())
}

/// Print the final summary.
pub fn print_summary(
    w: &mut dyn Write,
    summary: &StatusSummary,
    interrupted: bool,
    color: ColorMode,
) -> std::io::Result<()> {
    let sep = "=".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{}", "SUMMARY".bold())?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "SUMMARY")?;
        writeln!(w, "{}", sep)?;
    }

    writeln!(w, "  References: {}", summary.total)?;
    if color.enabled() {
        writeln!(w, "  {} {}", "OK:".green(), summary.ok)?;
    } else {
        writeln!(w, "  OK: {}", summary.ok)?;
    }

    let likely = [
        ("Google Books", summary.likely_google_books),
        ("CrossRef", summary.likely_crossref),
        ("OpenAlex", summary.likely_openalex),
    ];
    for (source, count) in likely {
        if count == 0 {
            continue;
        }
        let label = format!("Likely found ({}):", source);
        if color.enabled() {
            writeln!(w, "  {} {}", label.yellow(), count)?;
        } else {
            writeln!(w, "  {} {}", label, count)?;
        }
    }

    for (label, count) in [("NOK:", summary.nok), ("Not found:", summary.not_found)] {
        if count == 0 {
            continue;
        }
        if color.enabled() {
            writeln!(w, "  {} {}", label.red(), count)?;
        } else {
            writeln!(w, "  {} {}", label, count)?;
        }
    }

    if summary.not_checked > 0 {
        let msg = if interrupted {
            format!("Not checked (interrupted): {}", summary.not_checked)
        } else {
            format!("Not checked: {}", summary.not_checked)
        };
        if color.enabled() {
            writeln!(w, "  {}", msg.dimmed())?;
        } else {
            writeln!(w, "  {}", msg)?;
        }
    }
    writeln!(w)?;
    Ok(())
}

/// Raw JSON of the extracted references.
pub fn print_json(w: &mut dyn Write, references: &[Reference]) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *w, references).map_err(std::io::Error::from)?;
    writeln!(w)
}

/// Cut `s` to at most `max` characters, marking the cut with "...".
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
