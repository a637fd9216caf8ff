use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use refcheck_core::{
    Applied, Config, PdfBackend, Reference, StatusBoard, Verification, Verifier, config_file,
    dispatch,
};
use refcheck_extract::{ApiKey, LlmClient, extract_references};
use refcheck_pdf_mupdf::MupdfBackend;
use tokio_util::sync::CancellationToken;

mod output;

use output::ColorMode;

/// Reference checker - extract references from a PDF with an LLM and check that they exist
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the references of a PDF and check each one
    Check {
        /// Path to the PDF
        file_path: PathBuf,

        #[command(flatten)]
        llm: LlmArgs,

        #[command(flatten)]
        verify: VerifyArgs,
    },

    /// Extract the references of a PDF without checking them
    Extract {
        /// Path to the PDF
        file_path: PathBuf,

        #[command(flatten)]
        llm: LlmArgs,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Check references from a JSON array of records
    Verify {
        /// Path to the JSON file
        json_path: PathBuf,

        #[command(flatten)]
        verify: VerifyArgs,
    },
}

#[derive(Args, Debug)]
struct LlmArgs {
    /// OpenRouter API key (default: OPENROUTER_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// LLM model used for extraction
    #[arg(long)]
    model: Option<String>,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Path to output report file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also print the references as raw JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    #[command(flatten)]
    report: ReportArgs,

    /// Comma-separated list of catalog searches to disable (Google Books, CrossRef, OpenAlex)
    #[arg(long, value_delimiter = ',')]
    disable_dbs: Vec<String>,

    /// Seconds to wait for a reference's link to answer
    #[arg(long)]
    link_timeout: Option<u64>,

    /// Contact address sent to CrossRef
    #[arg(long)]
    crossref_mailto: Option<String>,

    /// Print the per-backend steps of every check
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Check {
            file_path,
            llm,
            verify,
        } => check(file_path, llm, verify).await,
        Command::Extract {
            file_path,
            llm,
            report,
        } => extract(file_path, llm, report).await,
        Command::Verify { json_path, verify } => verify_json(json_path, verify).await,
    }
}

/// Resolve configuration: CLI flags > env vars > config file > defaults.
fn resolve_config(llm: Option<&LlmArgs>, verify: Option<&VerifyArgs>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    config_file::load_config()?.apply(&mut config);

    if let Ok(model) = std::env::var("REFCHECK_MODEL") {
        config.llm_model = model;
    }
    if let Ok(mailto) = std::env::var("CROSSREF_MAILTO") {
        config.crossref_mailto = Some(mailto);
    }
    if let Some(secs) = std::env::var("REFCHECK_LINK_TIMEOUT")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        config.link_timeout_secs = secs;
    }

    if let Some(llm) = llm
        && let Some(ref model) = llm.model
    {
        config.llm_model = model.clone();
    }
    if let Some(verify) = verify {
        if let Some(secs) = verify.link_timeout {
            config.link_timeout_secs = secs;
        }
        if let Some(ref mailto) = verify.crossref_mailto {
            config.crossref_mailto = Some(mailto.clone());
        }
        if !verify.disable_dbs.is_empty() {
            config.disabled_dbs = verify.disable_dbs.clone();
        }
    }

    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

fn resolve_api_key(llm: &LlmArgs) -> anyhow::Result<ApiKey> {
    let Some(raw) = llm
        .api_key
        .clone()
        .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
    else {
        anyhow::bail!("No API key given. Pass --api-key or set OPENROUTER_API_KEY.");
    };
    Ok(ApiKey::new(&raw)?)
}

fn open_writer(report: &ReportArgs) -> anyhow::Result<(Box<dyn Write>, ColorMode)> {
    let color = ColorMode(!report.no_color && report.output.is_none());
    let writer: Box<dyn Write> = if let Some(ref output_path) = report.output {
        Box::new(std::fs::File::create(output_path)?)
    } else {
        Box::new(std::io::stdout())
    };
    Ok((writer, color))
}

/// Read the PDF and ask the LLM for its references.
async fn read_references(
    file_path: &Path,
    llm: &LlmArgs,
    config: &Config,
    writer: &mut dyn Write,
    color: ColorMode,
) -> anyhow::Result<Vec<Reference>> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }
    let api_key = resolve_api_key(llm)?;

    output::print_step(writer, "Reading PDF...", color)?;
    let path = file_path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || MupdfBackend::new().extract_text(&path))
        .await??;
    if text.trim().is_empty() {
        output::print_warning(writer, "The PDF contains no extractable text.", color)?;
    }

    output::print_step(writer, "Analyzing text... (this may take a while)", color)?;
    let client = LlmClient::new(
        reqwest::Client::new(),
        config.llm_endpoint.clone(),
        config.llm_model.clone(),
        api_key,
    );
    let extraction = extract_references(&client, &text, config.max_text_chars).await?;
    if let Some(ref warning) = extraction.warning {
        output::print_warning(writer, warning, color)?;
    }
    writeln!(writer, "Found {} references", extraction.references.len())?;
    writeln!(writer)?;
    Ok(extraction.references)
}

async fn check(file_path: PathBuf, llm: LlmArgs, verify: VerifyArgs) -> anyhow::Result<()> {
    let config = resolve_config(Some(&llm), Some(&verify))?;
    let (mut writer, color) = open_writer(&verify.report)?;

    let references = read_references(&file_path, &llm, &config, &mut *writer, color).await?;
    run_checks(references, &config, &verify, &mut *writer, color).await
}

async fn extract(file_path: PathBuf, llm: LlmArgs, report: ReportArgs) -> anyhow::Result<()> {
    let config = resolve_config(Some(&llm), None)?;
    let (mut writer, color) = open_writer(&report)?;

    let references = read_references(&file_path, &llm, &config, &mut *writer, color).await?;
    if references.is_empty() {
        writeln!(writer, "No references found.")?;
        return Ok(());
    }
    output::print_reference_table(&mut *writer, &references, &[], color)?;
    if report.json {
        output::print_json(&mut *writer, &references)?;
    }
    Ok(())
}

async fn verify_json(json_path: PathBuf, verify: VerifyArgs) -> anyhow::Result<()> {
    let config = resolve_config(None, Some(&verify))?;
    let (mut writer, color) = open_writer(&verify.report)?;

    let content = std::fs::read_to_string(&json_path)
        .map_err(|e| anyhow::anyhow!("Could not read {}: {}", json_path.display(), e))?;
    let references = refcheck_extract::parse_references(&content)
        .map_err(|e| anyhow::anyhow!("{}: {}", json_path.display(), e))?;
    writeln!(writer, "Loaded {} references", references.len())?;
    writeln!(writer)?;

    run_checks(references, &config, &verify, &mut *writer, color).await
}

/// Check every reference concurrently, showing results as they arrive, then
/// print the final report.
async fn run_checks(
    references: Vec<Reference>,
    config: &Config,
    verify: &VerifyArgs,
    writer: &mut dyn Write,
    color: ColorMode,
) -> anyhow::Result<()> {
    if references.is_empty() {
        writeln!(writer, "No references to check.")?;
        return Ok(());
    }

    let mut board = StatusBoard::new();
    let run = board.begin_run(references.len());
    output::print_reference_table(writer, &references, board.statuses(), color)?;
    output::print_step(writer, "Checking references...", color)?;
    writer.flush()?;

    let verifier = Arc::new(Verifier::new(config)?);

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.cancel();
        }
    });

    let total = references.len();
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:40.cyan/dim}] {pos}/{len} checked")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.enable_steady_tick(Duration::from_millis(120));

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = dispatch(references.clone(), verifier, run, move |update| {
        let _ = tx.send(update);
    });
    tracing::debug!(%run, tasks = handle.len(), "checks dispatched");

    let mut verifications: Vec<Option<Verification>> = vec![None; total];
    let mut interrupted = false;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                interrupted = true;
                break;
            }
            update = rx.recv() => {
                let Some(update) = update else { break };
                let index = update.index;
                match board.apply(update.run, index, update.verification.status) {
                    Applied::Updated => {
                        bar.println(output::progress_line(
                            index,
                            total,
                            &references[index],
                            &update.verification,
                            color,
                        ));
                        bar.inc(1);
                        verifications[index] = Some(update.verification);
                    }
                    other => tracing::debug!(index, ?other, "update not applied"),
                }
            }
        }
    }

    if interrupted {
        bar.abandon_with_message("interrupted");
        tracing::info!(pending = board.pending(), "interrupted, reporting partial results");
    } else {
        bar.finish_and_clear();
        handle.wait().await;
    }

    writeln!(writer)?;
    output::print_reference_table(writer, &references, board.statuses(), color)?;
    if verify.verbose {
        output::print_details(writer, &references, &verifications, color)?;
    }
    output::print_summary(writer, &board.summary(), interrupted, color)?;
    if verify.report.json {
        output::print_json(writer, &references)?;
    }
    Ok(())
}
