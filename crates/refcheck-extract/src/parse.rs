use once_cell::sync::Lazy;
use regex::Regex;

use refcheck_core::Reference;

/// Remove a leading ```` ```json ```` (or bare ```` ``` ````) fence and a
/// trailing ```` ``` ```` fence, then trim.
pub fn strip_code_fences(content: &str) -> &str {
    static OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*```(?:json)?[ \t]*\r?\n?").unwrap());
    static CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n?```\s*$").unwrap());

    let mut s = content;
    if let Some(m) = OPEN.find(s) {
        s = &s[m.end()..];
    }
    if let Some(m) = CLOSE.find(s) {
        s = &s[..m.start()];
    }
    s.trim()
}

/// Why an LLM answer could not be turned into references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure(pub String);

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse the LLM answer as a JSON array of reference records.
///
/// Elements that are not objects are dropped with a debug log; a non-array
/// top level or invalid JSON is a failure.
pub fn parse_references(content: &str) -> Result<Vec<Reference>, ParseFailure> {
    let cleaned = strip_code_fences(content);
    let value: serde_json::Value =
        serde_json::from_str(cleaned).map_err(|e| ParseFailure(format!("invalid JSON: {e}")))?;

    let serde_json::Value::Array(items) = value else {
        return Err(ParseFailure("expected a JSON array of references".into()));
    };

    let mut refs = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Reference>(item) {
            Ok(r) => refs.push(r),
            Err(e) => tracing::debug!(index = i, error = %e, "skipping malformed reference"),
        }
    }
    Ok(refs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_are_removed() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```JSON\n[]```"), "[]");
        assert_eq!(strip_code_fences("```\n[]\n```\n"), "[]");
        assert_eq!(strip_code_fences("  [] "), "[]");
    }

    #[test]
    fn plain_array_parses() {
        let content = r#"[
            {"title": "Deep Learning", "authors": ["Ian Goodfellow"], "year": 2016},
            {"title": "Other", "year": "2020", "url": " "}
        ]"#;
        let refs = parse_references(content).unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].first_author(), Some("Ian Goodfellow"));
        assert_eq!(refs[1].year, Some(2020));
        assert_eq!(refs[1].url(), None);
    }

    #[test]
    fn fenced_array_parses() {
        let content = "```json\n[{\"title\": \"X\", \"doi\": \"doi:10.1/x\"}]\n```";
        let refs = parse_references(content).unwrap();
        assert_eq!(refs[0].doi(), Some("10.1/x"));
    }

    #[test]
    fn prose_is_a_failure() {
        assert!(parse_references("Here are the references you asked for.").is_err());
    }

    #[test]
    fn object_top_level_is_a_failure() {
        let err = parse_references(r#"{"references": []}"#).unwrap_err();
        assert!(err.0.contains("array"));
    }

    #[test]
    fn non_object_elements_are_dropped() {
        let refs = parse_references(r#"[{"title": "Kept"}, "stray", 7]"#).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].title(), Some("Kept"));
    }
}
