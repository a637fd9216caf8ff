//! The reference record as emitted by the LLM extraction step.
//!
//! LLM output is loosely typed: years arrive as numbers or strings, authors as
//! a list or a single string, and missing fields as `null` or `""`. The
//! deserializers here accept all of those and normalize blank values to
//! absent.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One extracted citation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(
        default,
        deserialize_with = "de_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_authors",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub authors: Vec<String>,
    #[serde(
        default,
        deserialize_with = "de_year",
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<i32>,
    #[serde(
        default,
        deserialize_with = "de_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub doi: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub publisher: Option<String>,
}

impl Reference {
    pub fn title(&self) -> Option<&str> {
        non_blank(self.title.as_deref())
    }

    pub fn url(&self) -> Option<&str> {
        non_blank(self.url.as_deref())
    }

    pub fn publisher(&self) -> Option<&str> {
        non_blank(self.publisher.as_deref())
    }

    /// The DOI without any resolver or `doi:` prefix, if one is present.
    /// A bare prefix with nothing after it is no DOI.
    pub fn doi(&self) -> Option<&str> {
        non_blank(self.doi.as_deref())
            .map(normalize_doi)
            .filter(|d| !d.is_empty())
    }

    /// Author names with blanks dropped.
    pub fn author_names(&self) -> impl Iterator<Item = &str> {
        self.authors
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
    }

    pub fn first_author(&self) -> Option<&str> {
        self.author_names().next()
    }

    /// All author names joined by spaces, as used for free-text author queries.
    pub fn authors_query(&self) -> String {
        self.author_names().collect::<Vec<_>>().join(" ")
    }

    /// Whether there is anything to run a metadata search with.
    pub fn has_metadata(&self) -> bool {
        self.title().is_some() || self.first_author().is_some()
    }

    /// Link shown for the record: the DOI resolver URL, otherwise the raw URL.
    pub fn display_link(&self) -> Option<String> {
        match self.doi() {
            Some(doi) => Some(format!("https://doi.org/{}", doi)),
            None => self.url().map(String::from),
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Strip resolver and scheme prefixes from a DOI.
pub fn normalize_doi(doi: &str) -> &str {
    const PREFIXES: [&str; 5] = [
        "https://doi.org/",
        "http://doi.org/",
        "https://dx.doi.org/",
        "http://dx.doi.org/",
        "doi:",
    ];
    let doi = doi.trim();
    for prefix in PREFIXES {
        if let Some(head) = doi.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                return doi[prefix.len()..].trim();
            }
        }
    }
    doi
}

fn de_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn de_authors<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s],
        _ => vec![],
    })
}

fn de_year<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Reference {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn full_record() {
        let r = parse(
            r#"{"title":"Deep Learning","authors":["Ian Goodfellow","Yoshua Bengio"],
                "year":2016,"url":"https://www.deeplearningbook.org","publisher":"MIT Press"}"#,
        );
        assert_eq!(r.title(), Some("Deep Learning"));
        assert_eq!(r.authors.len(), 2);
        assert_eq!(r.year, Some(2016));
        assert_eq!(r.publisher(), Some("MIT Press"));
        assert!(r.doi().is_none());
    }

    #[test]
    fn missing_fields_are_absent() {
        let r = parse(r#"{"title":"Only a title"}"#);
        assert!(r.authors.is_empty());
        assert!(r.year.is_none());
        assert!(r.url().is_none());
    }

    #[test]
    fn blank_and_null_fields_are_absent() {
        let r = parse(r#"{"title":"","authors":null,"year":null,"url":"   ","doi":null}"#);
        assert!(r.title.is_none());
        assert!(r.authors.is_empty());
        assert!(r.url.is_none());
        assert!(r.doi.is_none());
    }

    #[test]
    fn year_as_string() {
        assert_eq!(parse(r#"{"year":"2020"}"#).year, Some(2020));
        assert_eq!(parse(r#"{"year":"n.d."}"#).year, None);
    }

    #[test]
    fn single_author_string() {
        let r = parse(r#"{"authors":"Max Mustermann"}"#);
        assert_eq!(r.authors, vec!["Max Mustermann".to_string()]);
    }

    #[test]
    fn doi_prefixes_are_stripped() {
        assert_eq!(normalize_doi("https://doi.org/10.1000/xyz"), "10.1000/xyz");
        assert_eq!(normalize_doi("DOI:10.1000/xyz"), "10.1000/xyz");
        assert_eq!(normalize_doi(" 10.1000/xyz "), "10.1000/xyz");
    }

    #[test]
    fn bare_prefix_leaves_no_doi_to_link() {
        let r = Reference {
            doi: Some("https://doi.org/".into()),
            url: Some("https://example.test".into()),
            ..Default::default()
        };
        assert_eq!(r.doi(), None);
        assert_eq!(r.display_link().as_deref(), Some("https://example.test"));
    }

    #[test]
    fn display_link_prefers_doi() {
        let r = Reference {
            doi: Some("10.1000/xyz".into()),
            url: Some("https://example.test".into()),
            ..Default::default()
        };
        assert_eq!(r.display_link().as_deref(), Some("https://doi.org/10.1000/xyz"));

        let r = Reference {
            url: Some("https://example.test".into()),
            ..Default::default()
        };
        assert_eq!(r.display_link().as_deref(), Some("https://example.test"));
    }

    #[test]
    fn authors_query_skips_blanks() {
        let r = Reference {
            authors: vec!["Ian Goodfellow".into(), " ".into(), "Aaron Courville".into()],
            ..Default::default()
        };
        assert_eq!(r.authors_query(), "Ian Goodfellow Aaron Courville");
        assert_eq!(r.first_author(), Some("Ian Goodfellow"));
    }

    #[test]
    fn serialization_skips_absent_fields() {
        let r = Reference {
            title: Some("Unknown Work".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&r).unwrap(), r#"{"title":"Unknown Work"}"#);
    }
}
