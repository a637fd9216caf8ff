use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod backend;
pub mod board;
pub mod checker;
pub mod config_file;
pub mod db;
pub mod orchestrator;
pub mod reference;
pub mod selector;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend};
pub use board::{Applied, RunId, StatusBoard, StatusSummary};
pub use checker::{ChainStep, Verifier};
pub use db::LookupError;
pub use orchestrator::{RunHandle, StatusUpdate, dispatch};
pub use reference::{Reference, normalize_doi};
pub use selector::{Strategy, select_strategy};

/// Outcome of verifying one reference.
///
/// Every record starts as [`NotChecked`](VerificationStatus::NotChecked) and
/// moves to exactly one of the other values once its check resolves. The
/// `LikelyFound*` variants come from relevance searches, not authoritative
/// identifier lookups, and keep their provenance in the name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    #[default]
    NotChecked,
    Ok,
    Nok,
    LikelyFoundGoogleBooks,
    LikelyFoundCrossref,
    LikelyFoundOpenalex,
    NotFound,
}

impl VerificationStatus {
    pub const ALL: [VerificationStatus; 7] = [
        VerificationStatus::NotChecked,
        VerificationStatus::Ok,
        VerificationStatus::Nok,
        VerificationStatus::LikelyFoundGoogleBooks,
        VerificationStatus::LikelyFoundCrossref,
        VerificationStatus::LikelyFoundOpenalex,
        VerificationStatus::NotFound,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::NotChecked => "NOT_CHECKED",
            VerificationStatus::Ok => "OK",
            VerificationStatus::Nok => "NOK",
            VerificationStatus::LikelyFoundGoogleBooks => "LIKELY_FOUND_GOOGLE_BOOKS",
            VerificationStatus::LikelyFoundCrossref => "LIKELY_FOUND_CROSSREF",
            VerificationStatus::LikelyFoundOpenalex => "LIKELY_FOUND_OPENALEX",
            VerificationStatus::NotFound => "NOT_FOUND",
        }
    }

    /// Whether the check has resolved.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, VerificationStatus::NotChecked)
    }

    /// One of the heuristic metadata-search hits.
    pub fn is_likely_found(&self) -> bool {
        matches!(
            self,
            VerificationStatus::LikelyFoundGoogleBooks
                | VerificationStatus::LikelyFoundCrossref
                | VerificationStatus::LikelyFoundOpenalex
        )
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single backend call within a verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Found,
    NotFound,
    Timeout,
    Error(String),
    /// Not called: an earlier step already decided, or there was nothing to search for.
    Skipped,
}

/// Result from one backend call.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub backend: String,
    pub status: StepStatus,
    pub elapsed: Option<Duration>,
}

/// The result of verifying a single reference.
#[derive(Debug, Clone)]
pub struct Verification {
    pub status: VerificationStatus,
    pub strategy: Strategy,
    /// Backend that produced a positive answer, if any.
    pub source: Option<String>,
    pub steps: Vec<StepResult>,
    pub elapsed: Duration,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("config file {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Base URLs of the public APIs the checks talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub crossref: String,
    pub google_books: String,
    pub openalex: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            crossref: "https://api.crossref.org".into(),
            google_books: "https://www.googleapis.com/books/v1".into(),
            openalex: "https://api.openalex.org".into(),
        }
    }
}

pub const DEFAULT_LLM_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "mistralai/mistral-small-3.2-24b-instruct:free";

/// Configuration for extraction and verification.
#[derive(Clone)]
pub struct Config {
    pub endpoints: Endpoints,
    pub link_timeout_secs: u64,
    pub crossref_mailto: Option<String>,
    pub user_agent: String,
    /// Metadata-search steps to leave out ("Google Books", "CrossRef", "OpenAlex").
    pub disabled_dbs: Vec<String>,
    pub llm_endpoint: String,
    pub llm_model: String,
    /// Only this many characters of document text are sent to the LLM.
    pub max_text_chars: usize,
}

impl Config {
    pub fn link_timeout(&self) -> Duration {
        Duration::from_secs(self.link_timeout_secs)
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled_dbs
            .iter()
            .any(|d| d.trim().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("endpoints", &self.endpoints)
            .field("link_timeout_secs", &self.link_timeout_secs)
            .field(
                "crossref_mailto",
                &self.crossref_mailto.as_ref().map(|_| "***"),
            )
            .field("user_agent", &self.user_agent)
            .field("disabled_dbs", &self.disabled_dbs)
            .field("llm_endpoint", &self.llm_endpoint)
            .field("llm_model", &self.llm_model)
            .field("max_text_chars", &self.max_text_chars)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            link_timeout_secs: 5,
            crossref_mailto: None,
            user_agent: concat!("refcheck/", env!("CARGO_PKG_VERSION")).to_string(),
            disabled_dbs: vec![],
            llm_endpoint: DEFAULT_LLM_ENDPOINT.into(),
            llm_model: DEFAULT_LLM_MODEL.into(),
            max_text_chars: 12_000,
        }
    }
}
