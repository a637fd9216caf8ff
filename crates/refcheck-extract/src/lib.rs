//! Reference extraction: document text in, reference records out.
//!
//! The text is wrapped in a fixed prompt and sent to a chat-completions LLM.
//! The answer is expected to be a JSON array, possibly inside a Markdown code
//! fence. An answer that cannot be parsed is not an error: it yields no
//! references and a warning for the user.

use thiserror::Error;

use refcheck_core::Reference;

pub mod client;
pub mod parse;
pub mod prompt;

pub use client::{Completion, LlmClient};
pub use parse::{parse_references, strip_code_fences};
pub use prompt::build_prompt;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("LLM API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("LLM response contained no message")]
    EmptyResponse,
    #[error("invalid API key: {0}")]
    InvalidApiKey(&'static str),
}

/// Bearer credential for the LLM API. Held in memory only.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: &str) -> Result<Self, ExtractError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ExtractError::InvalidApiKey("key is empty"));
        }
        if !key.starts_with("sk-") {
            tracing::warn!("API key does not start with \"sk-\"; the LLM API may reject it");
        }
        Ok(Self(key.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// References found in a document.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub references: Vec<Reference>,
    /// Set when the LLM answer could not be parsed.
    pub warning: Option<String>,
}

pub async fn extract_references(
    llm: &dyn Completion,
    text: &str,
    max_chars: usize,
) -> Result<Extraction, ExtractError> {
    let prompt = build_prompt(text, max_chars);
    let answer = llm.complete(&prompt).await?;

    match parse_references(&answer) {
        Ok(references) => {
            tracing::info!(count = references.len(), "references extracted");
            Ok(Extraction {
                references,
                warning: None,
            })
        }
        Err(failure) => {
            tracing::warn!(error = %failure, "could not parse LLM answer");
            Ok(Extraction {
                references: Vec::new(),
                warning: Some(format!("The LLM answer could not be read ({failure}).")),
            })
        }
    }
}
