//! Lookup backends: one external call each, answering "does this exist?".

pub mod crossref;
pub mod doi_registry;
pub mod google_books;
pub mod link;
pub mod mock;
pub mod openalex;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::Reference;

/// `Ok(true)` when the backend found the reference, `Ok(false)` when it
/// answered but found nothing.
pub type LookupFuture<'a> = Pin<Box<dyn Future<Output = Result<bool, LookupError>> + Send + 'a>>;

/// Why a lookup could not produce an answer. Callers treat every variant as
/// "not found"; the variants only feed diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("HTTP {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unreadable response: {0}")]
    Decode(String),
    #[error("reference has no {0}")]
    MissingField(&'static str),
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            LookupError::Decode(e.to_string())
        } else {
            LookupError::Transport(e.to_string())
        }
    }
}

/// A backend that can be asked about a single reference.
pub trait LookupBackend: Send + Sync {
    /// The name shown in step results (e.g., "CrossRef", "Google Books").
    fn name(&self) -> &str;

    fn lookup<'a>(&'a self, reference: &'a Reference, client: &'a reqwest::Client)
    -> LookupFuture<'a>;
}

/// Pass success responses through; turn anything else into [`LookupError::Status`].
pub(crate) fn require_success(resp: reqwest::Response) -> Result<reqwest::Response, LookupError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(LookupError::Status(status.as_u16()))
    }
}

/// CrossRef asks polite clients to identify themselves with a mailto.
pub(crate) fn crossref_user_agent(base: &str, mailto: Option<&str>) -> String {
    match mailto {
        Some(email) => format!("{} (mailto:{})", base, email),
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> reqwest::Response {
        let http_resp = http::Response::builder().status(status).body("").unwrap();
        reqwest::Response::from(http_resp)
    }

    #[test]
    fn success_passes_through() {
        assert!(require_success(response(200)).is_ok());
        assert!(require_success(response(204)).is_ok());
    }

    #[test]
    fn not_found_is_status_error() {
        assert_eq!(
            require_success(response(404)).unwrap_err(),
            LookupError::Status(404)
        );
    }

    #[test]
    fn server_error_is_status_error() {
        assert_eq!(
            require_success(response(503)).unwrap_err(),
            LookupError::Status(503)
        );
    }

    #[test]
    fn user_agent_with_mailto() {
        assert_eq!(
            crossref_user_agent("refcheck/0.1.0", Some("me@example.org")),
            "refcheck/0.1.0 (mailto:me@example.org)"
        );
        assert_eq!(crossref_user_agent("refcheck/0.1.0", None), "refcheck/0.1.0");
    }
}
