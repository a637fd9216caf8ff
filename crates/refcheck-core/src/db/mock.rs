//! Mock lookup backend for testing.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{LookupBackend, LookupError, LookupFuture};
use crate::Reference;

/// A configurable mock response for [`MockBackend`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    Found,
    NotFound,
    /// Simulate a non-success HTTP status.
    Status(u16),
    /// Simulate a transport failure.
    Error(String),
    /// Never resolve. Only a caller-side timeout ends the call.
    Hang,
}

/// A hand-rolled mock implementing [`LookupBackend`] for tests.
///
/// Supports a fixed response or a sequence (one per call, repeating the last),
/// optional per-call latency, and call counting via
/// [`call_count()`](MockBackend::call_count).
pub struct MockBackend {
    name: &'static str,
    responses: Mutex<Vec<MockResponse>>,
    fallback: MockResponse,
    delay: Option<Duration>,
    call_count: AtomicUsize,
}

impl MockBackend {
    /// Create a mock that always returns `response`.
    pub fn new(name: &'static str, response: MockResponse) -> Self {
        Self {
            name,
            responses: Mutex::new(Vec::new()),
            fallback: response,
            delay: None,
            call_count: AtomicUsize::new(0),
        }
    }

    /// Create a mock that returns responses in order, repeating the last one.
    pub fn with_sequence(name: &'static str, mut responses: Vec<MockResponse>) -> Self {
        let fallback = responses.last().cloned().unwrap_or(MockResponse::NotFound);
        responses.reverse();
        Self {
            name,
            responses: Mutex::new(responses),
            fallback,
            delay: None,
            call_count: AtomicUsize::new(0),
        }
    }

    /// Set simulated network latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `lookup()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> MockResponse {
        let mut seq = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        seq.pop().unwrap_or_else(|| self.fallback.clone())
    }
}

impl LookupBackend for MockBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn lookup<'a>(
        &'a self,
        _reference: &'a Reference,
        _client: &'a reqwest::Client,
    ) -> LookupFuture<'a> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let response = self.next_response();
        let delay = self.delay;

        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }

            match response {
                MockResponse::Found => Ok(true),
                MockResponse::NotFound => Ok(false),
                MockResponse::Status(code) => Err(LookupError::Status(code)),
                MockResponse::Error(msg) => Err(LookupError::Transport(msg)),
                MockResponse::Hang => std::future::pending().await,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sequence_repeats_last() {
        let mock = MockBackend::with_sequence(
            "Seq",
            vec![MockResponse::NotFound, MockResponse::Found],
        );
        let client = reqwest::Client::new();
        let r = Reference::default();
        assert_eq!(mock.lookup(&r, &client).await, Ok(false));
        assert_eq!(mock.lookup(&r, &client).await, Ok(true));
        assert_eq!(mock.lookup(&r, &client).await, Ok(true));
        assert_eq!(mock.call_count(), 3);
    }
}
