use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::db::crossref::CrossRef;
use crate::db::doi_registry::DoiRegistry;
use crate::db::google_books::GoogleBooks;
use crate::db::link::LinkProbe;
use crate::db::openalex::OpenAlex;
use crate::db::{LookupBackend, LookupError};
use crate::selector::{Strategy, select_strategy};
use crate::{Config, CoreError, Reference, StepResult, StepStatus, Verification, VerificationStatus};

/// One link of the metadata-search chain: the backend to ask and the status
/// reported when it finds something.
#[derive(Clone)]
pub struct ChainStep {
    pub backend: Arc<dyn LookupBackend>,
    pub on_found: VerificationStatus,
}

/// Runs the check chosen by [`select_strategy`] for one reference.
///
/// Never fails: transport errors, non-success statuses, and timeouts all end
/// up as a negative status for that reference.
pub struct Verifier {
    client: reqwest::Client,
    doi: Arc<dyn LookupBackend>,
    link: Arc<dyn LookupBackend>,
    chain: Vec<ChainStep>,
    link_timeout: Duration,
}

impl Verifier {
    /// Build a verifier talking to the real registry, catalogs, and indexes.
    pub fn new(config: &Config) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        let user_agent = config.user_agent.clone();
        let mailto = config.crossref_mailto.clone();

        let doi = Arc::new(DoiRegistry {
            base_url: config.endpoints.crossref.clone(),
            user_agent: user_agent.clone(),
            mailto: mailto.clone(),
        });
        let link = Arc::new(LinkProbe {
            user_agent: user_agent.clone(),
        });

        let candidates: Vec<ChainStep> = vec![
            ChainStep {
                backend: Arc::new(GoogleBooks {
                    base_url: config.endpoints.google_books.clone(),
                    user_agent: user_agent.clone(),
                }),
                on_found: VerificationStatus::LikelyFoundGoogleBooks,
            },
            ChainStep {
                backend: Arc::new(CrossRef {
                    base_url: config.endpoints.crossref.clone(),
                    user_agent: user_agent.clone(),
                    mailto: mailto.clone(),
                }),
                on_found: VerificationStatus::LikelyFoundCrossref,
            },
            ChainStep {
                backend: Arc::new(OpenAlex {
                    base_url: config.endpoints.openalex.clone(),
                    user_agent,
                    mailto,
                }),
                on_found: VerificationStatus::LikelyFoundOpenalex,
            },
        ];
        let chain = candidates
            .into_iter()
            .filter(|step| !config.is_disabled(step.backend.name()))
            .collect();

        Ok(Self::from_parts(
            client,
            doi,
            link,
            chain,
            config.link_timeout(),
        ))
    }

    /// Assemble a verifier from explicit backends.
    pub fn from_parts(
        client: reqwest::Client,
        doi: Arc<dyn LookupBackend>,
        link: Arc<dyn LookupBackend>,
        chain: Vec<ChainStep>,
        link_timeout: Duration,
    ) -> Self {
        Self {
            client,
            doi,
            link,
            chain,
            link_timeout,
        }
    }

    pub fn link_timeout(&self) -> Duration {
        self.link_timeout
    }

    /// Names of the metadata-search backends, in the order they are tried.
    pub fn chain_names(&self) -> Vec<String> {
        self.chain
            .iter()
            .map(|s| s.backend.name().to_string())
            .collect()
    }

    pub async fn verify(&self, reference: &Reference) -> Verification {
        let start = Instant::now();
        let strategy = select_strategy(reference);

        let (status, source, steps) = match strategy {
            Strategy::Doi => {
                let step = self.run_step(self.doi.as_ref(), reference, None).await;
                single_step_outcome(step)
            }
            Strategy::Link => {
                let step = self
                    .run_step(self.link.as_ref(), reference, Some(self.link_timeout))
                    .await;
                single_step_outcome(step)
            }
            Strategy::Metadata => self.search_metadata(reference).await,
        };

        Verification {
            status,
            strategy,
            source,
            steps,
            elapsed: start.elapsed(),
        }
    }

    /// Try each catalog in order and stop at the first hit.
    async fn search_metadata(
        &self,
        reference: &Reference,
    ) -> (VerificationStatus, Option<String>, Vec<StepResult>) {
        let mut steps = Vec::with_capacity(self.chain.len());

        if !reference.has_metadata() {
            tracing::debug!("no title or authors to search for");
            steps.extend(self.chain.iter().map(|s| skipped(s.backend.name())));
            return (VerificationStatus::NotFound, None, steps);
        }

        for (i, step) in self.chain.iter().enumerate() {
            let result = self.run_step(step.backend.as_ref(), reference, None).await;
            if result.status == StepStatus::Found {
                let source = result.backend.clone();
                steps.push(result);
                steps.extend(self.chain[i + 1..].iter().map(|s| skipped(s.backend.name())));
                return (step.on_found, Some(source), steps);
            }
            steps.push(result);
        }

        (VerificationStatus::NotFound, None, steps)
    }

    async fn run_step(
        &self,
        backend: &dyn LookupBackend,
        reference: &Reference,
        timeout: Option<Duration>,
    ) -> StepResult {
        let start = Instant::now();
        let lookup = backend.lookup(reference, &self.client);

        let status = match timeout {
            Some(limit) => match tokio::time::timeout(limit, lookup).await {
                Ok(result) => step_status(result),
                Err(_) => StepStatus::Timeout,
            },
            None => step_status(lookup.await),
        };
        let elapsed = start.elapsed();

        match &status {
            StepStatus::Error(err) => {
                tracing::debug!(backend = backend.name(), error = %err, "lookup failed")
            }
            other => {
                tracing::debug!(backend = backend.name(), status = ?other, ?elapsed, "lookup done")
            }
        }

        StepResult {
            backend: backend.name().to_string(),
            status,
            elapsed: Some(elapsed),
        }
    }
}

fn step_status(result: Result<bool, LookupError>) -> StepStatus {
    match result {
        Ok(true) => StepStatus::Found,
        Ok(false) => StepStatus::NotFound,
        Err(e) => StepStatus::Error(e.to_string()),
    }
}

fn single_step_outcome(step: StepResult) -> (VerificationStatus, Option<String>, Vec<StepResult>) {
    if step.status == StepStatus::Found {
        let source = step.backend.clone();
        (VerificationStatus::Ok, Some(source), vec![step])
    } else {
        (VerificationStatus::Nok, None, vec![step])
    }
}

fn skipped(name: &str) -> StepResult {
    StepResult {
        backend: name.to_string(),
        status: StepStatus::Skipped,
        elapsed: None,
    }
}
