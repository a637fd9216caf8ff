//! Reachability check for a reference's own URL.
//!
//! Only transport success counts. The body is never read and the status code
//! is ignored, matching what an opaque cross-origin request can observe. The
//! caller bounds the call with a timeout.

use super::{LookupBackend, LookupError, LookupFuture};
use crate::Reference;

pub struct LinkProbe {
    pub user_agent: String,
}

impl LookupBackend for LinkProbe {
    fn name(&self) -> &str {
        "Link"
    }

    fn lookup<'a>(
        &'a self,
        reference: &'a Reference,
        client: &'a reqwest::Client,
    ) -> LookupFuture<'a> {
        Box::pin(async move {
            let url = reference.url().ok_or(LookupError::MissingField("URL"))?;

            let resp = client
                .get(url)
                .header("User-Agent", self.user_agent.as_str())
                .send()
                .await?;

            tracing::debug!(url, status = resp.status().as_u16(), "link answered");
            Ok(true)
        })
    }
}
