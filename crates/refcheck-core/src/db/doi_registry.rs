//! DOI registration check against the CrossRef works endpoint.

use super::{LookupBackend, LookupError, LookupFuture, crossref_user_agent};
use crate::Reference;

/// Asks CrossRef whether a DOI is registered. No timeout: the request waits as
/// long as the transport does.
pub struct DoiRegistry {
    pub base_url: String,
    pub user_agent: String,
    pub mailto: Option<String>,
}

impl DoiRegistry {
    pub fn works_url(&self, doi: &str) -> String {
        let mut url = format!(
            "{}/works/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(doi)
        );
        if let Some(ref email) = self.mailto {
            url.push_str(&format!("?mailto={}", urlencoding::encode(email)));
        }
        url
    }
}

impl LookupBackend for DoiRegistry {
    fn name(&self) -> &str {
        "DOI"
    }

    fn lookup<'a>(
        &'a self,
        reference: &'a Reference,
        client: &'a reqwest::Client,
    ) -> LookupFuture<'a> {
        Box::pin(async move {
            let doi = reference.doi().ok_or(LookupError::MissingField("DOI"))?;

            let resp = client
                .get(self.works_url(doi))
                .header(
                    "User-Agent",
                    crossref_user_agent(&self.user_agent, self.mailto.as_deref()),
                )
                .send()
                .await?;

            let status = resp.status();
            if status.is_success() {
                Ok(true)
            } else if status.as_u16() == 404 {
                Ok(false)
            } else {
                Err(LookupError::Status(status.as_u16()))
            }
        })
    }
}
