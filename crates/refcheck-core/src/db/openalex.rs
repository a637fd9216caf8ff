use super::{LookupBackend, LookupFuture, require_success};
use crate::Reference;

/// OpenAlex full-text work search over title and authors combined.
pub struct OpenAlex {
    pub base_url: String,
    pub user_agent: String,
    pub mailto: Option<String>,
}

impl OpenAlex {
    pub fn search_url(&self, reference: &Reference) -> String {
        let query = format!(
            "{} {}",
            reference.title().unwrap_or(""),
            reference.authors_query()
        );
        let mut url = format!(
            "{}/works?search={}&per-page=5",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(query.trim())
        );
        if let Some(ref email) = self.mailto {
            url.push_str(&format!("&mailto={}", urlencoding::encode(email)));
        }
        url
    }
}

pub fn has_results(data: &serde_json::Value) -> bool {
    data["results"]
        .as_array()
        .is_some_and(|results| !results.is_empty())
}

impl LookupBackend for OpenAlex {
    fn name(&self) -> &str {
        "OpenAlex"
    }

    fn lookup<'a>(
        &'a self,
        reference: &'a Reference,
        client: &'a reqwest::Client,
    ) -> LookupFuture<'a> {
        Box::pin(async move {
            let resp = client
                .get(self.search_url(reference))
                .header("User-Agent", self.user_agent.as_str())
                .send()
                .await?;
            let data: serde_json::Value = require_success(resp)?.json().await?;
            Ok(has_results(&data))
        })
    }
}
