use super::{LookupBackend, LookupFuture, crossref_user_agent, require_success};
use crate::Reference;

/// CrossRef bibliographic search by author and title, narrowed to the
/// publication year when one is known.
pub struct CrossRef {
    pub base_url: String,
    pub user_agent: String,
    pub mailto: Option<String>,
}

impl CrossRef {
    pub fn search_url(&self, reference: &Reference) -> String {
        let mut url = format!(
            "{}/works?query.author={}&query.bibliographic={}&rows=5",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&reference.authors_query()),
            urlencoding::encode(reference.title().unwrap_or(""))
        );
        if let Some(year) = reference.year {
            url.push_str(&format!(
                "&filter=from-pub-date:{},until-pub-date:{}",
                year, year
            ));
        }
        if let Some(ref email) = self.mailto {
            url.push_str(&format!("&mailto={}", urlencoding::encode(email)));
        }
        url
    }
}

pub fn has_items(data: &serde_json::Value) -> bool {
    data["message"]["items"]
        .as_array()
        .is_some_and(|items| !items.is_empty())
}

impl LookupBackend for CrossRef {
    fn name(&self) -> &str {
        "CrossRef"
    }

    fn lookup<'a>(
        &'a self,
        reference: &'a Reference,
        client: &'a reqwest::Client,
    ) -> LookupFuture<'a> {
        Box::pin(async move {
            let resp = client
                .get(self.search_url(reference))
                .header(
                    "User-Agent",
                    crossref_user_agent(&self.user_agent, self.mailto.as_deref()),
                )
                .send()
                .await?;
            let data: serde_json::Value = require_success(resp)?.json().await?;
            Ok(has_items(&data))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn crossref() -> CrossRef {
        CrossRef {
            base_url: "https://api.crossref.org".into(),
            user_agent: "refcheck-test".into(),
            mailto: None,
        }
    }

    #[test]
    fn year_adds_date_filter() {
        let reference = Reference {
            title: Some("Deep Learning".into()),
            authors: vec!["Ian Goodfellow".into()],
            year: Some(2016),
            ..Default::default()
        };
        let url = crossref().search_url(&reference);
        assert!(url.contains("query.author=Ian%20Goodfellow"));
        assert!(url.contains("query.bibliographic=Deep%20Learning"));
        assert!(url.ends_with("&filter=from-pub-date:2016,until-pub-date:2016"));
    }

    #[test]
    fn no_year_no_filter() {
        let reference = Reference {
            title: Some("Deep Learning".into()),
            ..Default::default()
        };
        assert!(!crossref().search_url(&reference).contains("filter="));
    }

    #[test]
    fn items_decide() {
        assert!(has_items(&json!({"message": {"items": [{"DOI": "10.1/a"}]}})));
        assert!(!has_items(&json!({"message": {"items": []}})));
        assert!(!has_items(&json!({"status": "failed"})));
    }
}
