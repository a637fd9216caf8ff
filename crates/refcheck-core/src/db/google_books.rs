use super::{LookupBackend, LookupFuture, require_success};
use crate::Reference;

/// Google Books volume search by title and first author.
pub struct GoogleBooks {
    pub base_url: String,
    pub user_agent: String,
}

impl GoogleBooks {
    pub fn search_url(&self, reference: &Reference) -> String {
        let title = urlencoding::encode(reference.title().unwrap_or(""));
        let author = urlencoding::encode(reference.first_author().unwrap_or(""));
        format!(
            "{}/volumes?q={}+inauthor:{}",
            self.base_url.trim_end_matches('/'),
            title,
            author
        )
    }
}

/// Non-zero `totalItems` means the catalog knows the work.
pub fn has_volumes(data: &serde_json::Value) -> bool {
    data["totalItems"].as_u64().unwrap_or(0) > 0
}

impl LookupBackend for GoogleBooks {
    fn name(&self) -> &str {
        "Google Books"
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
            Ok(has_volumes(&data))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_uses_title_and_first_author() {
        let books = GoogleBooks {
            base_url: "https://www.googleapis.com/books/v1".into(),
            user_agent: "refcheck-test".into(),
        };
        let reference = Reference {
            title: Some("Deep Learning".into()),
            authors: vec!["Ian Goodfellow".into(), "Yoshua Bengio".into()],
            ..Default::default()
        };
        assert_eq!(
            books.search_url(&reference),
            "https://www.googleapis.com/books/v1/volumes?q=Deep%20Learning+inauthor:Ian%20Goodfellow"
        );
    }

    #[test]
    fn total_items_decides() {
        assert!(has_volumes(&json!({"totalItems": 3, "items": []})));
        assert!(!has_volumes(&json!({"totalItems": 0})));
        assert!(!has_volumes(&json!({"kind": "books#volumes"})));
    }
}
