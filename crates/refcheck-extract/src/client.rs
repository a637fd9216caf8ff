use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{ApiKey, ExtractError};

pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ExtractError>> + Send + 'a>>;

/// Something that answers a single-turn prompt with free-form text.
pub trait Completion: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str) -> CompletionFuture<'a>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for OpenRouter and compatible APIs.
pub struct LlmClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: ApiKey,
}

impl LlmClient {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: ApiKey,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, prompt: &str) -> Result<String, ExtractError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "sending extraction prompt");
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ExtractError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let data: ChatResponse = resp.json().await?;
        data.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ExtractError::EmptyResponse)
    }
}

impl Completion for LlmClient {
    fn complete<'a>(&'a self, prompt: &'a str) -> CompletionFuture<'a> {
        Box::pin(self.chat(prompt))
    }
}
