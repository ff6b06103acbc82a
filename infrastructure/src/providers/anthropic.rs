//! Anthropic Messages API backend

use super::{check_status, transport_error};
use async_trait::async_trait;
use council_application::{Backend, BackendError};
use reqwest::header::CONTENT_TYPE;
use serde_json::{Value, json};
use tracing::debug;

const API_VERSION: &str = "2023-06-01";

pub struct AnthropicBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    max_tokens: u32,
}

impl AnthropicBackend {
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        model: String,
        api_key: String,
        max_tokens: u32,
    ) -> Self {
        Self {
            client,
            base_url,
            model,
            api_key,
            max_tokens,
        }
    }

    fn build_payload(&self, prompt: &str, context: &[String]) -> Value {
        let messages: Vec<Value> = context
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(prompt))
            .map(|content| json!({ "role": "user", "content": content }))
            .collect();

        json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": messages,
        })
    }

    /// Concatenate every text block of the response
    fn parse_response(body: &Value) -> Result<String, BackendError> {
        let text: String = body
            .get("content")
            .and_then(|v| v.as_array())
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                    .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            Err(BackendError::EmptyResponse)
        } else {
            Ok(text)
        }
    }
}

#[async_trait]
impl Backend for AnthropicBackend {
    async fn call(&self, prompt: &str, context: &[String]) -> Result<String, BackendError> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!(model = self.model.as_str(), "Sending Anthropic message");

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.build_payload(prompt, context))
            .send()
            .await
            .map_err(transport_error)?;

        let body: Value = check_status(response)
            .await?
            .json()
            .await
            .map_err(transport_error)?;
        Self::parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let backend = AnthropicBackend::new(
            reqwest::Client::new(),
            "https://api.anthropic.com".to_string(),
            "claude-3-5-haiku-latest".to_string(),
            "key".to_string(),
            1024,
        );
        let payload = backend.build_payload("Synthesize", &["critique".to_string()]);

        assert_eq!(payload["max_tokens"], 1024);
        assert_eq!(payload["messages"][0]["content"], "critique");
        assert_eq!(payload["messages"][1]["content"], "Synthesize");
    }

    #[test]
    fn test_parse_response_joins_text_blocks() {
        let body = json!({
            "content": [
                { "type": "text", "text": "Two plus two " },
                { "type": "tool_use", "id": "x" },
                { "type": "text", "text": "is four." }
            ]
        });
        assert_eq!(
            AnthropicBackend::parse_response(&body).unwrap(),
            "Two plus two is four."
        );
        assert_eq!(
            AnthropicBackend::parse_response(&json!({ "content": [] })).unwrap_err(),
            BackendError::EmptyResponse
        );
    }
}
