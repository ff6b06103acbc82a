//! OpenAI-compatible chat completions backend
//!
//! Works against any server exposing `POST {base_url}/chat/completions`
//! (OpenAI, Gemini's OpenAI-compatible endpoint, local inference servers).

use super::{check_status, transport_error};
use async_trait::async_trait;
use council_application::{Backend, BackendError};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::{Value, json};
use tracing::debug;

pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
}

impl OpenAiBackend {
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        model: String,
        api_key: Option<String>,
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

    /// Context entries become preceding user messages, then the prompt
    fn build_payload(&self, prompt: &str, context: &[String]) -> Value {
        let messages: Vec<Value> = context
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(prompt))
            .map(|content| json!({ "role": "user", "content": content }))
            .collect();

        json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
        })
    }

    fn parse_response(body: &Value) -> Result<String, BackendError> {
        body.get("choices")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
            .ok_or(BackendError::EmptyResponse)
    }
}

#[async_trait]
impl Backend for OpenAiBackend {
    async fn call(&self, prompt: &str, context: &[String]) -> Result<String, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = self.model.as_str(), url = url.as_str(), "Sending chat completion");

        let mut request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(&self.build_payload(prompt, context));
        if let Some(key) = &self.api_key {
            request = request.header(AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = request.send().await.map_err(transport_error)?;
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

    fn backend() -> OpenAiBackend {
        OpenAiBackend::new(
            reqwest::Client::new(),
            "http://localhost:11434/v1".to_string(),
            "llama3".to_string(),
            None,
            512,
        )
    }

    #[test]
    fn test_payload_orders_context_before_prompt() {
        let payload = backend().build_payload(
            "Critique these",
            &["draft one".to_string(), "draft two".to_string()],
        );
        let messages = payload["messages"].as_array().unwrap();

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["content"], "draft one");
        assert_eq!(messages[1]["content"], "draft two");
        assert_eq!(messages[2]["content"], "Critique these");
        assert_eq!(payload["model"], "llama3");
        assert_eq!(payload["max_tokens"], 512);
    }

    #[test]
    fn test_parse_response() {
        let body = json!({
            "choices": [{ "message": { "role": "assistant", "content": "4" } }]
        });
        assert_eq!(OpenAiBackend::parse_response(&body).unwrap(), "4");

        let blank = json!({ "choices": [{ "message": { "content": "  " } }] });
        assert_eq!(
            OpenAiBackend::parse_response(&blank).unwrap_err(),
            BackendError::EmptyResponse
        );
        assert_eq!(
            OpenAiBackend::parse_response(&json!({})).unwrap_err(),
            BackendError::EmptyResponse
        );
    }
}
