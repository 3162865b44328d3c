//! Client for OpenAI-compatible chat-completion servers (vLLM, llama.cpp, SGLang, ...)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::traits::{
    CompletionRequest, CompletionResponse, LLMProvider, Message, ProviderError, ProviderResult,
};
use crate::config::Config;

/// Chat-completion client for a locally hosted inference server
pub struct LocalApiClient {
    api_key: String,
    url: String,
    http_client: Client,
    model: String,
}

impl LocalApiClient {
    /// Create a client posting to `url` (the full `/chat/completions` route)
    pub fn new(url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            url: url.into(),
            http_client: Client::new(),
            model: model.into(),
        }
    }

    /// Create from the endpoint section of a configuration
    pub fn from_config(config: &Config, model: impl Into<String>) -> ProviderResult<Self> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(ProviderError::Config("model name must not be empty".to_string()));
        }
        Ok(Self::new(config.chat_completions_url(), config.endpoint.api_key.clone(), model))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[async_trait]
impl LLMProvider for LocalApiClient {
    fn name(&self) -> &str {
        "local"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
        let start = Instant::now();

        let body = ChatRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            top_k: request.top_k,
            temperature: request.temperature,
        };

        let response = self
            .http_client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let api_response: ChatResponse = response.json().await?;
        let latency_ms = start.elapsed().as_millis() as u64;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Parse("No choices in response".to_string()))?;

        let content = choice
            .message
            .content
            .ok_or_else(|| ProviderError::Parse("No message content in first choice".to_string()))?;

        let (input_tokens, output_tokens) = api_response
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        tracing::debug!(
            "Completion from {} in {}ms ({} in / {} out tokens)",
            self.model,
            latency_ms,
            input_tokens,
            output_tokens
        );

        Ok(CompletionResponse {
            content,
            model: api_response.model.unwrap_or_else(|| self.model.clone()),
            input_tokens,
            output_tokens,
            finish_reason: choice.finish_reason.unwrap_or_else(|| "unknown".to_string()),
            latency_ms,
        })
    }
}
