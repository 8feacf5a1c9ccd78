//! LLM agent module - the single outbound call to the hosted model.
//!
//! Each invoker makes exactly one request per call and never retries. A
//! deadline wraps every call; a call that outlives it reports a timeout.

use crate::config::{Config, ConfigError, Provider};
use async_trait::async_trait;
use reqwest::Client;
use rstructor::{GeminiClient, GeminiModel, LLMClient};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}

/// Sends a prompt to a text-generation model and returns its raw reply.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<String, AgentError>;

    /// Model identifier used for every call
    fn model(&self) -> &str;
}

/// Build the invoker for the configured provider
pub fn build_invoker(config: &Config) -> Result<Arc<dyn ModelInvoker>, AgentError> {
    let api_key = config.api_key()?;
    let invoker: Arc<dyn ModelInvoker> = match config.agent.provider {
        Provider::Groq => Arc::new(GroqInvoker::new(
            &config.agent.endpoint,
            api_key,
            &config.agent.model,
            config.agent.timeout(),
        )?
        .with_temperature(config.agent.temperature)
        .with_max_tokens(config.agent.max_tokens)
        .with_json_mode(config.agent.json_mode)),
        Provider::Gemini => Arc::new(GeminiInvoker::new(
            api_key,
            &config.agent.model,
            config.agent.timeout(),
        )),
    };
    Ok(invoker)
}

/// Run `call`, turning expiry of `timeout` into [`AgentError::Timeout`]
async fn with_deadline<F>(timeout: Duration, call: F) -> Result<String, AgentError>
where
    F: Future<Output = Result<String, AgentError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| AgentError::Timeout(timeout))?
}

/// OpenAI-compatible chat completions request.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Groq chat completions over its OpenAI-compatible API.
pub struct GroqInvoker {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    json_mode: bool,
}

impl GroqInvoker {
    pub fn new(
        endpoint: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, AgentError> {
        let client = Client::builder()
            .user_agent(concat!("notewise/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
            temperature: None,
            max_tokens: None,
            json_mode: false,
        })
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Request `response_format: json_object` from the API
    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    async fn chat(&self, prompt: &str) -> Result<String, AgentError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: self.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let url = format!("{}/chat/completions", self.endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::RequestFailed(format!("HTTP {}", status)));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::RequestFailed(format!("invalid response body: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AgentError::RequestFailed("response contained no message".to_string()))
    }
}

#[async_trait]
impl ModelInvoker for GroqInvoker {
    async fn invoke(&self, prompt: &str) -> Result<String, AgentError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "calling groq");
        let text = with_deadline(self.timeout, self.chat(prompt)).await?;
        debug!(response_len = text.len(), "groq responded");
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Google Gemini through rstructor.
pub struct GeminiInvoker {
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GeminiInvoker {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, AgentError> {
        let client = GeminiClient::new(self.api_key.as_str())
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?
            .model(parse_gemini_model(&self.model));

        let result = client
            .generate_with_metadata(prompt)
            .await
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?;

        Ok(result.text)
    }
}

#[async_trait]
impl ModelInvoker for GeminiInvoker {
    async fn invoke(&self, prompt: &str) -> Result<String, AgentError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "calling gemini");
        with_deadline(self.timeout, self.generate(prompt)).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Parse a model string into a GeminiModel
fn parse_gemini_model(model: &str) -> GeminiModel {
    match model {
        "gemini-2.0-flash" => GeminiModel::Gemini20Flash,
        "gemini-2.5-flash" => GeminiModel::Gemini25Flash,
        "gemini-2.5-pro" => GeminiModel::Gemini25Pro,
        _ => GeminiModel::Gemini20Flash, // Default
    }
}
