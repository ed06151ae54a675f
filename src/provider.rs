//! Model Provider Abstraction
//!
//! Unified interface for the external text-completion service (OpenAI,
//! Anthropic, local models via Ollama or OpenAI-compatible servers). The
//! service accepts a system instruction plus a user prompt and returns free
//! text with no format guarantee; everything downstream of this module exists
//! to recover structure from that text.

use crate::error::PipelineError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

/// Provider kind selected in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    Anthropic,
    Ollama,
    LocalCustom,
}

/// One provider entry from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        match self.provider_type {
            ProviderType::OpenAI | ProviderType::Anthropic if self.api_key.is_none() => {
                Err("api_key is required for hosted providers".to_string())
            }
            ProviderType::LocalCustom if self.endpoint.is_none() => {
                Err("endpoint is required for local-custom providers".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Sampling options forwarded to the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: Some(0.7),
            max_tokens: Some(4096),
        }
    }
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
}

/// Text-completion client trait. One blocking (awaited) call per attempt; the
/// orchestrator owns timeout and retry.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, PipelineError>;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}

// OpenAI-compatible API request/response structures
#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct ChatApiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatApiMessage,
}

fn map_http_error(error: reqwest::Error) -> PipelineError {
    if error.is_status() {
        let status = error.status().map(|s| s.as_u16()).unwrap_or(0);
        match status {
            401 => PipelineError::ProviderAuthFailed(error.to_string()),
            429 => PipelineError::ProviderRateLimit(error.to_string()),
            _ => PipelineError::ProviderRequestFailed(error.to_string()),
        }
    } else if error.is_timeout() {
        PipelineError::ProviderRequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        PipelineError::ProviderRequestFailed(format!("Connection error: {}", error))
    } else {
        PipelineError::ProviderError(format!("HTTP error: {}", error))
    }
}

async fn map_error_response(response: reqwest::Response) -> PipelineError {
    let status = response.status().as_u16();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    match status {
        401 => PipelineError::ProviderAuthFailed(error_text),
        429 => PipelineError::ProviderRateLimit(error_text),
        _ => PipelineError::ProviderRequestFailed(format!(
            "Request failed with status {}: {}",
            status, error_text
        )),
    }
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROVIDER_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

fn build_provider_http_client() -> Result<Client, PipelineError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(PROVIDER_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| PipelineError::ProviderError(format!("Failed to create HTTP client: {}", e)))
}

/// Shared request path for every OpenAI-compatible endpoint (OpenAI, Ollama,
/// custom local servers).
async fn complete_openai_compatible(
    client: &Client,
    base_url: &str,
    api_key: Option<&str>,
    model: &str,
    system: &str,
    user: &str,
    options: &CompletionOptions,
) -> Result<CompletionResponse, PipelineError> {
    let request = ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatApiMessage {
                role: "system".to_string(),
                content: system.to_string(),
            },
            ChatApiMessage {
                role: "user".to_string(),
                content: user.to_string(),
            },
        ],
        temperature: options.temperature,
        max_tokens: options.max_tokens,
        stream: false,
    };

    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    let mut request_builder = client
        .post(&url)
        .header("Content-Type", "application/json");
    if let Some(key) = api_key {
        request_builder = request_builder.header("Authorization", format!("Bearer {}", key));
    }

    let response = request_builder
        .json(&request)
        .send()
        .await
        .map_err(map_http_error)?;

    if !response.status().is_success() {
        return Err(map_error_response(response).await);
    }

    let completion: ChatCompletionResponse = response
        .json()
        .await
        .map_err(|e| PipelineError::ProviderError(format!("Failed to parse response: {}", e)))?;

    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| PipelineError::ProviderError("No choices in response".to_string()))?;

    Ok(CompletionResponse {
        content: choice.message.content,
        model: completion.model,
    })
}

/// OpenAI provider client
pub struct OpenAIClient {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    pub fn new(
        model: String,
        api_key: String,
        base_url: Option<String>,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            client: build_provider_http_client()?,
            model,
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAIClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, PipelineError> {
        complete_openai_compatible(
            &self.client,
            &self.base_url,
            Some(&self.api_key),
            &self.model,
            system,
            user,
            options,
        )
        .await
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Anthropic provider client
pub struct AnthropicClient {
    client: Client,
    model: String,
    api_key: String,
}

impl AnthropicClient {
    pub fn new(model: String, api_key: String) -> Result<Self, PipelineError> {
        Ok(Self {
            client: build_provider_http_client()?,
            model,
            api_key,
        })
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, PipelineError> {
        let request_body = json!({
            "model": self.model,
            "max_tokens": options.max_tokens.unwrap_or(4096),
            "temperature": options.temperature,
            "system": system,
            "messages": [{"role": "user", "content": user}],
        });

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            return Err(map_error_response(response).await);
        }

        #[derive(Deserialize)]
        struct AnthropicResponse {
            content: Vec<AnthropicContent>,
            model: String,
        }

        #[derive(Deserialize)]
        struct AnthropicContent {
            text: String,
        }

        let completion: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::ProviderError(format!("Failed to parse response: {}", e)))?;

        let content = completion
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            model: completion.model,
        })
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Ollama provider client (local models, OpenAI-compatible API)
pub struct OllamaClient {
    client: Client,
    model: String,
    base_url: String,
}

impl OllamaClient {
    pub fn new(model: String, base_url: Option<String>) -> Result<Self, PipelineError> {
        Ok(Self {
            client: build_provider_http_client()?,
            model,
            base_url: base_url.unwrap_or_else(|| "http://localhost:11434".to_string()),
        })
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, PipelineError> {
        let base = format!("{}/v1", self.base_url.trim_end_matches('/'));
        complete_openai_compatible(
            &self.client,
            &base,
            None,
            &self.model,
            system,
            user,
            options,
        )
        .await
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Custom local provider client (OpenAI-compatible endpoint)
pub struct CustomLocalClient {
    client: Client,
    model: String,
    endpoint: String,
    api_key: Option<String>,
}

impl CustomLocalClient {
    pub fn new(
        model: String,
        endpoint: String,
        api_key: Option<String>,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            client: build_provider_http_client()?,
            model,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl CompletionClient for CustomLocalClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, PipelineError> {
        complete_openai_compatible(
            &self.client,
            &self.endpoint,
            self.api_key.as_deref(),
            &self.model,
            system,
            user,
            options,
        )
        .await
    }

    fn provider_name(&self) -> &str {
        "local"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Provider factory for creating completion clients from configuration
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_client(
        config: &ProviderConfig,
    ) -> Result<Box<dyn CompletionClient>, PipelineError> {
        config
            .validate()
            .map_err(PipelineError::ProviderNotConfigured)?;

        match config.provider_type {
            ProviderType::OpenAI => Ok(Box::new(OpenAIClient::new(
                config.model.clone(),
                config.api_key.clone().unwrap_or_default(),
                config.endpoint.clone(),
            )?)),
            ProviderType::Anthropic => Ok(Box::new(AnthropicClient::new(
                config.model.clone(),
                config.api_key.clone().unwrap_or_default(),
            )?)),
            ProviderType::Ollama => Ok(Box::new(OllamaClient::new(
                config.model.clone(),
                config.endpoint.clone(),
            )?)),
            ProviderType::LocalCustom => Ok(Box::new(CustomLocalClient::new(
                config.model.clone(),
                config.endpoint.clone().unwrap_or_default(),
                config.api_key.clone(),
            )?)),
        }
    }
}

/// Scripted completion client for tests. Each call consumes the next scripted
/// outcome; once exhausted it repeats the last one.
pub struct MockCompletionClient {
    responses: parking_lot::Mutex<Vec<Result<String, PipelineError>>>,
    pub calls: std::sync::atomic::AtomicU32,
    model_name: String,
}

impl MockCompletionClient {
    pub fn new(responses: Vec<Result<String, PipelineError>>) -> Self {
        Self {
            responses: parking_lot::Mutex::new(responses),
            calls: std::sync::atomic::AtomicU32::new(0),
            model_name: "mock-model".to_string(),
        }
    }

    pub fn always(response: &str) -> Self {
        Self::new(vec![Ok(response.to_string())])
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(
        &self,
        _system: &str,
        _user: &str,
        _options: &CompletionOptions,
    ) -> Result<CompletionResponse, PipelineError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let mut responses = self.responses.lock();
        let outcome = if responses.len() > 1 {
            responses.remove(0)
        } else {
            match responses.first() {
                Some(Ok(content)) => Ok(content.clone()),
                Some(Err(e)) => Err(PipelineError::ProviderError(e.to_string())),
                None => Err(PipelineError::ProviderError("script exhausted".to_string())),
            }
        };
        outcome.map(|content| CompletionResponse {
            content,
            model: self.model_name.clone(),
        })
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
