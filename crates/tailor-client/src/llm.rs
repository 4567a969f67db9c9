use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tailor_core::config::LLM_TEMPERATURE;
use tailor_core::error::AppError;
use tailor_core::prompts::user_message;
use tailor_core::provider::Provider;
use tailor_core::traits::{Completer, CompleterFactory};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const GEMINI_OPENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MAX_TOKENS: u32 = 4096;
const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(120);

/// Message sent by [`ProviderClient::test_connection`] when none is given.
pub const DEFAULT_PING_MESSAGE: &str = "Hello, are you ready?";

fn build_http_client(timeout: Duration) -> Result<Client, AppError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::HttpError(e.to_string()))
}

fn send_error(e: reqwest::Error, timeout_secs: u64) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(timeout_secs)
    } else if e.is_connect() {
        AppError::NetworkError(format!("Connection failed: {e}"))
    } else {
        AppError::HttpError(e.to_string())
    }
}

/// Both APIs wrap failures as `{"error": {"message": ...}}`.
#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn api_error(status_code: u16, body: &str) -> AppError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("HTTP {status_code}: {body}"));
    AppError::LlmError {
        message,
        status_code,
    }
}

fn empty_response() -> AppError {
    AppError::LlmError {
        message: "Empty response from LLM".into(),
        status_code: 200,
    }
}

async fn read_failure(response: reqwest::Response) -> AppError {
    let status_code = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    api_error(status_code, &body)
}

// ---------------------------------------------------------------------------
// OpenAI-compatible chat completions (OpenAI, Gemini)
// ---------------------------------------------------------------------------

/// Client for any OpenAI-compatible chat completions API.
///
/// Serves OpenAI directly and Gemini through Google's compatibility layer.
#[derive(Clone)]
pub struct OpenAiCompatClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl OpenAiCompatClient {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Result<Self, AppError> {
        Self::build(api_key, model, base_url, DEFAULT_LLM_TIMEOUT)
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, AppError> {
        Self::build(&self.api_key, &self.model, &self.base_url, timeout)
    }

    fn build(
        api_key: &str,
        model: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_body<'a>(&'a self, system: &'a str, user: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            temperature: LLM_TEMPERATURE,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        }
    }

    /// Sends one system + user exchange and returns the reply text.
    pub async fn chat(&self, system: &str, user: &str) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = self.request_body(system, user);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error(e, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(read_failure(response).await);
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse LLM response: {e}")))?;
        chat.into_text().ok_or_else(empty_response)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Anthropic Messages API
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl AnthropicClient {
    pub fn new(api_key: &str, model: &str) -> Result<Self, AppError> {
        Self::build(api_key, model, ANTHROPIC_API_URL, DEFAULT_LLM_TIMEOUT)
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, AppError> {
        Self::build(&self.api_key, &self.model, &self.url, timeout)
    }

    fn build(api_key: &str, model: &str, url: &str, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            url: url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body<'a>(&'a self, system: &'a str, user: &'a str) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: ANTHROPIC_MAX_TOKENS,
            temperature: LLM_TEMPERATURE,
            system,
            messages: vec![ChatMessage {
                role: "user",
                content: user,
            }],
        }
    }

    pub async fn chat(&self, system: &str, user: &str) -> Result<String, AppError> {
        let request = self.request_body(system, user);

        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error(e, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(read_failure(response).await);
        }

        let messages: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse LLM response: {e}")))?;
        if let Some(usage) = &messages.usage {
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Anthropic call succeeded"
            );
        }
        messages.into_text().ok_or_else(empty_response)
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl MessagesResponse {
    /// Concatenates all text blocks.
    fn into_text(self) -> Option<String> {
        let text: String = self
            .content
            .into_iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text)
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

// ---------------------------------------------------------------------------
// Provider dispatch
// ---------------------------------------------------------------------------

/// A configured client for one of the supported providers.
#[derive(Clone)]
pub enum ProviderClient {
    Google(OpenAiCompatClient),
    OpenAi(OpenAiCompatClient),
    Anthropic(AnthropicClient),
}

impl ProviderClient {
    /// Builds the client for `provider` with its fixed model.
    pub fn for_provider(provider: Provider, api_key: &str) -> Result<Self, AppError> {
        let model = provider.default_model();
        Ok(match provider {
            Provider::Google => {
                Self::Google(OpenAiCompatClient::new(api_key, model, GEMINI_OPENAI_BASE_URL)?)
            }
            Provider::OpenAi => {
                Self::OpenAi(OpenAiCompatClient::new(api_key, model, OPENAI_BASE_URL)?)
            }
            Provider::Anthropic => Self::Anthropic(AnthropicClient::new(api_key, model)?),
        })
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, AppError> {
        Ok(match self {
            Self::Google(c) => Self::Google(c.with_timeout(timeout)?),
            Self::OpenAi(c) => Self::OpenAi(c.with_timeout(timeout)?),
            Self::Anthropic(c) => Self::Anthropic(c.with_timeout(timeout)?),
        })
    }

    pub fn provider(&self) -> Provider {
        match self {
            Self::Google(_) => Provider::Google,
            Self::OpenAi(_) => Provider::OpenAi,
            Self::Anthropic(_) => Provider::Anthropic,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::Google(c) | Self::OpenAi(c) => c.model(),
            Self::Anthropic(c) => c.model(),
        }
    }

    pub async fn chat(&self, system: &str, user: &str) -> Result<String, AppError> {
        match self {
            Self::Google(c) | Self::OpenAi(c) => c.chat(system, user).await,
            Self::Anthropic(c) => c.chat(system, user).await,
        }
    }

    /// Sends one message under a generic assistant system prompt and returns
    /// the reply.
    pub async fn test_connection(&self, message: &str) -> Result<String, AppError> {
        tracing::info!(provider = %self.provider(), model = self.model(), "Testing connection");
        self.chat("You are a helpful assistant.", message).await
    }
}

impl Completer for ProviderClient {
    async fn complete(
        &self,
        system_prompt: &str,
        resume_text: &str,
        job_text: &str,
    ) -> Result<String, AppError> {
        tracing::info!(provider = %self.provider(), model = self.model(), "Requesting completion");
        self.chat(system_prompt, &user_message(resume_text, job_text))
            .await
    }
}

/// Builds a [`ProviderClient`] per request.
#[derive(Clone, Default)]
pub struct ProviderClientFactory {
    llm_timeout: Option<Duration>,
}

impl ProviderClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = Some(timeout);
        self
    }
}

impl CompleterFactory for ProviderClientFactory {
    type Completer = ProviderClient;

    fn create(&self, provider: Provider, api_key: &str) -> Result<ProviderClient, AppError> {
        let init_error =
            |e: AppError| AppError::ConfigError(format!("Failed to initialize {provider} model: {e}"));

        let client = ProviderClient::for_provider(provider, api_key).map_err(init_error)?;
        match self.llm_timeout {
            Some(t) => client.with_timeout(t).map_err(init_error),
            None => Ok(client),
        }
    }
}
