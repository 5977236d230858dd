use crate::domain::models::AiProvider;
use crate::infrastructure::config::ProviderEndpoints;
use crate::infrastructure::error::{GenerationError, InfraError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const REQUEST_TIMEOUT_SECS: u64 = 60;
const GEMINI_MODEL: &str = "gemini-1.5-flash";
const OPENAI_MODEL: &str = "gpt-3.5-turbo";
const DEEPSEEK_MODEL: &str = "deepseek-chat";
const GEMINI_VALIDATION_PROMPT: &str = "Hello, this is a test request to validate the API key.";

/// One AI vendor behind a uniform "prompt in, text out" seam.
#[async_trait]
pub trait AiProviderClient: Send + Sync {
    fn provider(&self) -> AiProvider;

    /// `Ok(false)` means the vendor rejected the secret. Transport failures are
    /// errors, not a verdict on the key.
    async fn validate_credential(&self, secret: &str) -> Result<bool, InfraError>;

    async fn generate(&self, secret: &str, prompt: &str) -> Result<String, InfraError>;
}

pub fn client_for(provider: AiProvider, endpoints: &ProviderEndpoints) -> Arc<dyn AiProviderClient> {
    let base_url = endpoints.base_url(provider);
    match provider {
        AiProvider::Gemini => Arc::new(GeminiClient::new(base_url)),
        AiProvider::OpenAi => Arc::new(ChatCompletionsClient::openai(base_url)),
        AiProvider::DeepSeek => Arc::new(ChatCompletionsClient::deepseek(base_url)),
    }
}

fn ensure_secret(secret: &str) -> Result<(), InfraError> {
    if secret.trim().is_empty() {
        return Err(InfraError::InvalidInput("API key must not be empty".to_string()));
    }
    Ok(())
}

fn endpoint(base_url: &str, segments: &[&str]) -> Result<Url, InfraError> {
    let mut url = Url::parse(base_url)
        .map_err(|error| InfraError::InvalidConfig(format!("invalid provider base url: {error}")))?;
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            InfraError::InvalidConfig(format!("provider base url cannot be a base: {base_url}"))
        })?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

/// Drops the request url first: Gemini carries the key in its query string.
fn network_error(error: reqwest::Error) -> InfraError {
    InfraError::Generation(GenerationError::Network(error.without_url().to_string()))
}

/// Sends the request and returns the body of a 2xx response.
async fn send_for_body(request: RequestBuilder) -> Result<String, InfraError> {
    let response = request
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .send()
        .await
        .map_err(network_error)?;
    let status = response.status();
    let body = response.text().await.map_err(network_error)?;
    if !status.is_success() {
        return Err(GenerationError::HttpStatus {
            status: status.as_u16(),
            body,
        }
        .into());
    }
    Ok(body)
}

async fn send_for_status(request: RequestBuilder) -> Result<StatusCode, InfraError> {
    let response = request
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .send()
        .await
        .map_err(network_error)?;
    Ok(response.status())
}

fn non_blank(text: Option<String>, missing: &str) -> Result<String, InfraError> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(GenerationError::EnvelopeMalformed(missing.to_string()).into()),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_k: u32,
    top_p: f64,
    max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 2048,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    parts: Option<Vec<GeminiResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        self.candidates?
            .into_iter()
            .next()?
            .content?
            .parts?
            .into_iter()
            .next()?
            .text
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn generate_endpoint(&self) -> Result<Url, InfraError> {
        let action = format!("{GEMINI_MODEL}:generateContent");
        endpoint(&self.base_url, &["models", action.as_str()])
    }

    fn generate_request(&self, secret: &str, prompt: &str) -> Result<RequestBuilder, InfraError> {
        let payload = GenerateContentRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GenerationConfig::default(),
        };
        Ok(self
            .client
            .post(self.generate_endpoint()?)
            .query(&[("key", secret)])
            .json(&payload))
    }
}

#[async_trait]
impl AiProviderClient for GeminiClient {
    fn provider(&self) -> AiProvider {
        AiProvider::Gemini
    }

    async fn validate_credential(&self, secret: &str) -> Result<bool, InfraError> {
        ensure_secret(secret)?;
        let status = send_for_status(self.generate_request(secret, GEMINI_VALIDATION_PROMPT)?).await?;
        Ok(status != StatusCode::BAD_REQUEST && status != StatusCode::FORBIDDEN)
    }

    async fn generate(&self, secret: &str, prompt: &str) -> Result<String, InfraError> {
        ensure_secret(secret)?;
        let body = send_for_body(self.generate_request(secret, prompt)?).await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body).map_err(|error| {
            GenerationError::EnvelopeMalformed(format!("invalid gemini payload: {error}"))
        })?;
        non_blank(parsed.into_text(), "gemini response has no candidate text")
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat-completions vendors (OpenAI, DeepSeek).
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    provider: AiProvider,
    model: &'static str,
    base_url: String,
}

impl ChatCompletionsClient {
    pub fn openai(base_url: impl Into<String>) -> Self {
        Self::new(AiProvider::OpenAi, OPENAI_MODEL, base_url)
    }

    pub fn deepseek(base_url: impl Into<String>) -> Self {
        Self::new(AiProvider::DeepSeek, DEEPSEEK_MODEL, base_url)
    }

    fn new(provider: AiProvider, model: &'static str, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            provider,
            model,
            base_url: base_url.into(),
        }
    }

    pub fn model(&self) -> &'static str {
        self.model
    }
}

#[async_trait]
impl AiProviderClient for ChatCompletionsClient {
    fn provider(&self) -> AiProvider {
        self.provider
    }

    async fn validate_credential(&self, secret: &str) -> Result<bool, InfraError> {
        ensure_secret(secret)?;
        let url = endpoint(&self.base_url, &["models"])?;
        let status = send_for_status(self.client.get(url).bearer_auth(secret)).await?;
        Ok(status.is_success())
    }

    async fn generate(&self, secret: &str, prompt: &str) -> Result<String, InfraError> {
        ensure_secret(secret)?;
        let url = endpoint(&self.base_url, &["chat", "completions"])?;
        let payload = ChatCompletionRequest {
            model: self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.7,
            max_tokens: 1000,
        };
        let body = send_for_body(self.client.post(url).bearer_auth(secret).json(&payload)).await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|error| {
            GenerationError::EnvelopeMalformed(format!(
                "invalid {} payload: {error}",
                self.provider.as_str()
            ))
        })?;
        let text = parsed
            .choices
            .and_then(|choices| choices.into_iter().next())
            .and_then(|choice| choice.message)
            .and_then(|message| message.content);
        non_blank(text, "chat completion has no message content")
    }
}
