//! OpenAI-compatible chat completions adapter (OpenAI, Groq)

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use social_autopilot_domain::{CompletionRequest, ContentGenerator, GenerateError};
use std::time::Duration;

use super::LlmConfig;

/// Exponent cap for the retry delay (500ms * 2^6 = 32s)
const MAX_BACKOFF_EXP: u32 = 6;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Generator for any `/chat/completions` endpoint
pub struct OpenAiCompatGenerator {
    client: Client,
    api_key: SecretString,
    base_url: String,
    provider: &'static str,
    config: LlmConfig,
}

impl OpenAiCompatGenerator {
    pub fn openai(api_key: SecretString, config: LlmConfig) -> Result<Self, GenerateError> {
        Self::with_base_url("openai", api_key, OPENAI_BASE_URL.to_string(), config)
    }

    pub fn groq(api_key: SecretString, config: LlmConfig) -> Result<Self, GenerateError> {
        Self::with_base_url("groq", api_key, GROQ_BASE_URL.to_string(), config)
    }

    pub fn with_base_url(
        provider: &'static str,
        api_key: SecretString,
        base_url: String,
        config: LlmConfig,
    ) -> Result<Self, GenerateError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerateError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            provider,
            config,
        })
    }

    async fn call_api(&self, request: &CompletionRequest) -> Result<String, GenerateError> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request
                .json_output
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerateError::Timeout
                } else {
                    GenerateError::Api(e.to_string())
                }
            })?;

        if response.status() == 429 {
            return Err(GenerateError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Api(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::InvalidFormat(e.to_string()))?;

        let text = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GenerateError::InvalidFormat("Empty response".to_string()));
        }

        Ok(text)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
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

#[async_trait]
impl ContentGenerator for OpenAiCompatGenerator {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerateError> {
        let mut last_error = None;
        for attempt in 0..=self.config.retries {
            if attempt > 0 {
                tracing::warn!(attempt = attempt, provider = self.provider, "Retrying completion");
                tokio::time::sleep(backoff(attempt)).await;
            }

            match self.call_api(&request).await {
                Ok(text) => return Ok(text),
                Err(GenerateError::RateLimited) => return Err(GenerateError::RateLimited),
                Err(e) => {
                    tracing::warn!(error = %e, provider = self.provider, "Completion failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| GenerateError::Api("Unknown error".to_string())))
    }

    fn provider(&self) -> &'static str {
        self.provider
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(500 * 2_u64.pow(attempt.min(MAX_BACKOFF_EXP)))
}
