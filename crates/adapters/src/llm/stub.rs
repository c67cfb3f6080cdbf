//! Offline generators

use async_trait::async_trait;
use social_autopilot_domain::{CompletionRequest, ContentGenerator, GenerateError};

/// Returns canned text; JSON requests get an object with empty lists
pub struct StubGenerator {
    text: String,
}

impl StubGenerator {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for StubGenerator {
    fn default() -> Self {
        Self::new("Stub caption #stub")
    }
}

#[async_trait]
impl ContentGenerator for StubGenerator {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerateError> {
        if request.json_output {
            return Ok(serde_json::json!({
                "variations": [self.text],
                "ideas": [],
                "recommendations": []
            })
            .to_string());
        }
        Ok(self.text.clone())
    }

    fn provider(&self) -> &'static str {
        "stub"
    }
}

/// Stands in when no API key is configured; every call fails
#[derive(Debug, Default)]
pub struct UnconfiguredGenerator {
    reason: String,
}

impl UnconfiguredGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ContentGenerator for UnconfiguredGenerator {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, GenerateError> {
        Err(GenerateError::Config(if self.reason.is_empty() {
            "No LLM provider configured".to_string()
        } else {
            self.reason.clone()
        }))
    }

    fn provider(&self) -> &'static str {
        "none"
    }
}
