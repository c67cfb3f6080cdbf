//! Hosted text-completion adapters

pub mod openai_compat;
pub mod stub;

pub use openai_compat::OpenAiCompatGenerator;
pub use stub::{StubGenerator, UnconfiguredGenerator};

use serde::{Deserialize, Serialize};

/// Common LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name/ID
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries on failure
    pub retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            timeout_secs: 45,
            retries: 0,
        }
    }
}
