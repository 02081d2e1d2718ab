//! LLM client module for Promptly
//!
//! One client per supported provider behind the [`LlmClient`] trait.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod gemini;
mod openai;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use client::mock::MockLlmClient;
pub use error::LlmError;
pub use gemini::{GeminiClient, QUOTA_GUIDANCE};
pub use openai::OpenAIClient;
pub use types::{
    CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage, trim_leading_assistant,
};

use crate::config::{ProviderKind, ResolvedLlmConfig};

/// Create the client for the resolved provider
pub fn create_client(config: &ResolvedLlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider {
        ProviderKind::Gemini => Ok(Arc::new(GeminiClient::from_config(config)?)),
        ProviderKind::OpenAI => Ok(Arc::new(OpenAIClient::from_config(config)?)),
        ProviderKind::Claude => Ok(Arc::new(AnthropicClient::from_config(config)?)),
    }
}

/// Pull `error.message` out of a provider error body, else the raw body
pub(crate) fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
