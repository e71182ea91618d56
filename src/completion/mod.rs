//! Completion service clients.
//!
//! Every insight is produced by one call to a [`CompletionService`]. The
//! aggregator only sees the trait, so providers can be swapped freely.

pub mod gemini;
#[cfg(test)]
pub mod mock;
pub mod ollama;

use crate::config::{ModelConfig, Provider};
use crate::error::CompletionError;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

/// A prompt-in, text-out text generation endpoint.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Short provider name for logs and reports.
    fn provider_name(&self) -> &str;

    /// Model identifier sent with each request.
    fn model_name(&self) -> &str;

    /// Run one completion. May be slow; may fail.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// Build the configured completion client.
pub fn build_service(config: &ModelConfig) -> Result<Arc<dyn CompletionService>> {
    let service: Arc<dyn CompletionService> = match config.provider {
        Provider::Ollama => Arc::new(OllamaClient::new(config)?),
        Provider::Gemini => Arc::new(GeminiClient::new(config)?),
    };
    Ok(service)
}

/// System instruction shared by the chat-style providers.
pub(crate) const SYSTEM_PROMPT: &str = "You are an assistant that reads emails and \
answers questions about them precisely and concisely. Answer only with the requested \
content, without preamble.";
