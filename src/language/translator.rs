//! Machine translation through the completion service.

use super::language_name;
use crate::completion::CompletionService;
use crate::error::CompletionError;
use async_trait::async_trait;
use std::sync::Arc;

/// Translates text between two ISO 639-1 languages.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, from: &str, to: &str)
        -> Result<String, CompletionError>;
}

/// Asks the completion model for a translation.
pub struct CompletionTranslator {
    completion: Arc<dyn CompletionService>,
}

impl CompletionTranslator {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }
}

#[async_trait]
impl Translator for CompletionTranslator {
    async fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
    ) -> Result<String, CompletionError> {
        let prompt = format!(
            "Translate the following email from {} to {}. Answer with the translation only.\n\n{}",
            language_name(from),
            language_name(to),
            text
        );
        self.completion.complete(&prompt).await
    }
}
