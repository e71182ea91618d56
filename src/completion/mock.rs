//! Scripted completion service for tests.

use super::CompletionService;
use crate::error::CompletionError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// What the mock does for a matching prompt.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    /// Text suffixed with the global call number, so repeated calls differ.
    Numbered(String),
    Fail(CompletionError),
    /// Never answers within any sane timeout.
    Hang,
    Panic,
}

pub struct MockCompletion {
    rules: Vec<(String, MockReply)>,
    default_reply: MockReply,
    delay: Duration,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockCompletion {
    pub fn new(default_text: &str) -> Self {
        Self {
            rules: Vec::new(),
            default_reply: MockReply::Text(default_text.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_default(mut self, reply: MockReply) -> Self {
        self.default_reply = reply;
        self
    }

    /// Reply with `reply` whenever the prompt contains `needle`.
    pub fn on(mut self, needle: &str, reply: MockReply) -> Self {
        self.rules.push((needle.to_string(), reply));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for MockCompletion {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().unwrap().push(prompt.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default_reply.clone());

        match reply {
            MockReply::Text(text) => Ok(text),
            MockReply::Numbered(text) => Ok(format!("{} #{}", text, call)),
            MockReply::Fail(err) => Err(err),
            MockReply::Hang => {
                tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
                Ok(String::new())
            }
            MockReply::Panic => panic!("mock completion panicked"),
        }
    }
}
