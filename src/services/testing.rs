use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, SelfCareError};
use crate::interfaces::providers::LlmProvider;

/// Records every prompt and answers with a canned reply or a failure.
pub(crate) struct RecordingProvider {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl RecordingProvider {
    pub(crate) fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for RecordingProvider {
    async fn generate_text(&self, prompt: &str, _system_prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .ok_or_else(|| SelfCareError::Http("Chat completion failed (429): quota".to_string()))
    }
}
