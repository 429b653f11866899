use std::sync::Arc;

use crate::error::{Result, SelfCareError};
use crate::interfaces::providers::LlmProvider;

/// Which prompt template a chat message is answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatTopic {
    DietPlan,
    SelfCare,
}

impl ChatTopic {
    pub fn classify(message: &str) -> Self {
        if message.to_lowercase().contains("diet") {
            ChatTopic::DietPlan
        } else {
            ChatTopic::SelfCare
        }
    }

    pub fn prompt(self, message: &str) -> String {
        match self {
            ChatTopic::DietPlan => format!(
                "Create a detailed 7-day vegetarian diet plan based on this request: \"{message}\"\n\n\
                 For each day include breakfast, lunch, dinner and snacks. \
                 Give approximate calorie counts for every meal and a daily total, \
                 and briefly explain the nutritional benefits of the key ingredients."
            ),
            ChatTopic::SelfCare => format!(
                "You are a professional self-care assistant. \
                 Give practical, actionable self-care advice for the following message. \
                 Respond with concrete suggestions and do not ask the user questions back.\n\n\
                 Message: \"{message}\""
            ),
        }
    }
}

/// Single-shot chat: no conversation memory between calls.
pub struct ChatService {
    provider: Arc<dyn LlmProvider>,
}

impl ChatService {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub async fn reply(&self, message: &str) -> Result<String> {
        if message.trim().is_empty() {
            return Err(SelfCareError::Validation(
                "Message cannot be empty".to_string(),
            ));
        }
        let topic = ChatTopic::classify(message);
        tracing::debug!(?topic, "Selected chat prompt template");
        self.provider.generate_text(&topic.prompt(message), "").await
    }
}
