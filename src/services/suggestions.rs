use std::sync::Arc;

use crate::error::Result;
use crate::interfaces::providers::LlmProvider;

pub const SUGGESTION_PROMPT: &str = "Suggest a random self-care activity with a brief explanation why it's beneficial. Keep it concise and friendly.";

/// One fresh model call per suggestion; nothing is cached.
pub struct SuggestionService {
    provider: Arc<dyn LlmProvider>,
}

impl SuggestionService {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub async fn suggest(&self) -> Result<String> {
        self.provider.generate_text(SUGGESTION_PROMPT, "").await
    }
}
