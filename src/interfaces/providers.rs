use async_trait::async_trait;

use crate::error::Result;

/// A text-generation backend. The proxies only see this trait, so tests can
/// substitute a recording or failing model.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate_text(&self, prompt: &str, system_prompt: &str) -> Result<String>;
}
