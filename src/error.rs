use thiserror::Error;

#[derive(Debug, Error)]
pub enum SelfCareError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl SelfCareError {
    /// Client-input errors are the only ones whose message may be shown to callers.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SelfCareError::Validation(_))
    }
}

pub use crate::Result;
