use thiserror::Error;

/// Message used when the backend rejects a request without saying why.
pub const FALLBACK_ERROR_MESSAGE: &str = "API Request failed";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("{0}")]
    Rejected(String),
    #[error("unexpected response payload: {0}")]
    Decode(String),
}

impl EnvelopeError {
    pub fn rejected(error: Option<String>) -> Self {
        match error {
            Some(message) if !message.is_empty() => Self::Rejected(message),
            _ => Self::Rejected(FALLBACK_ERROR_MESSAGE.to_string()),
        }
    }
}
