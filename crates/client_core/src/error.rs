use reqwest::StatusCode;
use shared::error::EnvelopeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP error! status: {}", .status.as_u16())]
    HttpStatus { status: StatusCode },
    #[error("{0}")]
    Application(String),
    #[error("unexpected response payload: {0}")]
    Decode(String),
    #[error("failed to encode request body: {0}")]
    Encode(String),
    #[error("invalid endpoint url: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("token storage failed: {0:#}")]
    Storage(anyhow::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::HttpStatus { status } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }
}

impl From<EnvelopeError> for ClientError {
    fn from(value: EnvelopeError) -> Self {
        match value {
            EnvelopeError::Rejected(message) => Self::Application(message),
            EnvelopeError::Decode(message) => Self::Decode(message),
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
