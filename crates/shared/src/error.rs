use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a generation call produced no usable value.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", content = "detail", rename_all = "snake_case")]
pub enum GenerationFailure {
    #[error("no generation credential configured")]
    NoCredential,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl GenerationFailure {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Short label for structured log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoCredential => "no_credential",
            Self::Transport(_) => "transport",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }
}
