//! Registry and handler errors

use std::time::Duration;

use thiserror::Error;

/// Registration and lookup failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool already registered: {0}")]
    DuplicateName(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

/// Failure inside a tool's own logic
///
/// Always recovered by the registry into an error result; the message is what
/// the model sees.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Missing required parameter '{0}'")]
    MissingParameter(String),

    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Missing credential '{0}'; set it in the environment or .env file")]
    MissingCredential(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Tool timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    /// Plain failure carrying only a message
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }

    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        HandlerError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        HandlerError::Upstream(message.into())
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;
