//! Query-level errors

use thiserror::Error;

use crate::providers::ProviderError;
use crate::session::TransportError;

/// Failures that abort a query
///
/// Per-tool failures never show up here; they become error results in the
/// conversation instead.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Model provider error: {0}")]
    Provider(ProviderError),

    #[error("Query cancelled")]
    Cancelled,
}

impl From<ProviderError> for OrchestratorError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Cancelled => OrchestratorError::Cancelled,
            other => OrchestratorError::Provider(other),
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
