//! Transport error types

use std::time::Duration;

use thiserror::Error;

use crate::mcp::McpError;

/// Session/transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Session is not connected")]
    NotConnected,

    #[error("Session is already connected")]
    AlreadyConnected,

    #[error("Connection lost: {0}")]
    Disconnected(String),

    #[error("Tool call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// True when the session can no longer carry requests
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TransportError::Disconnected(_) | TransportError::NotConnected
        )
    }
}

impl From<McpError> for TransportError {
    fn from(err: McpError) -> Self {
        match err {
            McpError::ConnectionFailed(msg) | McpError::InitializationFailed(msg) => {
                TransportError::Connection(msg)
            }
            McpError::Disconnected(msg) => TransportError::Disconnected(msg),
            McpError::ToolCallFailed(msg) | McpError::Protocol(msg) => TransportError::Protocol(msg),
            McpError::Io(e) => TransportError::Io(e),
        }
    }
}

pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(TransportError::NotConnected.is_fatal());
        assert!(TransportError::Disconnected("eof".into()).is_fatal());
        assert!(!TransportError::Timeout(Duration::from_secs(1)).is_fatal());
        assert!(!TransportError::Protocol("bad params".into()).is_fatal());
    }

    #[test]
    fn test_from_mcp_error() {
        let err: TransportError = McpError::InitializationFailed("handshake".into()).into();
        assert!(matches!(err, TransportError::Connection(_)));

        let err: TransportError = McpError::Disconnected("closed".into()).into();
        assert!(err.is_fatal());

        let err: TransportError = McpError::ToolCallFailed("invalid params".into()).into();
        assert!(matches!(err, TransportError::Protocol(_)));
    }
}
