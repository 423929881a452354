//! Provider error types

use thiserror::Error;

/// Errors that can occur during provider operations
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Missing API key
    #[error("API key is required for {provider}; set it in the environment or .env file")]
    MissingApiKey { provider: String },

    /// The completion request failed
    #[error("{provider} request failed: {message}")]
    Request { provider: String, message: String },

    /// Rate limited
    #[error("{provider} rate limited: {message}")]
    RateLimited { provider: String, message: String },

    /// Invalid response from provider
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    /// JSON conversion error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request was cancelled
    #[error("Request cancelled")]
    Cancelled,

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// Classify a failed request; HTTP 429 and rate-limit messages become
    /// `RateLimited`
    pub fn request(provider: impl Into<String>, message: impl Into<String>) -> Self {
        let provider = provider.into();
        let message = message.into();
        let lowered = message.to_lowercase();
        if lowered.contains("429") || lowered.contains("rate limit") {
            Self::RateLimited { provider, message }
        } else {
            Self::Request { provider, message }
        }
    }

    /// Create a missing API key error
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
