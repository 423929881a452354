//! LLM provider implementations
//!
//! ## Architecture
//!
//! Real providers go through the `genai` crate, which handles the
//! provider-specific protocols and tool calling. OpenAI-compatible services
//! without a native genai adapter (OpenRouter) are routed through genai's
//! `ServiceTargetResolver`.
//!
//! Auth flows through our `SecretStore`, not genai's env var lookup.
//!
//! The `MockProvider` is kept for testing purposes.

mod error;
mod genai_adapter;
mod genai_provider;
mod mock;
mod traits;

// Core traits and types
pub use error::{ProviderError, ProviderResult};
pub use traits::{ChatOptions, Completion, Provider, ProviderModelConfig};

// The main provider - handles all LLM providers via genai
pub use genai_adapter::{adapter_kind_for, requires_api_key, ProviderConfig};
pub use genai_provider::GenaiProvider;

// Mock provider for testing
pub use mock::{MockConfig, MockMode, MockProvider, MockReply, RecordedRequest};

use crate::logging::Logger;
use crate::secrets::SecretStore;
use std::sync::Arc;

/// Create a provider for the given provider ID
///
/// `mock` yields an echoing `MockProvider`; everything else goes through
/// `GenaiProvider`. Unknown ids are treated as OpenAI-compatible endpoints,
/// which needs `api_base` set in the model config.
pub fn create_provider(
    provider_id: &str,
    secrets: Arc<dyn SecretStore>,
    logger: Arc<dyn Logger>,
) -> Box<dyn Provider> {
    match provider_id.to_lowercase().as_str() {
        "mock" => Box::new(MockProvider::echo(logger)),
        _ => {
            if !GenaiProvider::supports(provider_id) {
                logger.warn(&format!(
                    "[providers] Unknown provider '{}'; assuming an OpenAI-compatible API",
                    provider_id
                ));
            }
            Box::new(GenaiProvider::new(provider_id, secrets, logger))
        }
    }
}

/// List all supported provider IDs
pub fn supported_providers() -> Vec<&'static str> {
    vec![
        // Native genai providers
        "groq",
        "openai",
        "anthropic",
        "gemini",
        "ollama",
        "xai",
        "deepseek",
        "cohere",
        "fireworks",
        "together",
        // OpenAI-compatible providers via resolver
        "openrouter",
        // Testing
        "mock",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::secrets::MemorySecretStore;

    #[test]
    fn test_create_provider() {
        let secrets: Arc<dyn SecretStore> = Arc::new(MemorySecretStore::new());
        let mock = create_provider("Mock", secrets.clone(), Arc::new(NoOpLogger));
        assert_eq!(mock.name(), "mock");

        let groq = create_provider("groq", secrets, Arc::new(NoOpLogger));
        assert_eq!(groq.name(), "groq");
    }
}
