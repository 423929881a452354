//! GenaiProvider: one provider type for every genai-backed API
//!
//! Handles genai's native providers (Groq, OpenAI, Anthropic, Gemini, …) and
//! OpenAI-compatible endpoints such as OpenRouter.

use async_trait::async_trait;
use std::sync::Arc;

use genai::chat::ChatRequest;

use crate::logging::Logger;
use crate::secrets::SecretStore;
use crate::types::{CancellationToken, ChatMessage};

use super::error::{ProviderError, ProviderResult};
use super::genai_adapter::{
    self, create_client, from_genai_tool_call, requires_api_key, to_genai_messages,
    to_genai_options, to_genai_tools, ProviderConfig,
};
use super::traits::{ChatOptions, Completion, Provider, ProviderModelConfig};

/// Unified provider using genai for all supported LLM APIs
pub struct GenaiProvider {
    /// Provider identifier
    provider_id: String,
    secrets: Arc<dyn SecretStore>,
    logger: Arc<dyn Logger>,
}

impl GenaiProvider {
    pub fn new(
        provider_id: impl Into<String>,
        secrets: Arc<dyn SecretStore>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            provider_id: provider_id.into().to_lowercase(),
            secrets,
            logger,
        }
    }

    /// Check if this provider can handle the given provider ID
    pub fn supports(provider_id: &str) -> bool {
        super::supported_providers()
            .iter()
            .any(|p| *p != "mock" && p.eq_ignore_ascii_case(provider_id))
    }

    /// Extract model name from a model string (e.g., "groq/llama-3.1-8b" -> "llama-3.1-8b")
    ///
    /// Only the provider's own prefix is stripped: OpenRouter model ids like
    /// `meta-llama/llama-3.3-70b` keep their slash.
    pub fn extract_model_name<'a>(&self, model: &'a str) -> &'a str {
        match model.split_once('/') {
            Some((prefix, rest)) if prefix.eq_ignore_ascii_case(&self.provider_id) => rest,
            _ => model,
        }
    }
}

#[async_trait]
impl Provider for GenaiProvider {
    fn name(&self) -> &str {
        &self.provider_id
    }

    fn default_api_base(&self) -> &str {
        genai_adapter::default_api_base(&self.provider_id)
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        model_config: ProviderModelConfig,
        options: ChatOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<Completion> {
        if cancel_token.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        if requires_api_key(&self.provider_id)
            && model_config.api_key.is_none()
            && !self.secrets.has(&self.provider_id)
        {
            return Err(ProviderError::missing_api_key(&self.provider_id));
        }

        let config = ProviderConfig {
            provider: self.provider_id.clone(),
            api_key: model_config.api_key.clone(),
            api_base: model_config.api_base.clone(),
        };
        let client = create_client(&config, Arc::clone(&self.secrets));

        let mut chat_req = ChatRequest::new(to_genai_messages(messages)?);

        // ToolChoice::None is realised by not offering any tools
        let offered = options.offered_tools();
        if !offered.is_empty() {
            chat_req = chat_req.with_tools(to_genai_tools(offered));
        }

        let genai_options = to_genai_options(&options);
        let model_name = self.extract_model_name(&model_config.model);

        self.logger.info(&format!(
            "[GenaiProvider] complete: provider={}, model={}, tools={}",
            self.provider_id,
            model_name,
            offered.len()
        ));

        let response = cancel_token
            .run_until_cancelled(client.exec_chat(model_name, chat_req, Some(&genai_options)))
            .await
            .ok_or(ProviderError::Cancelled)?
            .map_err(|e| {
                self.logger
                    .error(&format!("[GenaiProvider] Request failed: {}", e));
                ProviderError::request(&self.provider_id, e.to_string())
            })?;

        let text = response
            .first_text()
            .map(str::to_string)
            .filter(|t| !t.trim().is_empty());
        let tool_calls: Vec<_> = response
            .into_tool_calls()
            .iter()
            .map(from_genai_tool_call)
            .collect();

        if text.is_none() && tool_calls.is_empty() {
            return Err(ProviderError::invalid_response(
                &self.provider_id,
                "response had neither text nor tool calls",
            ));
        }

        self.logger.debug(&format!(
            "[GenaiProvider] Completion: {} chars, {} tool calls",
            text.as_deref().map_or(0, str::len),
            tool_calls.len()
        ));
        Ok(Completion { text, tool_calls })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::secrets::MemorySecretStore;

    fn provider(id: &str) -> GenaiProvider {
        GenaiProvider::new(id, Arc::new(MemorySecretStore::new()), Arc::new(NoOpLogger))
    }

    #[test]
    fn test_extract_model_name() {
        let groq = provider("groq");
        assert_eq!(groq.extract_model_name("groq/llama-3.1-8b"), "llama-3.1-8b");
        assert_eq!(groq.extract_model_name("llama-3.3-70b-versatile"), "llama-3.3-70b-versatile");

        let openrouter = provider("openrouter");
        assert_eq!(
            openrouter.extract_model_name("meta-llama/llama-3.3-70b-instruct"),
            "meta-llama/llama-3.3-70b-instruct"
        );
    }

    #[test]
    fn test_supports() {
        assert!(GenaiProvider::supports("groq"));
        assert!(GenaiProvider::supports("OpenRouter"));
        assert!(!GenaiProvider::supports("mock"));
        assert!(!GenaiProvider::supports("unknown_provider"));
    }

    #[test]
    fn test_default_api_base() {
        assert_eq!(provider("groq").default_api_base(), "https://api.groq.com/openai/v1/");
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let err = provider("groq")
            .complete(
                vec![ChatMessage::user("hi")],
                ProviderModelConfig::new("llama-3.3-70b-versatile"),
                ChatOptions::new(),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_before_request() {
        let token = CancellationToken::new();
        token.cancel();
        let err = provider("groq")
            .complete(
                vec![ChatMessage::user("hi")],
                ProviderModelConfig::new("m").with_api_key("k"),
                ChatOptions::new(),
                token,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Cancelled));
    }
}
