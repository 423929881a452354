//! Mock provider for testing
//!
//! Deterministic, network-free completions. Every request is recorded so
//! tests can assert on exactly what the model was sent.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatOptions, Completion, Provider, ProviderModelConfig};
use crate::logging::Logger;
use crate::types::{CancellationToken, ChatMessage, ContentPart, MessageContent, MessageRole, ToolCall};

/// One scripted model turn
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Answer with text
    Text(String),
    /// Request these tool calls
    ToolCalls(Vec<ToolCall>),
    /// Fail the request
    Error(String),
    /// Answer with every tool result seen so far, as `id -> content`
    SummariseToolResults,
}

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the last user message
    #[default]
    Echo,
    /// Return a fixed response
    Fixed(String),
    /// Fail every request
    Error(String),
    /// Play replies in order; running out is an error
    Scripted(Vec<MockReply>),
}

/// Configuration for the mock provider
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Response mode
    pub mode: MockMode,
    /// Simulated latency per request (zero = none)
    pub delay: Duration,
}

/// A request the mock received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub options: ChatOptions,
}

impl RecordedRequest {
    /// Names of the tools offered on this request
    pub fn tool_names(&self) -> Vec<String> {
        self.options
            .offered_tools()
            .iter()
            .map(|t| t.name.clone())
            .collect()
    }
}

/// Mock LLM provider for testing
pub struct MockProvider {
    config: MockConfig,
    script: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    /// Create a new mock provider with default config
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self::with_config(MockConfig::default(), logger)
    }

    /// Create with specific config
    pub fn with_config(config: MockConfig, logger: Arc<dyn Logger>) -> Self {
        let script = match &config.mode {
            MockMode::Scripted(replies) => replies.iter().cloned().collect(),
            _ => VecDeque::new(),
        };
        Self {
            config,
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// Create an echo provider (echoes back user message)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::new(logger)
    }

    /// Create a fixed response provider
    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode: MockMode::Fixed(response.into()),
                ..Default::default()
            },
            logger,
        )
    }

    /// Create an error-producing provider
    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode: MockMode::Error(message.into()),
                ..Default::default()
            },
            logger,
        )
    }

    /// Create a provider that plays `replies` in order
    pub fn scripted(replies: Vec<MockReply>, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode: MockMode::Scripted(replies),
                ..Default::default()
            },
            logger,
        )
    }

    /// Set simulated latency
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.config.delay = delay;
        self
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Extract last user message content
    fn get_last_user_message(&self, messages: &[ChatMessage]) -> String {
        for msg in messages.iter().rev() {
            if msg.role == MessageRole::User {
                match &msg.content {
                    MessageContent::Text(text) => {
                        if !text.is_empty() {
                            return text.clone();
                        }
                    }
                    MessageContent::Parts(parts) => {
                        let mut text = String::new();
                        for part in parts {
                            if let ContentPart::Text { text: t } = part {
                                text.push_str(t);
                            }
                        }
                        if !text.is_empty() {
                            return text;
                        }
                    }
                }
            }
        }
        "Hello from MockProvider!".to_string()
    }

    fn summarise_tool_results(messages: &[ChatMessage]) -> String {
        let parts: Vec<String> = messages
            .iter()
            .flat_map(|m| m.tool_results())
            .map(|(id, content, is_error)| {
                if is_error {
                    format!("{} -> error: {}", id, content)
                } else {
                    format!("{} -> {}", id, content)
                }
            })
            .collect();

        if parts.is_empty() {
            "No tool results.".to_string()
        } else {
            format!("Tool results: {}", parts.join("; "))
        }
    }

    fn next_reply(&self, messages: &[ChatMessage]) -> ProviderResult<Completion> {
        match &self.config.mode {
            MockMode::Echo => {
                let user_msg = self.get_last_user_message(messages);
                self.logger
                    .debug(&format!("MockProvider: Echo mode, echoing: {}", user_msg));
                Ok(Completion::text(format!("Echo: {}", user_msg)))
            }
            MockMode::Fixed(response) => Ok(Completion::text(response.clone())),
            MockMode::Error(message) => Err(ProviderError::Other(format!("Mock error: {}", message))),
            MockMode::Scripted(_) => {
                let reply = self.script.lock().pop_front().ok_or_else(|| {
                    ProviderError::Other("Mock script exhausted".to_string())
                })?;
                self.logger
                    .debug(&format!("MockProvider: Scripted reply {:?}", reply));
                match reply {
                    MockReply::Text(text) => Ok(Completion::text(text)),
                    MockReply::ToolCalls(calls) => Ok(Completion::tool_calls(calls)),
                    MockReply::Error(message) => {
                        Err(ProviderError::Other(format!("Mock error: {}", message)))
                    }
                    MockReply::SummariseToolResults => {
                        Ok(Completion::text(Self::summarise_tool_results(messages)))
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_api_base(&self) -> &str {
        "http://localhost:0/mock"
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: ChatOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<Completion> {
        self.logger.debug("MockProvider: complete called");
        self.requests.lock().push(RecordedRequest {
            messages: messages.clone(),
            model: model.model,
            options,
        });

        if cancel_token.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        if !self.config.delay.is_zero() {
            cancel_token
                .run_until_cancelled(tokio::time::sleep(self.config.delay))
                .await
                .ok_or(ProviderError::Cancelled)?;
        }

        self.next_reply(&messages)
    }
}
