//! The per-query dispatch loop

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use super::catalog::{translate, ToolFilter};
use super::error::{OrchestratorError, OrchestratorResult};
use crate::config::{AssistantSettings, ModelSettings};
use crate::logging::Logger;
use crate::providers::{ChatOptions, Completion, Provider, ProviderModelConfig};
use crate::registry::RegistryError;
use crate::session::Session;
use crate::types::{
    CancellationToken, ChatMessage, Conversation, Tool, ToolCall, ToolChoice, ToolResult,
};

/// Runs the tool-call round trip for one query at a time
///
/// Holds no per-query state: every call to `process_query` starts a fresh
/// conversation that is dropped when it returns.
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    model: ModelSettings,
    assistant: AssistantSettings,
    logger: Arc<dyn Logger>,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: ModelSettings,
        assistant: AssistantSettings,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            provider,
            model,
            assistant,
            logger,
        }
    }

    pub fn assistant(&self) -> &AssistantSettings {
        &self.assistant
    }

    /// System message for both model turns
    pub fn system_context(&self) -> String {
        let mut lines = vec![
            format!("User Country: {}", self.assistant.country),
            "You are an assistant with access to specialized tools.".to_string(),
        ];
        if self.assistant.internet {
            lines.push("Always search the internet to provide accurate, up-to-date answers.".to_string());
        } else {
            lines.push(
                "Internet access is disabled. Do not attempt an internet search; \
                 answer from your own knowledge or use the other tools."
                    .to_string(),
            );
        }
        lines.extend(self.assistant.guidance.iter().cloned());
        lines.join("\n")
    }

    /// The user turn: the query plus every matching hint
    pub fn user_turn(&self, query: &str) -> String {
        let hints: Vec<&str> = self
            .assistant
            .query_hints
            .iter()
            .filter(|h| h.matches(query))
            .map(|h| h.hint.as_str())
            .collect();

        if hints.is_empty() {
            query.to_string()
        } else {
            format!("{}\n\n{}", query, hints.join("\n"))
        }
    }

    fn model_config(&self) -> ProviderModelConfig {
        let config = ProviderModelConfig::new(&self.model.model);
        match &self.model.api_base {
            Some(base) => config.with_api_base(base),
            None => config,
        }
    }

    fn options(&self, tools: &[Tool], choice: ToolChoice, max_tokens: u32) -> ChatOptions {
        let options = ChatOptions::new()
            .with_tools(tools.to_vec())
            .with_tool_choice(choice)
            .with_max_tokens(max_tokens);
        match self.model.temperature {
            Some(t) => options.with_temperature(t),
            None => options,
        }
    }

    /// Answer one query
    ///
    /// Tool failures are folded into the conversation. Only transport loss,
    /// model-provider failures and cancellation abort the query.
    pub async fn process_query(
        &self,
        session: &Session,
        query: &str,
        cancel: &CancellationToken,
    ) -> OrchestratorResult<String> {
        // 1. Discover
        let catalog = session.list_tools().await?;
        let tools = translate(&catalog, &ToolFilter::for_assistant(&self.assistant));
        self.logger.info(&format!(
            "[Orchestrator] Offering {} of {} tools",
            tools.len(),
            catalog.len()
        ));
        let offered: HashSet<&str> = tools.iter().map(|t| t.name.as_str()).collect();

        let system = ChatMessage::system(self.system_context());
        let mut conversation = Conversation::new();
        conversation.push_user(self.user_turn(query));

        // 2. First completion
        let first = self
            .complete(
                &system,
                &conversation,
                self.options(&tools, ToolChoice::Auto, self.model.max_tokens),
                cancel,
            )
            .await?;

        if !first.has_tool_calls() {
            self.logger.info("[Orchestrator] No tool calls; returning first answer");
            return Ok(first.text.unwrap_or_default());
        }

        // 3. Dispatch
        conversation.push_assistant_tool_calls(first.text, &first.tool_calls);
        for call in &first.tool_calls {
            let result = self.dispatch(session, &offered, call, cancel).await?;
            conversation.push_tool_result(&result);
        }
        debug_assert!(conversation.pending_call_ids().is_empty());

        // 4. Second completion, tools disabled
        let last = self
            .complete(
                &system,
                &conversation,
                self.options(&tools, ToolChoice::None, self.model.final_max_tokens),
                cancel,
            )
            .await?;

        // 5. Return
        Ok(last.text.unwrap_or_default())
    }

    /// Connect `session` and answer `query`, giving up as soon as `interrupt`
    /// resolves
    ///
    /// Connecting is raced against the interrupt as well, so a hung startup can
    /// still be abandoned. The caller closes the session on every outcome.
    pub async fn connect_and_answer<F: Future>(
        &self,
        session: &mut Session,
        query: &str,
        cancel: &CancellationToken,
        interrupt: F,
    ) -> OrchestratorResult<String> {
        let run = async {
            session.connect().await?;
            self.process_query(&*session, query, cancel).await
        };

        tokio::select! {
            result = run => result,
            _ = interrupt => {
                self.logger.warn("[Orchestrator] Interrupted; abandoning query");
                cancel.cancel();
                Err(OrchestratorError::Cancelled)
            }
        }
    }

    async fn complete(
        &self,
        system: &ChatMessage,
        conversation: &Conversation,
        options: ChatOptions,
        cancel: &CancellationToken,
    ) -> OrchestratorResult<Completion> {
        if cancel.is_cancelled() {
            return Err(OrchestratorError::Cancelled);
        }

        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(system.clone());
        messages.extend_from_slice(conversation.messages());

        let completion = self
            .provider
            .complete(messages, self.model_config(), options, cancel.clone())
            .await?;
        self.logger.debug(&format!(
            "[Orchestrator] Model turn: {} tool calls",
            completion.tool_calls.len()
        ));
        Ok(completion)
    }

    /// Run one call; only a dead transport or cancellation escapes
    ///
    /// Names outside the offered catalog never reach the session.
    async fn dispatch(
        &self,
        session: &Session,
        offered: &HashSet<&str>,
        call: &ToolCall,
        cancel: &CancellationToken,
    ) -> OrchestratorResult<ToolResult> {
        if cancel.is_cancelled() {
            return Err(OrchestratorError::Cancelled);
        }
        if !offered.contains(call.name.as_str()) {
            let err = RegistryError::UnknownTool(call.name.clone());
            self.logger.warn(&format!("[Orchestrator] Rejected call {}: {}", call.id, err));
            return Ok(ToolResult::error(&call.id, err.to_string()));
        }
        self.logger.info(&format!(
            "[Orchestrator] Calling tool {} with arguments: {}",
            call.name, call.input
        ));

        let outcome = cancel
            .run_until_cancelled(session.call_tool(call))
            .await
            .ok_or(OrchestratorError::Cancelled)?;

        match outcome {
            Ok(result) => {
                if result.is_error {
                    self.logger.warn(&format!(
                        "[Orchestrator] Tool {} failed: {}",
                        call.name, result.content
                    ));
                }
                Ok(result)
            }
            Err(e) if e.is_fatal() => {
                self.logger
                    .error(&format!("[Orchestrator] Transport lost: {}", e));
                Err(e.into())
            }
            Err(e) => {
                self.logger.warn(&format!(
                    "[Orchestrator] Error calling tool {}: {}",
                    call.name, e
                ));
                Ok(ToolResult::error(&call.id, format!("Error: {}", e)))
            }
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.name())
            .field("model", &self.model.model)
            .field("internet", &self.assistant.internet)
            .finish()
    }
}
