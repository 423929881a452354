//! Per-query conversation transcript

use std::collections::HashSet;

use super::message::ChatMessage;
use super::tool::{ToolCall, ToolResult};

/// Append-only transcript of a single query
///
/// Lives for exactly one query; nothing is carried over between queries.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user turn
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::user(text));
    }

    /// Append the assistant turn that requested `calls`
    pub fn push_assistant_tool_calls(&mut self, text: Option<String>, calls: &[ToolCall]) {
        self.messages
            .push(ChatMessage::assistant_tool_calls(text, calls));
    }

    /// Append a tool-result turn
    pub fn push_tool_result(&mut self, result: &ToolResult) {
        self.messages.push(ChatMessage::tool_result(result));
    }

    /// Call ids that were requested but have no result yet, in request order
    pub fn pending_call_ids(&self) -> Vec<String> {
        let answered: HashSet<&str> = self
            .messages
            .iter()
            .flat_map(|m| m.tool_results().map(|(id, _, _)| id))
            .collect();

        self.messages
            .iter()
            .flat_map(|m| m.tool_uses().map(|(id, _, _)| id))
            .filter(|id| !answered.contains(id))
            .map(str::to_string)
            .collect()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;
    use serde_json::json;

    #[test]
    fn test_pending_call_ids() {
        let mut conversation = Conversation::new();
        conversation.push_user("weather and time?");
        conversation.push_assistant_tool_calls(
            None,
            &[
                ToolCall::new("c1", "get_weather", json!({"city": "Pune"})),
                ToolCall::new("c2", "get_datetime", json!({})),
            ],
        );
        assert_eq!(conversation.pending_call_ids(), vec!["c1", "c2"]);

        conversation.push_tool_result(&ToolResult::success("c1", "sunny"));
        assert_eq!(conversation.pending_call_ids(), vec!["c2"]);

        conversation.push_tool_result(&ToolResult::error("c2", "boom"));
        assert!(conversation.pending_call_ids().is_empty());

        let roles: Vec<_> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::Tool,
                MessageRole::Tool
            ]
        );
    }
}
