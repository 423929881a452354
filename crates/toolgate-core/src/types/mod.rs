//! Core types for tool-calling conversations
//!
//! This module contains the shared types used by the registry, the session
//! and the orchestrator.

mod message;
mod tool;
mod conversation;
mod cancellation;

pub use message::{ChatMessage, ContentPart, MessageRole, MessageContent};
pub use tool::{Tool, ToolCall, ToolChoice, ToolDescriptor, ToolResult};
pub use conversation::Conversation;
pub use cancellation::CancellationToken;
