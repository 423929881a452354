//! MCP (Model Context Protocol) server and client
//!
//! Both ends use the official rmcp SDK. JSON-RPC framing and request id
//! correlation are handled by the SDK.
//!
//! # Example
//!
//! ```rust,ignore
//! use toolgate_core::mcp::{McpClient, RegistryServer};
//!
//! // Registry side: answer tools/list and tools/call on stdin/stdout
//! RegistryServer::new(registry, logger.clone()).serve_stdio().await?;
//!
//! // Client side: spawn the registry and talk to it
//! let client = McpClient::connect_child_process("toolgate", &["serve".into()], &[], logger).await?;
//! let tools = client.list_tools().await?;
//! let result = client.call_tool("echo", json!({"text": "hello"})).await?;
//! client.close().await?;
//! ```

mod client;
mod server;

pub use client::{result_text, McpClient, McpError, McpResult};
pub use server::RegistryServer;

// Re-export rmcp types that consumers might need
pub use rmcp::model::{CallToolResult as McpToolResult, Tool as McpTool};
