//! Transports and the connectors that open them

use std::sync::Arc;

use async_trait::async_trait;

use super::error::TransportResult;
use crate::logging::Logger;
use crate::mcp::{result_text, McpClient};
use crate::registry::ToolRegistry;
use crate::types::{ToolCall, ToolDescriptor, ToolResult};

/// An open channel to a tool registry
#[async_trait]
pub trait ToolTransport: Send + Sync {
    /// Current catalog, in registry order
    async fn list_tools(&self) -> TransportResult<Vec<ToolDescriptor>>;

    /// Run one call; tool failures come back as error results, not `Err`
    async fn call_tool(&self, call: &ToolCall) -> TransportResult<ToolResult>;

    /// Release the channel and anything it owns
    async fn close(self: Box<Self>) -> TransportResult<()>;
}

/// Opens a `ToolTransport`
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, logger: Arc<dyn Logger>) -> TransportResult<Box<dyn ToolTransport>>;

    /// Human-readable target, for logs
    fn describe(&self) -> String;
}

#[async_trait]
impl Connector for Box<dyn Connector> {
    async fn connect(&self, logger: Arc<dyn Logger>) -> TransportResult<Box<dyn ToolTransport>> {
        (**self).connect(logger).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Calls straight into a registry in this process
pub struct LocalTransport {
    registry: Arc<ToolRegistry>,
}

impl LocalTransport {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ToolTransport for LocalTransport {
    async fn list_tools(&self) -> TransportResult<Vec<ToolDescriptor>> {
        Ok(self.registry.list())
    }

    async fn call_tool(&self, call: &ToolCall) -> TransportResult<ToolResult> {
        let output = self.registry.invoke(&call.name, call.input.clone()).await;
        Ok(ToolResult {
            call_id: call.id.clone(),
            content: output.content,
            is_error: output.is_error,
        })
    }

    async fn close(self: Box<Self>) -> TransportResult<()> {
        Ok(())
    }
}

/// MCP client wrapped as a transport
pub struct McpTransport {
    client: McpClient,
}

impl McpTransport {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolTransport for McpTransport {
    async fn list_tools(&self) -> TransportResult<Vec<ToolDescriptor>> {
        Ok(self.client.list_descriptors().await?)
    }

    async fn call_tool(&self, call: &ToolCall) -> TransportResult<ToolResult> {
        let result = self.client.call_tool(&call.name, call.input.clone()).await?;
        Ok(ToolResult {
            call_id: call.id.clone(),
            content: result_text(&result),
            is_error: result.is_error.unwrap_or(false),
        })
    }

    async fn close(self: Box<Self>) -> TransportResult<()> {
        Ok(self.client.close().await?)
    }
}

/// In-process registry, no wire
#[derive(Clone)]
pub struct LocalConnector {
    registry: Arc<ToolRegistry>,
}

impl LocalConnector {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Connector for LocalConnector {
    async fn connect(&self, _logger: Arc<dyn Logger>) -> TransportResult<Box<dyn ToolTransport>> {
        Ok(Box::new(LocalTransport::new(self.registry.clone())))
    }

    fn describe(&self) -> String {
        format!("in-process registry ({} tools)", self.registry.len())
    }
}

/// Spawns the registry as a child process speaking MCP on stdio
#[derive(Clone)]
pub struct ChildProcessConnector {
    command: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl ChildProcessConnector {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            envs: Vec::new(),
        }
    }

    /// Extra environment for the child, on top of the inherited one
    pub fn with_env(mut self, envs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.envs.extend(envs);
        self
    }

    pub fn env_names(&self) -> Vec<&str> {
        self.envs.iter().map(|(k, _)| k.as_str()).collect()
    }
}

// Values may be credentials
impl std::fmt::Debug for ChildProcessConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildProcessConnector")
            .field("command", &self.command)
            .field("args", &self.args)
            .field("envs", &self.env_names())
            .finish()
    }
}

#[async_trait]
impl Connector for ChildProcessConnector {
    async fn connect(&self, logger: Arc<dyn Logger>) -> TransportResult<Box<dyn ToolTransport>> {
        let client = McpClient::connect_child_process(&self.command, &self.args, &self.envs, logger).await?;
        Ok(Box::new(McpTransport::new(client)))
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

/// Attaches to a Streamable HTTP MCP endpoint
#[derive(Debug, Clone)]
pub struct HttpConnector {
    url: String,
}

impl HttpConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(&self, logger: Arc<dyn Logger>) -> TransportResult<Box<dyn ToolTransport>> {
        let client = McpClient::connect_http(&self.url, logger).await?;
        Ok(Box::new(McpTransport::new(client)))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
