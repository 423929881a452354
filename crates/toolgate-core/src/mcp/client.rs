//! MCP client using the official rmcp SDK
//!
//! Connects to a registry over a spawned child process (stdio), a
//! Streamable HTTP endpoint, or any byte stream.

use std::sync::Arc;

use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation,
        RawContent, Tool,
    },
    service::{RunningService, ServiceError},
    transport::{ConfigureCommandExt, IntoTransport, TokioChildProcess},
    RoleClient, ServiceExt,
};
use serde_json::Value;
use thiserror::Error;
use tokio::process::Command;

use crate::logging::Logger;
use crate::types::ToolDescriptor;

/// MCP client errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("Connection closed: {0}")]
    Disconnected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl McpError {
    /// Classify an rmcp request failure; a dead transport is kept apart from
    /// errors the peer reported for this one request
    fn from_service(err: ServiceError, per_call: fn(String) -> McpError) -> Self {
        match err {
            ServiceError::TransportClosed
            | ServiceError::TransportSend(_)
            | ServiceError::Cancelled { .. } => McpError::Disconnected(err.to_string()),
            other => per_call(other.to_string()),
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "toolgate".to_string(),
            title: Some("Toolgate".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// MCP client for one registry connection
pub struct McpClient {
    /// The underlying rmcp running service
    client: RunningService<RoleClient, ClientInfo>,
    logger: Arc<dyn Logger>,
}

impl McpClient {
    /// Spawn `command args…` and speak MCP over its stdin/stdout
    ///
    /// The child's stderr is inherited so its logs stay visible.
    pub async fn connect_child_process(
        command: &str,
        args: &[String],
        envs: &[(String, String)],
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        logger.info(&format!(
            "[McpClient] Spawning registry: {} {}",
            command,
            args.join(" ")
        ));

        let transport = TokioChildProcess::new(Command::new(command).configure(|cmd| {
            cmd.args(args);
            cmd.envs(envs.iter().map(|(k, v)| (k, v)));
        }))
        .map_err(|e| McpError::ConnectionFailed(format!("failed to spawn '{}': {}", command, e)))?;

        Self::connect_with(transport, logger).await
    }

    /// Connect to an MCP server over HTTP (Streamable HTTP transport)
    pub async fn connect_http(url: &str, logger: Arc<dyn Logger>) -> McpResult<Self> {
        use rmcp::transport::StreamableHttpClientTransport;

        logger.info(&format!("[McpClient] Connecting to HTTP: {}", url));
        let transport = StreamableHttpClientTransport::from_uri(url.to_string());
        Self::connect_with(transport, logger).await
    }

    /// Run the MCP handshake over any rmcp transport
    pub async fn connect_with<T, E, A>(transport: T, logger: Arc<dyn Logger>) -> McpResult<Self>
    where
        T: IntoTransport<RoleClient, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let client = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        if let Some(info) = client.peer_info() {
            logger.info(&format!(
                "[McpClient] Connected to {} {}",
                info.server_info.name, info.server_info.version
            ));
        } else {
            logger.info("[McpClient] Connected and initialized successfully");
        }

        Ok(Self { client, logger })
    }

    /// List all available tools
    pub async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        let result = self
            .client
            .list_tools(Default::default())
            .await
            .map_err(|e| McpError::from_service(e, McpError::Protocol))?;

        self.logger.info(&format!(
            "[McpClient] Listed {} tools",
            result.tools.len()
        ));

        Ok(result.tools)
    }

    /// List tools as registry descriptors, in server order
    pub async fn list_descriptors(&self) -> McpResult<Vec<ToolDescriptor>> {
        Ok(self.list_tools().await?.iter().map(to_descriptor).collect())
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<CallToolResult> {
        self.logger.info(&format!("[McpClient] Calling tool: {}", name));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: arguments.as_object().cloned(),
            task: None,
        };

        self.client
            .call_tool(params)
            .await
            .map_err(|e| McpError::from_service(e, McpError::ToolCallFailed))
    }

    /// Get server info
    pub fn server_info(&self) -> Option<&Implementation> {
        self.client.peer_info().map(|info| &info.server_info)
    }

    /// Close the connection; a spawned child process is reaped
    pub async fn close(self) -> McpResult<()> {
        self.logger.info("[McpClient] Closing connection");
        self.client
            .cancel()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        Ok(())
    }
}

/// Convert an rmcp tool listing into a registry descriptor
pub(crate) fn to_descriptor(tool: &Tool) -> ToolDescriptor {
    ToolDescriptor::new(
        tool.name.to_string(),
        tool.description.as_deref().unwrap_or_default(),
    )
    .with_schema(Value::Object((*tool.input_schema).clone()))
}

/// Text payload of a call result; text parts joined by newlines, the
/// structured content used when there is no text at all
pub fn result_text(result: &CallToolResult) -> String {
    let parts: Vec<&str> = result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        if let Some(structured) = &result.structured_content {
            return structured.to_string();
        }
    }
    parts.join("\n")
}
