//! Registry exposed as an MCP server

use std::sync::Arc;

use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    ErrorData, RoleServer, ServerHandler, ServiceExt,
};
use serde_json::Value;

use super::client::{McpError, McpResult};
use crate::logging::Logger;
use crate::registry::ToolRegistry;
use crate::types::ToolDescriptor;

/// Serves a `ToolRegistry` over MCP
///
/// Tool failures are answered with `isError: true` results, never with a
/// JSON-RPC error, so the peer always gets a result for every call.
#[derive(Clone)]
pub struct RegistryServer {
    registry: Arc<ToolRegistry>,
    logger: Arc<dyn Logger>,
}

impl RegistryServer {
    pub fn new(registry: Arc<ToolRegistry>, logger: Arc<dyn Logger>) -> Self {
        Self { registry, logger }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Serve on stdin/stdout until the peer disconnects
    pub async fn serve_stdio(self) -> McpResult<()> {
        let logger = self.logger.clone();
        logger.info(&format!(
            "[RegistryServer] Serving {} tools on stdio",
            self.registry.len()
        ));

        let service = self
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        let reason = service
            .waiting()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        logger.info(&format!("[RegistryServer] Stopped: {:?}", reason));
        Ok(())
    }
}

fn to_mcp_tool(descriptor: ToolDescriptor) -> Tool {
    let schema = match descriptor.input_schema {
        Value::Object(map) => map,
        _ => Default::default(),
    };
    Tool::new(descriptor.name, descriptor.description, Arc::new(schema))
}

impl ServerHandler for RegistryServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "toolgate".to_string(),
                title: Some("Toolgate tool registry".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                website_url: None,
                icons: None,
            },
            instructions: Some(format!(
                "Tool registry with {} tools. Call tools/list for the catalog.",
                self.registry.len()
            )),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        self.logger.debug("[RegistryServer] tools/list");
        let tools = self.registry.list().into_iter().map(to_mcp_tool).collect();
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let arguments = request.arguments.map(Value::Object).unwrap_or(Value::Null);
        let output = self.registry.invoke(&request.name, arguments).await;

        let content = vec![Content::text(output.content)];
        if output.is_error {
            Ok(CallToolResult::error(content))
        } else {
            Ok(CallToolResult::success(content))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_mcp_tool() {
        let descriptor = ToolDescriptor::new("echo", "Echo text").with_schema(json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        }));
        let tool = to_mcp_tool(descriptor);
        assert_eq!(tool.name, "echo");
        assert_eq!(tool.description.as_deref(), Some("Echo text"));
        assert_eq!(tool.input_schema["required"], json!(["text"]));
    }

    #[test]
    fn test_non_object_schema_becomes_empty() {
        let tool = to_mcp_tool(ToolDescriptor::new("x", "").with_schema(json!(true)));
        assert!(tool.input_schema.is_empty());
    }
}
