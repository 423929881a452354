//! MCP server and client talking over an in-memory pipe

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::ServiceExt;
use serde_json::{json, Value};

use toolgate_core::config::{AssistantSettings, ModelSettings};
use toolgate_core::logging::{Logger, NoOpLogger};
use toolgate_core::mcp::{result_text, McpClient, RegistryServer};
use toolgate_core::providers::{MockProvider, MockReply};
use toolgate_core::registry::{handler_fn, HandlerError, ToolContext, ToolRegistry};
use toolgate_core::session::{Connector, McpTransport, Session, ToolTransport, TransportResult};
use toolgate_core::tools::EchoTool;
use toolgate_core::types::{CancellationToken, ToolCall};
use toolgate_core::Orchestrator;

fn logger() -> Arc<dyn Logger> {
    Arc::new(NoOpLogger)
}

fn registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new(ToolContext::default(), logger());
    registry.register_builtin(EchoTool).unwrap();
    registry
        .register(
            toolgate_core::ToolDescriptor::new("fail_always", "Always fails"),
            handler_fn(|_, _| async move { Err::<Value, _>(HandlerError::failed("boom")) }),
        )
        .unwrap();
    Arc::new(registry)
}

/// Start a server task on one end of a duplex pipe and connect a client to the other
async fn connect() -> McpClient {
    let (server_io, client_io) = tokio::io::duplex(4096);
    let server = RegistryServer::new(registry(), logger());
    tokio::spawn(async move {
        if let Ok(running) = server.serve(server_io).await {
            let _ = running.waiting().await;
        }
    });
    McpClient::connect_with(client_io, logger()).await.unwrap()
}

#[tokio::test]
async fn handshake_and_listing() {
    let client = connect().await;

    let info = client.server_info().unwrap();
    assert_eq!(info.name, "toolgate");

    let tools = client.list_descriptors().await.unwrap();
    let names: Vec<_> = tools.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["echo", "fail_always"]);
    assert_eq!(tools[0].input_schema["type"], "object");
    assert_eq!(tools[0].input_schema["required"], json!(["text"]));

    client.close().await.unwrap();
}

#[tokio::test]
async fn calls_cross_the_wire() {
    let client = connect().await;

    let ok = client.call_tool("echo", json!({"text": "hello"})).await.unwrap();
    assert!(!ok.is_error.unwrap_or(false));
    assert_eq!(result_text(&ok), r#"{"echoed":"hello"}"#);

    let failed = client.call_tool("fail_always", json!({})).await.unwrap();
    assert_eq!(failed.is_error, Some(true));
    assert_eq!(result_text(&failed), "boom");

    let unknown = client.call_tool("nope", json!({})).await.unwrap();
    assert_eq!(unknown.is_error, Some(true));
    assert_eq!(result_text(&unknown), "Unknown tool: nope");

    client.close().await.unwrap();
}

struct DuplexConnector;

#[async_trait]
impl Connector for DuplexConnector {
    async fn connect(&self, _logger: Arc<dyn Logger>) -> TransportResult<Box<dyn ToolTransport>> {
        Ok(Box::new(McpTransport::new(connect().await)))
    }

    fn describe(&self) -> String {
        "duplex pipe".to_string()
    }
}

#[tokio::test]
async fn query_over_mcp_session() {
    let mut session = Session::new(DuplexConnector, logger());
    session.connect().await.unwrap();

    let provider = Arc::new(MockProvider::scripted(
        vec![
            MockReply::ToolCalls(vec![
                ToolCall::new("c1", "echo", json!({"text": "hello"})),
                ToolCall::new("c2", "fail_always", json!({})),
            ]),
            MockReply::SummariseToolResults,
        ],
        logger(),
    ));
    let orchestrator = Orchestrator::new(
        provider.clone(),
        ModelSettings::default(),
        AssistantSettings::default(),
        logger(),
    );

    let answer = orchestrator
        .process_query(&session, "echo hello", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(
        answer,
        r#"Tool results: c1 -> {"echoed":"hello"}; c2 -> error: boom"#
    );
    assert_eq!(provider.request_count(), 2);

    session.close().await.unwrap();
    assert!(!session.is_connected());
}
