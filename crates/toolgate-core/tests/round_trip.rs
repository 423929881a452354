//! Tool-call round trip through the orchestrator, with a scripted model and
//! an in-process registry

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use toolgate_core::config::{AssistantSettings, ModelSettings};
use toolgate_core::logging::{Logger, NoOpLogger};
use toolgate_core::providers::{MockProvider, MockReply};
use toolgate_core::registry::{handler_fn, HandlerError, ToolContext, ToolRegistry};
use toolgate_core::session::{
    Connector, LocalTransport, Session, ToolTransport, TransportError, TransportResult,
};
use toolgate_core::tools::EchoTool;
use toolgate_core::types::{CancellationToken, ToolCall, ToolDescriptor, ToolResult};
use toolgate_core::{Orchestrator, OrchestratorError};

fn logger() -> Arc<dyn Logger> {
    Arc::new(NoOpLogger)
}

fn registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new(ToolContext::default(), logger());
    registry.register_builtin(EchoTool).unwrap();
    registry
        .register(
            ToolDescriptor::new("fail_always", "Always fails"),
            handler_fn(|_, _| async move { Err::<Value, _>(HandlerError::failed("boom")) }),
        )
        .unwrap();
    registry
        .register(
            ToolDescriptor::new("a", "Slow tool a"),
            handler_fn(|_, _| async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok::<_, HandlerError>(json!("a done"))
            }),
        )
        .unwrap();
    registry
        .register(
            ToolDescriptor::new("b", "Fast tool b"),
            handler_fn(|_, _| async move { Ok::<_, HandlerError>(json!("b done")) }),
        )
        .unwrap();
    registry
        .register(
            ToolDescriptor::new("internet_search", "Web search"),
            handler_fn(|_, _| async move { Ok::<_, HandlerError>(json!("results")) }),
        )
        .unwrap();
    Arc::new(registry)
}

/// Wraps the in-process transport and logs when each call starts and ends
struct RecordingTransport {
    inner: LocalTransport,
    log: Arc<Mutex<Vec<String>>>,
    disconnected: bool,
}

#[async_trait]
impl ToolTransport for RecordingTransport {
    async fn list_tools(&self) -> TransportResult<Vec<ToolDescriptor>> {
        self.inner.list_tools().await
    }

    async fn call_tool(&self, call: &ToolCall) -> TransportResult<ToolResult> {
        if self.disconnected {
            return Err(TransportError::Disconnected("peer closed".to_string()));
        }
        self.log.lock().unwrap().push(format!("start {}", call.name));
        let result = self.inner.call_tool(call).await;
        self.log.lock().unwrap().push(format!("end {}", call.name));
        result
    }

    async fn close(self: Box<Self>) -> TransportResult<()> {
        Ok(())
    }
}

struct RecordingConnector {
    registry: Arc<ToolRegistry>,
    log: Arc<Mutex<Vec<String>>>,
    disconnected: bool,
}

#[async_trait]
impl Connector for RecordingConnector {
    async fn connect(&self, _logger: Arc<dyn Logger>) -> TransportResult<Box<dyn ToolTransport>> {
        Ok(Box::new(RecordingTransport {
            inner: LocalTransport::new(self.registry.clone()),
            log: self.log.clone(),
            disconnected: self.disconnected,
        }))
    }

    fn describe(&self) -> String {
        "recording".to_string()
    }
}

struct Harness {
    session: Session,
    provider: Arc<MockProvider>,
    orchestrator: Orchestrator,
    log: Arc<Mutex<Vec<String>>>,
}

impl Harness {
    async fn new(replies: Vec<MockReply>) -> Self {
        Self::build(replies, AssistantSettings::default(), false).await
    }

    async fn build(replies: Vec<MockReply>, assistant: AssistantSettings, disconnected: bool) -> Self {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut session = Session::new(
            RecordingConnector {
                registry: registry(),
                log: log.clone(),
                disconnected,
            },
            logger(),
        );
        session.connect().await.unwrap();

        let provider = Arc::new(MockProvider::scripted(replies, logger()));
        let orchestrator = Orchestrator::new(
            provider.clone(),
            ModelSettings::default(),
            assistant,
            logger(),
        );
        Self {
            session,
            provider,
            orchestrator,
            log,
        }
    }

    async fn ask(&self, query: &str) -> Result<String, OrchestratorError> {
        self.orchestrator
            .process_query(&self.session, query, &CancellationToken::new())
            .await
    }

    fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Tool results carried by the given model request, in order
    fn tool_results(&self, request: usize) -> Vec<(String, String, bool)> {
        self.provider.requests()[request]
            .messages
            .iter()
            .flat_map(|m| {
                m.tool_results()
                    .map(|(id, content, err)| (id.to_string(), content.to_string(), err))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

#[tokio::test]
async fn echo_round_trip() {
    let h = Harness::new(vec![
        MockReply::ToolCalls(vec![ToolCall::new("c1", "echo", json!({"text": "hello"}))]),
        MockReply::SummariseToolResults,
    ])
    .await;

    let answer = h.ask("echo hello").await.unwrap();
    assert_eq!(answer, r#"Tool results: c1 -> {"echoed":"hello"}"#);

    let requests = h.provider.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].tool_names().contains(&"echo".to_string()));
    assert!(requests[1].tool_names().is_empty(), "second turn must not offer tools");
    assert_eq!(requests[0].options.max_tokens, Some(1024));
    assert_eq!(requests[1].options.max_tokens, Some(4096));
    assert_eq!(
        h.tool_results(1),
        vec![("c1".to_string(), r#"{"echoed":"hello"}"#.to_string(), false)]
    );
}

#[tokio::test]
async fn failing_tool_still_reaches_second_turn() {
    let h = Harness::new(vec![
        MockReply::ToolCalls(vec![ToolCall::new("c1", "fail_always", json!({}))]),
        MockReply::SummariseToolResults,
    ])
    .await;

    let answer = h.ask("please fail").await.unwrap();
    assert_eq!(answer, "Tool results: c1 -> error: boom");
    assert_eq!(h.provider.request_count(), 2);
    assert_eq!(
        h.tool_results(1),
        vec![("c1".to_string(), "boom".to_string(), true)]
    );
}

#[tokio::test]
async fn calls_run_sequentially_in_model_order() {
    let h = Harness::new(vec![
        MockReply::ToolCalls(vec![
            ToolCall::new("c1", "a", json!({})),
            ToolCall::new("c2", "b", json!({})),
        ]),
        MockReply::Text("done".to_string()),
    ])
    .await;

    assert_eq!(h.ask("a then b").await.unwrap(), "done");
    assert_eq!(h.calls(), vec!["start a", "end a", "start b", "end b"]);
}

#[tokio::test]
async fn plain_answer_skips_dispatch() {
    let h = Harness::new(vec![MockReply::Text("It is sunny.".to_string())]).await;

    assert_eq!(h.ask("how are you?").await.unwrap(), "It is sunny.");
    assert_eq!(h.provider.request_count(), 1);
    assert!(h.calls().is_empty());
}

#[tokio::test]
async fn every_call_gets_exactly_one_result() {
    let calls = vec![
        ToolCall::new("x1", "echo", json!({"text": "one"})),
        ToolCall::new("x2", "nope", json!({})),
        ToolCall::new("x3", "echo", json!("{\"text\": ")),
        ToolCall::new("x4", "b", Value::Null),
    ];
    let h = Harness::new(vec![
        MockReply::ToolCalls(calls.clone()),
        MockReply::SummariseToolResults,
    ])
    .await;

    h.ask("mixed bag").await.unwrap();

    let results = h.tool_results(1);
    let ids: Vec<_> = results.iter().map(|(id, _, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["x1", "x2", "x3", "x4"]);
    assert_eq!(results.len(), calls.len());

    // unknown tool
    assert_eq!(results[1].1, "Unknown tool: nope");
    assert!(results[1].2);
    // malformed arguments never reach the transport
    assert!(results[2].1.starts_with("Invalid arguments for 'echo'"));
    assert!(results[2].2);
    // and the loop carried on
    assert_eq!(results[3], ("x4".to_string(), "b done".to_string(), false));
    // neither the unknown nor the malformed call reaches the transport
    assert_eq!(h.calls(), vec!["start echo", "end echo", "start b", "end b"]);
}

#[tokio::test]
async fn provider_failure_aborts_query() {
    let h = Harness::new(vec![MockReply::Error("rate limited".to_string())]).await;

    let err = h.ask("anything").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Provider(_)));
    assert!(err.to_string().contains("rate limited"));
}

#[tokio::test]
async fn lost_transport_is_fatal() {
    let h = Harness::build(
        vec![
            MockReply::ToolCalls(vec![ToolCall::new("c1", "echo", json!({"text": "hi"}))]),
            MockReply::SummariseToolResults,
        ],
        AssistantSettings::default(),
        true,
    )
    .await;

    let err = h.ask("echo hi").await.unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Transport(TransportError::Disconnected(_))
    ));
    assert_eq!(h.provider.request_count(), 1, "turn 2 must not be requested");
}

#[tokio::test]
async fn closed_session_is_fatal() {
    let mut h = Harness::new(vec![MockReply::Text("unused".to_string())]).await;
    h.session.close().await.unwrap();

    let err = h.ask("anything").await.unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Transport(TransportError::NotConnected)
    ));
    assert_eq!(h.provider.request_count(), 0);
}

#[tokio::test]
async fn cancelled_query_stops_before_model() {
    let h = Harness::new(vec![MockReply::Text("unused".to_string())]).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = h
        .orchestrator
        .process_query(&h.session, "anything", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::Cancelled));
    assert_eq!(h.provider.request_count(), 0);
}

#[tokio::test]
async fn offline_mode_hides_web_tools() {
    let offline = AssistantSettings {
        internet: false,
        ..Default::default()
    };
    let h = Harness::build(vec![MockReply::Text("offline".to_string())], offline, false).await;

    h.ask("search the web").await.unwrap();

    let request = &h.provider.requests()[0];
    let names = request.tool_names();
    assert!(!names.contains(&"internet_search".to_string()));
    assert!(names.contains(&"echo".to_string()));

    let system = request.messages[0].text().unwrap();
    assert!(system.contains("Internet access is disabled"));
}

#[tokio::test]
async fn offline_mode_refuses_hidden_tools() {
    let offline = AssistantSettings {
        internet: false,
        ..Default::default()
    };
    let h = Harness::build(
        vec![
            MockReply::ToolCalls(vec![
                ToolCall::new("c1", "internet_search", json!({"query": "news"})),
                ToolCall::new("c2", "echo", json!({"text": "still works"})),
            ]),
            MockReply::SummariseToolResults,
        ],
        offline,
        false,
    )
    .await;

    h.ask("latest news").await.unwrap();

    assert!(!h.provider.requests()[0]
        .tool_names()
        .contains(&"internet_search".to_string()));
    assert_eq!(h.calls(), vec!["start echo", "end echo"]);
    assert_eq!(
        h.tool_results(1),
        vec![
            ("c1".to_string(), "Unknown tool: internet_search".to_string(), true),
            ("c2".to_string(), r#"{"echoed":"still works"}"#.to_string(), false),
        ]
    );
}

/// Never finishes the handshake
struct HangingConnector;

#[async_trait]
impl Connector for HangingConnector {
    async fn connect(&self, _logger: Arc<dyn Logger>) -> TransportResult<Box<dyn ToolTransport>> {
        std::future::pending().await
    }

    fn describe(&self) -> String {
        "hanging".to_string()
    }
}

#[tokio::test]
async fn interrupt_during_connect_abandons_query() {
    let mut session = Session::new(HangingConnector, logger());
    let provider = Arc::new(MockProvider::scripted(vec![], logger()));
    let orchestrator = Orchestrator::new(
        provider.clone(),
        ModelSettings::default(),
        AssistantSettings::default(),
        logger(),
    );
    let cancel = CancellationToken::new();

    let err = orchestrator
        .connect_and_answer(
            &mut session,
            "anything",
            &cancel,
            tokio::time::sleep(Duration::from_millis(20)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestratorError::Cancelled));
    assert!(cancel.is_cancelled());
    assert!(!session.is_connected());
    session.close().await.unwrap();
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn connect_and_answer_without_interrupt() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut session = Session::new(
        RecordingConnector {
            registry: registry(),
            log: log.clone(),
            disconnected: false,
        },
        logger(),
    );
    let provider = Arc::new(MockProvider::scripted(
        vec![MockReply::Text("done".to_string())],
        logger(),
    ));
    let orchestrator = Orchestrator::new(
        provider,
        ModelSettings::default(),
        AssistantSettings::default(),
        logger(),
    );

    let answer = orchestrator
        .connect_and_answer(
            &mut session,
            "hello",
            &CancellationToken::new(),
            std::future::pending::<()>(),
        )
        .await
        .unwrap();

    assert_eq!(answer, "done");
    assert!(session.is_connected());
    session.close().await.unwrap();
}

#[tokio::test]
async fn catalog_matches_registration() {
    let h = Harness::new(vec![]).await;
    let catalog = h.session.list_tools().await.unwrap();
    let names: Vec<_> = catalog.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["echo", "fail_always", "a", "b", "internet_search"]);
    assert_eq!(catalog[1].description, "Always fails");
}
