//! Toolgate Core
//!
//! A tool-serving agent gateway: a registry of callable tools exposed over
//! MCP, and a client that lets a language model call them.
//!
//! ## Tool round trip
//!
//! - `registry` holds name → (schema, handler) and never lets a handler
//!   failure escape as anything but an error result
//! - `mcp` serves a registry on stdio and connects to one as a client
//! - `session` owns one connection (child process, HTTP or in-process)
//! - `orchestrator` runs discover → model → dispatch → model for one query
//!
//! ```rust,ignore
//! use toolgate_core::{default_registry, LocalConnector, Orchestrator, Session};
//!
//! let registry = Arc::new(default_registry(context, &config.registry, logger.clone())?);
//! let mut session = Session::new(LocalConnector::new(registry), logger.clone());
//! session.connect().await?;
//!
//! let orchestrator = Orchestrator::new(provider, config.model, config.assistant, logger);
//! let answer = orchestrator.process_query(&session, "weather in Pune?", &cancel).await;
//! session.close().await?;
//! ```

pub mod config;
pub mod logging;
pub mod mcp;
pub mod orchestrator;
pub mod providers;
pub mod registry;
pub mod secrets;
pub mod session;
pub mod tools;
pub mod types;

// Re-export commonly used types
pub use types::{
    CancellationToken, ChatMessage, ContentPart, Conversation, MessageContent, MessageRole, Tool,
    ToolCall, ToolChoice, ToolDescriptor, ToolResult,
};

pub use config::{ConfigError, ConfigResult, Credentials, GatewayConfig, ToolConfig};

pub use secrets::{
    ChainSecretStore, EnvSecretStore, MemorySecretStore, SecretInfo, SecretStore,
    SecretStoreError, SecretStoreResult,
};

pub use logging::{Logger, NoOpLogger, TracingLogger};

pub use registry::{
    handler_fn, BuiltinTool, HandlerError, RegistryError, ToolContext, ToolHandler, ToolOutput,
    ToolRegistry,
};

pub use tools::default_registry;

pub use mcp::{McpClient, McpError, McpResult, RegistryServer};

pub use session::{
    ChildProcessConnector, Connector, HttpConnector, LocalConnector, Session, ToolTransport,
    TransportError, TransportResult,
};

pub use providers::{
    create_provider, ChatOptions, Completion, GenaiProvider, MockProvider, MockReply, Provider,
    ProviderError, ProviderModelConfig, ProviderResult,
};

pub use orchestrator::{Orchestrator, OrchestratorError, OrchestratorResult, ToolFilter};
