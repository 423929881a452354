//! Tool handler trait and invocation context

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::error::HandlerError;
use super::schema::{ToolArgs, ToolSpec};
use crate::config::ToolConfig;
use crate::logging::{Logger, NoOpLogger};

/// Read-only state handed to every handler
///
/// Cheap to clone: the configuration is shared and `reqwest::Client` is a
/// handle over one connection pool.
#[derive(Clone)]
pub struct ToolContext {
    config: Arc<ToolConfig>,
    http: reqwest::Client,
    logger: Arc<dyn Logger>,
}

impl ToolContext {
    pub fn new(config: ToolConfig, logger: Arc<dyn Logger>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("toolgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            config: Arc::new(config),
            http,
            logger,
        }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Fetch a credential or fail with `MissingCredential`
    pub fn credential<'a>(
        &self,
        name: &str,
        value: &'a Option<String>,
    ) -> Result<&'a str, HandlerError> {
        value
            .as_deref()
            .ok_or_else(|| HandlerError::MissingCredential(name.to_string()))
    }
}

impl Default for ToolContext {
    fn default() -> Self {
        Self::new(ToolConfig::default(), Arc::new(NoOpLogger))
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("config", &self.config)
            .finish()
    }
}

/// A callable tool body
///
/// Handlers receive arguments as given by the caller and return either a
/// JSON value or a `HandlerError`. They must not mutate shared state.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value, HandlerError>;
}

/// Handler built from an async closure
pub struct FnHandler<F> {
    f: F,
}

/// Wrap an async closure as a `ToolHandler`
///
/// ```
/// use serde_json::json;
/// use toolgate_core::registry::{handler_fn, HandlerError};
///
/// let fail_always = handler_fn(|_args, _ctx| async move {
///     Err::<serde_json::Value, _>(HandlerError::failed("boom"))
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Value, ToolContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, HandlerError>> + Send,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Value, ToolContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, HandlerError>> + Send,
{
    async fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value, HandlerError> {
        (self.f)(args, ctx.clone()).await
    }
}

/// A tool described by a `ToolSpec` whose body only sees validated arguments
#[async_trait]
pub trait BuiltinTool: Send + Sync {
    fn spec(&self) -> ToolSpec;

    async fn run(&self, args: ToolArgs, ctx: &ToolContext) -> Result<Value, HandlerError>;
}

/// Runs schema validation before delegating to a `BuiltinTool`
pub(crate) struct ValidatingHandler<T> {
    spec: ToolSpec,
    tool: T,
}

impl<T: BuiltinTool> ValidatingHandler<T> {
    pub(crate) fn new(tool: T) -> Self {
        Self {
            spec: tool.spec(),
            tool,
        }
    }

    pub(crate) fn spec(&self) -> &ToolSpec {
        &self.spec
    }
}

#[async_trait]
impl<T: BuiltinTool> ToolHandler for ValidatingHandler<T> {
    async fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value, HandlerError> {
        let args = self.spec.validate(&args)?;
        self.tool.run(args, ctx).await
    }
}
