//! Name → handler registry

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use indexmap::IndexMap;
use serde_json::Value;

use super::error::{HandlerError, RegistryError};
use super::handler::{BuiltinTool, ToolContext, ToolHandler, ValidatingHandler};
use crate::logging::Logger;
use crate::types::ToolDescriptor;

/// Default deadline for one handler run
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of an invocation, already serialized to text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }

    /// Render a handler's success value: strings verbatim, everything else as
    /// compact JSON
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => Self::success(text),
            other => Self::success(other.to_string()),
        }
    }
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Arc<dyn ToolHandler>,
}

/// Registry of callable tools
///
/// Populated at startup, then shared read-only (typically behind an `Arc`).
pub struct ToolRegistry {
    tools: IndexMap<String, RegisteredTool>,
    context: ToolContext,
    handler_timeout: Duration,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    pub fn new(context: ToolContext, logger: Arc<dyn Logger>) -> Self {
        Self {
            tools: IndexMap::new(),
            context,
            handler_timeout: DEFAULT_HANDLER_TIMEOUT,
            logger,
        }
    }

    /// Set the per-invocation handler deadline
    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }

    pub fn handler_timeout(&self) -> Duration {
        self.handler_timeout
    }

    /// Register a tool under `descriptor.name`
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: impl ToolHandler + 'static,
    ) -> Result<(), RegistryError> {
        self.register_arc(descriptor, Arc::new(handler))
    }

    /// Register a schema-described tool; arguments are validated before it runs
    pub fn register_builtin(&mut self, tool: impl BuiltinTool + 'static) -> Result<(), RegistryError> {
        let handler = ValidatingHandler::new(tool);
        let descriptor = handler.spec().descriptor();
        self.register_arc(descriptor, Arc::new(handler))
    }

    fn register_arc(
        &mut self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), RegistryError> {
        if self.tools.contains_key(&descriptor.name) {
            self.logger.warn(&format!(
                "[ToolRegistry] Rejected duplicate tool: {}",
                descriptor.name
            ));
            return Err(RegistryError::DuplicateName(descriptor.name));
        }

        self.logger
            .debug(&format!("[ToolRegistry] Registered tool: {}", descriptor.name));
        self.tools.insert(
            descriptor.name.clone(),
            RegisteredTool {
                descriptor,
                handler,
            },
        );
        Ok(())
    }

    /// All descriptors in registration order
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|t| t.descriptor.clone()).collect()
    }

    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name).map(|t| &t.descriptor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name
    ///
    /// Never fails. Every failure mode is folded into an error output so a
    /// single tool can't abort the caller's turn.
    pub async fn invoke(&self, name: &str, arguments: Value) -> ToolOutput {
        let Some(tool) = self.tools.get(name) else {
            let err = RegistryError::UnknownTool(name.to_string());
            self.logger.warn(&format!("[ToolRegistry] {}", err));
            return ToolOutput::error(err.to_string());
        };

        self.logger.info(&format!("[ToolRegistry] Invoking tool: {}", name));

        let run = AssertUnwindSafe(tool.handler.call(arguments, &self.context)).catch_unwind();
        let output = match tokio::time::timeout(self.handler_timeout, run).await {
            Ok(Ok(Ok(value))) => ToolOutput::from_value(value),
            Ok(Ok(Err(e))) => ToolOutput::error(e.to_string()),
            Ok(Err(panic)) => ToolOutput::error(format!(
                "Tool '{}' panicked: {}",
                name,
                panic_message(panic.as_ref())
            )),
            Err(_) => ToolOutput::error(HandlerError::Timeout(self.handler_timeout).to_string()),
        };

        if output.is_error {
            self.logger.warn(&format!(
                "[ToolRegistry] Tool {} failed: {}",
                name, output.content
            ));
        } else {
            self.logger.debug(&format!(
                "[ToolRegistry] Tool {} returned {} bytes",
                name,
                output.content.len()
            ));
        }
        output
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .field("handler_timeout", &self.handler_timeout)
            .finish()
    }
}
