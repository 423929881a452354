//! Session lifecycle

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::error::{TransportError, TransportResult};
use super::transport::{Connector, ToolTransport};
use crate::config::ServerSettings;
use crate::logging::Logger;
use crate::types::{ToolCall, ToolDescriptor, ToolResult};

const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Owns the connection to one registry
///
/// Created disconnected; `connect()` opens the transport, `close()` releases
/// it. Dropping a connected session releases the transport as well.
pub struct Session {
    connector: Box<dyn Connector>,
    transport: Option<Box<dyn ToolTransport>>,
    startup_timeout: Duration,
    call_timeout: Duration,
    logger: Arc<dyn Logger>,
}

impl Session {
    pub fn new(connector: impl Connector + 'static, logger: Arc<dyn Logger>) -> Self {
        Self {
            connector: Box::new(connector),
            transport: None,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            logger,
        }
    }

    /// Session with timeouts taken from the `server` config section
    pub fn from_settings(
        connector: impl Connector + 'static,
        settings: &ServerSettings,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self::new(connector, logger)
            .with_startup_timeout(settings.startup_timeout())
            .with_call_timeout(settings.call_timeout())
    }

    /// Bound on connect + handshake
    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Bound on each `list_tools` / `call_tool` round trip
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Open the transport
    pub async fn connect(&mut self) -> TransportResult<()> {
        if self.transport.is_some() {
            return Err(TransportError::AlreadyConnected);
        }

        let target = self.connector.describe();
        self.logger
            .info(&format!("[Session] Connecting to {}", target));

        let connecting = self.connector.connect(self.logger.clone());
        let transport = match tokio::time::timeout(self.startup_timeout, connecting).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(TransportError::Connection(format!(
                    "{} did not respond within {:?}",
                    target, self.startup_timeout
                )))
            }
        };

        self.transport = Some(transport);
        self.logger.info("[Session] Connected");
        Ok(())
    }

    /// Fetch the registry's catalog
    pub async fn list_tools(&self) -> TransportResult<Vec<ToolDescriptor>> {
        let transport = self.transport()?;
        tokio::time::timeout(self.call_timeout, transport.list_tools())
            .await
            .map_err(|_| TransportError::Timeout(self.call_timeout))?
    }

    /// Run one tool call and wait for its result
    ///
    /// Arguments that don't parse as a JSON object produce an error result
    /// for this call without touching the transport.
    pub async fn call_tool(&self, call: &ToolCall) -> TransportResult<ToolResult> {
        let transport = self.transport()?;

        let arguments = match call.arguments() {
            Ok(map) => map,
            Err(message) => {
                self.logger.warn(&format!("[Session] {}", message));
                return Ok(ToolResult::error(&call.id, message));
            }
        };
        let call = ToolCall::new(&call.id, &call.name, Value::Object(arguments));

        self.logger.debug(&format!(
            "[Session] Calling {} (id {})",
            call.name, call.id
        ));
        tokio::time::timeout(self.call_timeout, transport.call_tool(&call))
            .await
            .map_err(|_| TransportError::Timeout(self.call_timeout))?
    }

    /// Release the transport; a no-op when not connected
    pub async fn close(&mut self) -> TransportResult<()> {
        match self.transport.take() {
            Some(transport) => {
                self.logger.info("[Session] Closing");
                transport.close().await
            }
            None => Ok(()),
        }
    }

    fn transport(&self) -> TransportResult<&dyn ToolTransport> {
        self.transport.as_deref().ok_or(TransportError::NotConnected)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.transport.is_some() {
            self.logger
                .warn("[Session] Dropped while connected; releasing transport");
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("target", &self.connector.describe())
            .field("connected", &self.is_connected())
            .field("startup_timeout", &self.startup_timeout)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}
