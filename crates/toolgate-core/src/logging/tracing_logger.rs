//! Logger backed by the `tracing` crate

use super::traits::Logger;

/// Forwards every message to `tracing` under a fixed component name
///
/// The subscriber (filtering, formatting, output stream) is installed by the
/// binary; this type only emits events.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: &'static str,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new("toolgate")
    }
}

impl TracingLogger {
    /// Create a logger whose events carry `component`
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn component(&self) -> &'static str {
        self.component
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(component = self.component, "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(component = self.component, "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(component = self.component, "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(component = self.component, "{}", message);
    }
}
