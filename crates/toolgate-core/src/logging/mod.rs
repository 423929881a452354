//! Logging abstractions
//!
//! Components take an `Arc<dyn Logger>` so the host decides where messages go.
//! The binary wires in `TracingLogger`; tests use `NoOpLogger`.

mod traits;
mod tracing_logger;

pub use traits::{Logger, NoOpLogger};
pub use tracing_logger::TracingLogger;
