//! Session: one client's connection to a tool registry
//!
//! ```text
//!   Session ──connect()──► Connector ──► Box<dyn ToolTransport>
//!                                          ├─ LocalTransport  (in-process registry)
//!                                          └─ McpTransport    (child process / HTTP)
//! ```
//!
//! A session owns at most one live transport. `close()` is idempotent and
//! dropping a connected session releases the transport.

mod connection;
mod error;
mod transport;

pub use connection::Session;
pub use error::{TransportError, TransportResult};
pub use transport::{
    ChildProcessConnector, Connector, HttpConnector, LocalConnector, LocalTransport, McpTransport,
    ToolTransport,
};
