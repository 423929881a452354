//! Tool registry
//!
//! Owns the name → (descriptor, handler) mapping. Discovery returns
//! descriptors in registration order; invocation never fails: unknown names,
//! handler errors, panics and deadline overruns all come back as error output.
//!
//! ```text
//! ToolRegistry::invoke(name, args)
//!     │
//!     ├── unknown name ──────────────► ToolOutput { is_error: true }
//!     │
//!     └── handler.call(args, ctx)
//!             ├── Ok(value) ─────────► ToolOutput { content: text(value) }
//!             ├── Err(HandlerError) ─► ToolOutput { is_error: true }
//!             ├── panic ─────────────► ToolOutput { is_error: true }
//!             └── deadline ──────────► ToolOutput { is_error: true }
//! ```

mod error;
mod handler;
pub mod schema;
mod tool_registry;

pub use error::{HandlerError, HandlerResult, RegistryError};
pub use handler::{handler_fn, BuiltinTool, FnHandler, ToolContext, ToolHandler};
pub use schema::{ParamKind, ParamSpec, ToolArgs, ToolSpec};
pub use tool_registry::{ToolOutput, ToolRegistry, DEFAULT_HANDLER_TIMEOUT};
