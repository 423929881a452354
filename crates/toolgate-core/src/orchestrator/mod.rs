//! Tool-call orchestration
//!
//! One query, at most one round of tools:
//!
//! ```text
//!   discover ─► turn 1 (tools: auto) ─┬─ text ───────────────────────► answer
//!                                     └─ tool calls ─► dispatch (in order)
//!                                                        └─► turn 2 (tools: none) ─► answer
//! ```

mod catalog;
mod error;
mod query;

pub use catalog::{translate, ToolFilter};
pub use error::{OrchestratorError, OrchestratorResult};
pub use query::Orchestrator;
