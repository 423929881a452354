//! Local date and time

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::registry::{BuiltinTool, HandlerError, ToolArgs, ToolContext, ToolSpec};

/// `get_datetime()` → `{"datetime": "YYYY-MM-DD HH:MM:SS"}`
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeTool;

#[async_trait]
impl BuiltinTool for DateTimeTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "get_datetime",
            "Returns the current local date and time as YYYY-MM-DD HH:MM:SS.",
        )
    }

    async fn run(&self, _args: ToolArgs, _ctx: &ToolContext) -> Result<Value, HandlerError> {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        Ok(json!({ "datetime": now }))
    }
}
