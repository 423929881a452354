//! Diagnostic echo tool

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::registry::{BuiltinTool, HandlerError, ParamSpec, ToolArgs, ToolContext, ToolSpec};

/// `echo(text)` → `{"echoed": text}`
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoTool;

#[async_trait]
impl BuiltinTool for EchoTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "echo",
            "Echo the given text back unchanged. Useful for checking that tool calls work.",
        )
        .param(ParamSpec::string("text", "Text to echo back"))
    }

    async fn run(&self, args: ToolArgs, _ctx: &ToolContext) -> Result<Value, HandlerError> {
        Ok(json!({ "echoed": args.get_str("text")? }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo() {
        let args = EchoTool.spec().validate(&json!({"text": "hello"})).unwrap();
        let out = EchoTool.run(args, &ToolContext::default()).await.unwrap();
        assert_eq!(out, json!({"echoed": "hello"}));
    }
}
