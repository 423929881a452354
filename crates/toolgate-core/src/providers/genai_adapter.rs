//! Adapter between toolgate types and genai types
//!
//! API keys are resolved through our `SecretStore`, not genai's own
//! environment lookup, so `.env` values and in-memory stores work alike.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions,
    Tool as GenaiTool, ToolCall as GenaiToolCall, ToolResponse as GenaiToolResponse,
};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::{adapter::AdapterKind, Client, ModelIden, ServiceTarget};
use serde_json::{json, Value};

use crate::secrets::SecretStore;
use crate::types::{ChatMessage, ContentPart, MessageContent, MessageRole, Tool, ToolCall};

use super::error::ProviderResult;
use super::traits::ChatOptions;

// ============================================================================
// Message Conversion: toolgate -> genai
// ============================================================================

/// Plain-text message for `role`
///
/// Tool output only travels as tool responses, so free text under the tool
/// role is sent as user text.
fn text_message(role: MessageRole, text: String) -> GenaiMessage {
    match role {
        MessageRole::System => GenaiMessage::system(text),
        MessageRole::Assistant => GenaiMessage::assistant(text),
        MessageRole::User | MessageRole::Tool => GenaiMessage::user(text),
    }
}

fn to_genai_tool_call(id: String, name: String, input: Value) -> ProviderResult<GenaiToolCall> {
    Ok(serde_json::from_value(json!({
        "call_id": id,
        "fn_name": name,
        "fn_arguments": input,
    }))?)
}

/// Convert one ChatMessage into genai messages
///
/// An assistant turn with tool calls becomes its text (if any) followed by a
/// tool-call message; each tool result becomes its own tool-response message.
pub fn to_genai_message(msg: ChatMessage) -> ProviderResult<Vec<GenaiMessage>> {
    let parts = match msg.content {
        MessageContent::Text(text) => return Ok(vec![text_message(msg.role, text)]),
        MessageContent::Parts(parts) => parts,
    };

    let mut text = Vec::new();
    let mut calls = Vec::new();
    let mut responses = Vec::new();
    for part in parts {
        match part {
            ContentPart::Text { text: t } => text.push(t),
            ContentPart::ToolUse { id, name, input } => calls.push(to_genai_tool_call(id, name, input)?),
            ContentPart::ToolResult {
                tool_use_id,
                content,
                ..
            } => responses.push(GenaiMessage::from(GenaiToolResponse::new(tool_use_id, content))),
        }
    }

    let mut out = Vec::new();
    if !text.is_empty() {
        out.push(text_message(msg.role, text.join("\n")));
    }
    if !calls.is_empty() {
        out.push(GenaiMessage::from(calls));
    }
    out.extend(responses);
    Ok(out)
}

/// Convert a vector of messages to genai messages
pub fn to_genai_messages(messages: Vec<ChatMessage>) -> ProviderResult<Vec<GenaiMessage>> {
    let mut out = Vec::with_capacity(messages.len());
    for message in messages {
        out.extend(to_genai_message(message)?);
    }
    Ok(out)
}

// ============================================================================
// Tool Conversion: toolgate -> genai
// ============================================================================

/// Convert a Tool to genai Tool
pub fn to_genai_tool(tool: &Tool) -> GenaiTool {
    let mut genai_tool = GenaiTool::new(&tool.name).with_description(&tool.description);

    if let Some(schema) = &tool.input_schema {
        genai_tool = genai_tool.with_schema(schema.clone());
    }

    genai_tool
}

/// Convert tools to genai tools
pub fn to_genai_tools(tools: &[Tool]) -> Vec<GenaiTool> {
    tools.iter().map(to_genai_tool).collect()
}

// ============================================================================
// Options Conversion: toolgate -> genai
// ============================================================================

/// Convert ChatOptions to genai ChatOptions
pub fn to_genai_options(options: &ChatOptions) -> GenaiOptions {
    let mut genai_opts = GenaiOptions::default();

    if let Some(temp) = options.temperature {
        genai_opts = genai_opts.with_temperature(temp);
    }

    if let Some(max_tokens) = options.max_tokens {
        genai_opts = genai_opts.with_max_tokens(max_tokens);
    }

    genai_opts
}

// ============================================================================
// Response Conversion: genai -> toolgate
// ============================================================================

/// Convert genai ToolCall to ToolCall
pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCall {
    ToolCall {
        id: tc.call_id.clone(),
        name: tc.fn_name.clone(),
        input: tc.fn_arguments.clone(),
    }
}

// ============================================================================
// Provider Resolution
// ============================================================================

/// Provider configuration for routing
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider identifier (e.g., "groq", "openrouter")
    pub provider: String,
    /// API key for authentication
    pub api_key: Option<String>,
    /// Custom API base URL
    pub api_base: Option<String>,
}

/// genai adapter that speaks a provider's protocol
pub fn adapter_kind_for(provider: &str) -> AdapterKind {
    match provider.to_lowercase().as_str() {
        "anthropic" => AdapterKind::Anthropic,
        "gemini" | "google" => AdapterKind::Gemini,
        "ollama" => AdapterKind::Ollama,
        "groq" => AdapterKind::Groq,
        "xai" => AdapterKind::Xai,
        "deepseek" => AdapterKind::DeepSeek,
        "cohere" => AdapterKind::Cohere,
        "fireworks" => AdapterKind::Fireworks,
        "together" => AdapterKind::Together,
        // openai, openrouter and any other OpenAI-compatible endpoint
        _ => AdapterKind::OpenAI,
    }
}

/// Default API base URL for a provider
pub fn default_api_base(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "anthropic" => "https://api.anthropic.com/v1/",
        "gemini" | "google" => "https://generativelanguage.googleapis.com/v1beta/",
        "ollama" => "http://localhost:11434/",
        "groq" => "https://api.groq.com/openai/v1/",
        "xai" => "https://api.x.ai/v1/",
        "deepseek" => "https://api.deepseek.com/v1/",
        "cohere" => "https://api.cohere.com/v1/",
        "fireworks" => "https://api.fireworks.ai/inference/v1/",
        "together" => "https://api.together.xyz/v1/",
        "openrouter" => "https://openrouter.ai/api/v1/",
        _ => "https://api.openai.com/v1/",
    }
}

/// Whether a provider refuses requests without a key
pub fn requires_api_key(provider: &str) -> bool {
    !provider.eq_ignore_ascii_case("ollama")
}

// ============================================================================
// Client Creation with Custom Auth
// ============================================================================

/// Create a genai Client with custom auth and endpoint resolution
///
/// The provider id, not the model name, picks the adapter and endpoint, so
/// names like `llama-3.3-70b-versatile` route to the configured provider.
pub fn create_client(config: &ProviderConfig, secrets: Arc<dyn SecretStore>) -> Client {
    let auth_provider = config.provider.to_lowercase();
    let auth_explicit_key = config.api_key.clone();

    let auth_resolver = AuthResolver::from_resolver_async_fn(
        move |_model_iden: ModelIden| -> Pin<Box<dyn Future<Output = genai::resolver::Result<Option<AuthData>>> + Send>> {
            let provider = auth_provider.clone();
            let explicit_key = auth_explicit_key.clone();
            let secrets = Arc::clone(&secrets);

            Box::pin(async move {
                if let Some(key) = explicit_key {
                    return Ok(Some(AuthData::from_single(key)));
                }
                // None is fine for keyless providers such as Ollama
                Ok(secrets.get(&provider).map(AuthData::from_single))
            })
        },
    );

    let adapter_kind = adapter_kind_for(&config.provider);
    let endpoint_url = config
        .api_base
        .clone()
        .unwrap_or_else(|| default_api_base(&config.provider).to_string());

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let ServiceTarget { model, auth, .. } = target;
            Ok(ServiceTarget {
                endpoint: Endpoint::from_owned(endpoint_url.clone()),
                auth,
                model: ModelIden::new(adapter_kind, model.model_name),
            })
        },
    );

    Client::builder()
        .with_auth_resolver(auth_resolver)
        .with_service_target_resolver(target_resolver)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolResult;
    use genai::chat::ChatRole as GenaiRole;

    #[test]
    fn test_text_roles() {
        assert!(matches!(text_message(MessageRole::System, "s".into()).role, GenaiRole::System));
        assert!(matches!(
            text_message(MessageRole::Assistant, "a".into()).role,
            GenaiRole::Assistant
        ));
        assert!(matches!(text_message(MessageRole::Tool, "t".into()).role, GenaiRole::User));
    }

    #[test]
    fn test_text_message_conversion() {
        let converted = to_genai_message(ChatMessage::user("Hello, world!")).unwrap();
        assert_eq!(converted.len(), 1);
        assert!(matches!(converted[0].role, GenaiRole::User));
    }

    #[test]
    fn test_tool_turn_conversion() {
        let calls = [ToolCall::new("c1", "echo", json!({"text": "hi"}))];
        let assistant =
            to_genai_message(ChatMessage::assistant_tool_calls(Some("Let me check".into()), &calls))
                .unwrap();
        assert_eq!(assistant.len(), 2);
        assert!(assistant.iter().all(|m| matches!(m.role, GenaiRole::Assistant)));

        let result = to_genai_message(ChatMessage::tool_result(&ToolResult::success("c1", "ok")))
            .unwrap();
        assert_eq!(result.len(), 1);
        assert!(matches!(result[0].role, GenaiRole::Tool));
    }

    #[test]
    fn test_tool_conversion() {
        let tool = Tool::new("get_weather", "Get weather for a location").with_schema(json!({
            "type": "object",
            "properties": {
                "city": { "type": "string" }
            }
        }));

        let genai_tool = to_genai_tool(&tool);
        assert_eq!(genai_tool.name, "get_weather");
    }

    #[test]
    fn test_tool_call_round_trip() {
        let genai_call = to_genai_tool_call("c7".into(), "echo".into(), json!({"text": "x"})).unwrap();
        let call = from_genai_tool_call(&genai_call);
        assert_eq!(call, ToolCall::new("c7", "echo", json!({"text": "x"})));
    }

    #[test]
    fn test_provider_routing() {
        assert!(matches!(adapter_kind_for("groq"), AdapterKind::Groq));
        assert!(matches!(adapter_kind_for("openrouter"), AdapterKind::OpenAI));
        assert_eq!(default_api_base("openrouter"), "https://openrouter.ai/api/v1/");
        assert!(requires_api_key("groq"));
        assert!(!requires_api_key("ollama"));
    }
}
