//! Web search tools: Tavily and Google Programmable Search

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{fetch_json, show};
use crate::registry::{BuiltinTool, HandlerError, ParamSpec, ToolArgs, ToolContext, ToolSpec};

/// `internet_search(query, depth)` → Tavily's JSON response
#[derive(Debug, Clone, Copy, Default)]
pub struct InternetSearchTool;

#[async_trait]
impl BuiltinTool for InternetSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "internet_search",
            "Performs a web search using Tavily and returns the top results with content snippets.",
        )
        .param(ParamSpec::string("query", "Search query"))
        .param(
            ParamSpec::string(
                "depth",
                "\"basic\" is fast and lightweight; \"advanced\" is slower with broader context",
            )
            .with_default("basic")
            .one_of(["basic", "advanced"]),
        )
    }

    async fn run(&self, args: ToolArgs, ctx: &ToolContext) -> Result<Value, HandlerError> {
        let key = ctx.credential("tavily", &ctx.config().credentials.tavily)?;
        let url = format!(
            "{}/search",
            ctx.config().endpoints.tavily.trim_end_matches('/')
        );

        let request = ctx.http().post(url).bearer_auth(key).json(&json!({
            "query": args.get_str("query")?,
            "search_depth": args.get_str("depth")?,
        }));
        fetch_json(request, "Tavily").await
    }
}

/// `google_search(query)` → `{"results_string": "1. Title (site): summary\n..."}`
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleSearchTool;

#[async_trait]
impl BuiltinTool for GoogleSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "google_search",
            "Searches Google (Custom Search API) and returns numbered results with a short description.",
        )
        .param(ParamSpec::string("query", "Search query"))
    }

    async fn run(&self, args: ToolArgs, ctx: &ToolContext) -> Result<Value, HandlerError> {
        let creds = &ctx.config().credentials;
        let key = ctx.credential("google_search", &creds.google_search)?;
        let cx = ctx.credential("google_search_cx", &creds.google_search_cx)?;

        let body = fetch_json(
            ctx.http()
                .get(&ctx.config().endpoints.google_search)
                .query(&[("key", key), ("cx", cx), ("q", args.get_str("query")?)]),
            "Google Search",
        )
        .await?;

        Ok(json!({ "results_string": format_google_results(&body)? }))
    }
}

fn format_google_results(body: &Value) -> Result<String, HandlerError> {
    if let Some(message) = body.pointer("/error/message") {
        return Err(HandlerError::upstream(show(message)));
    }
    let Some(items) = body.get("items").and_then(Value::as_array) else {
        return Ok("No results found".to_string());
    };

    let lines: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let title = item.get("title").map(show).unwrap_or_else(|| "Untitled".into());
            let site = item.get("displayLink").map(show).unwrap_or_default();
            // Prefer the page's own og:description over Google's snippet
            let context = item
                .pointer("/pagemap/metatags/0/og:description")
                .map(show)
                .filter(|s| !s.is_empty())
                .or_else(|| item.get("snippet").map(show))
                .unwrap_or_else(|| "No description available".into());
            format!("{}. {} ({}): {}", i + 1, title, site, context)
        })
        .collect();
    Ok(lines.join("\n"))
}
