//! Firecrawl tools: web search, deep research and credit usage

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{fetch_json, field, show};
use crate::registry::{BuiltinTool, HandlerError, ParamSpec, ToolArgs, ToolContext, ToolSpec};

const RESEARCH_PROMPT: &str = "Keep the final analysis under 1024 tokens in total. \
Prefer dense bullet points and short headings over prose, and leave out any detail \
that is not essential to the question.";

fn api_base(ctx: &ToolContext) -> String {
    format!(
        "{}/v1",
        ctx.config().endpoints.firecrawl.trim_end_matches('/')
    )
}

fn api_key(ctx: &ToolContext) -> Result<&str, HandlerError> {
    ctx.credential("firecrawl", &ctx.config().credentials.firecrawl)
}

/// Firecrawl answers `{"success": false, "error": ...}` on logical failures
fn check_success(body: &Value) -> Result<(), HandlerError> {
    match body.get("success").and_then(Value::as_bool) {
        Some(false) => Err(HandlerError::upstream(format!(
            "Firecrawl: {}",
            body.get("error").map(show).unwrap_or_else(|| "request failed".into())
        ))),
        _ => Ok(()),
    }
}

/// `search_firecrawl(query, limit)` → `{"search_result": "Title (url): description\n..."}`
#[derive(Debug, Clone, Copy, Default)]
pub struct FirecrawlSearchTool;

#[async_trait]
impl BuiltinTool for FirecrawlSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "search_firecrawl",
            "Searches the web with Firecrawl and returns one line per result: title, URL and description.",
        )
        .param(ParamSpec::string("query", "Search query"))
        .param(
            ParamSpec::integer("limit", "Number of results to return")
                .with_default(5)
                .range(Some(1), Some(50)),
        )
    }

    async fn run(&self, args: ToolArgs, ctx: &ToolContext) -> Result<Value, HandlerError> {
        let key = api_key(ctx)?;
        let request = ctx
            .http()
            .post(format!("{}/search", api_base(ctx)))
            .bearer_auth(key)
            .json(&json!({
                "query": args.get_str("query")?,
                "limit": args.get_i64("limit")?,
            }));
        let body = fetch_json(request, "Firecrawl").await?;
        Ok(json!({ "search_result": format_search_results(&body)? }))
    }
}

fn format_search_results(body: &Value) -> Result<String, HandlerError> {
    check_success(body)?;
    let results = field(body, "data")?
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default();
    if results.is_empty() {
        return Ok("No results found".to_string());
    }

    let lines: Vec<String> = results
        .iter()
        .map(|r| {
            format!(
                "{} ({}): {}",
                r.get("title").map(show).unwrap_or_else(|| "Untitled".into()),
                r.get("url").map(show).unwrap_or_default(),
                r.get("description").map(show).unwrap_or_default(),
            )
        })
        .collect();
    Ok(lines.join("\n"))
}

/// `deep_research(query, max_depth)` → `{"finalAnalysis": ...}`
///
/// Starts a research job and polls it until it finishes. The registry's
/// handler deadline bounds the whole run, so deployments that use this tool
/// usually raise `registry.handler_timeout_secs`.
#[derive(Debug, Clone, Copy)]
pub struct DeepResearchTool {
    poll_interval: Duration,
}

impl Default for DeepResearchTool {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
        }
    }
}

impl DeepResearchTool {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[async_trait]
impl BuiltinTool for DeepResearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "deep_research",
            "Researches a question across many web pages with Firecrawl and returns a condensed final analysis.",
        )
        .param(ParamSpec::string("query", "Research question"))
        .param(
            ParamSpec::integer("max_depth", "How many rounds of follow-up searching to allow")
                .with_default(3)
                .range(Some(1), Some(10)),
        )
    }

    async fn run(&self, args: ToolArgs, ctx: &ToolContext) -> Result<Value, HandlerError> {
        let key = api_key(ctx)?;
        let base = api_base(ctx);

        let started = fetch_json(
            ctx.http()
                .post(format!("{}/deep-research", base))
                .bearer_auth(key)
                .json(&json!({
                    "query": args.get_str("query")?,
                    "maxDepth": args.get_i64("max_depth")?,
                    "systemPrompt": RESEARCH_PROMPT,
                })),
            "Firecrawl",
        )
        .await?;
        check_success(&started)?;
        let id = field(&started, "id")?
            .as_str()
            .ok_or_else(|| HandlerError::upstream("Firecrawl: job id is not a string"))?;
        ctx.logger()
            .debug(&format!("[deep_research] Started job {}", id));

        let status_url = format!("{}/deep-research/{}", base, id);
        loop {
            let body = fetch_json(ctx.http().get(&status_url).bearer_auth(key), "Firecrawl").await?;
            if let Some(analysis) = research_outcome(&body)? {
                return Ok(json!({ "finalAnalysis": analysis }));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// `Some(analysis)` once the job completed, `None` while it is still running
fn research_outcome(body: &Value) -> Result<Option<String>, HandlerError> {
    check_success(body)?;
    match body.get("status").and_then(Value::as_str) {
        Some("completed") => body
            .pointer("/data/finalAnalysis")
            .map(|a| Some(show(a)))
            .ok_or_else(|| HandlerError::upstream("Firecrawl: completed job has no finalAnalysis")),
        Some("failed") => Err(HandlerError::upstream(format!(
            "Firecrawl: deep research failed: {}",
            body.get("error").map(show).unwrap_or_else(|| "no reason given".into())
        ))),
        _ => Ok(None),
    }
}

/// `get_credits()` → Firecrawl's credit-usage response
#[derive(Debug, Clone, Copy, Default)]
pub struct CreditsTool;

#[async_trait]
impl BuiltinTool for CreditsTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "get_credits",
            "Returns the remaining credits on the Firecrawl account.",
        )
    }

    async fn run(&self, _args: ToolArgs, ctx: &ToolContext) -> Result<Value, HandlerError> {
        let key = api_key(ctx)?;
        let request = ctx
            .http()
            .get(format!("{}/team/credit-usage", api_base(ctx)))
            .bearer_auth(key);
        fetch_json(request, "Firecrawl").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, Endpoints, ToolConfig};
    use crate::logging::NoOpLogger;
    use std::sync::Arc;

    fn context(base: &str) -> ToolContext {
        ToolContext::new(
            ToolConfig::new(
                Endpoints::all_at(base),
                Credentials {
                    firecrawl: Some("fc-test".to_string()),
                    ..Default::default()
                },
            ),
            Arc::new(NoOpLogger),
        )
    }

    #[test]
    fn test_format_search_results() {
        let body = json!({"success": true, "data": [
            {"title": "Rust", "url": "https://rust-lang.org", "description": "A language"},
            {"url": "https://example.com"}
        ]});
        assert_eq!(
            format_search_results(&body).unwrap(),
            "Rust (https://rust-lang.org): A language\nUntitled (https://example.com): "
        );
        assert_eq!(
            format_search_results(&json!({"success": true, "data": []})).unwrap(),
            "No results found"
        );

        let err = format_search_results(&json!({"success": false, "error": "Insufficient credits"}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Upstream error: Firecrawl: Insufficient credits");
    }

    #[test]
    fn test_research_outcome() {
        assert_eq!(
            research_outcome(&json!({"success": true, "status": "processing"})).unwrap(),
            None
        );
        assert_eq!(
            research_outcome(&json!({
                "success": true, "status": "completed", "data": {"finalAnalysis": "- point"}
            }))
            .unwrap(),
            Some("- point".to_string())
        );
        let err = research_outcome(&json!({"success": true, "status": "failed", "error": "timeout"}))
            .unwrap_err();
        assert!(err.to_string().contains("deep research failed: timeout"));
    }

    #[tokio::test]
    async fn test_search_posts_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/search")
            .match_header("authorization", "Bearer fc-test")
            .match_body(mockito::Matcher::PartialJson(json!({"query": "rust", "limit": 3})))
            .with_status(200)
            .with_body(
                json!({"success": true, "data": [
                    {"title": "Rust", "url": "https://rust-lang.org", "description": "A language"}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let args = FirecrawlSearchTool
            .spec()
            .validate(&json!({"query": "rust", "limit": "3"}))
            .unwrap();
        let out = FirecrawlSearchTool
            .run(args, &context(&server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(out, json!({"search_result": "Rust (https://rust-lang.org): A language"}));
    }

    #[tokio::test]
    async fn test_deep_research_polls_job() {
        let mut server = mockito::Server::new_async().await;
        let start = server
            .mock("POST", "/v1/deep-research")
            .match_body(mockito::Matcher::PartialJson(json!({"query": "why rust", "maxDepth": 3})))
            .with_status(200)
            .with_body(json!({"success": true, "id": "job-1"}).to_string())
            .create_async()
            .await;
        let status = server
            .mock("GET", "/v1/deep-research/job-1")
            .match_header("authorization", "Bearer fc-test")
            .with_status(200)
            .with_body(
                json!({"success": true, "status": "completed", "data": {"finalAnalysis": "Memory safety."}})
                    .to_string(),
            )
            .create_async()
            .await;

        let tool = DeepResearchTool::default().with_poll_interval(Duration::from_millis(1));
        let args = tool.spec().validate(&json!({"query": "why rust"})).unwrap();
        let out = tool.run(args, &context(&server.url())).await.unwrap();

        start.assert_async().await;
        status.assert_async().await;
        assert_eq!(out, json!({"finalAnalysis": "Memory safety."}));
    }

    #[test]
    fn test_depth_out_of_range() {
        let err = DeepResearchTool::default()
            .spec()
            .validate(&json!({"query": "q", "max_depth": 50}))
            .unwrap_err();
        assert!(matches!(err, HandlerError::InvalidParameter { .. }));
    }

    #[tokio::test]
    async fn test_credits_needs_key() {
        let ctx = ToolContext::default();
        let args = CreditsTool.spec().validate(&json!({})).unwrap();
        let err = CreditsTool.run(args, &ctx).await.unwrap_err();
        assert!(matches!(err, HandlerError::MissingCredential(ref name) if name == "firecrawl"));
    }

    #[tokio::test]
    async fn test_credits_passes_body_through() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/team/credit-usage")
            .match_header("authorization", "Bearer fc-test")
            .with_status(200)
            .with_body(json!({"success": true, "data": {"remaining_credits": 420}}).to_string())
            .create_async()
            .await;

        let args = CreditsTool.spec().validate(&Value::Null).unwrap();
        let out = CreditsTool.run(args, &context(&server.url())).await.unwrap();

        mock.assert_async().await;
        assert_eq!(out["data"]["remaining_credits"], 420);
    }
}
