//! Wikipedia search via the MediaWiki action API

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{fetch_json, field, show};
use crate::registry::{BuiltinTool, HandlerError, ParamSpec, ToolArgs, ToolContext, ToolSpec};

/// `wikipedia_search(query, search_limit)` → `{"results_string": ...}`
///
/// One search request, then one intro-extract request per hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct WikipediaSearchTool;

#[async_trait]
impl BuiltinTool for WikipediaSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "wikipedia_search",
            "Searches English Wikipedia and returns the title, URL and intro of each matching article.",
        )
        .param(ParamSpec::string("query", "Search query, e.g. \"Alan Turing\""))
        .param(
            ParamSpec::integer("search_limit", "Number of articles to return")
                .with_default(5)
                .range(Some(1), Some(20)),
        )
    }

    async fn run(&self, args: ToolArgs, ctx: &ToolContext) -> Result<Value, HandlerError> {
        let query = args.get_str("query")?;
        let limit = args.get_i64("search_limit")?.to_string();
        let url = &ctx.config().endpoints.wikipedia;

        let search = fetch_json(
            ctx.http().get(url).query(&[
                ("action", "query"),
                ("format", "json"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
            ]),
            "Wikipedia",
        )
        .await?;

        let hits = field(field(&search, "query")?, "search")?
            .as_array()
            .cloned()
            .unwrap_or_default();

        let mut lines = Vec::with_capacity(hits.len());
        for hit in &hits {
            let title = show(field(hit, "title")?);
            let page_id = show(field(hit, "pageid")?);

            let page = fetch_json(
                ctx.http().get(url).query(&[
                    ("action", "query"),
                    ("format", "json"),
                    ("prop", "extracts|info"),
                    ("explaintext", "1"),
                    ("exintro", "1"),
                    ("inprop", "url"),
                    ("titles", title.as_str()),
                ]),
                "Wikipedia",
            )
            .await?;

            let Some(page) = page.pointer(&format!("/query/pages/{}", page_id)) else {
                ctx.logger().debug(&format!(
                    "[wikipedia_search] No extract for page {} ({})",
                    page_id, title
                ));
                continue;
            };
            lines.push(format!(
                "{} ({}): {}",
                show(field(page, "title")?),
                page.get("fullurl").map(show).unwrap_or_default(),
                page.get("extract").map(show).unwrap_or_default().trim()
            ));
        }

        Ok(json!({ "results_string": lines.join("\n") }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Endpoints, ToolConfig};
    use crate::logging::NoOpLogger;
    use mockito::Matcher;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_search_and_extracts() {
        let mut server = mockito::Server::new_async().await;
        let _search = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::UrlEncoded("list".into(), "search".into()))
            .with_status(200)
            .with_body(
                json!({"query": {"search": [{"title": "Rust (programming language)", "pageid": 42}]}})
                    .to_string(),
            )
            .create_async()
            .await;
        let _extract = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::UrlEncoded("prop".into(), "extracts|info".into()))
            .with_status(200)
            .with_body(
                json!({"query": {"pages": {"42": {
                    "title": "Rust (programming language)",
                    "fullurl": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
                    "extract": "Rust is a systems language.\n"
                }}}})
                .to_string(),
            )
            .create_async()
            .await;

        let ctx = ToolContext::new(
            ToolConfig::new(Endpoints::all_at(&server.url()), Default::default()),
            Arc::new(NoOpLogger),
        );
        let args = WikipediaSearchTool
            .spec()
            .validate(&json!({"query": "rust", "search_limit": "1"}))
            .unwrap();
        let out = WikipediaSearchTool.run(args, &ctx).await.unwrap();

        assert_eq!(
            out["results_string"],
            "Rust (programming language) (https://en.wikipedia.org/wiki/Rust_(programming_language)): Rust is a systems language."
        );
    }
}
