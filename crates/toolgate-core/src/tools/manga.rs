//! MangaDex title search

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{fetch_json, show};
use crate::registry::{BuiltinTool, HandlerError, ParamSpec, ToolArgs, ToolContext, ToolSpec};

/// `manga_search(title, tags)` → `{"result": "id:... title:...\n..."}`
#[derive(Debug, Clone, Copy, Default)]
pub struct MangaSearchTool;

#[async_trait]
impl BuiltinTool for MangaSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "manga_search",
            "Searches MangaDex for manga by title and lists id, title, description, status, year and content rating.",
        )
        .param(ParamSpec::string("title", "Manga title to search for"))
        .param(
            ParamSpec::boolean("tags", "Include each result's genre and theme tags")
                .with_default(false),
        )
    }

    async fn run(&self, args: ToolArgs, ctx: &ToolContext) -> Result<Value, HandlerError> {
        let url = format!(
            "{}/manga",
            ctx.config().endpoints.mangadex.trim_end_matches('/')
        );
        let body = fetch_json(
            ctx.http().get(url).query(&[("title", args.get_str("title")?)]),
            "MangaDex",
        )
        .await?;

        let result = format_manga_list(&body, args.get_bool("tags")?)?;
        Ok(json!({ "result": result }))
    }
}

fn format_manga_list(body: &Value, with_tags: bool) -> Result<String, HandlerError> {
    if body.get("result").and_then(Value::as_str) != Some("ok") {
        let detail = body
            .pointer("/errors/0/detail")
            .map(show)
            .unwrap_or_else(|| "request was not successful".to_string());
        return Err(HandlerError::upstream(format!("MangaDex: {}", detail)));
    }

    let entries = body.get("data").and_then(Value::as_array);
    let lines: Vec<String> = entries
        .into_iter()
        .flatten()
        .map(|entry| format_entry(entry, with_tags))
        .collect();

    if lines.is_empty() {
        return Ok("No manga found".to_string());
    }
    Ok(lines.join("\n"))
}

fn format_entry(entry: &Value, with_tags: bool) -> String {
    let attrs = entry.get("attributes").unwrap_or(&Value::Null);
    let english = |key: &str| {
        attrs
            .pointer(&format!("/{}/en", key))
            .map(show)
            .unwrap_or_default()
    };
    let attr = |key: &str| attrs.get(key).map(show).unwrap_or_else(|| "unknown".into());

    let mut line = format!(
        "id:{} title:{},description:{},status:{},year:{},contentRating:{}",
        entry.get("id").map(show).unwrap_or_default(),
        english("title"),
        english("description").replace('\n', " "),
        attr("status"),
        attr("year"),
        attr("contentRating"),
    );

    if with_tags {
        let tags: Vec<String> = attrs
            .get("tags")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|tag| tag.pointer("/attributes/name/en").map(show))
            .collect();
        line.push_str(&format!(",tags:{}", tags.join(",")));
    }
    line
}
