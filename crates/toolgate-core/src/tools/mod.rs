//! Built-in tools
//!
//! Each tool is a thin wrapper over one upstream HTTP API: validate the
//! arguments, make a single request, reshape the response into compact text or
//! JSON. No retries and no caching.
//!
//! | Tool               | Upstream                     | Credential         |
//! |--------------------|------------------------------|--------------------|
//! | `echo`             | none                         | none               |
//! | `get_datetime`     | local clock                  | none               |
//! | `get_weather`      | WeatherAPI                   | `weather`          |
//! | `wikipedia_search` | MediaWiki action API         | none               |
//! | `internet_search`  | Tavily                       | `tavily`           |
//! | `google_search`    | Google Programmable Search   | `google_search`, `google_search_cx` |
//! | `get_crypto_data`  | Alpha Vantage                | `alphavantage`     |
//! | `manga_search`     | MangaDex                     | none               |
//! | `search_firecrawl` | Firecrawl search             | `firecrawl`        |
//! | `deep_research`    | Firecrawl deep research      | `firecrawl`        |
//! | `get_credits`      | Firecrawl credit usage       | `firecrawl`        |
//! | `get_project_structure` | local filesystem        | none               |
//!
//! `deep_research` polls a job until it completes, so it is the one tool that
//! makes more than a single request.

mod crypto;
mod datetime;
mod echo;
mod firecrawl;
mod manga;
mod project;
mod search;
mod weather;
mod wiki;

use std::sync::Arc;

use reqwest::RequestBuilder;
use serde_json::Value;

use crate::config::RegistrySettings;
use crate::logging::Logger;
use crate::registry::{BuiltinTool, HandlerError, RegistryError, ToolContext, ToolRegistry};

pub use crypto::CryptoDataTool;
pub use datetime::DateTimeTool;
pub use echo::EchoTool;
pub use firecrawl::{CreditsTool, DeepResearchTool, FirecrawlSearchTool};
pub use manga::MangaSearchTool;
pub use project::ProjectStructureTool;
pub use search::{GoogleSearchTool, InternetSearchTool};
pub use weather::WeatherTool;
pub use wiki::WikipediaSearchTool;

/// Build a registry holding every built-in tool, in a fixed order
///
/// Tools named in `settings.disabled_tools` are skipped.
pub fn default_registry(
    context: ToolContext,
    settings: &RegistrySettings,
    logger: Arc<dyn Logger>,
) -> Result<ToolRegistry, RegistryError> {
    let mut registry =
        ToolRegistry::new(context, logger.clone()).with_handler_timeout(settings.handler_timeout());

    add(&mut registry, settings, &logger, EchoTool)?;
    add(&mut registry, settings, &logger, DateTimeTool)?;
    add(&mut registry, settings, &logger, WeatherTool)?;
    add(&mut registry, settings, &logger, WikipediaSearchTool)?;
    add(&mut registry, settings, &logger, InternetSearchTool)?;
    add(&mut registry, settings, &logger, GoogleSearchTool)?;
    add(&mut registry, settings, &logger, CryptoDataTool)?;
    add(&mut registry, settings, &logger, MangaSearchTool)?;
    add(&mut registry, settings, &logger, FirecrawlSearchTool)?;
    add(&mut registry, settings, &logger, DeepResearchTool::default())?;
    add(&mut registry, settings, &logger, CreditsTool)?;
    add(
        &mut registry,
        settings,
        &logger,
        ProjectStructureTool::new(settings.project_root.clone()),
    )?;

    logger.info(&format!("[tools] Registered {} built-in tools", registry.len()));
    Ok(registry)
}

fn add<T: BuiltinTool + 'static>(
    registry: &mut ToolRegistry,
    settings: &RegistrySettings,
    logger: &Arc<dyn Logger>,
    tool: T,
) -> Result<(), RegistryError> {
    let name = tool.spec().name;
    if settings.disabled_tools.iter().any(|d| *d == name) {
        logger.info(&format!("[tools] Skipping disabled tool: {}", name));
        return Ok(());
    }
    registry.register_builtin(tool)
}

/// Send a request and decode a JSON body, mapping non-2xx statuses to
/// `HandlerError::Upstream`
pub(crate) async fn fetch_json(request: RequestBuilder, service: &str) -> Result<Value, HandlerError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(HandlerError::upstream(format!(
            "{} returned {}: {}",
            service,
            status,
            excerpt(&body, 200)
        )));
    }
    Ok(response.json::<Value>().await?)
}

/// Render a scalar JSON value the way a human would write it
pub(crate) fn show(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "unknown".to_string(),
        other => other.to_string(),
    }
}

/// Look up `key` in an object or fail with an upstream-shape error
pub(crate) fn field<'a>(value: &'a Value, key: &str) -> Result<&'a Value, HandlerError> {
    value
        .get(key)
        .ok_or_else(|| HandlerError::upstream(format!("unexpected response: missing '{}'", key)))
}

fn excerpt(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
