//! YAML configuration file
//!
//! Lives at `~/.config/toolgate/config.yaml` unless a path is given.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root of the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub model: ModelSettings,
    pub server: ServerSettings,
    pub registry: RegistrySettings,
    pub assistant: AssistantSettings,
    pub endpoints: Endpoints,
}

/// Language-model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Provider id (`groq`, `openai`, `openrouter`, `mock`, ...)
    pub provider: String,
    pub model: String,
    /// Override the provider's default API base
    pub api_base: Option<String>,
    pub temperature: Option<f64>,
    /// Completion budget for the first (tool-enabled) turn
    pub max_tokens: u32,
    /// Completion budget for the final (tool-disabled) turn
    pub final_max_tokens: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_base: None,
            temperature: None,
            max_tokens: 1024,
            final_max_tokens: 4096,
        }
    }
}

/// How the client reaches the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Command to spawn; `None` re-executes the current binary with `serve`
    pub command: Option<String>,
    pub args: Vec<String>,
    /// Streamable-HTTP endpoint; takes precedence over `command` when set
    pub url: Option<String>,
    pub startup_timeout_secs: u64,
    pub call_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            url: None,
            startup_timeout_secs: 30,
            call_timeout_secs: 60,
        }
    }
}

impl ServerSettings {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

/// Registry-side settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Deadline for a single handler run
    pub handler_timeout_secs: u64,
    /// Built-in tools that should not be registered
    pub disabled_tools: Vec<String>,
    /// Directory described by `get_project_structure`
    pub project_root: PathBuf,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            handler_timeout_secs: 30,
            disabled_tools: Vec::new(),
            project_root: PathBuf::from("."),
        }
    }
}

impl RegistrySettings {
    pub fn handler_timeout(&self) -> Duration {
        Duration::from_secs(self.handler_timeout_secs)
    }
}

/// A hint appended to the user query when its keywords match
///
/// Matches when the lowercased query contains at least one of `any` and
/// every entry of `all`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryHint {
    #[serde(default)]
    pub any: Vec<String>,
    #[serde(default)]
    pub all: Vec<String>,
    pub hint: String,
}

impl QueryHint {
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        let any_ok = self.any.is_empty() || self.any.iter().any(|k| query.contains(k.as_str()));
        let all_ok = self.all.iter().all(|k| query.contains(k.as_str()));
        any_ok && all_ok
    }
}

/// Prompting policy for the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantSettings {
    pub country: String,
    /// When false, web-search tools are hidden from the model
    pub internet: bool,
    /// Tools hidden from the catalog in offline mode
    pub online_tools: Vec<String>,
    /// Extra guidance appended to the system context
    pub guidance: Vec<String>,
    pub query_hints: Vec<QueryHint>,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            country: "India".to_string(),
            internet: true,
            online_tools: vec![
                "internet_search".to_string(),
                "google_search".to_string(),
                "search_firecrawl".to_string(),
                "deep_research".to_string(),
            ],
            guidance: vec![
                "For weather forecasting, use the get_weather tool with the city name, current, \
                 forecast, days, forecast_type, and day_for_hourly values."
                    .to_string(),
                "days must always be greater than the day_for_hourly (day_for_hourly < days)."
                    .to_string(),
            ],
            query_hints: vec![QueryHint {
                any: vec!["bitcoin".to_string(), "btc".to_string(), "crypto".to_string()],
                all: vec!["price".to_string()],
                hint: "IMPORTANT: Use the get_crypto_data tool to fetch the Open, High, and Low \
                       prices. Do not estimate them yourself."
                    .to_string(),
            }],
        }
    }
}

/// Upstream base URLs for the built-in tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub weather: String,
    pub wikipedia: String,
    pub tavily: String,
    pub google_search: String,
    pub alphavantage: String,
    pub mangadex: String,
    pub firecrawl: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            weather: "https://api.weatherapi.com/v1".to_string(),
            wikipedia: "https://en.wikipedia.org/w/api.php".to_string(),
            tavily: "https://api.tavily.com".to_string(),
            google_search: "https://www.googleapis.com/customsearch/v1".to_string(),
            alphavantage: "https://www.alphavantage.co/query".to_string(),
            mangadex: "https://api.mangadex.org".to_string(),
            firecrawl: "https://api.firecrawl.dev".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every endpoint at one base URL (mock servers in tests)
    pub fn all_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            weather: base.to_string(),
            wikipedia: format!("{}/w/api.php", base),
            tavily: base.to_string(),
            google_search: format!("{}/customsearch/v1", base),
            alphavantage: format!("{}/query", base),
            mangadex: base.to_string(),
            firecrawl: base.to_string(),
        }
    }
}

impl GatewayConfig {
    /// Default config file location (`~/.config/toolgate/config.yaml`)
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
        });
        config_dir.join("toolgate").join("config.yaml")
    }

    /// Parse a YAML document
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        // An empty document deserializes to unit, not a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: GatewayConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load from the default location
    pub fn load_default() -> ConfigResult<Self> {
        Self::load(Self::default_path())
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject values that would make the gateway unusable
    pub fn validate(&self) -> ConfigResult<()> {
        if self.model.provider.trim().is_empty() {
            return Err(ConfigError::Invalid("model.provider must not be empty".into()));
        }
        if self.model.max_tokens == 0 || self.model.final_max_tokens == 0 {
            return Err(ConfigError::Invalid("token budgets must be positive".into()));
        }
        if self.server.startup_timeout_secs == 0
            || self.server.call_timeout_secs == 0
            || self.registry.handler_timeout_secs == 0
        {
            return Err(ConfigError::Invalid("timeouts must be at least one second".into()));
        }
        if let Some(t) = self.model.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::Invalid(format!(
                    "model.temperature {} is outside 0.0..=2.0",
                    t
                )));
            }
        }
        Ok(())
    }
}
