//! Environment variable secret store

use std::collections::HashMap;
use std::env;

use once_cell::sync::Lazy;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};

/// Logical secret names and the environment variables that may hold them,
/// tried in order
static ENV_VAR_MAP: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    // Tool credentials
    m.insert("weather", vec!["WEATHER_API_KEY"]);
    m.insert("tavily", vec!["TAVILY_API_KEY"]);
    m.insert("alphavantage", vec!["ALPHAVANTAGE_API", "ALPHAVANTAGE_API_KEY"]);
    m.insert("google_search", vec!["GOOGLE_SEARCH_API_KEY"]);
    m.insert("google_search_cx", vec!["PROGRAMMABLE_SEARCH_ENGINE_ID"]);
    m.insert("firecrawl", vec!["FIRECRAWL_API_KEY", "FIRECRAWL_SANE_API"]);
    // Model providers
    m.insert("groq", vec!["GROQ_API_KEY", "GROQ_API_KEY_2"]);
    m.insert("openai", vec!["OPENAI_API_KEY"]);
    m.insert("openrouter", vec!["OPENROUTER_API_KEY", "OPENROUTER"]);
    m.insert("anthropic", vec!["ANTHROPIC_API_KEY"]);
    m.insert("gemini", vec!["GEMINI_API_KEY", "GOOGLE_API_KEY"]);
    m.insert("ollama", vec![]);
    m
});

/// Read-only secret store over environment variables
///
/// # Name mapping
///
/// - `weather` → `WEATHER_API_KEY`
/// - `alphavantage` → `ALPHAVANTAGE_API` or `ALPHAVANTAGE_API_KEY`
/// - `google_search_cx` → `PROGRAMMABLE_SEARCH_ENGINE_ID`
/// - `groq` → `GROQ_API_KEY` or `GROQ_API_KEY_2`
///
/// Any other key is tried verbatim and then as `<KEY>_API_KEY`.
#[derive(Debug, Default)]
pub struct EnvSecretStore {
    _private: (),
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Environment variables consulted for a logical name
    pub fn env_vars_for(name: &str) -> Option<&'static [&'static str]> {
        ENV_VAR_MAP.get(name.to_lowercase().as_str()).map(|v| v.as_slice())
    }

    /// The variable that carries `name` into a child process's environment
    pub fn var_for(name: &str) -> String {
        Self::env_vars_for(name)
            .and_then(|vars| vars.first())
            .map(|v| v.to_string())
            .unwrap_or_else(|| format!("{}_API_KEY", name.to_uppercase()))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

impl SecretStore for EnvSecretStore {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = non_empty_var(key) {
            return Some(value);
        }

        if let Some(vars) = Self::env_vars_for(key) {
            if let Some(value) = vars.iter().find_map(|v| non_empty_var(v)) {
                return Some(value);
            }
        }

        non_empty_var(&format!("{}_API_KEY", key.to_uppercase()))
    }

    fn store(&self, _key: &str, _value: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }

    fn delete(&self, _key: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }
}
