//! Credentials resolved once at startup

use crate::secrets::{SecretInfo, SecretStore};

use super::file::Endpoints;

/// Logical names of every tool credential, in lookup order
pub const CREDENTIAL_NAMES: [&str; 6] = [
    "weather",
    "tavily",
    "alphavantage",
    "google_search",
    "google_search_cx",
    "firecrawl",
];

/// API keys used by the built-in tools
///
/// Each field is optional; a tool whose key is absent reports a
/// missing-credential error when invoked instead of failing at startup.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub weather: Option<String>,
    pub tavily: Option<String>,
    pub alphavantage: Option<String>,
    pub google_search: Option<String>,
    pub google_search_cx: Option<String>,
    pub firecrawl: Option<String>,
}

impl Credentials {
    /// Look up every tool credential by its logical name
    pub fn resolve(store: &dyn SecretStore) -> Self {
        Self {
            weather: store.get("weather"),
            tavily: store.get("tavily"),
            alphavantage: store.get("alphavantage"),
            google_search: store.get("google_search"),
            google_search_cx: store.get("google_search_cx"),
            firecrawl: store.get("firecrawl"),
        }
    }

    /// Which store answered for each credential, for startup diagnostics
    pub fn sources(store: &dyn SecretStore) -> Vec<(&'static str, SecretInfo)> {
        CREDENTIAL_NAMES
            .iter()
            .map(|name| (*name, store.get_info(name)))
            .collect()
    }

    /// Logical names of the credentials that were not found
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("weather", &self.weather),
            ("tavily", &self.tavily),
            ("alphavantage", &self.alphavantage),
            ("google_search", &self.google_search),
            ("google_search_cx", &self.google_search_cx),
            ("firecrawl", &self.firecrawl),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| name)
        .collect()
    }
}

// Keys must not end up in logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("weather", &mask(&self.weather))
            .field("tavily", &mask(&self.tavily))
            .field("alphavantage", &mask(&self.alphavantage))
            .field("google_search", &mask(&self.google_search))
            .field("google_search_cx", &mask(&self.google_search_cx))
            .field("firecrawl", &mask(&self.firecrawl))
            .finish()
    }
}

/// Everything a tool handler may read: upstream endpoints and credentials
///
/// Built once and shared read-only through the tool context.
#[derive(Debug, Clone, Default)]
pub struct ToolConfig {
    pub endpoints: Endpoints,
    pub credentials: Credentials,
}

impl ToolConfig {
    pub fn new(endpoints: Endpoints, credentials: Credentials) -> Self {
        Self {
            endpoints,
            credentials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::MemorySecretStore;

    #[test]
    fn test_resolve_from_store() {
        let store = MemorySecretStore::with_secrets([("weather", "wk"), ("tavily", "tk")]);
        let creds = Credentials::resolve(&store);

        assert_eq!(creds.weather.as_deref(), Some("wk"));
        assert_eq!(creds.tavily.as_deref(), Some("tk"));
        assert_eq!(
            creds.missing(),
            vec!["alphavantage", "google_search", "google_search_cx", "firecrawl"]
        );
    }

    #[test]
    fn test_sources_report_store() {
        let store = MemorySecretStore::with_secrets([("alphavantage", "av")]);
        let sources = Credentials::sources(&store);

        assert_eq!(sources.len(), CREDENTIAL_NAMES.len());
        let (name, info) = &sources[2];
        assert_eq!(*name, "alphavantage");
        assert!(info.available);
        assert_eq!(info.source, "memory");
        assert!(!sources[0].1.available);
    }

    #[test]
    fn test_debug_masks_values() {
        let creds = Credentials {
            weather: Some("super-secret".to_string()),
            ..Default::default()
        };
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<set>"));
    }
}
