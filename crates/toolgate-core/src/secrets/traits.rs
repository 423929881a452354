//! Secret store trait and lookup metadata

use thiserror::Error;

/// Result of probing a store for one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretInfo {
    pub available: bool,
    /// Name of the store that answered; `"none"` when nothing did
    pub source: String,
}

impl SecretInfo {
    pub fn new(available: bool, source: impl Into<String>) -> Self {
        Self {
            available,
            source: source.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(false, "none")
    }
}

#[derive(Error, Debug)]
pub enum SecretStoreError {
    #[error("Store is read-only")]
    ReadOnly,

    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Other(String),
}

pub type SecretStoreResult<T> = Result<T, SecretStoreError>;

/// Source of API keys for tools and model providers
///
/// Keys are logical names (`weather`, `tavily`, `groq`); each store decides
/// how a name maps onto its backing storage.
///
/// ```
/// use toolgate_core::secrets::{SecretStore, EnvSecretStore};
///
/// let store = EnvSecretStore::new();
/// // store.get("weather") reads WEATHER_API_KEY
/// ```
pub trait SecretStore: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the backing storage can be read at all
    fn is_available(&self) -> bool {
        true
    }

    fn get(&self, key: &str) -> Option<String>;

    /// Returns `Err(SecretStoreError::ReadOnly)` for stores that can't be written
    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()>;

    fn delete(&self, key: &str) -> SecretStoreResult<()>;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn get_info(&self, key: &str) -> SecretInfo {
        if self.has(key) {
            SecretInfo::new(true, self.name())
        } else {
            SecretInfo::not_found()
        }
    }

    /// Fetch a key the caller cannot proceed without
    fn require(&self, key: &str) -> SecretStoreResult<String> {
        self.get(key)
            .ok_or_else(|| SecretStoreError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_info() {
        let info = SecretInfo::not_found();
        assert!(!info.available);
        assert_eq!(info.source, "none");
        assert_eq!(info, SecretInfo::new(false, "none"));
    }
}
