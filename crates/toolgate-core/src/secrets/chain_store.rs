//! Chained secret store with fallback behavior

use std::sync::Arc;

use super::env_store::EnvSecretStore;
use super::memory_store::MemorySecretStore;
use super::traits::{SecretInfo, SecretStore, SecretStoreError, SecretStoreResult};

/// Tries each store in order; the first hit wins
///
/// Writes go to the first store.
///
/// # Example
///
/// ```
/// use toolgate_core::secrets::{SecretStore, ChainSecretStore, EnvSecretStore, MemorySecretStore};
/// use std::sync::Arc;
///
/// let overrides = Arc::new(MemorySecretStore::new());
/// let chain = ChainSecretStore::new(vec![overrides, Arc::new(EnvSecretStore::new())]);
/// chain.store("weather", "wk-test").unwrap();
/// ```
pub struct ChainSecretStore {
    stores: Vec<Arc<dyn SecretStore>>,
}

impl ChainSecretStore {
    pub fn new(stores: Vec<Arc<dyn SecretStore>>) -> Self {
        Self { stores }
    }

    /// Explicit values in memory, then the environment
    pub fn with_overrides<K, V>(overrides: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let memory: Arc<dyn SecretStore> = Arc::new(MemorySecretStore::with_secrets(overrides));
        Self::new(vec![memory, Arc::new(EnvSecretStore::new())])
    }

    pub fn stores(&self) -> &[Arc<dyn SecretStore>] {
        &self.stores
    }
}

impl SecretStore for ChainSecretStore {
    fn name(&self) -> &str {
        "chain"
    }

    fn is_available(&self) -> bool {
        self.stores.iter().any(|s| s.is_available())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.stores
            .iter()
            .filter(|s| s.is_available())
            .find_map(|s| s.get(key))
    }

    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()> {
        match self.stores.first() {
            Some(store) => store.store(key, value),
            None => Err(SecretStoreError::Other("empty store chain".to_string())),
        }
    }

    fn delete(&self, key: &str) -> SecretStoreResult<()> {
        // Read-only members are skipped
        for store in self.stores.iter().filter(|s| s.has(key)) {
            let _ = store.delete(key);
        }
        Ok(())
    }

    fn get_info(&self, key: &str) -> SecretInfo {
        self.stores
            .iter()
            .filter(|s| s.is_available())
            .find(|s| s.has(key))
            .map(|s| SecretInfo::new(true, s.name()))
            .unwrap_or_else(SecretInfo::not_found)
    }
}

impl std::fmt::Debug for ChainSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainSecretStore")
            .field("stores", &format!("[{} stores]", self.stores.len()))
            .finish()
    }
}
