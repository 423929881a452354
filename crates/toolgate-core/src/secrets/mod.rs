//! Secret storage for API keys
//!
//! Tool credentials and model-provider keys are looked up by logical name
//! (`weather`, `tavily`, `groq`, ...) through the `SecretStore` trait:
//! - `EnvSecretStore` reads environment variables (including a loaded `.env`)
//! - `MemorySecretStore` holds values in memory (tests, `--secret` overrides)
//! - `ChainSecretStore` tries several stores in order

mod traits;
mod env_store;
mod memory_store;
mod chain_store;

pub use traits::{SecretStore, SecretInfo, SecretStoreError, SecretStoreResult};
pub use env_store::EnvSecretStore;
pub use memory_store::MemorySecretStore;
pub use chain_store::ChainSecretStore;
