//! Gateway configuration
//!
//! A single YAML file (`~/.config/toolgate/config.yaml` by default) holds every
//! tunable. All fields have defaults, so a missing file is a valid config.
//! Secrets never live in the file; they are resolved once at startup into
//! `Credentials` from a `SecretStore`.

mod file;
mod credentials;

pub use file::{
    AssistantSettings, ConfigError, ConfigResult, Endpoints, GatewayConfig, ModelSettings,
    QueryHint, RegistrySettings, ServerSettings,
};
pub use credentials::{Credentials, ToolConfig, CREDENTIAL_NAMES};
