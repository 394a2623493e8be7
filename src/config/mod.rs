//! Layered configuration: user config, project file and CLI overrides.

mod manager;

pub use manager::{
    ConfigError, ConfigFile, ConfigManager, ProviderConfig, ResolveOptions, ResolvedConfig,
    ResolvedResources, ResourcesConfig, StringsyncConfig, SyncSettings, resolve_config,
};
