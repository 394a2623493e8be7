use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::paths;
use crate::resource::DEFAULT_CHUNK_SIZE;
use crate::ui::Style;

/// A configuration problem the user has to fix (missing setting, unknown
/// provider, unreadable file).
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Default settings in the `[stringsync]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringsyncConfig {
    /// Default provider name.
    pub provider: Option<String>,
    /// Default model name.
    pub model: Option<String>,
    /// Maximum number of targets translated at once.
    pub workers: Option<usize>,
    /// Number of entries per request when translating a whole file.
    pub chunk_size: Option<usize>,
}

/// The `[resources]` section: which documents to keep in sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesConfig {
    /// The source-of-truth document.
    pub base: Option<PathBuf>,
    /// Localized documents. Each one's parent directory names its language.
    #[serde(default)]
    pub targets: Vec<PathBuf>,
}

/// Configuration for a translation provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The OpenAI-compatible API endpoint URL.
    pub endpoint: String,
    /// API key stored directly in config (not recommended).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable name containing the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// List of available models for this provider.
    #[serde(default)]
    pub models: Vec<String>,
}

impl ProviderConfig {
    /// Gets the API key, preferring environment variable over config file.
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(env_var) = &self.api_key_env
            && let Ok(key) = std::env::var(env_var)
            && !key.is_empty()
        {
            return Some(key);
        }
        self.api_key.clone()
    }

    /// Returns `true` if this provider requires an API key.
    pub const fn requires_api_key(&self) -> bool {
        self.api_key.is_some() || self.api_key_env.is_some()
    }
}

/// The schema shared by the user config and the project file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub stringsync: StringsyncConfig,
    #[serde(default)]
    pub resources: ResourcesConfig,
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl ConfigFile {
    /// Layers `overlay` on top of `self`; set values in `overlay` win.
    #[must_use]
    pub fn merge(mut self, overlay: Self) -> Self {
        let settings = overlay.stringsync;
        self.stringsync = StringsyncConfig {
            provider: settings.provider.or(self.stringsync.provider),
            model: settings.model.or(self.stringsync.model),
            workers: settings.workers.or(self.stringsync.workers),
            chunk_size: settings.chunk_size.or(self.stringsync.chunk_size),
        };

        if overlay.resources.base.is_some() {
            self.resources.base = overlay.resources.base;
        }
        if !overlay.resources.targets.is_empty() {
            self.resources.targets = overlay.resources.targets;
        }

        self.providers.extend(overlay.providers);
        self
    }

    /// Rewrites relative resource paths so they are relative to `dir`.
    fn rebase_resources(&mut self, dir: &Path) {
        if let Some(base) = &self.resources.base {
            self.resources.base = Some(dir.join(base));
        }
        for target in &mut self.resources.targets {
            *target = dir.join(&*target);
        }
    }

    /// The configured documents, or an error naming what is missing.
    pub fn resources(&self) -> Result<ResolvedResources, ConfigError> {
        let base = self.resources.base.clone().ok_or_else(|| {
            ConfigError::new(
                "Missing required configuration: 'resources.base'\n\n\
                 Add it to the project file (stringsync.toml):\n  \
                 [resources]\n  \
                 base = \"path/to/base/strings.xml\"",
            )
        })?;

        Ok(ResolvedResources {
            base,
            targets: self.resources.targets.clone(),
        })
    }

    /// Worker and chunk settings, with defaults filled in.
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            workers: self
                .stringsync
                .workers
                .filter(|&workers| workers > 0)
                .unwrap_or_else(default_workers),
            chunk_size: self
                .stringsync
                .chunk_size
                .filter(|&size| size > 0)
                .unwrap_or(DEFAULT_CHUNK_SIZE),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Documents to synchronize, with paths ready to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResources {
    pub base: PathBuf,
    pub targets: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub workers: usize,
    pub chunk_size: usize,
}

/// Resolved translation settings after merging CLI arguments and config files.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub provider_name: String,
    pub endpoint: String,
    pub model: String,
    /// The API key (if required).
    pub api_key: Option<String>,
}

/// CLI overrides that take precedence over config file values.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub provider: Option<String>,
    pub model: Option<String>,
}

/// Resolves translation settings by merging CLI options with config values.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the provider or model is missing, the
/// provider is not configured, or its API key is not available.
pub fn resolve_config(
    options: &ResolveOptions,
    config_file: &ConfigFile,
) -> Result<ResolvedConfig, ConfigError> {
    let provider_name = options
        .provider
        .as_ref()
        .or(config_file.stringsync.provider.as_ref())
        .cloned()
        .ok_or_else(|| {
            ConfigError::new(
                "Missing required configuration: 'provider'\n\n\
                 Please provide it via:\n  \
                 - CLI option: stringsync --provider <name>\n  \
                 - Project file: stringsync.toml\n  \
                 - Config file: ~/.config/stringsync/config.toml",
            )
        })?;

    let provider_config = config_file.providers.get(&provider_name).ok_or_else(|| {
        let mut available: Vec<_> = config_file.providers.keys().map(String::as_str).collect();
        available.sort_unstable();
        if available.is_empty() {
            ConfigError::new(format!(
                "Provider '{provider_name}' not found\n\n\
                 No providers configured. Add a [providers.{provider_name}] section \
                 to stringsync.toml or ~/.config/stringsync/config.toml"
            ))
        } else {
            ConfigError::new(format!(
                "Provider '{provider_name}' not found\n\n\
                 Available providers:\n  \
                 - {}",
                available.join("\n  - ")
            ))
        }
    })?;

    let model = options
        .model
        .as_ref()
        .or(config_file.stringsync.model.as_ref())
        .cloned()
        .ok_or_else(|| {
            ConfigError::new(
                "Missing required configuration: 'model'\n\n\
                 Please provide it via:\n  \
                 - CLI option: stringsync --model <name>\n  \
                 - Project file: stringsync.toml\n  \
                 - Config file: ~/.config/stringsync/config.toml",
            )
        })?;

    if !provider_config.models.is_empty() && !provider_config.models.contains(&model) {
        crate::warn!(
            "{} Model '{}' is not in the configured models list for '{}'\n\
             Configured models: {}\n\
             Proceeding anyway...\n",
            Style::warning("Warning:"),
            model,
            provider_name,
            provider_config.models.join(", ")
        );
    }

    let api_key = provider_config.get_api_key();

    if provider_config.requires_api_key() && api_key.is_none() {
        let env_var = provider_config.api_key_env.as_deref().unwrap_or("API_KEY");
        return Err(ConfigError::new(format!(
            "Provider '{provider_name}' requires an API key\n\n\
             Set the {env_var} environment variable:\n  \
             export {env_var}=\"your-api-key\"\n\n\
             Or set api_key in the provider's configuration"
        )));
    }

    Ok(ResolvedConfig {
        provider_name,
        endpoint: provider_config.endpoint.clone(),
        model,
        api_key,
    })
}

/// Loads the user config and the project file and layers them.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Uses `$XDG_CONFIG_HOME/stringsync/config.toml`, or
    /// `~/.config/stringsync/config.toml` if `XDG_CONFIG_HOME` is not set.
    pub fn new() -> Self {
        Self::with_path(paths::config_dir().join("config.toml"))
    }

    pub const fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Reads the user config. A missing file is an empty config.
    pub fn load(&self) -> Result<ConfigFile> {
        if !self.config_path.exists() {
            return Ok(ConfigFile::default());
        }
        read_config(&self.config_path)
    }

    /// Reads the project file and rebases its resource paths onto the
    /// file's directory. A missing file is an empty config.
    pub fn load_project(project_path: &Path) -> Result<ConfigFile> {
        if !project_path.exists() {
            return Ok(ConfigFile::default());
        }

        let mut project = read_config(project_path)?;
        let dir = project_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        project.rebase_resources(dir);

        Ok(project)
    }

    /// The user config overlaid with the project file.
    pub fn load_layered(&self, project_path: &Path) -> Result<ConfigFile> {
        let user = self.load()?;
        let project = Self::load_project(project_path)?;
        Ok(user.merge(project))
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn read_config(path: &Path) -> Result<ConfigFile> {
    let contents = fs::read_to_string(path).map_err(|e| {
        ConfigError::new(format!("Failed to read config file {}: {e}", path.display()))
    })?;

    toml::from_str(&contents)
        .map_err(|e| ConfigError::new(format!("Failed to parse {}: {e}", path.display())))
        .context("Invalid configuration")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const PROJECT: &str = r#"
[stringsync]
provider = "ollama"
model = "gemma3:12b"
chunk_size = 50

[resources]
base = "base/strings.xml"
targets = ["fr/strings.xml", "/abs/ja/strings.xml"]

[providers.ollama]
endpoint = "http://localhost:11434"
models = ["gemma3:12b"]
"#;

    fn provider(endpoint: &str) -> ProviderConfig {
        ProviderConfig {
            endpoint: endpoint.to_string(),
            api_key: None,
            api_key_env: None,
            models: vec![],
        }
    }

    #[test]
    fn test_load_missing_user_config_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp_dir.path().join("config.toml"));

        assert_eq!(manager.load().unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[stringsync\nprovider = ").unwrap();

        let err = ConfigManager::with_path(path).load().unwrap_err();
        assert!(err.chain().any(|cause| cause.is::<ConfigError>()));
    }

    #[test]
    fn test_project_paths_are_relative_to_project_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("stringsync.toml");
        fs::write(&path, PROJECT).unwrap();

        let project = ConfigManager::load_project(&path).unwrap();
        let resources = project.resources().unwrap();

        assert_eq!(resources.base, temp_dir.path().join("base/strings.xml"));
        assert_eq!(
            resources.targets,
            [
                temp_dir.path().join("fr/strings.xml"),
                PathBuf::from("/abs/ja/strings.xml")
            ]
        );
    }

    #[test]
    fn test_project_overrides_user_config() {
        let temp_dir = TempDir::new().unwrap();
        let user_path = temp_dir.path().join("config.toml");
        fs::write(
            &user_path,
            r#"
[stringsync]
provider = "openrouter"
model = "user-model"
workers = 2

[providers.openrouter]
endpoint = "https://openrouter.ai/api"
"#,
        )
        .unwrap();
        let project_path = temp_dir.path().join("stringsync.toml");
        fs::write(&project_path, PROJECT).unwrap();

        let config = ConfigManager::with_path(user_path)
            .load_layered(&project_path)
            .unwrap();

        assert_eq!(config.stringsync.provider.as_deref(), Some("ollama"));
        assert_eq!(config.stringsync.model.as_deref(), Some("gemma3:12b"));
        assert_eq!(config.stringsync.workers, Some(2));
        assert!(config.providers.contains_key("openrouter"));
        assert!(config.providers.contains_key("ollama"));
    }

    #[test]
    fn test_resources_require_base() {
        let err = ConfigFile::default().resources().unwrap_err();
        assert!(err.to_string().contains("resources.base"));
    }

    #[test]
    fn test_sync_settings_defaults() {
        let settings = ConfigFile::default().sync_settings();
        assert!(settings.workers >= 1);
        assert_eq!(settings.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_sync_settings_ignore_zero() {
        let mut config = ConfigFile::default();
        config.stringsync.workers = Some(0);
        config.stringsync.chunk_size = Some(0);

        let settings = config.sync_settings();
        assert!(settings.workers >= 1);
        assert_eq!(settings.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    #[serial]
    fn test_provider_get_api_key_from_env() {
        // SAFETY: tests touching the environment are serialized
        unsafe {
            std::env::set_var("STRINGSYNC_TEST_API_KEY", "test-key-value");
        }

        let provider = ProviderConfig {
            api_key: Some("fallback-key".to_string()),
            api_key_env: Some("STRINGSYNC_TEST_API_KEY".to_string()),
            ..provider("https://api.example.com")
        };

        assert_eq!(provider.get_api_key(), Some("test-key-value".to_string()));

        unsafe {
            std::env::remove_var("STRINGSYNC_TEST_API_KEY");
        }
    }

    #[test]
    fn test_provider_get_api_key_fallback() {
        let provider = ProviderConfig {
            api_key: Some("fallback-key".to_string()),
            api_key_env: Some("STRINGSYNC_TEST_NONEXISTENT_KEY".to_string()),
            ..provider("https://api.example.com")
        };

        assert_eq!(provider.get_api_key(), Some("fallback-key".to_string()));
    }

    fn create_test_config() -> ConfigFile {
        let mut providers = HashMap::new();
        providers.insert("ollama".to_string(), provider("http://localhost:11434"));
        providers.insert(
            "openrouter".to_string(),
            ProviderConfig {
                api_key_env: Some("STRINGSYNC_TEST_NONEXISTENT_API_KEY".to_string()),
                ..provider("https://openrouter.ai/api")
            },
        );

        ConfigFile {
            stringsync: StringsyncConfig {
                provider: Some("ollama".to_string()),
                model: Some("gemma3:12b".to_string()),
                ..StringsyncConfig::default()
            },
            providers,
            ..ConfigFile::default()
        }
    }

    #[test]
    fn test_resolve_config_falls_back_to_file() {
        let resolved = resolve_config(&ResolveOptions::default(), &create_test_config()).unwrap();

        assert_eq!(resolved.provider_name, "ollama");
        assert_eq!(resolved.endpoint, "http://localhost:11434");
        assert_eq!(resolved.model, "gemma3:12b");
        assert!(resolved.api_key.is_none());
    }

    #[test]
    fn test_resolve_config_missing_provider() {
        let err = resolve_config(&ResolveOptions::default(), &ConfigFile::default()).unwrap_err();
        assert!(err.to_string().contains("provider"));
    }

    #[test]
    fn test_resolve_config_provider_not_found() {
        let options = ResolveOptions {
            provider: Some("nonexistent".to_string()),
            model: None,
        };

        let err = resolve_config(&options, &create_test_config()).unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(err.to_string().contains("- ollama"));
    }

    #[test]
    fn test_resolve_config_missing_model() {
        let mut config = create_test_config();
        config.stringsync.model = None;

        let err = resolve_config(&ResolveOptions::default(), &config).unwrap_err();
        assert!(err.to_string().contains("model"));
    }

    #[test]
    fn test_resolve_config_api_key_required_but_missing() {
        let options = ResolveOptions {
            provider: Some("openrouter".to_string()),
            model: None,
        };

        let err = resolve_config(&options, &create_test_config()).unwrap_err();
        assert!(err.to_string().contains("API key"));
    }
}
