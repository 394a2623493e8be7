use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::cache::CacheManager;
use crate::config::{ConfigFile, ConfigManager, ResolveOptions, resolve_config};
use crate::resource::Document;
use crate::sync::{LanguageTarget, SyncCoordinator};
use crate::translation::TranslationClient;
use crate::ui::Style;

/// Global options shared by every project command.
#[derive(Debug, Clone)]
pub struct ProjectOptions {
    pub project: PathBuf,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub no_cache: bool,
}

/// The layered configuration of the current project.
pub struct Project {
    options: ProjectOptions,
    config: ConfigFile,
}

impl Project {
    pub fn load(options: ProjectOptions) -> Result<Self> {
        let config = ConfigManager::new().load_layered(&options.project)?;
        Ok(Self { options, config })
    }

    pub const fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Loads the base document and every target.
    pub fn documents(&self) -> Result<(Document, Vec<LanguageTarget>)> {
        let resources = self.config.resources()?;

        let base = Document::load(&resources.base).context("Failed to load the base document")?;
        let targets = resources
            .targets
            .iter()
            .map(|path| {
                LanguageTarget::load(path)
                    .with_context(|| format!("Failed to load target {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;

        if targets.is_empty() {
            crate::warn!(
                "{} no targets configured in [resources]",
                Style::warning("Warning:")
            );
        }

        Ok((base, targets))
    }

    /// A coordinator for commands that never translate.
    pub fn offline(&self) -> Result<SyncCoordinator<()>> {
        let (base, targets) = self.documents()?;
        Ok(SyncCoordinator::offline(base, targets))
    }

    /// A coordinator backed by the configured provider.
    pub fn online(&self) -> Result<SyncCoordinator<TranslationClient>> {
        let resolved = resolve_config(
            &ResolveOptions {
                provider: self.options.provider.clone(),
                model: self.options.model.clone(),
            },
            &self.config,
        )?;

        let mut client = TranslationClient::new(resolved.endpoint, resolved.api_key, resolved.model);
        if !self.options.no_cache {
            match CacheManager::new() {
                Ok(cache) => client = client.with_cache(cache),
                Err(e) => {
                    crate::warn!("{} {e:#}", Style::warning("Translation cache disabled:"));
                }
            }
        }

        let settings = self.config.sync_settings();
        let (base, targets) = self.documents()?;
        Ok(SyncCoordinator::new(base, targets, client)
            .with_workers(settings.workers)
            .with_chunk_size(settings.chunk_size))
    }
}
