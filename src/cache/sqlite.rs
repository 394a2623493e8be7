use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

use crate::paths;
use crate::translation::TranslationRequest;

/// Stores raw model replies for translation batches, keyed by request hash.
#[derive(Debug, Clone)]
pub struct CacheManager {
    db_path: PathBuf,
}

impl CacheManager {
    /// Opens the cache under `$XDG_CACHE_HOME/stringsync`.
    pub fn new() -> Result<Self> {
        Self::open_in(&paths::cache_dir())
    }

    /// Opens (and creates if needed) the cache database inside `cache_dir`.
    pub fn open_in(cache_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(cache_dir).with_context(|| {
            format!("Failed to create cache directory: {}", cache_dir.display())
        })?;

        let manager = Self {
            db_path: cache_dir.join("translations.db"),
        };
        manager.init_db()?;

        Ok(manager)
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.connect()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS translations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cache_key TEXT UNIQUE NOT NULL,
                source_entries TEXT NOT NULL,
                translated_entries TEXT NOT NULL,
                target_language TEXT NOT NULL,
                model TEXT NOT NULL,
                endpoint TEXT NOT NULL,
                prompt_hash TEXT NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                accessed_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )
        .context("Failed to create translations table")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_cache_key ON translations(cache_key)",
            [],
        )
        .context("Failed to create index")?;

        Ok(())
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .with_context(|| format!("Failed to open cache database: {}", self.db_path.display()))
    }

    pub fn get(&self, request: &TranslationRequest) -> Result<Option<String>> {
        let cache_key = request.cache_key();
        let conn = self.connect()?;

        let result: Option<String> = conn
            .query_row(
                "SELECT translated_entries FROM translations WHERE cache_key = ?1",
                [&cache_key],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query translation cache")?;

        if result.is_some() {
            conn.execute(
                "UPDATE translations SET accessed_at = CURRENT_TIMESTAMP WHERE cache_key = ?1",
                [&cache_key],
            )?;
        }

        Ok(result)
    }

    pub fn put(&self, request: &TranslationRequest, translated_entries: &str) -> Result<()> {
        let cache_key = request.cache_key();
        let prompt_hash = TranslationRequest::prompt_hash();
        let conn = self.connect()?;

        conn.execute(
            "INSERT OR REPLACE INTO translations
             (cache_key, source_entries, translated_entries, target_language, model, endpoint, prompt_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                cache_key,
                request.source_entries,
                translated_entries,
                request.target_language,
                request.model,
                request.endpoint,
                prompt_hash,
            ],
        )
        .context("Failed to insert translation into cache")?;

        Ok(())
    }
}
