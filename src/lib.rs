//! # stringsync - keep localized `strings.xml` files in sync
//!
//! `stringsync` treats one `strings.xml` as the source of truth and keeps a
//! set of localized copies up to date by sending only the entries that
//! changed to an OpenAI-compatible chat completions endpoint.
//!
//! ## Features
//!
//! - **Layout-preserving edits**: comments, plurals and attributes survive
//!   every write; only touched `<string>` elements are re-serialized
//! - **Incremental translation**: missing entries, recently appended entries
//!   or a hand-picked list of keys
//! - **Isolated fan-out**: targets are translated concurrently and one
//!   failing language never blocks the others
//! - **Caching**: repeated batches are served from `SQLite`
//!
//! ## Quick Start
//!
//! ```bash
//! # Add an entry to the base file and translate it everywhere
//! stringsync add welcome_title "Welcome back!"
//!
//! # Fill in whatever the targets are missing
//! stringsync sync
//!
//! # See what the first target lacks
//! stringsync compare 0
//! ```
//!
//! ## Configuration
//!
//! The project file `stringsync.toml` names the documents; provider settings
//! can live there or in `~/.config/stringsync/config.toml`:
//!
//! ```toml
//! [stringsync]
//! provider = "openrouter"
//! model = "google/gemini-2.5-flash"
//!
//! [resources]
//! base = "src/commonMain/moko-resources/base/strings.xml"
//! targets = ["src/commonMain/moko-resources/fr/strings.xml"]
//!
//! [providers.openrouter]
//! endpoint = "https://openrouter.ai/api"
//! api_key_env = "OPENROUTER_API_KEY"
//! ```

/// Translation cache management using `SQLite`.
pub mod cache;

/// Command-line interface definitions and handlers.
pub mod cli;

/// Configuration file management and provider settings.
pub mod config;

/// Error types shared by documents and sync operations.
pub mod error;

/// File system utilities.
pub mod fs;

/// Interactive value entry through `$EDITOR`.
pub mod input;

/// Global output configuration (quiet mode, colors, stderr/stdout routing).
pub mod output;

/// XDG-style path utilities for configuration and cache.
pub mod paths;

/// `strings.xml` documents, entry sets, escaping and diffing.
pub mod resource;

/// Coordination of base and target documents.
pub mod sync;

/// Translation client for OpenAI-compatible APIs.
pub mod translation;

/// Terminal UI components (spinner, colors).
pub mod ui;

pub use error::{Error, Result};
