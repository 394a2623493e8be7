//! Error types for resource documents and sync operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::translation::TranslationError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to parse {location}: {message}")]
    Parse { location: String, message: String },

    #[error("key `{0}` not found")]
    KeyNotFound(String),

    #[error("key `{0}` already exists")]
    DuplicateKey(String),

    #[error("no target configured for language `{0}`")]
    LanguageNotFound(String),

    #[error("translation to `{language}` failed: {source}")]
    Translation {
        language: String,
        #[source]
        source: TranslationError,
    },

    #[error("document has no location to flush to")]
    NoLocation,

    #[error("target index {index} is out of range ({count} targets configured)")]
    TargetIndex { index: usize, count: usize },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn parse(location: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            location: location.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
