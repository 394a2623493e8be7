mod client;
mod language;
mod prompt;

use async_trait::async_trait;
use thiserror::Error;

use crate::resource::ResourceSet;

pub use client::{TranslationClient, TranslationRequest};
pub use language::{KNOWN_LANGUAGES, language_name};

/// Errors produced by a [`Translator`].
#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("failed to connect to API endpoint {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API response contained no message content")]
    EmptyResponse,

    #[error("response is not a flat JSON object of strings: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("response is missing keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),

    #[error("{0}")]
    Backend(String),
}

/// Batch translation of resource entries.
///
/// Implementations receive a flat key/value batch and must return the same
/// keys with translated values, keeping `\n` tokens intact.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        entries: &ResourceSet,
        target_language: &str,
    ) -> Result<ResourceSet, TranslationError>;
}

/// Checks that `response` covers every key of `request`.
///
/// Keys the response adds on its own are dropped, and the result follows the
/// request's order.
pub fn ensure_complete(
    request: &ResourceSet,
    response: &ResourceSet,
) -> Result<ResourceSet, TranslationError> {
    let missing: Vec<String> = request
        .keys()
        .filter(|key| !response.contains_key(key))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(TranslationError::MissingKeys(missing));
    }

    Ok(request
        .keys()
        .filter_map(|key| response.get(key).map(|value| (key, value)))
        .collect())
}
