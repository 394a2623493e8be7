use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::borrow::Cow;

use super::prompt::{SYSTEM_PROMPT_TEMPLATE, build_system_prompt};
use super::{TranslationError, Translator, ensure_complete};
use crate::cache::CacheManager;
use crate::resource::ResourceSet;
use crate::ui::Style;

#[derive(Debug, Clone)]
pub struct TranslationRequest {
    /// The batch serialized as a JSON object.
    pub source_entries: String,
    pub target_language: String,
    pub model: String,
    pub endpoint: String,
}

impl TranslationRequest {
    pub fn new(entries: &ResourceSet, target_language: &str, model: &str, endpoint: &str) -> Self {
        Self {
            source_entries: serde_json::to_string(entries).unwrap_or_default(),
            target_language: target_language.to_string(),
            model: model.to_string(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Compute cache key for this request
    pub fn cache_key(&self) -> String {
        let prompt_hash = Self::prompt_hash();

        let cache_input = serde_json::json!({
            "source_entries": self.source_entries,
            "target_language": self.target_language,
            "model": self.model,
            "endpoint": self.endpoint,
            "prompt_hash": prompt_hash
        });

        let mut hasher = Sha256::new();
        hasher.update(cache_input.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Compute hash of the system prompt template
    pub fn prompt_hash() -> String {
        let mut hasher = Sha256::new();
        hasher.update(SYSTEM_PROMPT_TEMPLATE.as_bytes());
        hex::encode(hasher.finalize())
    }
}

// Use Cow to avoid cloning strings that are only borrowed for serialization
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Cow<'a, str>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Translator backed by an OpenAI-compatible chat completions endpoint.
pub struct TranslationClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    cache: Option<CacheManager>,
}

impl TranslationClient {
    pub fn new(endpoint: String, api_key: Option<String>, model: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            api_key,
            model,
            cache: None,
        }
    }

    /// Serves repeated batches from `cache` and stores fresh results in it.
    #[must_use]
    pub fn with_cache(mut self, cache: CacheManager) -> Self {
        self.cache = Some(cache);
        self
    }

    async fn complete(
        &self,
        entries: &ResourceSet,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.endpoint.trim_end_matches('/')
        );

        let chat_request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: Cow::Owned(build_system_prompt(target_language)),
                },
                Message {
                    role: "user",
                    content: Cow::Owned(serde_json::to_string_pretty(entries)?),
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let mut http_request = self.client.post(&url).json(&chat_request);

        // Add Authorization header if API key is present
        if let Some(api_key) = &self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = http_request
            .send()
            .await
            .map_err(|source| TranslationError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| TranslationError::Request { url, source })?;

        if !status.is_success() {
            return Err(TranslationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body)?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(TranslationError::EmptyResponse)
    }

    fn cached(&self, request: &TranslationRequest) -> Option<ResourceSet> {
        let cache = self.cache.as_ref()?;
        match cache.get(request) {
            Ok(hit) => hit.and_then(|content| parse_translation(&content).ok()),
            Err(e) => {
                crate::warn!("{} {e:#}", Style::warning("Cache lookup failed:"));
                None
            }
        }
    }

    fn store(&self, request: &TranslationRequest, content: &str) {
        if let Some(cache) = &self.cache
            && let Err(e) = cache.put(request, content)
        {
            crate::warn!("{} {e:#}", Style::warning("Cache write failed:"));
        }
    }
}

#[async_trait]
impl Translator for TranslationClient {
    async fn translate(
        &self,
        entries: &ResourceSet,
        target_language: &str,
    ) -> Result<ResourceSet, TranslationError> {
        let request = TranslationRequest::new(entries, target_language, &self.model, &self.endpoint);
        if let Some(hit) = self.cached(&request) {
            return Ok(hit);
        }

        let content = self.complete(entries, target_language).await?;
        let translated = ensure_complete(entries, &parse_translation(&content)?)?;
        self.store(&request, &content);

        Ok(translated)
    }
}

/// Parses a model reply into entries, tolerating a Markdown code fence around the JSON.
fn parse_translation(content: &str) -> Result<ResourceSet, TranslationError> {
    let trimmed = content.trim();
    let json = trimmed
        .strip_prefix("```")
        .and_then(|fenced| fenced.split_once('\n'))
        .map_or(trimmed, |(_, body)| {
            body.trim_end().strip_suffix("```").unwrap_or(body)
        });

    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(language: &str) -> TranslationRequest {
        let entries: ResourceSet = [("greeting", "Hi")].into_iter().collect();
        TranslationRequest::new(&entries, language, "gemini-2.5-flash", "http://localhost")
    }

    #[test]
    fn test_cache_key_is_stable() {
        assert_eq!(request("fr").cache_key(), request("fr").cache_key());
        assert_eq!(request("fr").cache_key().len(), 64);
    }

    #[test]
    fn test_cache_key_depends_on_language() {
        assert_ne!(request("fr").cache_key(), request("ja").cache_key());
    }

    #[test]
    fn test_parse_translation_plain_json() {
        let set = parse_translation(r#"{"greeting": "Bonjour", "bye": "Au revoir"}"#).unwrap();
        assert_eq!(set.get("greeting"), Some("Bonjour"));
        assert_eq!(set.keys().collect::<Vec<_>>(), ["greeting", "bye"]);
    }

    #[test]
    fn test_parse_translation_code_fence() {
        let set = parse_translation("```json\n{\"greeting\": \"Hallo\\\\nWelt\"}\n```").unwrap();
        assert_eq!(set.get("greeting"), Some("Hallo\\nWelt"));
    }

    #[test]
    fn test_parse_translation_rejects_non_object() {
        let err = parse_translation("[\"Bonjour\"]").unwrap_err();
        assert!(matches!(err, TranslationError::Malformed(_)));
    }

    #[test]
    fn test_request_serializes_json_mode() {
        let chat_request = ChatCompletionRequest {
            model: "m",
            messages: vec![Message {
                role: "user",
                content: Cow::Borrowed("{}"),
            }],
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };
        let json = serde_json::to_value(&chat_request).unwrap();

        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["temperature"], 0.0);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_request_error() {
        let client = TranslationClient::new(
            "http://127.0.0.1:9".to_string(),
            None,
            "model".to_string(),
        );
        let entries: ResourceSet = [("greeting", "Hi")].into_iter().collect();

        let err = client.translate(&entries, "fr").await.unwrap_err();
        assert!(matches!(err, TranslationError::Request { .. }));
    }
}
