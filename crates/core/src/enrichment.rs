use crate::traits::Enricher;
use crate::EnrichmentError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

pub const SUMMARY_INPUT_CHARS: usize = 8_000;
pub const SUMMARY_MAX_TOKENS: u32 = 250;
pub const CLASSIFY_INPUT_CHARS: usize = 4_000;
pub const CLASSIFY_MAX_TOKENS: u32 = 10;

pub const DEFAULT_LABELS: &[&str] = &[
    "code", "notes", "school", "work", "finance", "personal", "other",
];

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const SUMMARY_SYSTEM_PROMPT: &str = "You are an expert summarization engine.";
const CLASSIFY_SYSTEM_PROMPT: &str = "You are a precise document classifier.";

#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl EnrichmentConfig {
    /// Reads `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `OPENAI_MODEL`.
    pub fn from_env() -> Result<Self, EnrichmentError> {
        let api_key = non_blank_env("OPENAI_API_KEY").ok_or_else(|| {
            EnrichmentError::MissingCredential("OPENAI_API_KEY is not set".to_string())
        })?;

        let base_url =
            non_blank_env("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = non_blank_env("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key,
            base_url,
            model,
        })
    }
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let value = value.trim().to_string();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

/// Enricher backed by an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiEnricher {
    endpoint: Url,
    api_key: String,
    model: String,
    client: Client,
}

impl OpenAiEnricher {
    pub fn new(config: EnrichmentConfig) -> Result<Self, EnrichmentError> {
        if config.api_key.trim().is_empty() {
            return Err(EnrichmentError::MissingCredential(
                "provider api key is empty".to_string(),
            ));
        }

        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&base)?.join("chat/completions")?;

        Ok(Self {
            endpoint,
            api_key: config.api_key,
            model: config.model,
            client: Client::new(),
        })
    }

    pub fn from_env() -> Result<Self, EnrichmentError> {
        Self::new(EnrichmentConfig::from_env()?)
    }

    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<Value, EnrichmentError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
            "max_tokens": max_tokens,
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::BackendResponse {
                backend: self.endpoint.to_string(),
                details: format!("{status}: {details}"),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Enricher for OpenAiEnricher {
    async fn summarize(&self, text: &str) -> Result<String, EnrichmentError> {
        let prompt = summary_prompt(text);
        let payload = self
            .complete(SUMMARY_SYSTEM_PROMPT, &prompt, SUMMARY_MAX_TOKENS)
            .await?;
        completion_text(&payload)
    }

    async fn classify(&self, text: &str, labels: &[String]) -> Result<String, EnrichmentError> {
        let prompt = classify_prompt(text, labels);
        let payload = self
            .complete(CLASSIFY_SYSTEM_PROMPT, &prompt, CLASSIFY_MAX_TOKENS)
            .await?;
        classify_label(&payload)
    }
}

/// Returns at most `max_chars` characters of `text` without splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

pub fn summary_prompt(text: &str) -> String {
    format!(
        "Summarize the following document in 3-5 bullet points. \
         Focus on key ideas, topics, and important information. \
         Avoid unnecessary detail.\n\nDocument:\n{}",
        truncate_chars(text, SUMMARY_INPUT_CHARS)
    )
}

pub fn classify_prompt(text: &str, labels: &[String]) -> String {
    let labels = active_labels(labels).join(", ");

    format!(
        "Classify the following document into exactly one of these categories: {labels}.\n\
         Respond with the category name only and nothing else.\n\nDocument:\n{}",
        truncate_chars(text, CLASSIFY_INPUT_CHARS)
    )
}

/// The configured vocabulary, or the default one when none is configured.
pub fn active_labels(labels: &[String]) -> Vec<String> {
    if labels.is_empty() {
        DEFAULT_LABELS.iter().map(|label| label.to_string()).collect()
    } else {
        labels.to_vec()
    }
}

/// Maps a model answer such as `" Finance.\n"` onto a label from the vocabulary.
pub fn match_label(raw: &str, labels: &[String]) -> Option<String> {
    let answer = raw
        .trim()
        .trim_matches(|ch: char| ch.is_ascii_punctuation() || ch.is_whitespace());
    if answer.is_empty() {
        return None;
    }

    active_labels(labels)
        .into_iter()
        .find(|label| label.eq_ignore_ascii_case(answer))
}

fn classify_label(payload: &Value) -> Result<String, EnrichmentError> {
    let label = completion_text(payload)?.trim().to_string();
    if label.is_empty() {
        return Err(EnrichmentError::EmptyResponse);
    }
    Ok(label)
}

fn completion_text(payload: &Value) -> Result<String, EnrichmentError> {
    payload
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(EnrichmentError::EmptyResponse)
}
