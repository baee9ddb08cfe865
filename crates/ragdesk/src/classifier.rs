//! Question topic classification via an external language model.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ClassifierConfig;

const GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

/// Maximum number of tags kept per question.
pub const MAX_TAGS: usize = 5;

#[async_trait]
pub trait QuestionClassifier: Send + Sync {
    /// Return short topic tags for `question`.
    async fn classify(&self, question: &str) -> Result<Vec<String>>;
}

/// Classifier used when none is configured. Always yields no tags.
pub struct DisabledClassifier;

#[async_trait]
impl QuestionClassifier for DisabledClassifier {
    async fn classify(&self, _question: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

pub fn create_classifier(config: &ClassifierConfig) -> Result<Arc<dyn QuestionClassifier>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledClassifier)),
        "gemini" => Ok(Arc::new(GeminiClassifier::new(config)?)),
        other => bail!("Unknown classifier provider: {}", other),
    }
}

pub fn classifier_prompt(question: &str) -> String {
    format!(
        "You are a classifier. Given the following DevOps user question, return a \
         comma-separated list of short tags describing the topic(s). Only return tags, \
         no extra text.\n\nQuestion: {}\n\nTags:",
        question
    )
}

/// Split a model reply on commas and newlines into at most [`MAX_TAGS`]
/// trimmed, non-empty tags.
pub fn parse_tags(reply: &str) -> Vec<String> {
    reply
        .split([',', '\n'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .take(MAX_TAGS)
        .map(str::to_string)
        .collect()
}

/// Classifier calling the Gemini `generateContent` endpoint.
pub struct GeminiClassifier {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
}

impl GeminiClassifier {
    /// Reads the API key from the environment variable named by
    /// `config.api_key_env`.
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            anyhow::anyhow!("{} environment variable not set", config.api_key_env)
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let url = config
            .url
            .as_deref()
            .unwrap_or(GEMINI_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            url,
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl QuestionClassifier for GeminiClassifier {
    async fn classify(&self, question: &str) -> Result<Vec<String>> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": classifier_prompt(question) }] }]
        });

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Gemini API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        let reply = json
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|t| t.as_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid Gemini response: missing candidate text"))?;

        Ok(parse_tags(reply))
    }
}
