//! Embedding provider implementations.
//!
//! Implements [`Embedder`] for the backends selectable in `[embedding]`:
//! - **`disabled`**: no embedder; the vector index reports not ready.
//! - **`hash`**: [`HashEmbedder`], offline and deterministic.
//! - **`openai`**: [`OpenAIEmbedder`], `POST /v1/embeddings`.
//! - **`ollama`**: [`OllamaEmbedder`], `POST /api/embed`.
//!
//! # Retry Strategy
//!
//! The HTTP providers use exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub use ragdesk_core::embedding::{Embedder, HashEmbedder};

use crate::config::EmbeddingConfig;

const OPENAI_URL: &str = "https://api.openai.com";
const OLLAMA_URL: &str = "http://localhost:11434";

/// Build the embedder selected by `config`, or `None` when disabled.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Option<Arc<dyn Embedder>>> {
    let embedder: Arc<dyn Embedder> = match config.provider.as_str() {
        "disabled" => return Ok(None),
        "hash" => Arc::new(HashEmbedder::new(required_dims(config)?)),
        "openai" => Arc::new(OpenAIEmbedder::new(config)?),
        "ollama" => Arc::new(OllamaEmbedder::new(config)?),
        other => bail!("Unknown embedding provider: {}", other),
    };
    Ok(Some(embedder))
}

fn required_dims(config: &EmbeddingConfig) -> Result<usize> {
    match config.dims {
        Some(d) if d > 0 => Ok(d),
        _ => bail!("embedding.dims required for provider '{}'", config.provider),
    }
}

fn required_model(config: &EmbeddingConfig) -> Result<String> {
    config.model.clone().ok_or_else(|| {
        anyhow::anyhow!(
            "embedding.model required for provider '{}'",
            config.provider
        )
    })
}

/// Shared HTTP settings for the network providers.
struct HttpSettings {
    client: reqwest::Client,
    url: String,
    batch_size: usize,
    max_retries: u32,
}

impl HttpSettings {
    fn new(config: &EmbeddingConfig, default_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| default_url.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            client,
            url,
            batch_size: config.batch_size.max(1),
            max_retries: config.max_retries,
        })
    }
}

/// POST `body` to `url`, retrying transient failures, and return the JSON
/// response.
async fn post_with_retry(
    http: &HttpSettings,
    label: &str,
    url: &str,
    bearer: Option<&str>,
    body: &serde_json::Value,
) -> Result<serde_json::Value> {
    let mut last_err = None;

    for attempt in 0..=http.max_retries {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s, 8s, ...
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            debug!(provider = label, attempt, ?delay, "retrying embedding request");
            tokio::time::sleep(delay).await;
        }

        let mut request = http
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(token) = bearer {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return Ok(response.json().await?);
                }

                // Rate limited or server error, retry
                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    warn!(provider = label, %status, "transient embedding API error");
                    last_err = Some(anyhow::anyhow!(
                        "{} API error {}: {}",
                        label,
                        status,
                        body_text
                    ));
                    continue;
                }

                // Client error (not 429), fail fast
                let body_text = response.text().await.unwrap_or_default();
                bail!("{} API error {}: {}", label, status, body_text);
            }
            Err(e) => {
                warn!(provider = label, error = %e, "embedding API connection error");
                last_err = Some(anyhow::anyhow!(
                    "{} connection error (is it reachable at {}?): {}",
                    label,
                    http.url,
                    e
                ));
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("{} embedding failed after retries", label)))
}

fn check_dims(label: &str, vectors: &[Vec<f32>], dims: usize) -> Result<()> {
    if let Some(v) = vectors.iter().find(|v| v.len() != dims) {
        bail!(
            "{} returned a {}-dimensional vector, expected embedding.dims = {}",
            label,
            v.len(),
            dims
        );
    }
    Ok(())
}

// ============ OpenAI ============

/// Embedder backed by the OpenAI embeddings API.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAIEmbedder {
    model: String,
    dims: usize,
    api_key: String,
    http: HttpSettings,
}

impl OpenAIEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = required_model(config)?;
        let dims = required_dims(config)?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        Ok(Self {
            model,
            dims,
            api_key,
            http: HttpSettings::new(config, OPENAI_URL)?,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embeddings", self.http.url);
        let mut out = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.http.batch_size) {
            let body = serde_json::json!({
                "model": self.model,
                "input": batch,
            });
            let json =
                post_with_retry(&self.http, "OpenAI", &url, Some(&self.api_key), &body).await?;
            out.extend(parse_openai_response(&json)?);
        }

        check_dims("OpenAI", &out, self.dims)?;
        Ok(out)
    }
}

/// Extract `data[].embedding`, ordered by each item's `index` field.
fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing data array"))?;

    let mut indexed = Vec::with_capacity(data.len());

    for (pos, item) in data.iter().enumerate() {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing embedding"))?;
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .unwrap_or(pos as u64);

        indexed.push((index, to_f32_vec(embedding)));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

// ============ Ollama ============

/// Embedder backed by a local Ollama instance.
pub struct OllamaEmbedder {
    model: String,
    dims: usize,
    http: HttpSettings,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            model: required_model(config)?,
            dims: required_dims(config)?,
            http: HttpSettings::new(config, OLLAMA_URL)?,
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.http.url);
        let mut out = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.http.batch_size) {
            let body = serde_json::json!({
                "model": self.model,
                "input": batch,
            });
            let json = post_with_retry(&self.http, "Ollama", &url, None, &body).await?;
            out.extend(parse_ollama_response(&json)?);
        }

        check_dims("Ollama", &out, self.dims)?;
        Ok(out)
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing embeddings array"))?;

    embeddings
        .iter()
        .map(|embedding| {
            embedding
                .as_array()
                .map(|values| to_f32_vec(values))
                .ok_or_else(|| {
                    anyhow::anyhow!("Invalid Ollama response: embedding is not an array")
                })
        })
        .collect()
}

fn to_f32_vec(values: &[serde_json::Value]) -> Vec<f32> {
    values
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
        .collect()
}
