/// Embedding provider trait and Ollama implementation
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding client initialization failed: {0}")]
    InitializationError(String),

    #[error("Embedding request failed: {0}")]
    Request(String),

    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),

    #[error("Dimension mismatch at input {index}: expected {expected}, got {actual}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Embedding failed for batch input {index}: {source}")]
    Batch {
        index: usize,
        #[source]
        source: Box<EmbeddingError>,
    },

    #[error("Embedding worker failed: {0}")]
    Worker(String),
}

/// Trait for embedding providers
///
/// One call embeds one text. Batching and concurrency live in
/// [`EmbeddingPool`](super::EmbeddingPool).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Option<Vec<f32>>,
}

/// Embeddings served by a local Ollama instance (`/api/embeddings`)
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::InitializationError(e.to_string()))?;

        tracing::info!("Using Ollama embedding model {} at {}", model, base_url);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&serde_json::json!({
                "model": self.model,
                "prompt": text,
            }))
            .send()
            .await
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Request(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let parsed: OllamaEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;

        match parsed.embedding {
            Some(embedding) if !embedding.is_empty() => Ok(embedding),
            Some(_) => Err(EmbeddingError::MalformedResponse(
                "Empty embedding vector".to_string(),
            )),
            None => Err(EmbeddingError::MalformedResponse(
                "Missing 'embedding' field".to_string(),
            )),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
