/// Bounded worker pool for batch embedding
use super::{EmbeddingError, EmbeddingProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

/// Fans embedding requests out over at most `workers` concurrent calls.
///
/// The semaphore is created once and shared by every batch, so the bound
/// holds across calls as well as within one.
pub struct EmbeddingPool {
    provider: Arc<dyn EmbeddingProvider>,
    semaphore: Arc<Semaphore>,
    workers: usize,
}

impl EmbeddingPool {
    /// Create a pool; `workers` is clamped to at least 1.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            provider,
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Embed every text; `output[i]` is the embedding of `texts[i]`.
    ///
    /// The first failing input fails the whole batch, the remaining requests
    /// are aborted and nothing is returned for the inputs that did succeed.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let mut tasks = JoinSet::new();
        for (index, text) in texts.iter().cloned().enumerate() {
            let provider = Arc::clone(&self.provider);
            let semaphore = Arc::clone(&self.semaphore);
            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => provider.embed(&text).await,
                    Err(e) => Err(EmbeddingError::Worker(format!("pool closed: {}", e))),
                };
                (index, result)
            });
        }

        let mut slots: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined.map_err(|e| EmbeddingError::Worker(e.to_string()))?;
            match result {
                Ok(embedding) => slots[index] = Some(embedding),
                Err(source) => {
                    tasks.abort_all();
                    return Err(EmbeddingError::Batch {
                        index,
                        source: Box::new(source),
                    });
                }
            }
        }

        let embeddings = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| EmbeddingError::Worker(format!("no result for input {}", index)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        check_dimensions(&embeddings)?;

        debug!(
            "Embedded batch of {} texts in {:?} ({} workers)",
            texts.len(),
            start.elapsed(),
            self.workers
        );

        Ok(embeddings)
    }

    /// Embed a single query text.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| EmbeddingError::Worker(format!("pool closed: {}", e)))?;

        self.provider.embed(text).await
    }
}

fn check_dimensions(embeddings: &[Vec<f32>]) -> Result<(), EmbeddingError> {
    let Some(expected) = embeddings.first().map(Vec::len) else {
        return Ok(());
    };

    for (index, embedding) in embeddings.iter().enumerate() {
        if embedding.len() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                index,
                expected,
                actual: embedding.len(),
            });
        }
    }
    Ok(())
}
