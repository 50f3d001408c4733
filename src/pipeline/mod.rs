//! Indexing pipeline: extract → chunk → embed → store
//!
//! Documents are indexed one after another. A failure while embedding or
//! storing one document is recorded in the [`IndexReport`] and indexing moves
//! on to the next document; only a run in which every document fails is an
//! error.

use crate::chunking::{chunk_document, Document};
use crate::embedding::{EmbeddingError, EmbeddingPool};
use crate::extract::{self, ExtractionError};
use crate::store::{CollectionHandle, StoreAdapter, StoreError};
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to scan input folder: {0}")]
    Scan(#[from] ExtractionError),

    #[error("Failed to open collection: {0}")]
    Collection(#[from] StoreError),

    #[error("All {count} documents failed to index")]
    AllDocumentsFailed { count: usize },
}

/// Why a single document could not be indexed
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("storing chunk {chunk_id} failed after {stored} chunks: {source}")]
    Store {
        chunk_id: String,
        stored: usize,
        #[source]
        source: StoreError,
    },
}

/// Result of indexing one document
#[derive(Debug)]
pub enum DocumentOutcome {
    Indexed { source_index: usize, chunks: usize },
    Failed {
        source_index: usize,
        error: DocumentError,
    },
}

impl DocumentOutcome {
    pub fn source_index(&self) -> usize {
        match self {
            Self::Indexed { source_index, .. } | Self::Failed { source_index, .. } => *source_index,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Summary of an indexing run
#[derive(Debug)]
pub struct IndexReport {
    pub collection: CollectionHandle,
    pub outcomes: Vec<DocumentOutcome>,
    pub duration_ms: u64,
}

impl IndexReport {
    pub fn chunks_indexed(&self) -> usize {
        self.outcomes
            .iter()
            .map(|outcome| match outcome {
                DocumentOutcome::Indexed { chunks, .. } => *chunks,
                DocumentOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn indexed_documents(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_failed()).count()
    }

    pub fn failed_documents(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }
}

/// Scan `dir` and extract every supported file.
///
/// A file that fails to extract is logged and skipped. Its position is not
/// reused, so the remaining documents keep the same `source_index` they
/// would have had. If every file fails, the folder is reported as
/// [`PipelineError::AllDocumentsFailed`].
pub async fn load_documents(
    dir: &Path,
    source_extensions: &[String],
) -> Result<Vec<Document>, PipelineError> {
    let files = extract::scan_directory(dir, source_extensions)?;
    let found = files.len();
    info!("Found {} supported files in {}", found, dir.display());

    let mut documents = Vec::with_capacity(found);
    for (source_index, file) in files.into_iter().enumerate() {
        match extract::extract_async(file.path.clone(), file.kind).await {
            Ok(text) => {
                debug!(
                    "Extracted {} ({} bytes) as document {}",
                    file.path.display(),
                    text.len(),
                    source_index
                );
                documents.push(Document {
                    source_index,
                    path: file.path,
                    text,
                });
            }
            Err(e) => warn!("Skipping {}: {}", file.path.display(), e),
        }
    }

    if found > 0 && documents.is_empty() {
        return Err(PipelineError::AllDocumentsFailed { count: found });
    }

    Ok(documents)
}

/// Indexes documents into one collection
pub struct Indexer<'a> {
    pool: &'a EmbeddingPool,
    store: &'a StoreAdapter,
    collection: String,
}

impl<'a> Indexer<'a> {
    pub fn new(pool: &'a EmbeddingPool, store: &'a StoreAdapter, collection: &str) -> Self {
        Self {
            pool,
            store,
            collection: collection.to_string(),
        }
    }

    /// Index every document, in order.
    pub async fn index(&self, documents: &[Document]) -> Result<IndexReport, PipelineError> {
        let start = Instant::now();
        let collection = self.store.ensure_collection(&self.collection)?;

        info!(
            "Indexing {} documents into '{}'",
            documents.len(),
            collection.name()
        );

        let mut outcomes = Vec::with_capacity(documents.len());
        for document in documents {
            let outcome = match self.index_document(&collection, document).await {
                Ok(chunks) => {
                    info!(
                        "Indexed {} ({} chunks)",
                        document.path.display(),
                        chunks
                    );
                    DocumentOutcome::Indexed {
                        source_index: document.source_index,
                        chunks,
                    }
                }
                Err(error) => {
                    warn!("Failed to index {}: {}", document.path.display(), error);
                    DocumentOutcome::Failed {
                        source_index: document.source_index,
                        error,
                    }
                }
            };
            outcomes.push(outcome);
        }

        let report = IndexReport {
            collection,
            outcomes,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        if !documents.is_empty() && report.indexed_documents() == 0 {
            return Err(PipelineError::AllDocumentsFailed {
                count: documents.len(),
            });
        }

        info!(
            "Indexing complete: {} chunks from {} documents, {} failed, {}ms",
            report.chunks_indexed(),
            report.indexed_documents(),
            report.failed_documents(),
            report.duration_ms
        );

        Ok(report)
    }

    /// Embed all chunks of one document as a batch, then store them in order.
    async fn index_document(
        &self,
        collection: &CollectionHandle,
        document: &Document,
    ) -> Result<usize, DocumentError> {
        let chunks = chunk_document(document);
        if chunks.is_empty() {
            debug!("{} has no non-empty chunks", document.path.display());
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = self.pool.embed_batch(&texts).await?;

        for (stored, (chunk, embedding)) in chunks.iter().zip(embeddings.iter()).enumerate() {
            let chunk_id = chunk.id.to_string();
            self.store
                .upsert(collection, &chunk_id, embedding, &chunk.text)
                .map_err(|source| DocumentError::Store {
                    chunk_id: chunk_id.clone(),
                    stored,
                    source,
                })?;
        }

        Ok(chunks.len())
    }
}
