//! Vector store adapter
//!
//! A [`StoreAdapter`] owns named collections of `(id, embedding, text)`
//! records backed by an in-process HNSW index. It is constructed explicitly
//! and handed to the indexing pipeline and the query loop.

mod vector_index;

pub use vector_index::{IndexParams, Neighbor, VectorIndex, VectorIndexError};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Collection '{collection}' is empty")]
    EmptyCollection { collection: String },

    #[error("Id '{id}' already exists in collection '{collection}'")]
    DuplicateId { collection: String, id: String },

    #[error("Dimension mismatch in collection '{collection}': expected {expected}, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },

    #[error("Empty embedding for id '{id}'")]
    EmptyEmbedding { id: String },

    #[error("Zero-norm embedding for id '{id}'")]
    ZeroEmbedding { id: String },

    #[error("Store lock poisoned: {0}")]
    Poisoned(String),
}

/// What `upsert` does when the id is already stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Replace the stored record; the old vector is never returned again
    #[default]
    Overwrite,
    /// Fail with [`StoreError::DuplicateId`]
    Reject,
}

/// A stored chunk returned by a query
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub id: String,
    pub text: String,
    /// Cosine distance to the query (lower is closer)
    pub distance: f32,
}

struct Record {
    id: String,
    text: String,
}

struct CollectionState {
    index: VectorIndex,
    /// Indexed by HNSW slot; `None` marks a replaced record
    slots: Vec<Option<Record>>,
    by_id: HashMap<String, usize>,
}

impl CollectionState {
    fn tombstones(&self) -> usize {
        self.slots.len() - self.by_id.len()
    }
}

struct Collection {
    name: String,
    state: RwLock<CollectionState>,
}

/// Shared reference to one collection
#[derive(Clone)]
pub struct CollectionHandle {
    inner: Arc<Collection>,
}

impl CollectionHandle {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether two handles refer to the same underlying collection
    pub fn same_collection(&self, other: &CollectionHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live records
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.by_id.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Text stored under `id`, if any
    pub fn get_text(&self, id: &str) -> Result<Option<String>, StoreError> {
        let state = self.read()?;
        Ok(state
            .by_id
            .get(id)
            .and_then(|slot| state.slots[*slot].as_ref())
            .map(|record| record.text.clone()))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, CollectionState>, StoreError> {
        self.inner
            .state
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, CollectionState>, StoreError> {
        self.inner
            .state
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl fmt::Debug for CollectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionHandle")
            .field("name", &self.inner.name)
            .finish()
    }
}

/// Owns the collections of one store instance
pub struct StoreAdapter {
    params: IndexParams,
    duplicate_policy: DuplicatePolicy,
    collections: RwLock<HashMap<String, CollectionHandle>>,
}

impl StoreAdapter {
    pub fn new(params: IndexParams, duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            params,
            duplicate_policy,
            collections: RwLock::new(HashMap::new()),
        }
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    /// Return the collection called `name`, creating it on first use.
    pub fn ensure_collection(&self, name: &str) -> Result<CollectionHandle, StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;

        let handle = collections
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!("Creating collection '{}'", name);
                CollectionHandle {
                    inner: Arc::new(Collection {
                        name: name.to_string(),
                        state: RwLock::new(CollectionState {
                            index: VectorIndex::new(self.params),
                            slots: Vec::new(),
                            by_id: HashMap::new(),
                        }),
                    }),
                }
            })
            .clone();

        Ok(handle)
    }

    /// Insert one record, applying the duplicate-id policy.
    pub fn upsert(
        &self,
        handle: &CollectionHandle,
        id: &str,
        embedding: &[f32],
        text: &str,
    ) -> Result<(), StoreError> {
        let mut state = handle.write()?;

        state
            .index
            .validate(embedding)
            .map_err(|e| map_index_error(handle.name(), id, e))?;

        let previous = state.by_id.get(id).copied();
        if previous.is_some() && self.duplicate_policy == DuplicatePolicy::Reject {
            return Err(StoreError::DuplicateId {
                collection: handle.name().to_string(),
                id: id.to_string(),
            });
        }

        let slot = state.slots.len();
        state
            .index
            .insert(slot, embedding)
            .map_err(|e| map_index_error(handle.name(), id, e))?;
        state.slots.push(Some(Record {
            id: id.to_string(),
            text: text.to_string(),
        }));
        state.by_id.insert(id.to_string(), slot);

        if let Some(old) = previous {
            tracing::debug!("Overwrote '{}' in collection '{}'", id, handle.name());
            state.slots[old] = None;
        }

        Ok(())
    }

    /// The `k` records nearest to `embedding`, nearest first.
    pub fn query(
        &self,
        handle: &CollectionHandle,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, StoreError> {
        let state = handle.read()?;

        if state.by_id.is_empty() {
            return Err(StoreError::EmptyCollection {
                collection: handle.name().to_string(),
            });
        }

        // Over-fetch so replaced records can be skipped without losing hits
        let fetch = k.saturating_add(state.tombstones());
        let neighbors = state
            .index
            .search(embedding, fetch)
            .map_err(|e| map_index_error(handle.name(), "<query>", e))?;

        let results = neighbors
            .into_iter()
            .filter_map(|neighbor| {
                let record = state.slots.get(neighbor.slot)?.as_ref()?;
                Some(RetrievedChunk {
                    id: record.id.clone(),
                    text: record.text.clone(),
                    distance: neighbor.distance,
                })
            })
            .take(k)
            .collect();

        Ok(results)
    }
}

fn map_index_error(collection: &str, id: &str, err: VectorIndexError) -> StoreError {
    match err {
        VectorIndexError::InvalidDimension { expected, actual } => StoreError::DimensionMismatch {
            collection: collection.to_string(),
            expected,
            actual,
        },
        VectorIndexError::EmptyVector => StoreError::EmptyEmbedding { id: id.to_string() },
        VectorIndexError::ZeroVector => StoreError::ZeroEmbedding { id: id.to_string() },
    }
}
