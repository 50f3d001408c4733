/// HNSW vector index for similarity search
use hnsw_rs::prelude::*;
use thiserror::Error;

/// Upper bound on HNSW layers supported by hnsw_rs
const MAX_LAYERS: usize = 16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VectorIndexError {
    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Cannot index an empty vector")]
    EmptyVector,

    /// Cosine distance is undefined for the zero vector
    #[error("Cannot index a zero-norm vector")]
    ZeroVector,
}

/// HNSW construction and search parameters
#[derive(Debug, Clone, Copy)]
pub struct IndexParams {
    /// Capacity hint for the graph
    pub max_elements: usize,
    /// Connections per node (HNSW M)
    pub m: usize,
    pub ef_construction: usize,
    pub ef_search: usize,
}

/// Search hit: internal slot and cosine distance (0.0 = same direction)
#[derive(Debug, Clone, Copy)]
pub struct Neighbor {
    pub slot: usize,
    pub distance: f32,
}

/// HNSW index over cosine distance.
///
/// The dimension is fixed by the first inserted vector. Points are
/// addressed by dense slot numbers handed out by the caller.
pub struct VectorIndex {
    index: Hnsw<'static, f32, DistCosine>,
    dimension: Option<usize>,
    count: usize,
    ef_search: usize,
}

impl VectorIndex {
    pub fn new(params: IndexParams) -> Self {
        let index = Hnsw::<f32, DistCosine>::new(
            params.m,
            params.max_elements,
            MAX_LAYERS,
            params.ef_construction,
            DistCosine,
        );

        Self {
            index,
            dimension: None,
            count: 0,
            ef_search: params.ef_search,
        }
    }

    /// Check a vector against the index dimension without inserting it.
    pub fn validate(&self, vector: &[f32]) -> Result<(), VectorIndexError> {
        if vector.is_empty() {
            return Err(VectorIndexError::EmptyVector);
        }
        if vector.iter().all(|x| *x == 0.0) {
            return Err(VectorIndexError::ZeroVector);
        }
        match self.dimension {
            Some(expected) if expected != vector.len() => Err(VectorIndexError::InvalidDimension {
                expected,
                actual: vector.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Insert a vector under `slot`
    pub fn insert(&mut self, slot: usize, vector: &[f32]) -> Result<(), VectorIndexError> {
        self.validate(vector)?;
        let data = vector.to_vec();
        self.index.insert((&data, slot));
        self.dimension = Some(vector.len());
        self.count += 1;
        Ok(())
    }

    /// Search for the `k` nearest points, nearest first
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorIndexError> {
        self.validate(query)?;
        if k == 0 || self.count == 0 {
            return Ok(Vec::new());
        }

        let k = k.min(self.count);
        let ef = self.ef_search.max(k);
        let mut neighbors: Vec<Neighbor> = self
            .index
            .search(query, k, ef)
            .into_iter()
            .map(|neighbour| Neighbor {
                slot: neighbour.d_id,
                distance: neighbour.distance,
            })
            .collect();

        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(neighbors)
    }

    /// Number of inserted points, including ones the caller has since retired
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> IndexParams {
        IndexParams {
            max_elements: 1_000,
            m: 16,
            ef_construction: 200,
            ef_search: 64,
        }
    }

    fn axis(dim: usize, i: usize, weight: f32) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[i] = weight;
        v
    }

    #[test]
    fn test_index_creation() {
        let index = VectorIndex::new(params());
        assert_eq!(index.dimension(), None);
        assert_eq!(index.len(), 0);
        assert!(index.is_empty());
    }

    #[test]
    fn test_insert_and_search() {
        let mut index = VectorIndex::new(params());

        let vec1 = axis(8, 0, 1.0);
        let vec2 = axis(8, 1, 1.0);
        let mut vec3 = axis(8, 0, 0.9);
        vec3[1] = 0.1;

        index.insert(0, &vec1).unwrap();
        index.insert(1, &vec2).unwrap();
        index.insert(2, &vec3).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.dimension(), Some(8));

        let results = index.search(&vec1, 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].slot, 0);
        assert_eq!(results[1].slot, 2);
        assert!(results[0].distance <= results[1].distance);
        assert!(results[0].distance < 1e-4);
    }

    #[test]
    fn test_k_larger_than_index() {
        let mut index = VectorIndex::new(params());
        index.insert(0, &axis(4, 0, 1.0)).unwrap();
        index.insert(1, &axis(4, 1, 1.0)).unwrap();

        let results = index.search(&axis(4, 0, 1.0), 10).unwrap();
        assert_eq!(results.len(), 2);
        assert!(index.search(&axis(4, 0, 1.0), 0).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_validation() {
        let mut index = VectorIndex::new(params());
        index.insert(0, &vec![1.0; 16]).unwrap();

        assert_eq!(
            index.insert(1, &vec![1.0; 8]),
            Err(VectorIndexError::InvalidDimension {
                expected: 16,
                actual: 8
            })
        );
        assert!(index.search(&vec![1.0; 4], 1).is_err());
        assert_eq!(index.insert(2, &[]), Err(VectorIndexError::EmptyVector));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_zero_vector_rejected() {
        let mut index = VectorIndex::new(params());
        assert_eq!(
            index.insert(0, &[0.0; 4]),
            Err(VectorIndexError::ZeroVector)
        );
        assert_eq!(index.dimension(), None);

        index.insert(0, &axis(4, 0, 1.0)).unwrap();
        assert_eq!(
            index.search(&[0.0; 4], 1).unwrap_err(),
            VectorIndexError::ZeroVector
        );
    }
}
