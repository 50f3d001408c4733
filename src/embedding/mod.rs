/// Embedding generation
///
/// - EmbeddingProvider trait for abstraction over the embedding service
/// - OllamaEmbedder for a local Ollama server
/// - EmbeddingPool for bounded, order-preserving batch embedding
mod batch;
mod provider;

pub use batch::EmbeddingPool;
pub use provider::{EmbeddingError, EmbeddingProvider, OllamaEmbedder};
