// Embeddings module
// Maps text to fixed-dimension vectors through an external model

pub mod ollama;

use thiserror::Error;

pub use ollama::{ModelInfo, OllamaClient};

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding model request failed: {0:#}")]
    Request(#[from] anyhow::Error),

    #[error("Embedding model returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
}

/// Turns text into dense vectors.
///
/// Implementations are blocking and must be deterministic for a fixed model.
pub trait Embedder: Send + Sync {
    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    #[inline]
    fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}
