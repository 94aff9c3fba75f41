//! Document ingestion and similarity retrieval.
//!
//! [`Corpus`] keeps the vector index and the document store in lock-step so a
//! vector's ordinal always names the text it was computed from.
//! [`RetrievalService`] wraps a corpus together with an [`Embedder`] and is the
//! only way the rest of the crate reads or grows it.


use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::embeddings::{Embedder, EmbeddingError};
use crate::index::{IndexError, VectorIndex};
use crate::store::{DocumentStore, StoreError};

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_THRESHOLD: f32 = 0.5;
/// Largest `top_k` a query may ask for
pub const MAX_TOP_K: usize = 1000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error(transparent)]
    Model(#[from] EmbeddingError),

    #[error(transparent)]
    DimensionMismatch(#[from] IndexError),

    #[error(transparent)]
    OutOfRange(#[from] StoreError),

    #[error("No documents found matching the query.")]
    NotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Embedding worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    pub top_k: usize,
    /// Largest squared distance a hit may have
    pub threshold: f32,
}

impl SearchQuery {
    #[inline]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            top_k: DEFAULT_TOP_K,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    #[inline]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[inline]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    #[inline]
    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.text.trim().is_empty() {
            return Err(RetrievalError::InvalidInput(
                "query text must not be empty".to_string(),
            ));
        }
        if !(1..=MAX_TOP_K).contains(&self.top_k) {
            return Err(RetrievalError::InvalidInput(format!(
                "top_k must be between 1 and {MAX_TOP_K}, got {}",
                self.top_k
            )));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(RetrievalError::InvalidInput(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub document: String,
    pub distance: f32,
}

/// Vector index and document store that only grow together.
#[derive(Debug, Clone)]
pub struct Corpus {
    index: VectorIndex,
    documents: DocumentStore,
}

impl Corpus {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            index: VectorIndex::new(dimension),
            documents: DocumentStore::new(),
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    #[inline]
    pub fn document(&self, ordinal: usize) -> Result<&str, StoreError> {
        self.documents.get(ordinal)
    }

    #[inline]
    pub fn vector(&self, ordinal: usize) -> Option<&[f32]> {
        self.index.get(ordinal)
    }

    /// Adds one document and its embedding, returning the shared ordinal.
    #[inline]
    pub fn insert(&mut self, text: String, vector: &[f32]) -> Result<usize, RetrievalError> {
        // The index rejects bad vectors before mutating, so nothing is appended on error
        let ordinal = self.index.append(vector)?;
        let stored = self.documents.append(text);
        debug_assert_eq!(ordinal, stored);
        Ok(ordinal)
    }

    /// Adds documents pairwise with their embeddings. Either all are added or none.
    #[inline]
    pub fn insert_many(
        &mut self,
        texts: Vec<String>,
        vectors: &[Vec<f32>],
    ) -> Result<Vec<usize>, RetrievalError> {
        if texts.len() != vectors.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            }
            .into());
        }

        let expected = self.dimension();
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(IndexError::DimensionMismatch {
                expected,
                actual: bad.len(),
            }
            .into());
        }

        texts
            .into_iter()
            .zip(vectors)
            .map(|(text, vector)| self.insert(text, vector))
            .collect()
    }

    /// Runs the k-NN search and keeps hits within `threshold`, nearest first.
    ///
    /// Filtering happens after the fixed-size search, so a match that is under
    /// the threshold but outside the `top_k` nearest is never returned.
    #[inline]
    pub fn nearest(
        &self,
        query_vector: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<SearchHit>, RetrievalError> {
        let neighbors = self.index.search(query_vector, top_k)?;

        let mut hits = Vec::new();
        for neighbor in neighbors {
            if neighbor.distance <= threshold {
                let document = self.documents.get(neighbor.ordinal)?;
                hits.push(SearchHit {
                    document: document.to_string(),
                    distance: neighbor.distance,
                });
            }
        }

        Ok(hits)
    }
}

/// Query and ingestion entry point shared by all request handlers.
pub struct RetrievalService {
    embedder: Arc<dyn Embedder>,
    corpus: RwLock<Corpus>,
    timeout: Duration,
}

impl RetrievalService {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        let corpus = Corpus::new(embedder.dimension());
        Self {
            embedder,
            corpus: RwLock::new(corpus),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline]
    pub async fn document_count(&self) -> usize {
        self.corpus.read().await.len()
    }

    #[inline]
    pub async fn dimension(&self) -> usize {
        self.corpus.read().await.dimension()
    }

    /// Embeds and indexes the startup documents.
    #[inline]
    pub async fn seed(&self, documents: &[String]) -> Result<(), RetrievalError> {
        if documents.is_empty() {
            warn!("No seed documents configured; the index starts empty");
            return Ok(());
        }

        let ordinals = self.add_documents(documents.to_vec()).await?;
        info!("Seeded index with {} documents", ordinals.len());
        Ok(())
    }

    #[inline]
    pub async fn add_document(&self, text: String) -> Result<usize, RetrievalError> {
        let mut ordinals = self.add_documents(vec![text]).await?;
        ordinals
            .pop()
            .ok_or_else(|| RetrievalError::Worker("no ordinal returned for document".to_string()))
    }

    #[inline]
    pub async fn add_documents(&self, texts: Vec<String>) -> Result<Vec<usize>, RetrievalError> {
        if let Some(position) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(RetrievalError::InvalidInput(format!(
                "document {position} is empty"
            )));
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        self.with_deadline(async {
            let embedder = Arc::clone(&self.embedder);
            let inputs = texts.clone();
            let vectors = run_blocking(move || embedder.embed_many(&inputs)).await?;

            let mut corpus = self.corpus.write().await;
            let ordinals = corpus.insert_many(texts, &vectors)?;
            debug!(
                "Indexed {} documents; index now holds {}",
                ordinals.len(),
                corpus.len()
            );
            Ok(ordinals)
        })
        .await
    }

    /// Embeds the query, finds its nearest documents and applies the threshold.
    ///
    /// Fails with [`RetrievalError::NotFound`] when nothing is within range,
    /// whether the index is empty or the threshold is too strict.
    #[inline]
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, RetrievalError> {
        query.validate()?;

        debug!(
            "Searching: query='{}', top_k={}, threshold={}",
            query.text, query.top_k, query.threshold
        );

        let hits = self
            .with_deadline(async {
                let embedder = Arc::clone(&self.embedder);
                let text = query.text.clone();
                let query_vector = run_blocking(move || embedder.embed(&text)).await?;

                let corpus = self.corpus.read().await;
                corpus.nearest(&query_vector, query.top_k, query.threshold)
            })
            .await?;

        if hits.is_empty() {
            debug!("No hits within threshold {}", query.threshold);
            return Err(RetrievalError::NotFound);
        }

        debug!("Returning {} hits", hits.len());
        Ok(hits)
    }

    async fn with_deadline<T, F>(&self, operation: F) -> Result<T, RetrievalError>
    where
        F: Future<Output = Result<T, RetrievalError>>,
    {
        match tokio::time::timeout(self.timeout, operation).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Retrieval operation exceeded {:?}", self.timeout);
                Err(RetrievalError::Timeout(self.timeout))
            }
        }
    }
}

async fn run_blocking<T, F>(work: F) -> Result<T, RetrievalError>
where
    F: FnOnce() -> Result<T, EmbeddingError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| RetrievalError::Worker(e.to_string()))?
        .map_err(RetrievalError::from)
}
