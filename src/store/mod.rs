//! Ordinal-addressed storage for document texts as they were submitted.


use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Document ordinal {ordinal} out of range (store holds {len})")]
    OutOfRange { ordinal: usize, len: usize },
}

/// Append-only list of documents. A document's ordinal is its insertion position.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: Vec<String>,
}

impl DocumentStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
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
    pub fn append(&mut self, text: String) -> usize {
        let ordinal = self.documents.len();
        self.documents.push(text);
        ordinal
    }

    #[inline]
    pub fn get(&self, ordinal: usize) -> Result<&str, StoreError> {
        self.documents
            .get(ordinal)
            .map(String::as_str)
            .ok_or(StoreError::OutOfRange {
                ordinal,
                len: self.documents.len(),
            })
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(String::as_str)
    }
}
