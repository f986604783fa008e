// Document encoder: records to text, text to vectors
use std::sync::Arc;

use crate::errors::{Result, SupportError};
use crate::knowledge::record::QARecord;

/// Text embedding provider
///
/// Implementations must be deterministic for a fixed model and return
/// vectors of a single fixed length. `embed_batch` preserves input order.
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| SupportError::Embedding("provider returned no vector".to_string()))
    }

    /// Vector length produced by this provider
    fn dimension(&self) -> usize;
}

/// Turns records into embeddable text and texts into vectors
#[derive(Clone)]
pub struct DocumentEncoder {
    embedder: Arc<dyn Embedder>,
}

impl DocumentEncoder {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Deterministic text rendering of a record (see [`QARecord::encode`])
    pub fn encode(record: &QARecord) -> String {
        record.encode()
    }

    /// Embed a query string
    pub fn encode_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embedder.embed(text)
    }

    /// Embed many documents at once; the output is 1:1 with the input
    pub fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.embedder.embed_batch(texts)?;
        if vectors.len() != texts.len() {
            return Err(SupportError::Embedding(format!(
                "provider returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }
}
