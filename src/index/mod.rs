//! Vector index providers
//!
//! The ranking engine only sees the [`VectorIndex`] trait. Two backends are
//! provided: a file-persisted local index and a qdrant collection.

pub mod local;
pub mod qdrant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Result;
use crate::knowledge::RecordMetadata;

pub use local::LocalIndex;
pub use qdrant::QdrantIndex;

/// A document as stored in the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub document: String,
    pub metadata: RecordMetadata,
}

/// A nearest-neighbour hit before ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub document: String,
    pub metadata: RecordMetadata,
    /// Raw dissimilarity reported by the index (lower = more similar)
    pub distance: f32,
}

/// Nearest-neighbour store addressed by collection
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace entries by id. Fails if `entries` is larger than
    /// [`max_batch_size`](Self::max_batch_size).
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<()>;

    /// Up to `n` candidates sorted by ascending distance
    async fn query(&self, vector: &[f32], n: usize) -> Result<Vec<Candidate>>;

    /// Number of stored documents
    async fn count(&self) -> Result<u64>;

    /// Delete the collection (if present) and recreate it empty
    async fn reset(&self) -> Result<()>;

    /// Largest batch accepted by a single `upsert`
    fn max_batch_size(&self) -> usize;
}

/// Upsert `entries` in chunks of at most `chunk_size`.
///
/// Chunks are written in order; the first failing chunk aborts the rest.
pub async fn upsert_chunked(
    index: &dyn VectorIndex,
    entries: Vec<IndexEntry>,
    chunk_size: usize,
) -> Result<usize> {
    let chunk_size = chunk_size.clamp(1, index.max_batch_size().max(1));
    let total = entries.len();
    let mut remaining = entries;

    while !remaining.is_empty() {
        let rest = remaining.split_off(chunk_size.min(remaining.len()));
        let chunk = std::mem::replace(&mut remaining, rest);
        debug!(size = chunk.len(), "upserting chunk");
        index.upsert(chunk).await?;
    }

    Ok(total)
}

/// Euclidean distance; `None` on dimension mismatch
pub fn l2_distance(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let sum: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    Some(sum.sqrt())
}
