// File-persisted local vector index (brute-force Euclidean search)
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::errors::{Result, SupportError};
use crate::index::{l2_distance, Candidate, IndexEntry, VectorIndex};

/// Largest batch a single upsert accepts
pub const MAX_BATCH_SIZE: usize = 1000;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CollectionFile {
    collection: String,
    entries: Vec<IndexEntry>,
}

/// A collection stored as one JSON file under a storage directory
pub struct LocalIndex {
    path: PathBuf,
    collection: String,
    entries: RwLock<BTreeMap<String, IndexEntry>>,
}

impl LocalIndex {
    /// Open the collection, creating it if it does not exist yet
    pub fn open(storage_dir: &Path, collection: &str) -> Result<Self> {
        if collection.is_empty()
            || !collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(SupportError::Config(format!(
                "Invalid collection name: {:?}",
                collection
            )));
        }

        std::fs::create_dir_all(storage_dir)?;
        let path = storage_dir.join(format!("{}.json", collection));

        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            let file: CollectionFile = serde_json::from_str(&contents)?;
            file.entries
                .into_iter()
                .map(|entry| (entry.id.clone(), entry))
                .collect()
        } else {
            let empty = CollectionFile {
                collection: collection.to_string(),
                entries: Vec::new(),
            };
            std::fs::write(&path, serde_json::to_string(&empty)?)?;
            BTreeMap::new()
        };

        info!(collection, path = %path.display(), "opened local index");

        Ok(Self {
            path,
            collection: collection.to_string(),
            entries: RwLock::new(entries),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    async fn persist(&self, entries: &BTreeMap<String, IndexEntry>) -> Result<()> {
        let file = CollectionFile {
            collection: self.collection.clone(),
            entries: entries.values().cloned().collect(),
        };
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec(&file)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for LocalIndex {
    async fn upsert(&self, batch: Vec<IndexEntry>) -> Result<()> {
        if batch.len() > MAX_BATCH_SIZE {
            return Err(SupportError::Index(format!(
                "batch of {} exceeds the limit of {}",
                batch.len(),
                MAX_BATCH_SIZE
            )));
        }
        if batch.is_empty() {
            return Ok(());
        }

        let mut entries = self.entries.write().await;
        let expected_dim = entries
            .values()
            .next()
            .map(|e| e.vector.len())
            .unwrap_or(batch[0].vector.len());
        if let Some(bad) = batch.iter().find(|e| e.vector.len() != expected_dim) {
            return Err(SupportError::Index(format!(
                "vector for {} has dimension {}, collection uses {}",
                bad.id,
                bad.vector.len(),
                expected_dim
            )));
        }

        // Memory only changes once the file is written
        let mut updated = entries.clone();
        for entry in batch {
            updated.insert(entry.id.clone(), entry);
        }
        self.persist(&updated).await?;
        *entries = updated;
        debug!(collection = %self.collection, total = entries.len(), "upsert complete");
        Ok(())
    }

    async fn query(&self, vector: &[f32], n: usize) -> Result<Vec<Candidate>> {
        let entries = self.entries.read().await;
        let mut scored = Vec::with_capacity(entries.len());
        for entry in entries.values() {
            let distance = l2_distance(vector, &entry.vector).ok_or_else(|| {
                SupportError::Index(format!(
                    "query has dimension {}, collection uses {}",
                    vector.len(),
                    entry.vector.len()
                ))
            })?;
            scored.push((distance, entry));
        }

        // Stable: equal distances keep id order
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(scored
            .into_iter()
            .take(n)
            .map(|(distance, entry)| Candidate {
                id: entry.id.clone(),
                document: entry.document.clone(),
                metadata: entry.metadata.clone(),
                distance,
            })
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.entries.read().await.len() as u64)
    }

    async fn reset(&self) -> Result<()> {
        let mut entries = self.entries.write().await;
        // The rename in persist replaces any existing file
        self.persist(&BTreeMap::new()).await?;
        entries.clear();
        info!(collection = %self.collection, "collection reset");
        Ok(())
    }

    fn max_batch_size(&self) -> usize {
        MAX_BATCH_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::RecordMetadata;
    use tempfile::TempDir;

    fn entry(id: &str, vector: Vec<f32>) -> IndexEntry {
        IndexEntry {
            id: id.to_string(),
            vector,
            document: format!("doc {}", id),
            metadata: RecordMetadata {
                subject: Some(format!("subject {}", id)),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_open_creates_collection_file() {
        let temp = TempDir::new().unwrap();
        let index = LocalIndex::open(temp.path(), "support_emails").unwrap();
        assert!(index.path().exists());
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_collection_name() {
        let temp = TempDir::new().unwrap();
        assert!(LocalIndex::open(temp.path(), "../escape").is_err());
        assert!(LocalIndex::open(temp.path(), "").is_err());
    }

    #[tokio::test]
    async fn test_query_orders_by_distance() {
        let temp = TempDir::new().unwrap();
        let index = LocalIndex::open(temp.path(), "c").unwrap();
        index
            .upsert(vec![
                entry("far", vec![10.0, 0.0]),
                entry("near", vec![1.0, 0.0]),
                entry("mid", vec![4.0, 0.0]),
            ])
            .await
            .unwrap();

        let hits = index.query(&[0.0, 0.0], 10).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
        assert_eq!(hits[0].distance, 1.0);
        assert_eq!(hits[0].metadata.subject.as_deref(), Some("subject near"));
    }

    #[tokio::test]
    async fn test_query_limits_results() {
        let temp = TempDir::new().unwrap();
        let index = LocalIndex::open(temp.path(), "c").unwrap();
        index
            .upsert((0..5).map(|i| entry(&i.to_string(), vec![i as f32])).collect())
            .await
            .unwrap();
        assert_eq!(index.query(&[0.0], 3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_query_empty_index() {
        let temp = TempDir::new().unwrap();
        let index = LocalIndex::open(temp.path(), "c").unwrap();
        assert!(index.query(&[0.0, 1.0], 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_by_id() {
        let temp = TempDir::new().unwrap();
        let index = LocalIndex::open(temp.path(), "c").unwrap();
        index.upsert(vec![entry("a", vec![1.0])]).await.unwrap();
        index.upsert(vec![entry("a", vec![2.0])]).await.unwrap();
        assert_eq!(index.count().await.unwrap(), 1);
        let hits = index.query(&[2.0], 1).await.unwrap();
        assert_eq!(hits[0].distance, 0.0);
    }

    #[tokio::test]
    async fn test_upsert_rejects_oversized_batch() {
        let temp = TempDir::new().unwrap();
        let index = LocalIndex::open(temp.path(), "c").unwrap();
        let batch = (0..MAX_BATCH_SIZE + 1)
            .map(|i| entry(&i.to_string(), vec![0.0]))
            .collect();
        assert!(index.upsert(batch).await.is_err());
    }

    #[tokio::test]
    async fn test_upsert_rejects_dimension_mismatch() {
        let temp = TempDir::new().unwrap();
        let index = LocalIndex::open(temp.path(), "c").unwrap();
        index.upsert(vec![entry("a", vec![1.0, 2.0])]).await.unwrap();
        let err = index.upsert(vec![entry("b", vec![1.0])]).await.unwrap_err();
        assert!(matches!(err, SupportError::Index(_)));
    }

    #[tokio::test]
    async fn test_persistence_across_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let index = LocalIndex::open(temp.path(), "c").unwrap();
            index
                .upsert(vec![entry("a", vec![1.0]), entry("b", vec![2.0])])
                .await
                .unwrap();
        }
        let reopened = LocalIndex::open(temp.path(), "c").unwrap();
        assert_eq!(reopened.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reset_clears_collection() {
        let temp = TempDir::new().unwrap();
        let index = LocalIndex::open(temp.path(), "c").unwrap();
        index.upsert(vec![entry("a", vec![1.0])]).await.unwrap();
        index.reset().await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
        assert!(index.path().exists());

        let reopened = LocalIndex::open(temp.path(), "c").unwrap();
        assert_eq!(reopened.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_memory_unchanged() {
        let temp = TempDir::new().unwrap();
        let storage = temp.path().join("store");
        let index = LocalIndex::open(&storage, "c").unwrap();
        index.upsert(vec![entry("a", vec![1.0])]).await.unwrap();

        std::fs::remove_dir_all(&storage).unwrap();

        assert!(index.upsert(vec![entry("b", vec![2.0])]).await.is_err());
        assert_eq!(index.count().await.unwrap(), 1);
        let hits = index.query(&[2.0], 10).await.unwrap();
        assert!(hits.iter().all(|hit| hit.id != "b"));

        assert!(index.reset().await.is_err());
        assert_eq!(index.count().await.unwrap(), 1);
    }
}
