// Qdrant-backed vector index
use async_trait::async_trait;
use qdrant_client::{
    client::QdrantClient,
    qdrant::{
        vectors_config::Config, with_payload_selector::SelectorOptions, CreateCollection,
        Distance, PointStruct, SearchPoints, Value as QdrantValue, VectorParams, VectorsConfig,
        WithPayloadSelector,
    },
};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::errors::{Result, SupportError};
use crate::index::{Candidate, IndexEntry, VectorIndex};
use crate::knowledge::RecordMetadata;

/// Largest batch a single upsert accepts
pub const MAX_BATCH_SIZE: usize = 256;

const RECORD_ID_KEY: &str = "record_id";
const DOCUMENT_KEY: &str = "document";

fn index_err<E: std::fmt::Display>(context: &'static str) -> impl Fn(E) -> SupportError {
    move |e| SupportError::Index(format!("{}: {}", context, e))
}

/// A qdrant collection using Euclidean distance
pub struct QdrantIndex {
    client: QdrantClient,
    collection: String,
    dimension: u64,
}

impl QdrantIndex {
    /// Connect and get-or-create the collection
    pub async fn connect(url: &str, collection: &str, dimension: usize) -> Result<Self> {
        let client = QdrantClient::from_url(url)
            .build()
            .map_err(index_err("Failed to create Qdrant client"))?;

        let index = Self {
            client,
            collection: collection.to_string(),
            dimension: dimension as u64,
        };
        index.ensure_collection().await?;
        info!(collection, url, "connected to qdrant");
        Ok(index)
    }

    async fn exists(&self) -> Result<bool> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(index_err("Failed to list collections"))?;
        Ok(collections
            .collections
            .iter()
            .any(|c| c.name == self.collection))
    }

    async fn ensure_collection(&self) -> Result<()> {
        if self.exists().await? {
            return Ok(());
        }

        self.client
            .create_collection(&CreateCollection {
                collection_name: self.collection.clone(),
                vectors_config: Some(VectorsConfig {
                    config: Some(Config::Params(VectorParams {
                        size: self.dimension,
                        distance: Distance::Euclid.into(),
                        ..Default::default()
                    })),
                }),
                ..Default::default()
            })
            .await
            .map_err(index_err("Failed to create collection"))?;

        Ok(())
    }
}

/// Qdrant only accepts UUIDs or integers as point ids
pub fn point_uuid(record_id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, record_id.as_bytes()).to_string()
}

fn to_payload(entry: &IndexEntry) -> HashMap<String, QdrantValue> {
    let mut payload = HashMap::new();
    payload.insert(RECORD_ID_KEY.to_string(), QdrantValue::from(entry.id.clone()));
    payload.insert(DOCUMENT_KEY.to_string(), QdrantValue::from(entry.document.clone()));

    let meta = &entry.metadata;
    for (key, value) in [
        ("subject", &meta.subject),
        ("date", &meta.date),
        ("from", &meta.from),
        ("customer_email", &meta.customer_email),
    ] {
        if let Some(value) = value {
            payload.insert(key.to_string(), QdrantValue::from(value.clone()));
        }
    }
    payload
}

fn payload_string(payload: &HashMap<String, QdrantValue>, key: &str) -> Option<String> {
    use qdrant_client::qdrant::value::Kind;
    payload.get(key).and_then(|v| match &v.kind {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    })
}

fn point_id_to_string(point_id: &Option<qdrant_client::qdrant::PointId>) -> String {
    use qdrant_client::qdrant::point_id::PointIdOptions;
    match point_id.as_ref().and_then(|id| id.point_id_options.as_ref()) {
        Some(PointIdOptions::Num(n)) => n.to_string(),
        Some(PointIdOptions::Uuid(u)) => u.clone(),
        None => "unknown".to_string(),
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<()> {
        if entries.len() > MAX_BATCH_SIZE {
            return Err(SupportError::Index(format!(
                "batch of {} exceeds the limit of {}",
                entries.len(),
                MAX_BATCH_SIZE
            )));
        }
        if entries.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = entries
            .iter()
            .map(|entry| PointStruct::new(point_uuid(&entry.id), entry.vector.clone(), to_payload(entry)))
            .collect();

        self.client
            .upsert_points_blocking(self.collection.as_str(), None, points, None)
            .await
            .map_err(index_err("Failed to upsert points"))?;

        Ok(())
    }

    async fn query(&self, vector: &[f32], n: usize) -> Result<Vec<Candidate>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let search_result = self
            .client
            .search_points(&SearchPoints {
                collection_name: self.collection.clone(),
                vector: vector.to_vec(),
                limit: n as u64,
                with_payload: Some(WithPayloadSelector {
                    selector_options: Some(SelectorOptions::Enable(true)),
                }),
                ..Default::default()
            })
            .await
            .map_err(index_err("Failed to search points"))?;

        // With the Euclid metric the score is the distance, ascending
        let candidates = search_result
            .result
            .into_iter()
            .map(|point| {
                let payload = point.payload;
                Candidate {
                    id: payload_string(&payload, RECORD_ID_KEY)
                        .unwrap_or_else(|| point_id_to_string(&point.id)),
                    document: payload_string(&payload, DOCUMENT_KEY).unwrap_or_default(),
                    metadata: RecordMetadata {
                        subject: payload_string(&payload, "subject"),
                        date: payload_string(&payload, "date"),
                        from: payload_string(&payload, "from"),
                        customer_email: payload_string(&payload, "customer_email"),
                    },
                    distance: point.score,
                }
            })
            .collect();

        Ok(candidates)
    }

    async fn count(&self) -> Result<u64> {
        let info = self
            .client
            .collection_info(self.collection.as_str())
            .await
            .map_err(index_err("Failed to get collection info"))?;

        Ok(info.result.and_then(|r| r.points_count).unwrap_or(0))
    }

    async fn reset(&self) -> Result<()> {
        if self.exists().await? {
            self.client
                .delete_collection(self.collection.as_str())
                .await
                .map_err(index_err("Failed to delete collection"))?;
        }
        self.ensure_collection().await?;
        info!(collection = %self.collection, "collection reset");
        Ok(())
    }

    fn max_batch_size(&self) -> usize {
        MAX_BATCH_SIZE
    }
}
