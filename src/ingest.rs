//! Knowledge base ingestion
//!
//! Loads question/answer records, renders them to documents, embeds them in
//! batches and writes them to the vector index.

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{Result, SupportError};
use crate::index::{upsert_chunked, IndexEntry, VectorIndex};
use crate::knowledge::{DocumentEncoder, QARecord};

/// Outcome of an ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub indexed: usize,
    /// Records whose encoding was empty
    pub skipped: usize,
}

/// Read a JSON array of records
pub fn load_records(path: &Path) -> Result<Vec<QARecord>> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| {
        SupportError::Generic(format!("Invalid records file {}: {}", path.display(), e))
    })
}

/// Writes records into a vector index
pub struct Ingestor {
    encoder: DocumentEncoder,
    index: Arc<dyn VectorIndex>,
    batch_size: usize,
    show_progress: bool,
}

impl Ingestor {
    pub fn new(encoder: DocumentEncoder, index: Arc<dyn VectorIndex>, batch_size: usize) -> Self {
        Self {
            encoder,
            index,
            batch_size: batch_size.max(1),
            show_progress: false,
        }
    }

    /// Draw a progress bar on stderr while embedding
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Load `path` and ingest its records
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestReport> {
        let records = load_records(path)?;
        info!(path = %path.display(), records = records.len(), "loaded records");
        self.ingest(records).await
    }

    /// Encode, embed and upsert `records`.
    ///
    /// Records without an id get a fresh UUID. Records that encode to an
    /// empty document are skipped and never embedded.
    pub async fn ingest(&self, records: Vec<QARecord>) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let mut pending = Vec::with_capacity(records.len());

        for record in records {
            let document = DocumentEncoder::encode(&record);
            if document.is_empty() {
                warn!(id = ?record.id, "skipping record with no content");
                report.skipped += 1;
                continue;
            }
            let id = record
                .id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            pending.push((id, document, record.metadata()));
        }

        if pending.is_empty() {
            return Ok(report);
        }

        let progress = self.progress_bar(pending.len() as u64);
        let mut entries = Vec::with_capacity(pending.len());

        for chunk in pending.chunks(self.batch_size) {
            let texts: Vec<&str> = chunk.iter().map(|(_, doc, _)| doc.as_str()).collect();
            let vectors = self.encoder.encode_batch(&texts)?;

            for ((id, document, metadata), vector) in chunk.iter().zip(vectors) {
                entries.push(IndexEntry {
                    id: id.clone(),
                    vector,
                    document: document.clone(),
                    metadata: metadata.clone(),
                });
            }
            if let Some(pb) = &progress {
                pb.inc(chunk.len() as u64);
            }
        }

        if let Some(pb) = &progress {
            pb.finish_with_message("embedded");
        }

        report.indexed = upsert_chunked(self.index.as_ref(), entries, self.batch_size).await?;
        info!(
            indexed = report.indexed,
            skipped = report.skipped,
            "ingestion complete"
        );
        Ok(report)
    }

    fn progress_bar(&self, len: u64) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} Embedding [{bar:40.cyan/blue}] {pos}/{len} | {msg}")
            .map(|s| s.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        Some(pb)
    }
}
