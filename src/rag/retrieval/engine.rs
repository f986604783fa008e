// Time-aware retrieval over the vector index
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::errors::Result;
use crate::index::VectorIndex;
use crate::knowledge::DocumentEncoder;
use crate::rag::reranking::{RankedHit, ReRankConfig, ReRanker};

/// Search parameters for retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Default number of hits returned by `rank`
    pub top_k: usize,
    /// Candidates fetched per requested hit, so recent but slightly less
    /// similar documents can still make the cut after re-ranking
    pub overfetch_factor: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            top_k: 5,
            overfetch_factor: 3,
        }
    }
}

impl SearchParams {
    /// Number of candidates requested from the index for `top_k` hits
    pub fn fetch_k(&self, top_k: usize) -> usize {
        top_k.saturating_mul(self.overfetch_factor.max(1))
    }
}

/// Ranking engine blending semantic similarity with recency
///
/// Stateless across calls: the encoder and index are shared read-only.
pub struct RankingEngine {
    encoder: DocumentEncoder,
    index: Arc<dyn VectorIndex>,
    reranker: ReRanker,
    params: SearchParams,
}

impl RankingEngine {
    /// Create new ranking engine with default parameters
    pub fn new(encoder: DocumentEncoder, index: Arc<dyn VectorIndex>) -> Self {
        Self::with_config(encoder, index, SearchParams::default(), ReRankConfig::default())
    }

    /// Create with custom parameters
    pub fn with_config(
        encoder: DocumentEncoder,
        index: Arc<dyn VectorIndex>,
        params: SearchParams,
        rerank: ReRankConfig,
    ) -> Self {
        Self {
            encoder,
            index,
            reranker: ReRanker::with_config(rerank),
            params,
        }
    }

    /// Rank documents for `query`, best first, at most `top_k` hits
    pub async fn rank(&self, query: &str, top_k: usize) -> Result<Vec<RankedHit>> {
        self.rank_at(query, top_k, Utc::now()).await
    }

    /// Rank with the default `top_k`
    pub async fn rank_default(&self, query: &str) -> Result<Vec<RankedHit>> {
        self.rank(query, self.params.top_k).await
    }

    /// Rank relative to a fixed "now"
    pub async fn rank_at(
        &self,
        query: &str,
        top_k: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<RankedHit>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let fetch_k = self.params.fetch_k(top_k);
        let vector = self.encoder.encode_query(query)?;
        let candidates = self.index.query(&vector, fetch_k).await?;

        if candidates.is_empty() {
            debug!(fetch_k, "index returned no candidates");
            return Ok(Vec::new());
        }

        let fetched = candidates.len();
        let mut ranked = self.reranker.rerank(candidates, now);
        ranked.truncate(top_k);

        debug!(
            fetch_k,
            fetched,
            returned = ranked.len(),
            best = ranked.first().map(|h| h.blended_score).unwrap_or_default(),
            "ranked candidates"
        );

        Ok(ranked)
    }

    /// Get search parameters
    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn rerank_config(&self) -> &ReRankConfig {
        self.reranker.config()
    }

    /// Shared index handle (administrative operations)
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }
}
