// Retrieval-augmented answering
//
// Components:
// - Re-ranking: blend semantic similarity with document recency
// - Retrieval: over-fetch from the index, re-rank, truncate
// - Rules: operator directives that override retrieved context
// - Context Builder: render hits and rules into the answer prompt
// - Pipeline: end-to-end query path

pub mod context;
pub mod pipeline;
pub mod reranking;
pub mod retrieval;
pub mod rules;

// Re-export key types
pub use context::{AssembledContext, ContextBuilder, ContextConfig, NO_CONTEXT_SENTINEL};
pub use pipeline::{AnswerOutcome, PipelineConfig, PreparedPrompt, SupportAnswer, SupportPipeline};
pub use reranking::{RankedHit, ReRankConfig, ReRanker};
pub use retrieval::{RankingEngine, SearchParams};
pub use rules::RuleSet;
