// Ranking engine: over-fetch, re-rank, truncate
pub mod engine;

pub use engine::{RankingEngine, SearchParams};
