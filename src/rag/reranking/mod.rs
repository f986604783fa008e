// Re-ranking of index candidates by similarity and recency
pub mod scorer;

pub use scorer::{
    parse_date, recency_score, similarity_from_distance, RankedHit, ReRankConfig, ReRanker,
};
