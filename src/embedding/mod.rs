//! Local embedding provider
//!
//! Runs a sentence-transformers model on the CPU with Candle and exposes it
//! through the [`Embedder`](crate::knowledge::Embedder) trait.

pub mod engine;

pub use engine::{EmbeddingEngine, DEFAULT_MODEL_ID};
