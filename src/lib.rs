//! supportrag - Support email retrieval and answer engine
//!
//! Answers customer questions from a knowledge base of past support
//! exchanges. Retrieval blends semantic similarity with recency so newer
//! answers win when facts have changed.
//!
//! # Architecture
//!
//! - **knowledge / embedding / index**: records, encoding, vector storage
//! - **rag**: ranking, context assembly, the answer pipeline
//! - **generation / triage / bot**: model providers and the chat front-end

pub mod errors;
pub mod config;
pub mod cli;

// Re-export commonly used types
pub use errors::{Result, SupportError};

// Knowledge base
pub mod knowledge;
pub mod embedding;
pub mod index;
pub mod ingest;

// Query path
pub mod rag;
pub mod generation;
pub mod triage;

// Chat front-end
pub mod bot;
