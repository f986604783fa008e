//! Knowledge records and the document encoder
//!
//! Components:
//! - Records: the Q&A unit that gets indexed, plus the metadata kept with it
//! - Encoder: deterministic record-to-text rendering and text-to-vector embedding

pub mod encoder;
pub mod record;

pub use encoder::{DocumentEncoder, Embedder};
pub use record::{QARecord, RecordMetadata};
