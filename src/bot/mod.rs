//! Chat front-end
//!
//! Turns inbound chat events into replies: filters bot and threaded
//! traffic, consults the triage gate, runs the answer pipeline, and
//! degrades to an apology when a provider fails.

pub mod console;
pub mod handler;

pub use console::ConsoleTransport;
pub use handler::{InboundEvent, SupportBot};
