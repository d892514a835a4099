//! Finance FAQ Agent
//!
//! A dialogue agent that:
//! - Maps a free-form question onto a catalog of canonical finance questions
//! - Walks the matched template's script, collecting typed field values
//! - Falls back to general advice for other finance questions
//! - Declines anything off-topic
//!
//! SESSION FLOW:
//! QUESTION → RESOLVE → { INTERACT → RECORD | FALLBACK → ADVICE / DECLINE }

pub mod agent;
pub mod capability;
pub mod catalog;
pub mod config;
pub mod console;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod gemini;
pub mod models;
pub mod resolver;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use agent::{FaqAgent, SessionOutcome, SessionReport};
pub use resolver::{Resolution, Resolver};
