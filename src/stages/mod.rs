//! Stage operations applied to one work unit.
//!
//! Stages perform a single attempt; retries and checkpointing belong to the
//! orchestrator.

mod extraction;
mod speakers;
mod translation;

pub use extraction::{extract_quotes, parse_quote_response};
pub use speakers::{SpeakerProfile, SpeakerProfiles, DEFAULT_FUNCTION};
pub use translation::translate_quote;
