//! Resumable pipeline progress.
//!
//! The run loop owns one [`PipelineState`] value, mutates it through the
//! idempotent `mark_*` methods and commits it with [`CheckpointStore::commit`]
//! after every unit.

mod state;
mod store;

pub use state::{Counters, ErrorEntry, PipelineState, Stage, UnitProgress, UnitStatus};
pub use store::CheckpointStore;
