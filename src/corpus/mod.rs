//! Corpus storage: transcripts, per-unit quote files and the writer lock.

mod lock;
mod models;
mod store;

pub use lock::CorpusLock;
pub use models::{Language, QuoteRecord, WorkUnit};
pub use store::CorpusStore;
pub(crate) use store::write_json_atomic;
