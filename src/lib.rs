//! Podquote - resumable quote mining for podcast transcripts
//!
//! A CLI pipeline that turns a directory of podcast transcripts into a library
//! of translated, time-aligned quotes.
//!
//! # Overview
//!
//! Podquote allows you to:
//! - Extract the most quotable statements from each transcript with an LLM
//! - Translate every quote into several languages, each bound to its own provider
//! - Resume an interrupted run without repeating finished work
//! - Re-derive quote timestamps from the markers in the transcript
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `corpus` - Transcripts, per-unit quote files and the writer lock
//! - `checkpoint` - Durable pipeline progress
//! - `generation` - Text generation providers
//! - `stages` - Extraction and translation of a single unit
//! - `retry` - Bounded retry of a unit's stage
//! - `pacing` - Fixed delays, cooldowns and upfront estimates
//! - `alignment` - Timestamp resolution against transcripts
//! - `report` - Batch, run and status summaries
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use podquote::config::Settings;
//! use podquote::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let plan = orchestrator.plan()?;
//!     println!("{} files to extract", plan.estimate.files_to_extract);
//!
//!     let summary = orchestrator.run(plan.confirm()).await?;
//!     println!("Translated {} quotes", summary.quotes_translated);
//!
//!     Ok(())
//! }
//! ```

pub mod alignment;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod generation;
pub mod openai;
pub mod orchestrator;
pub mod pacing;
pub mod report;
pub mod retry;
pub mod stages;

pub use error::{PodquoteError, Result};
