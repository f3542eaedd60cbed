//! # pubmeta
//!
//! Collect a researcher's publication metadata from Google Scholar, attach
//! arXiv links, and reconcile the resulting JSON dataset.
//!
//! ## Modules
//!
//! - [`collector`] - Checkpointed, cache-first profile collection
//! - [`links`] - arXiv link resolution and title validation
//! - [`reconcile`] - Filter, merge-by-title, and author normalization passes
//! - [`record`] - Publication record and dataset types
//! - [`store`] - Atomic snapshot persistence
//! - [`gscholar`] / [`arxiv`] - Concrete external clients
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pubmeta::{collector::Collector, config::PipelineConfig, gscholar::ScholarClient, throttle::Throttle};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PipelineConfig::default();
//!     let source = ScholarClient::new(&config)?;
//!     let mut collector = Collector::new(source, Throttle::fixed(config.detail_delay), config.checkpoint_every);
//!     let dataset = collector.collect("Jane Doe", Path::new("meta_Jane Doe.json")).await?;
//!     println!("Collected {} records", dataset.len());
//!     Ok(())
//! }
//! ```

pub mod arxiv;
pub mod checkpoint;
pub mod collector;
pub mod config;
pub mod cookies;
pub mod error;
pub mod export;
pub mod gscholar;
pub mod links;
pub mod reconcile;
pub mod record;
pub mod retry;
pub mod source;
pub mod store;
pub mod throttle;

pub use error::{PubmetaError, Result};
pub use record::{CandidateMatch, Dataset, PublicationRecord};
