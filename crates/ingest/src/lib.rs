//! Trace ingestion: simulator trace files → canonical time-series points.
//!
//! This crate provides:
//! - [`canonical`]: raw column name → canonical metric, category and unit conversion
//! - [`source`]: trace file classification into source types and cells
//! - [`dedup`]: committed-record bookkeeping keyed by (time, entity, source)
//! - [`table`] / [`points`]: row parsing and the per-row point fold
//! - [`IngestionSession`]: serialized file-change handling against a store
//! - [`TraceWatcher`]: `notify`-based bridge from the filesystem to a session

pub mod canonical;
pub mod dedup;
pub mod error;
pub mod points;
pub mod session;
pub mod source;
pub mod table;
pub mod watcher;


pub use canonical::{canonicalize, classify, CanonicalMetric, MetricCategory};
pub use dedup::{DedupKey, Deduplicator};
pub use error::{IngestError, Result, RowError};
pub use session::{IngestReport, IngestionSession};
pub use source::{SourceDescriptor, SourceType};
pub use watcher::{matches_watch_pattern, TraceWatcher};
