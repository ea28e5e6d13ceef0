//! Time-series store contract and backends.
//!
//! The ingestion pipeline and the alert write-back only need two primitives:
//! a batched point write and a "last value per distinct tag set" query over
//! measurements matching a regex. [`MetricStore`] captures exactly that;
//! [`InfluxStore`] talks to an InfluxDB 1.x HTTP endpoint and
//! [`MemoryStore`] keeps everything in process for tests and dry runs.

pub mod error;
pub mod influx;
pub mod line_protocol;
pub mod memory;

use async_trait::async_trait;
use regex::Regex;

use simwatch_core::{MetricPoint, SeriesValue};

pub use error::StoreError;
pub use influx::InfluxStore;
pub use line_protocol::encode_line;
pub use memory::MemoryStore;

/// Queryable, writable time-series store.
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Write a batch of points. The whole batch either succeeds or the
    /// error is returned; callers must not assume partial success.
    async fn write_points(&self, points: &[MetricPoint]) -> Result<(), StoreError>;

    /// Last recorded `field` value of every distinct series whose
    /// measurement name matches `pattern`.
    async fn last_values(&self, pattern: &Regex, field: &str)
        -> Result<Vec<SeriesValue>, StoreError>;
}
