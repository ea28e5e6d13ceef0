//! [`IngestionSession`]: file-change handling with dedup bookkeeping.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use simwatch_core::config::MeasurementNaming;
use simwatch_core::MetricPoint;
use simwatch_storage::MetricStore;

use crate::dedup::{DedupKey, Deduplicator};
use crate::error::{IngestError, Result};
use crate::points::{build_position_point, build_trace_points};
use crate::source::{SourceDescriptor, SourceType};
use crate::table::{RawRow, TraceTable};

/// Outcome of handling one file-change event.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Rows whose points were committed in this event.
    pub rows_written: usize,
    pub points_written: usize,
    /// Rows skipped because their key was already committed.
    pub duplicate_rows: usize,
    /// Position rows dropped for missing or malformed fields.
    pub skipped_rows: usize,
    /// Non-numeric cells dropped from otherwise valid rows.
    pub skipped_fields: usize,
}

struct SessionState {
    dedup: Deduplicator,
}

/// Owns the dedup set and serializes all file-change handling.
///
/// Cheap to clone; clones share the same lock and state, so every
/// callback holding a clone is serialized against the others. Separate
/// sessions are fully independent.
#[derive(Clone)]
pub struct IngestionSession {
    store: Arc<dyn MetricStore>,
    naming: MeasurementNaming,
    state: Arc<Mutex<SessionState>>,
}

impl IngestionSession {
    pub fn new(store: Arc<dyn MetricStore>, naming: MeasurementNaming) -> Self {
        Self {
            store,
            naming,
            state: Arc::new(Mutex::new(SessionState {
                dedup: Deduplicator::new(),
            })),
        }
    }

    /// Number of committed dedup keys.
    pub async fn committed_keys(&self) -> usize {
        self.state.lock().await.dedup.len()
    }

    /// Handle a modification of `path`.
    ///
    /// The session lock is held for the whole event, store round-trips
    /// included, so concurrent notifications queue instead of interleaving.
    /// On a store failure the error is returned and the affected keys stay
    /// unconsumed; the next mutation of the file re-delivers them.
    pub async fn on_file_changed(&self, path: &Path) -> Result<IngestReport> {
        let source = SourceDescriptor::from_path(path)
            .ok_or_else(|| IngestError::UnknownSource(path.to_path_buf()))?;

        let mut state = self.state.lock().await;
        let text = tokio::fs::read_to_string(path).await?;
        let table = TraceTable::parse(&text);

        let report = match source.source_type {
            SourceType::UePosition => self.ingest_positions(&mut state, &table).await?,
            _ => self.ingest_trace(&mut state, path, &source, &table).await?,
        };

        if report.rows_written > 0 {
            info!(
                path = %path.display(),
                rows = report.rows_written,
                points = report.points_written,
                duplicates = report.duplicate_rows,
                skipped = report.skipped_rows,
                "ingested trace rows"
            );
        } else {
            debug!(
                path = %path.display(),
                duplicates = report.duplicate_rows,
                skipped = report.skipped_rows,
                "no new rows"
            );
        }
        Ok(report)
    }

    async fn ingest_trace(
        &self,
        state: &mut SessionState,
        path: &Path,
        source: &SourceDescriptor,
        table: &TraceTable,
    ) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        for (line, record) in &table.records {
            let row = RawRow::from_record(record).map_err(|e| IngestError::MalformedRow {
                path: path.to_path_buf(),
                line: *line,
                source: e,
            })?;

            let key = DedupKey::new(row.timestamp, row.entity_id, source.source_type);
            if state.dedup.is_consumed(&key) {
                report.duplicate_rows += 1;
                continue;
            }

            let built = build_trace_points(&row, source, self.naming);
            report.skipped_fields += built.skipped_fields;
            if !built.points.is_empty() {
                self.store.write_points(&built.points).await?;
            }
            state.dedup.mark_consumed(key);
            report.rows_written += 1;
            report.points_written += built.points.len();
        }

        Ok(report)
    }

    async fn ingest_positions(
        &self,
        state: &mut SessionState,
        table: &TraceTable,
    ) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let mut batch_keys = HashSet::new();
        let mut points: Vec<MetricPoint> = Vec::new();

        for (line, record) in &table.records {
            let row = match build_position_point(record, self.naming) {
                Ok(row) => row,
                Err(e) => {
                    debug!(line, error = %e, "skipping position row");
                    report.skipped_rows += 1;
                    continue;
                }
            };
            let key = DedupKey::new(row.timestamp, row.entity_id, SourceType::UePosition);
            if state.dedup.is_consumed(&key) || !batch_keys.insert(key) {
                report.duplicate_rows += 1;
                continue;
            }
            points.push(row.point);
        }

        if points.is_empty() {
            return Ok(report);
        }

        self.store.write_points(&points).await?;
        for key in batch_keys {
            state.dedup.mark_consumed(key);
        }
        report.rows_written = points.len();
        report.points_written = points.len();
        Ok(report)
    }
}
