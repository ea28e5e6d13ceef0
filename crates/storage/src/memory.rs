//! In-process store used by tests and `--dry-run`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use regex::Regex;

use simwatch_core::{MetricPoint, SeriesValue, Tags};

use crate::error::StoreError;
use crate::MetricStore;

/// Keeps every written point in memory, in write order.
#[derive(Default)]
pub struct MemoryStore {
    points: RwLock<Vec<MetricPoint>>,
    write_calls: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all points written so far.
    pub fn points(&self) -> Vec<MetricPoint> {
        self.points.read().expect("memory store lock poisoned").clone()
    }

    /// Points of a single measurement.
    pub fn points_for(&self, measurement: &str) -> Vec<MetricPoint> {
        self.points
            .read()
            .expect("memory store lock poisoned")
            .iter()
            .filter(|p| p.measurement == measurement)
            .cloned()
            .collect()
    }

    /// Number of `write_points` calls that reached the store, failed or not.
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Make subsequent writes fail (simulates an unreachable store).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MetricStore for MemoryStore {
    async fn write_points(&self, points: &[MetricPoint]) -> Result<(), StoreError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Other("memory store configured to fail writes".into()));
        }
        self.points
            .write()
            .expect("memory store lock poisoned")
            .extend_from_slice(points);
        Ok(())
    }

    async fn last_values(
        &self,
        pattern: &Regex,
        field: &str,
    ) -> Result<Vec<SeriesValue>, StoreError> {
        let guard = self.points.read().expect("memory store lock poisoned");

        // (measurement, tags) -> (timestamp, value); later writes win ties.
        let mut latest: HashMap<(String, Tags), (i64, f64)> = HashMap::new();
        for point in guard.iter().filter(|p| pattern.is_match(&p.measurement)) {
            let Some(value) = point.fields.get(field).and_then(|v| v.as_f64()) else {
                continue;
            };
            let key = (point.measurement.clone(), point.tags.clone());
            match latest.get(&key) {
                Some((ts, _)) if *ts > point.timestamp => {}
                _ => {
                    latest.insert(key, (point.timestamp, value));
                }
            }
        }

        let mut series: Vec<SeriesValue> = latest
            .into_iter()
            .map(|((measurement, tags), (_, value))| SeriesValue {
                measurement,
                tags,
                value,
            })
            .collect();
        series.sort_by(|a, b| a.series_key().cmp(&b.series_key()));
        Ok(series)
    }
}
