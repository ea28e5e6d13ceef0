//! Committed-record bookkeeping.

use std::collections::HashSet;

use simwatch_core::seconds_to_nanos;

use crate::source::SourceType;

/// Identity of one trace record: (time, entity, source type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub timestamp_ns: i64,
    pub entity_id: u64,
    pub source_ordinal: u8,
}

impl DedupKey {
    pub fn new(timestamp_secs: f64, entity_id: u64, source: SourceType) -> Self {
        Self {
            timestamp_ns: seconds_to_nanos(timestamp_secs),
            entity_id,
            source_ordinal: source.ordinal(),
        }
    }
}

/// Keys whose points have been written. Lives as long as the session;
/// a key is only inserted after its batch was accepted by the store.
#[derive(Debug, Default)]
pub struct Deduplicator {
    consumed: HashSet<DedupKey>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_consumed(&self, key: &DedupKey) -> bool {
        self.consumed.contains(key)
    }

    pub fn mark_consumed(&mut self, key: DedupKey) {
        self.consumed.insert(key);
    }

    pub fn len(&self) -> usize {
        self.consumed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty()
    }
}
