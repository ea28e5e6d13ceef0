//! Comma-separated trace tables as written by the simulator.
//!
//! The first line is the header; each following line is one record. Only
//! newline-terminated lines are returned: the simulator may be in the
//! middle of writing the last one.

use indexmap::IndexMap;

use crate::error::RowError;

pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const ENTITY_COLUMN: &str = "ueImsiComplete";

/// One record in header order. Empty cells are absent, not zero.
pub type Record = IndexMap<String, String>;

/// A parsed trace file.
#[derive(Debug, Clone, Default)]
pub struct TraceTable {
    pub header: Vec<String>,
    /// `(line number, record)`, line numbers 1-based.
    pub records: Vec<(usize, Record)>,
}

impl TraceTable {
    pub fn parse(text: &str) -> Self {
        // Drop the trailing partial line, if any.
        let complete = match text.rfind('\n') {
            Some(idx) => &text[..=idx],
            None => "",
        };

        let mut lines = complete.lines().enumerate();
        let header: Vec<String> = match lines.next() {
            Some((_, line)) => line.split(',').map(|c| c.trim().to_string()).collect(),
            None => return Self::default(),
        };

        let records = lines
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                let record = header
                    .iter()
                    .zip(line.split(','))
                    .filter_map(|(name, cell)| {
                        let cell = cell.trim();
                        (!cell.is_empty()).then(|| (name.clone(), cell.to_string()))
                    })
                    .collect();
                (idx + 1, record)
            })
            .collect();

        Self { header, records }
    }
}

/// A trace record with its mandatory identity parsed.
#[derive(Debug, Clone)]
pub struct RawRow {
    /// Simulation time in (fractional) seconds.
    pub timestamp: f64,
    pub entity_id: u64,
    /// Remaining populated columns, in header order.
    pub columns: Record,
}

impl RawRow {
    pub fn from_record(record: &Record) -> Result<Self, RowError> {
        let timestamp = parse_timestamp(record)?;
        let entity_id = parse_required::<u64>(record, ENTITY_COLUMN)?;
        let columns = record
            .iter()
            .filter(|(name, _)| name.as_str() != TIMESTAMP_COLUMN && name.as_str() != ENTITY_COLUMN)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Self {
            timestamp,
            entity_id,
            columns,
        })
    }
}

pub(crate) fn parse_required<T: std::str::FromStr>(
    record: &Record,
    column: &'static str,
) -> Result<T, RowError> {
    let text = record.get(column).ok_or(RowError::Missing(column))?;
    let value = text.parse::<T>().map_err(|_| RowError::Invalid {
        column: column.to_string(),
        value: text.clone(),
    })?;
    Ok(value)
}

/// Simulation time in seconds; `inf` and `NaN` parse as floats but are
/// not valid times.
pub(crate) fn parse_timestamp(record: &Record) -> Result<f64, RowError> {
    let timestamp = parse_required::<f64>(record, TIMESTAMP_COLUMN)?;
    if !timestamp.is_finite() {
        return Err(RowError::Invalid {
            column: TIMESTAMP_COLUMN.to_string(),
            value: timestamp.to_string(),
        });
    }
    Ok(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_order_is_preserved_and_empty_cells_dropped() {
        let t = TraceTable::parse("timestamp,ueImsiComplete,b,a,c\n1.0,111,2,,3\n");
        assert_eq!(t.header, vec!["timestamp", "ueImsiComplete", "b", "a", "c"]);
        let (line, rec) = &t.records[0];
        assert_eq!(*line, 2);
        let keys: Vec<&str> = rec.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["timestamp", "ueImsiComplete", "b", "c"]);
    }

    #[test]
    fn trailing_partial_line_is_ignored() {
        let t = TraceTable::parse("timestamp,ueImsiComplete,x\n1.0,1,5\n2.0,1,");
        assert_eq!(t.records.len(), 1);

        let t = TraceTable::parse("timestamp,ueImsiComplete,x");
        assert!(t.header.is_empty());
    }

    #[test]
    fn short_rows_leave_trailing_columns_absent() {
        let t = TraceTable::parse("timestamp,ueImsiComplete,x,y\n1.0,1\n\n");
        assert_eq!(t.records.len(), 1);
        assert!(!t.records[0].1.contains_key("x"));
    }

    #[test]
    fn non_finite_timestamps_are_rejected() {
        let t = TraceTable::parse("timestamp,ueImsiComplete,x\ninf,111,4\nNaN,111,4\n-inf,111,4\n");
        for (_, rec) in &t.records {
            match RawRow::from_record(rec) {
                Err(RowError::Invalid { column, .. }) => assert_eq!(column, TIMESTAMP_COLUMN),
                other => panic!("expected invalid timestamp, got {other:?}"),
            }
        }
    }

    #[test]
    fn raw_row_requires_identity() {
        let t = TraceTable::parse("timestamp,ueImsiComplete,x\n1.5,111,4\nabc,111,4\n2.0,,4\n");
        let row = RawRow::from_record(&t.records[0].1).unwrap();
        assert_eq!(row.timestamp, 1.5);
        assert_eq!(row.entity_id, 111);
        assert_eq!(row.columns.len(), 1);

        assert!(matches!(
            RawRow::from_record(&t.records[1].1),
            Err(RowError::Invalid { .. })
        ));
        assert!(matches!(
            RawRow::from_record(&t.records[2].1),
            Err(RowError::Missing(ENTITY_COLUMN))
        ));
    }
}
