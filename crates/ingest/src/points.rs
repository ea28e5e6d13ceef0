//! Record → metric points.
//!
//! Trace rows are folded column by column in header order. The fold carries
//! the most recently seen cell id so SINR columns can be attributed to the
//! cell named just before them in the same row.

use simwatch_core::config::MeasurementNaming;
use simwatch_core::{seconds_to_nanos, MetricPoint};
use tracing::debug;

use crate::canonical::{canonicalize, CanonicalMetric, ColumnRole, MetricCategory, MetricScope};
use crate::error::RowError;
use crate::source::SourceDescriptor;
use crate::table::{parse_required, parse_timestamp, RawRow, Record, ENTITY_COLUMN};

/// Points produced from one trace row.
#[derive(Debug, Default)]
pub struct RowPoints {
    pub points: Vec<MetricPoint>,
    /// Populated columns that were not numeric.
    pub skipped_fields: usize,
}

struct RowContext {
    current_cell_id: String,
    out: RowPoints,
}

struct Names {
    primary: String,
    serving: Option<String>,
}

fn cell_id_from_value(value: f64) -> String {
    (value.round() as i64).to_string()
}

/// Ordinal of a neighbor-id column (`L3 neigh Id 2 (cellId)` → `2`).
fn neighbor_ordinal(column: &str) -> Option<&str> {
    let rest = column.split_once("neigh Id")?.1.trim_start();
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

fn canonical_names(metric: &CanonicalMetric, cell_id: &str) -> Names {
    match metric.role {
        ColumnRole::CellSinr { serving, .. } => {
            let base = format!("{}_cell_{}", metric.name, cell_id);
            Names {
                serving: serving.then(|| format!("serv_{base}")),
                primary: base,
            }
        }
        _ => Names {
            primary: metric.name.clone(),
            serving: None,
        },
    }
}

fn legacy_names(
    column: &str,
    metric: &CanonicalMetric,
    cell_id: &str,
    source: &SourceDescriptor,
    ue: &str,
) -> Names {
    let compact = |s: String| s.replace(' ', "");
    if metric.scope == MetricScope::Cell {
        return Names {
            primary: compact(format!("{column}_cell_{}", source.cell_id)),
            serving: None,
        };
    }

    let (stat, serving) = match metric.role {
        ColumnRole::CellContext { serving: true } => ("Serv_Cellid".to_string(), None),
        ColumnRole::CellSinr { serving, gpp3 } => {
            let prefix = if gpp3 { "3GPP_" } else { "" };
            (
                format!("{prefix}SINR_cell_{cell_id}"),
                serving.then(|| format!("{prefix}Serv_SINR_cell_{cell_id}")),
            )
        }
        _ => (column.to_string(), None),
    };
    let suffix = match source.source_type.layer() {
        Some(layer) => format!("_ue_{ue}_{layer}"),
        None => format!("_ue_{ue}"),
    };
    Names {
        primary: compact(format!("{stat}{suffix}")),
        serving: serving.map(|s| compact(format!("{s}{suffix}"))),
    }
}

fn canonical_point(
    measurement: String,
    metric: &CanonicalMetric,
    source: &SourceDescriptor,
    ue: &str,
    timestamp: i64,
    value: f64,
) -> MetricPoint {
    let mut point = MetricPoint::new(measurement, timestamp)
        .with_tag("cell_id", source.cell_id.as_str())
        .with_tag("source", source.source_type.to_string())
        .with_tag("metric_type", metric.category.to_string())
        .with_field("value", value);
    if metric.scope == MetricScope::Ue {
        point = point.with_tag("ue_id", ue);
        if let Some(layer) = source.source_type.layer() {
            point = point.with_tag("layer", layer);
        }
    }
    point
}

/// Build every point for one trace row.
///
/// Malformed (non-numeric) cells are skipped individually and counted.
/// A serving SINR column yields two points: the per-cell SINR series and
/// its `serving` duplicate.
pub fn build_trace_points(
    row: &RawRow,
    source: &SourceDescriptor,
    naming: MeasurementNaming,
) -> RowPoints {
    let timestamp = seconds_to_nanos(row.timestamp);
    let ue = row.entity_id.to_string();

    let init = RowContext {
        current_cell_id: source.cell_id.clone(),
        out: RowPoints::default(),
    };

    let ctx = row.columns.iter().fold(init, |mut ctx, (column, text)| {
        let raw = match text.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                debug!(column = %column, value = %text, "skipping non-numeric field");
                ctx.out.skipped_fields += 1;
                return ctx;
            }
        };

        let metric = canonicalize(column);
        let value = metric.convert(raw);
        if let ColumnRole::CellContext { .. } = metric.role {
            ctx.current_cell_id = cell_id_from_value(value);
        }

        match naming {
            MeasurementNaming::Canonical => {
                let names = canonical_names(&metric, &ctx.current_cell_id);
                let mut point =
                    canonical_point(names.primary, &metric, source, &ue, timestamp, value);
                if matches!(metric.role, ColumnRole::CellContext { serving: false }) {
                    // One series per neighbor slot; the slots share a timestamp.
                    if let Some(n) = neighbor_ordinal(column) {
                        point = point.with_tag("neighbor", n);
                    }
                }
                ctx.out.points.push(point);
                if let Some(serving) = names.serving {
                    ctx.out.points.push(
                        canonical_point(serving, &metric, source, &ue, timestamp, value)
                            .with_tag("serving", "true"),
                    );
                }
            }
            MeasurementNaming::Legacy => {
                let names = legacy_names(column, &metric, &ctx.current_cell_id, source, &ue);
                for name in std::iter::once(names.primary).chain(names.serving) {
                    ctx.out
                        .points
                        .push(MetricPoint::new(name, timestamp).with_field("value", value));
                }
            }
        }
        ctx
    });

    ctx.out
}

/// A valid position record.
#[derive(Debug, Clone)]
pub struct PositionRow {
    pub timestamp: f64,
    pub entity_id: u64,
    pub point: MetricPoint,
}

/// Build the point for one `ue_positions.txt` record.
pub fn build_position_point(
    record: &Record,
    naming: MeasurementNaming,
) -> Result<PositionRow, RowError> {
    let timestamp = parse_timestamp(record)?;
    let entity_id = parse_required::<u64>(record, ENTITY_COLUMN)?;
    let x = parse_required::<f64>(record, "position_x")?;
    let y = parse_required::<f64>(record, "position_y")?;

    let ts = seconds_to_nanos(timestamp);
    let ue = entity_id.to_string();
    let point = match naming {
        MeasurementNaming::Canonical => MetricPoint::new("ue_position", ts)
            .with_tag("ue_id", ue)
            .with_tag("metric_type", MetricCategory::Location.to_string()),
        MeasurementNaming::Legacy => MetricPoint::new("UE_Position", ts).with_tag("ue", ue),
    }
    .with_field("x", x)
    .with_field("y", y);

    Ok(PositionRow {
        timestamp,
        entity_id,
        point,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceType;
    use crate::table::TraceTable;

    fn row(text: &str) -> RawRow {
        let t = TraceTable::parse(text);
        RawRow::from_record(&t.records[0].1).unwrap()
    }

    fn cp_cell(cell: &str) -> SourceDescriptor {
        SourceDescriptor {
            source_type: SourceType::CuCpCell,
            cell_id: cell.to_string(),
        }
    }

    fn names(points: &[MetricPoint]) -> Vec<&str> {
        points.iter().map(|p| p.measurement.as_str()).collect()
    }

    #[test]
    fn sinr_uses_cell_id_from_preceding_column() {
        let r = row(concat!(
            "timestamp,ueImsiComplete,L3 serving Id(m_cellId),L3 serving SINR,L3 neigh Id 1 (cellId),L3 neigh SINR 1\n",
            "0.5,111,3,12.5,4,-2\n",
        ));
        let out = build_trace_points(&r, &cp_cell("2"), MeasurementNaming::Canonical);
        assert_eq!(
            names(&out.points),
            vec![
                "serving_cell_id",
                "sinr_cell_3",
                "serv_sinr_cell_3",
                "neighbor_cell_id",
                "sinr_cell_4",
            ]
        );
        let serving = &out.points[2];
        assert_eq!(serving.tags.get("serving").map(String::as_str), Some("true"));
        assert_eq!(serving.value(), Some(12.5));
        assert_eq!(out.points[1].value(), Some(12.5));
        assert_eq!(out.points[1].timestamp, 500_000_000);
    }

    #[test]
    fn each_neighbor_id_column_is_its_own_series() {
        let r = row(concat!(
            "timestamp,ueImsiComplete,L3 neigh Id 1 (cellId),L3 neigh Id 2 (cellId),L3 neigh Id 3 (cellId)\n",
            "1.0,111,3,4,5\n",
        ));
        let out = build_trace_points(&r, &cp_cell("2"), MeasurementNaming::Canonical);
        assert_eq!(out.points.len(), 3);

        let series: std::collections::BTreeSet<_> = out
            .points
            .iter()
            .map(|p| (p.measurement.clone(), p.tags.clone()))
            .collect();
        assert_eq!(series.len(), 3);

        let slots: Vec<_> = out
            .points
            .iter()
            .map(|p| (p.tags.get("neighbor").map(String::as_str), p.value()))
            .collect();
        assert_eq!(
            slots,
            vec![(Some("1"), Some(3.0)), (Some("2"), Some(4.0)), (Some("3"), Some(5.0))]
        );
    }

    #[test]
    fn neighbor_ordinal_reads_the_slot_number() {
        assert_eq!(neighbor_ordinal("L3 neigh Id 12 (cellId)"), Some("12"));
        assert_eq!(neighbor_ordinal("L3 neigh Id"), None);
        assert_eq!(neighbor_ordinal("L3 serving Id(m_cellId)"), None);
    }

    #[test]
    fn sinr_without_preceding_id_falls_back_to_file_cell() {
        let r = row("timestamp,ueImsiComplete,L3 neigh SINR 1\n1.0,111,-4\n");
        let out = build_trace_points(&r, &cp_cell("5"), MeasurementNaming::Canonical);
        assert_eq!(names(&out.points), vec!["sinr_cell_5"]);
    }

    #[test]
    fn downlink_delay_is_rescaled() {
        let r = row("timestamp,ueImsiComplete,DRB.PdcpSduDelayDl.UEID (pdcpLatency)\n1.0,7,50\n");
        let src = SourceDescriptor {
            source_type: SourceType::CuUpCell,
            cell_id: "2".into(),
        };
        let out = build_trace_points(&r, &src, MeasurementNaming::Canonical);
        assert_eq!(out.points.len(), 1);
        let p = &out.points[0];
        assert_eq!(p.measurement, "pdcp_delay_downlink");
        assert_eq!(p.value(), Some(5.0));
        assert_eq!(p.tags.get("layer").map(String::as_str), Some("up"));
        assert_eq!(p.tags.get("metric_type").map(String::as_str), Some("latency"));
    }

    #[test]
    fn one_malformed_column_of_five_yields_four_points() {
        let r = row(concat!(
            "timestamp,ueImsiComplete,numActiveUes,RRC.ConnMean,DRB.EstabSucc.5QI.UEID (numDrb),Tot.PdcpSduNbrDl.UEID (txDlPackets),DRB.RelActNbr.5QI.UEID (0)\n",
            "2.0,9,4,12.5,oops,100,0\n",
        ));
        let out = build_trace_points(&r, &cp_cell("2"), MeasurementNaming::Canonical);
        assert_eq!(out.points.len(), 4);
        assert_eq!(out.skipped_fields, 1);
    }

    #[test]
    fn cell_level_columns_have_no_ue_tag() {
        let r = row("timestamp,ueImsiComplete,numActiveUes\n1.0,111,6\n");
        let out = build_trace_points(&r, &cp_cell("2"), MeasurementNaming::Canonical);
        let p = &out.points[0];
        assert_eq!(p.measurement, "active_ue_count");
        assert!(!p.tags.contains_key("ue_id"));
        assert_eq!(p.tags.get("cell_id").map(String::as_str), Some("2"));
    }

    #[test]
    fn legacy_names_follow_simulator_conventions() {
        let r = row(concat!(
            "timestamp,ueImsiComplete,numActiveUes,L3 serving Id(m_cellId),L3 serving SINR 3gpp\n",
            "1.0,111,6,3,8.0\n",
        ));
        let out = build_trace_points(&r, &cp_cell("2"), MeasurementNaming::Legacy);
        assert_eq!(
            names(&out.points),
            vec![
                "numActiveUes_cell_2",
                "Serv_Cellid_ue_111_cp",
                "3GPP_SINR_cell_3_ue_111_cp",
                "3GPP_Serv_SINR_cell_3_ue_111_cp",
            ]
        );
        assert!(out.points.iter().all(|p| p.tags.is_empty()));
    }

    #[test]
    fn position_point_shapes() {
        let t = TraceTable::parse("timestamp,ueImsiComplete,position_x,position_y\n1.5,42,10.0,20.5\n");
        let rec = &t.records[0].1;

        let row = build_position_point(rec, MeasurementNaming::Canonical).unwrap();
        assert_eq!(row.point.measurement, "ue_position");
        assert_eq!(row.point.timestamp, 1_500_000_000);
        assert_eq!(row.point.tags.get("metric_type").map(String::as_str), Some("location"));
        assert_eq!(row.point.fields.get("y").and_then(|v| v.as_f64()), Some(20.5));

        let legacy = build_position_point(rec, MeasurementNaming::Legacy).unwrap();
        assert_eq!(legacy.point.measurement, "UE_Position");
        assert_eq!(legacy.point.tags.get("ue").map(String::as_str), Some("42"));
    }

    #[test]
    fn position_row_missing_coordinate_is_rejected() {
        let t = TraceTable::parse("timestamp,ueImsiComplete,position_x,position_y\n1.5,42,10.0,\n");
        assert_eq!(
            build_position_point(&t.records[0].1, MeasurementNaming::Canonical).unwrap_err(),
            RowError::Missing("position_y")
        );
    }
}
