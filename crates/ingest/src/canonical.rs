//! Raw trace column name → canonical metric.
//!
//! Pure and deterministic: the same column name always yields the same
//! [`CanonicalMetric`]. Invoked once per populated column per row.

use std::fmt;

/// Semantic category of a metric, derived from its canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricCategory {
    RadioQuality,
    Latency,
    Bearer,
    Connection,
    Throughput,
    Statistics,
    Location,
    Other,
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricCategory::RadioQuality => write!(f, "radio_quality"),
            MetricCategory::Latency => write!(f, "latency"),
            MetricCategory::Bearer => write!(f, "bearer"),
            MetricCategory::Connection => write!(f, "connection"),
            MetricCategory::Throughput => write!(f, "throughput"),
            MetricCategory::Statistics => write!(f, "statistics"),
            MetricCategory::Location => write!(f, "location"),
            MetricCategory::Other => write!(f, "other"),
        }
    }
}

/// How a column participates in the per-row fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    /// An ordinary numeric metric.
    Plain,
    /// Identifies a cell; later SINR columns in the same row refer to it.
    CellContext { serving: bool },
    /// SINR measured towards the most recent context cell.
    CellSinr { serving: bool, gpp3: bool },
}

/// Whether a metric describes one UE or the whole cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricScope {
    Ue,
    Cell,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalMetric {
    pub name: String,
    pub category: MetricCategory,
    pub role: ColumnRole,
    pub scope: MetricScope,
    /// Multiplier applied to the raw value before it is stored.
    pub scale: Option<f64>,
}

impl CanonicalMetric {
    pub fn convert(&self, raw: f64) -> f64 {
        match self.scale {
            Some(factor) => raw * factor,
            None => raw,
        }
    }
}

struct Mapping {
    raw: &'static str,
    canonical: &'static str,
    role: ColumnRole,
    scale: Option<f64>,
}

const fn plain(raw: &'static str, canonical: &'static str) -> Mapping {
    Mapping { raw, canonical, role: ColumnRole::Plain, scale: None }
}

/// First substring match wins, so more specific names come first
/// (`... SINR 3gpp` before `... SINR`, per-UE delay before cell delay).
const METRIC_MAP: &[Mapping] = &[
    Mapping {
        raw: "L3 serving Id",
        canonical: "serving_cell_id",
        role: ColumnRole::CellContext { serving: true },
        scale: None,
    },
    Mapping {
        raw: "L3 neigh Id",
        canonical: "neighbor_cell_id",
        role: ColumnRole::CellContext { serving: false },
        scale: None,
    },
    Mapping {
        raw: "L3 serving SINR 3gpp",
        canonical: "sinr_3gpp",
        role: ColumnRole::CellSinr { serving: true, gpp3: true },
        scale: None,
    },
    Mapping {
        raw: "L3 neigh SINR 3gpp",
        canonical: "sinr_3gpp",
        role: ColumnRole::CellSinr { serving: false, gpp3: true },
        scale: None,
    },
    Mapping {
        raw: "L3 serving SINR",
        canonical: "sinr",
        role: ColumnRole::CellSinr { serving: true, gpp3: false },
        scale: None,
    },
    Mapping {
        raw: "L3 neigh SINR",
        canonical: "sinr",
        role: ColumnRole::CellSinr { serving: false, gpp3: false },
        scale: None,
    },
    plain("sameCellSinr 3gpp", "same_cell_sinr_3gpp"),
    plain("sameCellSinr", "same_cell_sinr"),
    Mapping {
        raw: "DRB.PdcpSduDelayDl.UEID",
        canonical: "pdcp_delay_downlink",
        role: ColumnRole::Plain,
        scale: Some(0.1),
    },
    plain("DRB.PdcpSduDelayDl", "cell_pdcp_delay_downlink"),
    plain("DRB.PdcpSduBitRateDl", "pdcp_throughput_downlink"),
    plain("DRB.PdcpSduVolumeDl", "pdcp_volume_downlink"),
    plain("Tot.PdcpSduNbrDl", "pdcp_tx_count"),
    plain("DRB.PdcpPduNbrDl", "pdcp_pdu_tx_count"),
    plain("DRB.PdcpSduNbrUl", "pdcp_rx_count"),
    plain("DRB.EstabSucc", "drb_established_count"),
    plain("DRB.RelActNbr", "drb_released_count"),
    plain("RRC.ConnMean", "rrc_connection_time"),
    plain("numActiveUes", "active_ue_count"),
];

/// Lowercase, with spaces and dots turned into underscores.
pub fn slugify(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            ' ' | '.' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Category of a canonical name, by substring in fixed priority order.
pub fn classify(canonical: &str) -> MetricCategory {
    let name = canonical.to_ascii_lowercase();
    if name.contains("sinr") {
        MetricCategory::RadioQuality
    } else if name.contains("delay") || name.contains("latency") {
        MetricCategory::Latency
    } else if name.contains("drb") {
        MetricCategory::Bearer
    } else if name.contains("rrc") {
        MetricCategory::Connection
    } else if name.contains("pdcp") {
        MetricCategory::Throughput
    } else if name.contains("count") || name.contains("ue") {
        MetricCategory::Statistics
    } else {
        MetricCategory::Other
    }
}

/// Per-UE columns carry a `UEID` marker or come from the L3 block.
fn scope_of(raw: &str) -> MetricScope {
    if raw.contains("UEID") || raw.contains("L3") {
        MetricScope::Ue
    } else {
        MetricScope::Cell
    }
}

/// Map a raw column name to its canonical metric.
pub fn canonicalize(raw: &str) -> CanonicalMetric {
    let (name, role, scale) = match METRIC_MAP.iter().find(|m| raw.contains(m.raw)) {
        Some(m) => (m.canonical.to_string(), m.role, m.scale),
        None => (slugify(raw), ColumnRole::Plain, None),
    };
    CanonicalMetric {
        category: classify(&name),
        name,
        role,
        scope: scope_of(raw),
        scale,
    }
}
