//! Trace file classification.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Name of the UE position trace.
pub const POSITION_FILE: &str = "ue_positions.txt";

/// Glob patterns of every file the watcher reacts to.
pub const WATCH_PATTERNS: &[&str] = &[
    "cu-up-cell-*.txt",
    "cu-cp-cell-*.txt",
    "du-cell-*.txt",
    POSITION_FILE,
];

/// Kind of trace a file carries. The ordinal is part of the dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    CuUpCell,
    CuCpCell,
    DuCell,
    CuUpEnb,
    CuCpEnb,
    UePosition,
}

impl SourceType {
    pub fn ordinal(self) -> u8 {
        match self {
            SourceType::CuUpCell => 0,
            SourceType::CuCpCell => 1,
            SourceType::DuCell => 2,
            SourceType::CuUpEnb => 3,
            SourceType::CuCpEnb => 4,
            SourceType::UePosition => 5,
        }
    }

    /// Protocol layer suffix used in tags and legacy measurement names.
    pub fn layer(self) -> Option<&'static str> {
        match self {
            SourceType::CuUpCell | SourceType::CuUpEnb => Some("up"),
            SourceType::CuCpCell | SourceType::CuCpEnb => Some("cp"),
            SourceType::DuCell => Some("du"),
            SourceType::UePosition => None,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::CuUpCell => write!(f, "cu_up_cell"),
            SourceType::CuCpCell => write!(f, "cu_cp_cell"),
            SourceType::DuCell => write!(f, "du_cell"),
            SourceType::CuUpEnb => write!(f, "cu_up_enb"),
            SourceType::CuCpEnb => write!(f, "cu_cp_enb"),
            SourceType::UePosition => write!(f, "ue_position"),
        }
    }
}

static SOURCE_PATTERNS: LazyLock<Vec<(Regex, SourceType)>> = LazyLock::new(|| {
    [
        (r"(?i)^cu-up-cell-([2-5])\.txt$", SourceType::CuUpCell),
        (r"(?i)^cu-cp-cell-([2-5])\.txt$", SourceType::CuCpCell),
        (r"(?i)^du-cell-([2-5])\.txt$", SourceType::DuCell),
        (r"(?i)^cu-up-cell-(1)\.txt$", SourceType::CuUpEnb),
        (r"(?i)^cu-cp-cell-(1)\.txt$", SourceType::CuCpEnb),
    ]
    .into_iter()
    .map(|(re, ty)| (Regex::new(re).expect("static source pattern"), ty))
    .collect()
});

/// What a file-change event refers to. Computed per event, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub source_type: SourceType,
    /// Cell the file belongs to; empty for the position file.
    pub cell_id: String,
}

impl SourceDescriptor {
    /// Classify a trace file by name. `None` for files that match no
    /// known pattern (including `du-cell-1.txt`, which has no eNB variant).
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.eq_ignore_ascii_case(POSITION_FILE) {
            return Some(Self {
                source_type: SourceType::UePosition,
                cell_id: String::new(),
            });
        }
        SOURCE_PATTERNS.iter().find_map(|(re, ty)| {
            re.captures(name).map(|caps| Self {
                source_type: *ty,
                cell_id: caps[1].to_string(),
            })
        })
    }
}
