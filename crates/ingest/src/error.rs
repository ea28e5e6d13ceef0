use std::path::PathBuf;

use thiserror::Error;

use simwatch_storage::StoreError;

/// Why a single record could not be used.
#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error("missing required column '{0}'")]
    Missing(&'static str),

    #[error("column '{column}' is not numeric: '{value}'")]
    Invalid { column: String, value: String },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unrecognized trace file: {}", .0.display())]
    UnknownSource(PathBuf),

    #[error("malformed row at {}:{}: {}", .path.display(), .line, .source)]
    MalformedRow {
        path: PathBuf,
        line: usize,
        #[source]
        source: RowError,
    },

    #[error("store write failed: {0}")]
    Store(#[from] StoreError),

    #[error("filesystem watcher error: {0}")]
    Watch(#[from] notify::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;
