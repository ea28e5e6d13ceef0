//! Bridge from filesystem notifications to the ingestion session.
//!
//! The `notify` callback runs on the watcher's own thread, so it only
//! forwards matching paths over a channel. A single tokio task drains the
//! channel and hands each path to [`IngestionSession::on_file_changed`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::{IngestError, Result};
use crate::session::IngestionSession;
use crate::source::WATCH_PATTERNS;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Whether a file name is one of the watched trace patterns.
pub fn matches_watch_pattern(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    WATCH_PATTERNS.iter().any(|p| {
        Pattern::new(p)
            .map(|pat| pat.matches_with(name, MATCH_OPTIONS))
            .unwrap_or(false)
    })
}

fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

/// Forward the matching paths of one notify event.
fn forward_event(event: &Event, tx: &mpsc::UnboundedSender<PathBuf>) {
    if !is_content_change(&event.kind) {
        return;
    }
    for path in event.paths.iter().filter(|p| matches_watch_pattern(p)) {
        if tx.send(path.clone()).is_err() {
            warn!(path = %path.display(), "ingest task gone, dropping file event");
        }
    }
}

/// Watches a trace directory and feeds changes into a session.
pub struct TraceWatcher {
    dir: PathBuf,
    /// Held to keep the OS watch alive.
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl TraceWatcher {
    /// Start watching `dir` (non-recursive). Files already present are
    /// queued once so records written before startup are ingested too.
    pub fn start(dir: &Path, session: IngestionSession) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel::<PathBuf>();

        let callback_tx = tx.clone();
        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<Event, notify::Error>| match res {
                Ok(event) => forward_event(&event, &callback_tx),
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            },
        )?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        for path in initial_files(dir)? {
            let _ = tx.send(path);
        }
        drop(tx);

        let task = tokio::spawn(run_ingest_loop(rx, session));
        info!(path = %dir.display(), patterns = ?WATCH_PATTERNS, "watching trace directory");

        Ok(Self {
            dir: dir.to_path_buf(),
            _watcher: watcher,
            task,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stop watching and abort the ingest task.
    pub fn stop(self) {
        self.task.abort();
        info!(path = %self.dir.display(), "stopped watching trace directory");
    }
}

fn initial_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && matches_watch_pattern(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Drain the channel, coalescing bursts: all paths queued at the moment a
/// batch is taken are handled once each.
async fn run_ingest_loop(mut rx: mpsc::UnboundedReceiver<PathBuf>, session: IngestionSession) {
    while let Some(first) = rx.recv().await {
        let mut pending = BTreeSet::from([first]);
        while let Ok(path) = rx.try_recv() {
            pending.insert(path);
        }

        for path in pending {
            match session.on_file_changed(&path).await {
                Ok(_) => {}
                Err(IngestError::UnknownSource(p)) => {
                    warn!(path = %p.display(), "ignoring unrecognized trace file");
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "failed to ingest trace file");
                }
            }
        }
    }
}
