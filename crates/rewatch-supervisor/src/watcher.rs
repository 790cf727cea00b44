//! File-system change notifier backed by `notify`.
//!
//! Every path in every non-access event is sent to the controller as an
//! [`FsEvent`]. Filtering is the controller's job.

use std::path::PathBuf;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rewatch_core::FsEvent;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Result, SupervisorError};

fn forward(event: notify::Event, tx: &mpsc::UnboundedSender<FsEvent>) {
    // Reads (including the child's own builds) must not cause restarts.
    if matches!(event.kind, EventKind::Access(_)) {
        return;
    }
    let kind = format!("{:?}", event.kind);
    for path in event.paths {
        if tx.send(FsEvent::new(path, kind.clone())).is_err() {
            return;
        }
    }
}

/// Recursive watch on a fixed set of directories.
pub struct FsWatcher {
    watcher: Option<RecommendedWatcher>,
}

impl FsWatcher {
    pub fn start(dirs: &[PathBuf], tx: mpsc::UnboundedSender<FsEvent>) -> Result<Self> {
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
            Ok(event) => forward(event, &tx),
            Err(e) => warn!(error = %e, "file watcher error"),
        })
        .map_err(SupervisorError::WatcherInit)?;

        for dir in dirs {
            watcher
                .watch(dir, RecursiveMode::Recursive)
                .map_err(|source| SupervisorError::Watch {
                    path: dir.clone(),
                    source,
                })?;
        }

        Ok(Self {
            watcher: Some(watcher),
        })
    }

    /// Stops watching. Idempotent.
    pub fn deinit(&mut self) {
        if self.watcher.take().is_some() {
            debug!("file watcher stopped");
        }
    }
}
