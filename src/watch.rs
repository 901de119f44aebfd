//! Filesystem watcher for continuous-sync mode (C8, `-W/--watch`)
//!
//! Batches non-directory change events; once more than `debounce` has
//! elapsed since the last flush, calls back with the sorted list of
//! changed paths. Upload units are safely re-invokable over the same
//! destinations (resume + idempotent atomic rename), so the caller can
//! simply re-run `send` over the batch.

use crate::cancel::CancelToken;
use crate::error::{Result, VaayuError};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Watch `paths` for changes, invoking `on_batch` with the sorted set of
/// changed files whenever `debounce` has elapsed since the previous
/// flush. Returns when `cancel` trips.
pub fn watch_and_send(
    paths: &[PathBuf],
    debounce: Duration,
    cancel: &CancelToken,
    mut on_batch: impl FnMut(Vec<PathBuf>) -> Result<()>,
) -> Result<()> {
    let (tx, rx) = channel::<notify::Result<Event>>();
    let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })
    .map_err(|e| VaayuError::Config(format!("failed to start filesystem watcher: {e}")))?;

    for path in paths {
        watcher
            .watch(path, RecursiveMode::Recursive)
            .map_err(|e| VaayuError::Config(format!("failed to watch '{}': {e}", path.display())))?;
    }

    let mut pending: BTreeSet<PathBuf> = BTreeSet::new();
    let mut last_flush = Instant::now();

    loop {
        if cancel.is_cancelled() {
            return Ok(());
        }

        match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(Ok(event)) => {
                if is_directory_only_event(&event) {
                    continue;
                }
                for path in event.paths {
                    pending.insert(path);
                }

                if !pending.is_empty() && last_flush.elapsed() > debounce {
                    flush(&mut pending, &mut last_flush, &mut on_batch)?;
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "filesystem watcher event error");
            }
            Err(RecvTimeoutError::Timeout) => {
                if !pending.is_empty() && last_flush.elapsed() > debounce {
                    flush(&mut pending, &mut last_flush, &mut on_batch)?;
                }
            }
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        }
    }
}

fn is_directory_only_event(event: &Event) -> bool {
    matches!(event.kind, EventKind::Access(_)) || event.paths.iter().all(|p| p.is_dir())
}

fn flush(
    pending: &mut BTreeSet<PathBuf>,
    last_flush: &mut Instant,
    on_batch: &mut impl FnMut(Vec<PathBuf>) -> Result<()>,
) -> Result<()> {
    let batch: Vec<PathBuf> = pending.iter().cloned().collect();
    pending.clear();
    *last_flush = Instant::now();
    on_batch(batch)
}

/// Whether `path` still exists, used to skip batches for deleted inputs
/// without treating it as an error.
pub fn still_exists(path: &Path) -> bool {
    path.exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_only_events_are_filtered() {
        let event = Event::new(EventKind::Access(notify::event::AccessKind::Any));
        assert!(is_directory_only_event(&event));
    }

    #[test]
    fn still_exists_reflects_filesystem_state() {
        let dir = tempfile::tempdir().unwrap();
        assert!(still_exists(dir.path()));
        assert!(!still_exists(&dir.path().join("missing")));
    }
}
