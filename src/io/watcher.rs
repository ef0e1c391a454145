use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::log_io::date_of_path;

/// Events sent from the file watcher to the cockpit event loop.
#[derive(Debug)]
pub enum FileEvent {
    /// One or more daily logs changed on disk.
    Changed(Vec<PathBuf>),
}

/// Watches the log folder for edits made outside the cockpit
/// (another editor, or `tc` run from a second terminal).
pub struct LogWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<FileEvent>,
}

impl LogWatcher {
    /// Start watching `log_dir`. Call `poll()` each tick.
    pub fn start(log_dir: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result else {
                    return;
                };
                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                let relevant: Vec<PathBuf> =
                    event.paths.into_iter().filter(|p| is_log_file(p)).collect();
                if !relevant.is_empty() {
                    let _ = tx.send(FileEvent::Changed(relevant));
                }
            },
            Config::default(),
        )?;

        watcher.watch(log_dir, RecursiveMode::NonRecursive)?;
        Ok(LogWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Drain queued events without blocking.
    pub fn poll(&self) -> Vec<FileEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }

    /// True if any queued event touches `path`. Drains the queue.
    pub fn changed(&self, path: &Path) -> bool {
        self.poll().into_iter().any(|FileEvent::Changed(paths)| {
            paths
                .iter()
                .any(|p| p == path || p.file_name() == path.file_name())
        })
    }
}

/// Daily logs only (`YYYY-MM-DD.md`); the lock file and editor temp files
/// are noise.
fn is_log_file(path: &Path) -> bool {
    date_of_path(path).is_some()
}
