//! Directory watching for shader and material hot reload.
//!
//! A [`FileWatcher`] runs the platform watcher on its own thread and records
//! every created or modified path into a [`ChangeSet`]. The frame loop calls
//! [`ChangeSet::drain`] once per frame and reloads what it finds.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::errors::Result;

/// Paths changed since the last drain, shared between threads.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    paths: Arc<Mutex<FxHashSet<PathBuf>>>,
}

impl ChangeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, path: impl Into<PathBuf>) {
        self.paths.lock().insert(path.into());
    }

    /// Takes every recorded path. Each path is returned once.
    #[must_use]
    pub fn drain(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.paths.lock().drain().collect();
        paths.sort();
        paths
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.lock().is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.lock().len()
    }
}

/// Recursive watch over one directory feeding a [`ChangeSet`].
///
/// Watching stops when the value is dropped.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
    changes: ChangeSet,
}

impl FileWatcher {
    pub fn watch(root: impl AsRef<Path>, changes: ChangeSet) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let sink = changes.clone();

        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| match result {
            Ok(event) => {
                if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                    for path in event.paths {
                        sink.record(path);
                    }
                }
            }
            Err(err) => log::warn!("File watcher error: {err}"),
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        log::info!("Watching {} for changes", root.display());
        Ok(Self {
            _watcher: watcher,
            root,
            changes,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_returns_each_path_once() {
        let changes = ChangeSet::new();
        changes.record("shaders/a.wgsl");
        changes.record("shaders/b.wgsl");
        changes.record("shaders/a.wgsl");

        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes.drain(),
            vec![PathBuf::from("shaders/a.wgsl"), PathBuf::from("shaders/b.wgsl")]
        );
        assert!(changes.drain().is_empty());
    }

    #[test]
    fn test_clones_share_storage() {
        let changes = ChangeSet::new();
        let producer = changes.clone();
        std::thread::spawn(move || producer.record("materials/floor.json"))
            .join()
            .unwrap();
        assert_eq!(changes.drain(), vec![PathBuf::from("materials/floor.json")]);
    }
}
