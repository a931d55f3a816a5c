//! Directories of form snapshots.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use walkdir::WalkDir;

use crate::{
    domain::Config,
    storage::{FormSnapshot, SnapshotError},
};

/// A snapshot file and the outcome of loading it.
#[derive(Debug)]
pub struct LoadedSnapshot {
    /// Path of the snapshot file.
    pub path: PathBuf,
    /// The loaded snapshot, or why it could not be loaded.
    pub snapshot: Result<FormSnapshot, SnapshotError>,
}

/// Every YAML or JSON file below `root`, sorted by path.
///
/// Hidden directories are skipped.
#[must_use]
pub fn collect_snapshot_paths(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<_> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            matches!(
                entry.path().extension().and_then(OsStr::to_str),
                Some("yaml" | "yml" | "json")
            )
        })
        .map(walkdir::DirEntry::into_path)
        .collect();
    paths.sort();
    paths
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

/// Loads every snapshot below `root` in parallel.
///
/// Files that fail to load are reported alongside the others rather than
/// aborting the whole directory.
#[must_use]
pub fn load_all(root: &Path, config: &Config) -> Vec<LoadedSnapshot> {
    let paths = collect_snapshot_paths(root);
    tracing::debug!(count = paths.len(), root = %root.display(), "loading snapshots");
    paths
        .into_par_iter()
        .map(|path| {
            let snapshot = FormSnapshot::load(&path, config);
            if let Err(e) = &snapshot {
                tracing::debug!("Failed to load {}: {e}", path.display());
            }
            LoadedSnapshot { path, snapshot }
        })
        .collect()
}
