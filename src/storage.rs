pub mod directory;
mod snapshot;

pub use directory::{collect_snapshot_paths, load_all, LoadedSnapshot};
pub use snapshot::{FormSnapshot, SnapshotError};
