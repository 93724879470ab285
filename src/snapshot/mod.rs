pub mod capture;
pub mod types;
pub mod utils;

pub use capture::capture_screenshot;
pub use types::{Snapshot, SnapshotConfig, SnapshotError, SnapshotResult};
pub use utils::{generate_filename, generate_timestamp, write_manifest};
