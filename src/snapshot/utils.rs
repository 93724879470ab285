use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

use crate::snapshot::types::{Snapshot, SnapshotConfig, SnapshotResult};

/// Generate a timestamp string in YYYYMMDD_HHMMSS format
pub fn generate_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Generate a filename for snapshot images
pub fn generate_filename(prefix: &str, timestamp: &str) -> String {
    format!("{}_{}.png", prefix, timestamp)
}

/// `dir/<prefix>_<timestamp>.png`, suffixed with `_2`, `_3`... when taken
pub fn unique_image_path(dir: &Path, prefix: &str, timestamp: &str) -> PathBuf {
    let path = dir.join(generate_filename(prefix, timestamp));
    if !path.exists() {
        return path;
    }
    (2..)
        .map(|n| dir.join(generate_filename(&format!("{}_{}", prefix, timestamp), &n.to_string())))
        .find(|p| !p.exists())
        .unwrap_or(path)
}

/// Write the JSON manifest for a snapshot if configured
pub fn write_manifest(snapshot: &Snapshot, config: &SnapshotConfig) -> SnapshotResult<()> {
    if config.include_manifest {
        let manifest_path = snapshot.image_path.with_extension("json");
        fs::write(manifest_path, serde_json::to_string_pretty(snapshot)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_filename() {
        assert_eq!(generate_filename("Login", "20240501_120000"), "Login_20240501_120000.png");
    }

    #[test]
    fn test_unique_image_path() {
        let dir = tempfile::tempdir().unwrap();
        let first = unique_image_path(dir.path(), "T", "20240501_120000");
        fs::write(&first, b"x").unwrap();
        let second = unique_image_path(dir.path(), "T", "20240501_120000");
        assert_eq!(second.file_name().unwrap(), "T_20240501_120000_2.png");
    }
}
