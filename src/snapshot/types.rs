// Core types for failure screenshots

use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;

/// Configuration for screenshot capture
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotConfig {
    /// Directory where screenshots will be saved
    pub output_dir: PathBuf,

    /// Whether to write a JSON manifest next to each image
    pub include_manifest: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(crate::config::DEFAULT_SCREENSHOTS_DIR),
            include_manifest: true,
        }
    }
}

impl SnapshotConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }
}

/// A captured browser screenshot
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Path to the PNG file
    pub image_path: PathBuf,

    /// Test the screenshot belongs to
    pub test: String,

    /// Page shown when the screenshot was taken
    pub url: String,

    pub width: u32,
    pub height: u32,

    /// Size of the PNG in bytes
    pub size: u64,

    pub timestamp: DateTime<Local>,
}

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Error types for snapshot operations
#[derive(Debug)]
pub enum SnapshotError {
    /// The browser could not produce a usable image
    Capture(String),

    /// I/O error
    Io(std::io::Error),

    /// Serialization error
    Serialization(serde_json::Error),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Capture(msg) => write!(f, "Capture error: {}", msg),
            SnapshotError::Io(err) => write!(f, "I/O error: {}", err),
            SnapshotError::Serialization(err) => write!(f, "Serialization error: {}", err),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Capture(_) => None,
            SnapshotError::Io(err) => Some(err),
            SnapshotError::Serialization(err) => Some(err),
        }
    }
}

// Implement From traits for automatic error conversion
impl From<std::io::Error> for SnapshotError {
    fn from(err: std::io::Error) -> Self {
        SnapshotError::Io(err)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::Serialization(err)
    }
}

impl From<image::ImageError> for SnapshotError {
    fn from(err: image::ImageError) -> Self {
        SnapshotError::Capture(err.to_string())
    }
}

impl From<crate::driver::DriverError> for SnapshotError {
    fn from(err: crate::driver::DriverError) -> Self {
        SnapshotError::Capture(err.to_string())
    }
}
