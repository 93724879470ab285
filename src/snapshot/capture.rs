//! Browser screenshots on disk.

use chrono::Local;
use std::fs;
use tracing::info;

use super::types::{Snapshot, SnapshotConfig, SnapshotError, SnapshotResult};
use super::utils::{generate_timestamp, unique_image_path, write_manifest};
use crate::driver::WebDriver;
use crate::report::paths::sanitize_name;

/// Save a screenshot of the current page for `test_name`
///
/// Writes `<dir>/<test>_<YYYYMMDD_HHMMSS>.png` plus a JSON manifest.
pub fn capture_screenshot(driver: &dyn WebDriver, config: &SnapshotConfig, test_name: &str) -> SnapshotResult<Snapshot> {
    let bytes = driver.screenshot_png()?;
    match image::guess_format(&bytes) {
        Ok(image::ImageFormat::Png) => {}
        Ok(other) => return Err(SnapshotError::Capture(format!("expected PNG, got {:?}", other))),
        Err(e) => return Err(e.into()),
    }
    let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)?;

    fs::create_dir_all(&config.output_dir)?;
    let path = unique_image_path(&config.output_dir, &sanitize_name(test_name), &generate_timestamp());
    fs::write(&path, &bytes)?;

    let snapshot = Snapshot {
        image_path: path,
        test: test_name.to_string(),
        url: driver.current_url().unwrap_or_default(),
        width: decoded.width(),
        height: decoded.height(),
        size: bytes.len() as u64,
        timestamp: Local::now(),
    };
    write_manifest(&snapshot, config)?;

    info!("Saved screenshot to {}", snapshot.image_path.display());
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MockBrowser;
    use crate::driver::mock::dom::el;

    fn browser() -> MockBrowser {
        let browser = MockBrowser::new().route("http://app/page", el("body").text("hello"));
        browser.goto("http://app/page").unwrap();
        browser
    }

    #[test]
    fn test_capture_writes_png_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let config = SnapshotConfig::new(dir.path().join("Screenshots"));
        let snapshot = capture_screenshot(&browser(), &config, "Failing Test").unwrap();

        let name = snapshot.image_path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("Failing_Test_"));
        assert!(name.ends_with(".png"));
        assert_eq!(snapshot.url, "http://app/page");
        assert_eq!((snapshot.width, snapshot.height), (64, 36));

        let bytes = fs::read(&snapshot.image_path).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Png);

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(snapshot.image_path.with_extension("json")).unwrap()).unwrap();
        assert_eq!(manifest["test"], "Failing Test");
        assert_eq!(manifest["size"], bytes.len() as u64);
    }

    #[test]
    fn test_capture_failure() {
        let dir = tempfile::tempdir().unwrap();
        let browser = browser().fail_screenshots(true);
        let err = capture_screenshot(&browser, &SnapshotConfig::new(dir.path()), "T").unwrap_err();
        assert!(matches!(err, SnapshotError::Capture(_)));
    }
}
