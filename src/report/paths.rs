//! Report file locations and housekeeping.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// Name of the reports directory
pub const REPORTS_DIR_NAME: &str = "Reports";

/// Prefix of aggregate report file names
pub const REPORT_FILE_PREFIX: &str = "TestReport_";

/// Where aggregate reports go
///
/// An explicit directory wins. Otherwise walk two parents up from the
/// executable's directory and use `<that>/Reports` when it exists, else
/// `<executable dir>/Reports`, else `./Reports`.
pub fn resolve_reports_dir(configured: Option<&Path>) -> PathBuf {
    if let Some(dir) = configured {
        return dir.to_path_buf();
    }

    let base = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    match base {
        Some(base) => {
            let project = base.parent().and_then(Path::parent).filter(|p| p.exists());
            project.unwrap_or(base.as_path()).join(REPORTS_DIR_NAME)
        }
        None => PathBuf::from(REPORTS_DIR_NAME),
    }
}

/// Create `dir` if missing; falls back to a temp location when that fails
pub fn ensure_dir(dir: &Path) -> PathBuf {
    if dir.is_dir() {
        return dir.to_path_buf();
    }
    match fs::create_dir_all(dir) {
        Ok(()) => {
            info!("Created reports directory {}", dir.display());
            dir.to_path_buf()
        }
        Err(e) => {
            let fallback = std::env::temp_dir().join(REPORTS_DIR_NAME);
            warn!(
                "Cannot create {} ({}), using {}",
                dir.display(),
                e,
                fallback.display()
            );
            let _ = fs::create_dir_all(&fallback);
            fallback
        }
    }
}

/// `TestReport_<stamp>.txt` in `dir`, suffixed when that name is taken
pub fn report_file_path(dir: &Path, stamp: &str) -> PathBuf {
    let path = dir.join(format!("{}{}.txt", REPORT_FILE_PREFIX, stamp));
    if !path.exists() {
        return path;
    }
    (2..)
        .map(|n| dir.join(format!("{}{}_{}.txt", REPORT_FILE_PREFIX, stamp, n)))
        .find(|p| !p.exists())
        .unwrap_or(path)
}

/// Sanitize a name for use in filenames
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    if cleaned.is_empty() {
        "test".to_string()
    } else {
        cleaned
    }
}

/// An aggregate report on disk
#[derive(Debug, Clone, Serialize)]
pub struct ReportFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<chrono::DateTime<chrono::Local>>,
}

/// All aggregate reports in `dir`, oldest first
pub fn list_reports(dir: &Path) -> std::io::Result<Vec<ReportFile>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut reports = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !is_report_file(&path) {
            continue;
        }
        let metadata = entry.metadata()?;
        reports.push(ReportFile {
            path,
            size: metadata.len(),
            modified: metadata.modified().ok().map(chrono::DateTime::from),
        });
    }
    reports.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(reports)
}

/// Delete aggregate reports older than `max_age`; returns how many went
pub fn cleanup_old_reports(dir: &Path, max_age: Duration) -> std::io::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let now = SystemTime::now();
    let mut cleaned = 0;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !is_report_file(&path) {
            continue;
        }
        let age = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if age.is_some_and(|age| age > max_age) && fs::remove_file(&path).is_ok() {
            cleaned += 1;
        }
    }

    Ok(cleaned)
}

fn is_report_file(path: &Path) -> bool {
    path.is_file()
        && path.extension().is_some_and(|e| e == "txt")
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(REPORT_FILE_PREFIX))
}
