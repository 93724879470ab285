//! Process-wide aggregation of test reports into one append-only file.
//!
//! All state (file path, counters, result list, finalized flag) lives behind
//! a single mutex, and every file modification happens while holding it, so
//! a header rewrite never interleaves with another test's append.

use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::format::{self, Counters};
use super::paths;
use crate::config::{self, ReportSettings};

/// Error types for aggregate file operations
///
/// Never returned from the public API: failures are logged and the test
/// carries on.
#[derive(Debug)]
pub enum ReportError {
    /// I/O error on the aggregate file
    Io(std::io::Error),

    /// The file no longer contains the tests section marker
    MissingMarker(PathBuf),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Io(err) => write!(f, "I/O error: {}", err),
            ReportError::MissingMarker(path) => {
                write!(f, "{} has no '{}' section", path.display(), format::TESTS_MARKER)
            }
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Io(err) => Some(err),
            ReportError::MissingMarker(_) => None,
        }
    }
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io(err)
    }
}

/// Handle returned when a test registers, used to update its result entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    session: u64,
    index: usize,
}

#[derive(Debug)]
struct ResultEntry {
    line: String,
    finished: bool,
}

#[derive(Debug, Default)]
struct State {
    session: u64,
    path: Option<PathBuf>,
    created: Option<DateTime<Local>>,
    finalized: bool,
    counters: Counters,
    results: Vec<ResultEntry>,
}

/// Shared sink for every test report of a session
#[derive(Debug)]
pub struct Aggregator {
    reports_dir: PathBuf,
    console: AtomicBool,
    state: Mutex<State>,
}

static GLOBAL: OnceLock<Arc<Aggregator>> = OnceLock::new();

impl Aggregator {
    /// Aggregator writing into `reports_dir`
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
            console: AtomicBool::new(true),
            state: Mutex::new(State::default()),
        }
    }

    /// Aggregator for the configured (or discovered) reports directory
    pub fn from_settings(settings: &ReportSettings) -> Self {
        Self::new(paths::resolve_reports_dir(settings.reports_dir.as_deref()))
    }

    /// Echo step lines to stdout (on by default)
    pub fn with_console(self, console: bool) -> Self {
        self.set_console(console);
        self
    }

    /// Switch the stdout echo on a shared aggregator, e.g. the global one
    pub fn set_console(&self, console: bool) {
        self.console.store(console, Ordering::Relaxed);
    }

    /// The process-wide aggregator
    ///
    /// Created on first use from the global configuration; creation installs
    /// the exit hooks that write the session footer.
    pub fn global() -> Arc<Aggregator> {
        GLOBAL
            .get_or_init(|| {
                let aggregator = Arc::new(Aggregator::from_settings(&config::get().reports));
                install_exit_hooks();
                aggregator
            })
            .clone()
    }

    pub fn console(&self) -> bool {
        self.console.load(Ordering::Relaxed)
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a starting test; `None` once the session is finalized
    ///
    /// The first registration creates the aggregate file and its header.
    pub fn register_test(&self, name: &str) -> Option<Ticket> {
        let mut state = self.lock();
        if state.finalized {
            return None;
        }
        self.ensure_initialized(&mut state);

        state.results.push(ResultEntry {
            line: format::started_entry(name),
            finished: false,
        });
        Some(Ticket {
            session: state.session,
            index: state.results.len() - 1,
        })
    }

    /// Append one line to the aggregate file
    pub fn write_line(&self, line: &str) {
        let state = self.lock();
        if state.finalized {
            return;
        }
        if let Some(path) = &state.path {
            if let Err(e) = append(path, &format!("{}\n", line)) {
                warn!("Failed to write to aggregate report: {}", e);
            }
        }
    }

    /// Record a finished test
    ///
    /// Updates the counters and the test's result entry, rewrites the header
    /// and appends the summary block, all under one lock.
    pub fn complete_test(
        &self,
        ticket: Option<Ticket>,
        name: &str,
        passed: bool,
        duration: Duration,
        summary_block: &str,
    ) {
        let mut state = self.lock();
        if state.finalized {
            return;
        }
        self.ensure_initialized(&mut state);

        state.counters.record(passed);

        let line = format::finished_entry(name, passed, duration);
        let slot = ticket
            .filter(|t| t.session == state.session)
            .map(|t| t.index)
            .filter(|&i| state.results.get(i).is_some_and(|e| !e.finished));
        let entry = ResultEntry { line, finished: true };
        match slot {
            Some(index) => state.results[index] = entry,
            None => state.results.push(entry),
        }

        if let Some(path) = state.path.clone() {
            if let Err(e) = rewrite_header(&path, &self.header(&state)) {
                warn!("Failed to update aggregate report header: {}", e);
            }
            if let Err(e) = append(&path, summary_block) {
                warn!("Failed to write test summary: {}", e);
            }
        }
    }

    /// Write the session footer; only the first call has an effect
    ///
    /// Returns whether this call finalized the session.
    pub fn finalize_session(&self) -> bool {
        let mut state = self.lock();
        if state.finalized {
            return false;
        }

        if let Some(path) = &state.path {
            let results: Vec<String> = state.results.iter().map(|r| r.line.clone()).collect();
            let footer = format::footer(Local::now(), &results, &state.counters);
            match append(path, &footer) {
                Ok(()) => {
                    info!(
                        total = state.counters.total,
                        passed = state.counters.passed,
                        failed = state.counters.failed,
                        "Test session finalized: {}",
                        path.display()
                    );
                }
                Err(e) => warn!("Failed to finalize test session: {}", e),
            }
        }

        state.finalized = true;
        true
    }

    /// Forget the current session; the next registration starts a new file
    pub fn start_new_session(&self) {
        let mut state = self.lock();
        let session = state.session + 1;
        *state = State {
            session,
            ..State::default()
        };
        debug!("Started new test session #{}", session);
    }

    pub fn current_report_path(&self) -> Option<PathBuf> {
        self.lock().path.clone()
    }

    pub fn counters(&self) -> Counters {
        self.lock().counters
    }

    /// Result list entries in registration order
    pub fn results(&self) -> Vec<String> {
        self.lock().results.iter().map(|r| r.line.clone()).collect()
    }

    pub fn is_finalized(&self) -> bool {
        self.lock().finalized
    }

    fn header(&self, state: &State) -> String {
        let directory = self
            .reports_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| paths::REPORTS_DIR_NAME.to_string());
        format::header(state.created.unwrap_or_else(Local::now), &directory, &state.counters)
    }

    fn ensure_initialized(&self, state: &mut State) {
        if state.path.is_some() {
            return;
        }

        let dir = paths::ensure_dir(&self.reports_dir);
        let created = Local::now();
        let path = paths::report_file_path(&dir, &created.format("%Y%m%d_%H%M%S").to_string());
        state.created = Some(created);

        match fs::write(&path, self.header(state)) {
            Ok(()) => {
                info!("Aggregate report created: {}", path.display());
                state.path = Some(path);
            }
            Err(e) => warn!("Failed to create aggregate report {}: {}", path.display(), e),
        }
    }
}

fn append(path: &Path, text: &str) -> Result<(), ReportError> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

/// Swap in a new header via a sibling temp file and rename
fn rewrite_header(path: &Path, header: &str) -> Result<(), ReportError> {
    let content = fs::read_to_string(path)?;
    let updated = format::replace_header(&content, header)
        .ok_or_else(|| ReportError::MissingMarker(path.to_path_buf()))?;

    let tmp = path.with_extension("txt.tmp");
    fs::write(&tmp, updated)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn install_exit_hooks() {
    #[cfg(unix)]
    {
        // SAFETY: registers a plain extern "C" function with no captured state
        let rc = unsafe { libc::atexit(finalize_global_session) };
        if rc != 0 {
            warn!("Failed to register exit hook for the test session");
        }
        spawn_signal_listener();
    }
}

extern "C" fn finalize_global_session() {
    if let Some(aggregator) = GLOBAL.get() {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| aggregator.finalize_session()));
    }
}

/// Finalize the session on SIGTERM / SIGINT, then exit with 128 + signo
#[cfg(unix)]
fn spawn_signal_listener() {
    let spawned = std::thread::Builder::new()
        .name("report-signals".to_string())
        .spawn(|| {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!("Cannot start signal listener runtime: {}", e);
                    return;
                }
            };

            let signo = runtime.block_on(async {
                use tokio::signal::unix::{SignalKind, signal};

                let mut terminate = signal(SignalKind::terminate()).ok()?;
                let mut interrupt = signal(SignalKind::interrupt()).ok()?;
                tokio::select! {
                    _ = terminate.recv() => Some(libc::SIGTERM),
                    _ = interrupt.recv() => Some(libc::SIGINT),
                }
            });

            if let Some(signo) = signo {
                warn!("Received signal {}, finalizing test session", signo);
                finalize_global_session();
                std::process::exit(128 + signo);
            }
        });

    if let Err(e) = spawned {
        warn!("Cannot spawn signal listener: {}", e);
    }
}
