//! chromedriver process management - spawning and readiness checking

use reqwest::blocking::Client;
use serde_json::Value;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::types::{DriverError, DriverResult};

/// Handle to a running chromedriver process
pub struct ChromeDriverService {
    child: Option<Child>,
    url: String,
    port: u16,
}

impl ChromeDriverService {
    /// Spawn `binary --port=<free port>` and wait until it reports ready
    pub fn start(binary: &Path, startup_timeout: Duration) -> DriverResult<Self> {
        let port = find_free_port()?;
        let url = format!("http://127.0.0.1:{}", port);

        info!("Spawning {} on port {}", binary.display(), port);

        let child = Command::new(binary)
            .arg(format!("--port={}", port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| DriverError::Launch(format!("failed to spawn {}: {}", binary.display(), e)))?;

        let mut service = Self {
            child: Some(child),
            url,
            port,
        };

        if let Err(e) = wait_until_ready(&service.url, startup_timeout) {
            service.stop();
            return Err(e);
        }

        info!("chromedriver ready at {}", service.url);
        Ok(service)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stop the process: SIGTERM first, then kill
    pub fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        debug!("Stopping chromedriver (pid: {})", child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{Signal, kill};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                thread::sleep(Duration::from_millis(200));
            }
        }

        let _ = child.kill();
        let _ = child.wait();
    }
}

impl Drop for ChromeDriverService {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Probe `<url>/status` once; `Ok(true)` when the remote end is ready
pub fn check_status(url: &str, timeout: Duration) -> DriverResult<bool> {
    let client = Client::builder().timeout(timeout).build()?;
    let response = client.get(format!("{}/status", url.trim_end_matches('/'))).send()?;
    if !response.status().is_success() {
        return Ok(false);
    }
    let payload: Value = response.json()?;
    Ok(payload
        .pointer("/value/ready")
        .and_then(Value::as_bool)
        .unwrap_or(false))
}

/// Poll `/status` until ready or the deadline passes
pub fn wait_until_ready(url: &str, timeout: Duration) -> DriverResult<()> {
    let start = Instant::now();
    let mut attempts = 0;

    while start.elapsed() < timeout {
        attempts += 1;
        match check_status(url, Duration::from_secs(2)) {
            Ok(true) => return Ok(()),
            Ok(false) => debug!("WebDriver at {} not ready yet", url),
            Err(e) => {
                // Connection refused is expected while the process starts
                if attempts == 1 {
                    debug!("Waiting for WebDriver at {}: {}", url, e);
                }
            }
        }
        thread::sleep(Duration::from_millis(100));
    }

    warn!("WebDriver at {} not ready after {} attempts", url, attempts);
    Err(DriverError::Launch(format!(
        "WebDriver at {} did not become ready within {:?}",
        url, timeout
    )))
}

/// Resolve a driver binary: explicit paths are used as-is, bare names are looked up on PATH
pub fn resolve_binary(binary: &Path) -> Option<PathBuf> {
    if binary.components().count() > 1 {
        return binary.exists().then(|| binary.to_path_buf());
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

fn find_free_port() -> DriverResult<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_free_port() {
        let port = find_free_port().unwrap();
        assert!(port > 1024);
    }

    #[test]
    fn test_check_status_ready() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"value":{"ready":true,"message":"ChromeDriver ready for new sessions."}}"#)
            .create();

        assert!(check_status(&server.url(), Duration::from_secs(2)).unwrap());
        mock.assert();
    }

    #[test]
    fn test_check_status_not_ready() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/status")
            .with_status(200)
            .with_body(r#"{"value":{"ready":false}}"#)
            .create();

        assert!(!check_status(&server.url(), Duration::from_secs(2)).unwrap());
    }

    #[test]
    fn test_wait_until_ready_times_out() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/status")
            .with_status(503)
            .expect_at_least(1)
            .create();

        let result = wait_until_ready(&server.url(), Duration::from_millis(300));
        assert!(matches!(result, Err(DriverError::Launch(_))));
    }

    #[test]
    fn test_start_missing_binary() {
        let result = ChromeDriverService::start(
            Path::new("/nonexistent/chromedriver"),
            Duration::from_millis(100),
        );
        assert!(matches!(result, Err(DriverError::Launch(_))));
    }
}
