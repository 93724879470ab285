//! Configuration management with environment variable support.
//!
//! This module provides centralized configuration for the harness, supporting:
//! - Environment variables for all configurable values
//! - Defaults matching the test environment of the target application
//! - Builder helpers for programmatic configuration (mostly used by tests)
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ECOSYSTEM_LOGIN` | Account login | `v_shutenko` |
//! | `ECOSYSTEM_PASSWORD` | Account password | *(empty)* |
//! | `ECOSYSTEM_LOGIN_URL` | Login page URL | test login page |
//! | `ECOSYSTEM_MODEL_URL` | Post-login model page URL | test model page |
//! | `ECOSYSTEM_HEADLESS` | Run Chrome headless (`on`/`off`, `1`/`0`) | `off` |
//! | `ECOSYSTEM_IMPLICIT_WAIT` | Implicit wait in seconds | `10` |
//! | `ECOSYSTEM_PAGE_LOAD` | Page-load timeout in seconds | `30` |
//! | `ECOSYSTEM_DEFAULT_WAIT` | Explicit wait timeout in seconds | `30` |
//! | `ECOSYSTEM_RESPONSE_TIMEOUT` | Response wait timeout in seconds | `90` |
//! | `ECOSYSTEM_BUTTON_TIMEOUT` | Button re-enable timeout in seconds | `30` |
//! | `ECOSYSTEM_WEBDRIVER_URL` | Existing WebDriver endpoint | *(spawn chromedriver)* |
//! | `ECOSYSTEM_CHROMEDRIVER` | chromedriver binary | `chromedriver` |
//! | `ECOSYSTEM_REPORTS_DIR` | Aggregate report directory | *(walk from executable)* |
//! | `ECOSYSTEM_SCREENSHOTS_DIR` | Failure screenshot directory | `./Screenshots` |
//!
//! The password deliberately has no default: configuration is the only
//! source of credentials.

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

// ============================================================================
// Default Values
// ============================================================================

/// Default account login
pub const DEFAULT_LOGIN: &str = "v_shutenko";

/// Default login page
pub const DEFAULT_LOGIN_URL: &str = "https://ai-ecosystem-test.janusww.com:9999/auth/login.html";

/// Default page reached after login
pub const DEFAULT_MODEL_URL: &str = "https://ai-ecosystem-test.janusww.com:9999/request/model.html";

/// Path fragment of the account settings page
pub const DEFAULT_PROFILE_PATH: &str = "/profile/index.html";

/// User identifier shown on the profile page
pub const DEFAULT_EXPECTED_USER_ID: &str = "b906170e-d802-4a11-b3a5-f22714f854ba";

/// Name shown in the user menu toggle
pub const DEFAULT_USER_DISPLAY_NAME: &str = "Vitaliy";

/// Default implicit wait (seconds)
pub const DEFAULT_IMPLICIT_WAIT_SEC: u64 = 10;

/// Default page-load timeout (seconds)
pub const DEFAULT_PAGE_LOAD_SEC: u64 = 30;

/// Default explicit wait timeout (seconds)
pub const DEFAULT_WAIT_SEC: u64 = 30;

/// Default response wait timeout (seconds)
pub const DEFAULT_RESPONSE_TIMEOUT_SEC: u64 = 90;

/// Default button re-enable timeout (seconds)
pub const DEFAULT_BUTTON_TIMEOUT_SEC: u64 = 30;

/// Default polling interval of the explicit wait (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Polling cadence while waiting for a response (milliseconds)
pub const DEFAULT_RESPONSE_POLL_MS: u64 = 2000;

/// Polling cadence while waiting for a button to re-enable (milliseconds)
pub const DEFAULT_BUTTON_POLL_MS: u64 = 1000;

/// Pause after a successful login (milliseconds)
pub const DEFAULT_POST_LOGIN_PAUSE_MS: u64 = 2000;

/// Pause after opening the user menu (milliseconds)
pub const DEFAULT_MENU_PAUSE_MS: u64 = 1000;

/// Pause after text entry and slider clicks (milliseconds)
pub const DEFAULT_INPUT_PAUSE_MS: u64 = 500;

/// Default chromedriver binary
pub const DEFAULT_CHROMEDRIVER: &str = "chromedriver";

/// How long to wait for a spawned chromedriver to report ready (seconds)
pub const DEFAULT_CHROMEDRIVER_STARTUP_SEC: u64 = 20;

/// Default screenshot directory, relative to the working directory
pub const DEFAULT_SCREENSHOTS_DIR: &str = "Screenshots";

// ============================================================================
// Environment Variable Names
// ============================================================================

pub const ENV_LOGIN: &str = "ECOSYSTEM_LOGIN";
pub const ENV_PASSWORD: &str = "ECOSYSTEM_PASSWORD";
pub const ENV_LOGIN_URL: &str = "ECOSYSTEM_LOGIN_URL";
pub const ENV_MODEL_URL: &str = "ECOSYSTEM_MODEL_URL";
pub const ENV_HEADLESS: &str = "ECOSYSTEM_HEADLESS";
pub const ENV_IMPLICIT_WAIT: &str = "ECOSYSTEM_IMPLICIT_WAIT";
pub const ENV_PAGE_LOAD: &str = "ECOSYSTEM_PAGE_LOAD";
pub const ENV_DEFAULT_WAIT: &str = "ECOSYSTEM_DEFAULT_WAIT";
pub const ENV_RESPONSE_TIMEOUT: &str = "ECOSYSTEM_RESPONSE_TIMEOUT";
pub const ENV_BUTTON_TIMEOUT: &str = "ECOSYSTEM_BUTTON_TIMEOUT";
pub const ENV_WEBDRIVER_URL: &str = "ECOSYSTEM_WEBDRIVER_URL";
pub const ENV_CHROMEDRIVER: &str = "ECOSYSTEM_CHROMEDRIVER";
pub const ENV_REPORTS_DIR: &str = "ECOSYSTEM_REPORTS_DIR";
pub const ENV_SCREENSHOTS_DIR: &str = "ECOSYSTEM_SCREENSHOTS_DIR";

/// Log filter for the tracing subscriber
pub const ENV_LOG: &str = "ECOSYSTEM_LOG";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized harness configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub site: SiteSettings,
    pub browser: BrowserSettings,
    pub waits: WaitSettings,
    pub reports: ReportSettings,
}

/// Target application: credentials and URLs
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub login: String,
    pub password: String,
    pub login_url: String,
    pub model_url: String,
    pub profile_path: String,
    pub expected_user_id: String,
    pub user_display_name: String,
}

/// Browser launch settings
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    pub implicit_wait_sec: u64,
    pub page_load_sec: u64,
    /// Connect to an already running WebDriver server instead of spawning one
    pub webdriver_url: Option<String>,
    pub chromedriver_path: PathBuf,
    pub chromedriver_startup_sec: u64,
}

/// Timeouts, polling cadences and settle pauses
#[derive(Debug, Clone)]
pub struct WaitSettings {
    pub default_wait_sec: u64,
    pub response_timeout_sec: u64,
    pub button_enable_timeout_sec: u64,
    pub poll_interval_ms: u64,
    pub response_poll_ms: u64,
    pub button_poll_ms: u64,
    pub post_login_pause_ms: u64,
    pub menu_pause_ms: u64,
    pub input_pause_ms: u64,
}

/// Output locations
#[derive(Debug, Clone)]
pub struct ReportSettings {
    /// Explicit aggregate report directory; `None` walks up from the executable
    pub reports_dir: Option<PathBuf>,
    pub screenshots_dir: PathBuf,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            site: SiteSettings::from_env(),
            browser: BrowserSettings::from_env(),
            waits: WaitSettings::from_env(),
            reports: ReportSettings::from_env(),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            site: SiteSettings::defaults(),
            browser: BrowserSettings::defaults(),
            waits: WaitSettings::defaults(),
            reports: ReportSettings::defaults(),
        }
    }

    pub fn with_credentials(mut self, login: impl Into<String>, password: impl Into<String>) -> Self {
        self.site.login = login.into();
        self.site.password = password.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.browser.headless = headless;
        self
    }

    pub fn with_reports_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reports.reports_dir = Some(dir.into());
        self
    }

    pub fn with_screenshots_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reports.screenshots_dir = dir.into();
        self
    }

    /// Drop every settle pause and shrink polling cadences; used with the mock browser
    pub fn without_pauses(mut self) -> Self {
        self.waits.post_login_pause_ms = 0;
        self.waits.menu_pause_ms = 0;
        self.waits.input_pause_ms = 0;
        self.waits.poll_interval_ms = 10;
        self.waits.response_poll_ms = 20;
        self.waits.button_poll_ms = 20;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl SiteSettings {
    pub fn from_env() -> Self {
        let defaults = Self::defaults();
        Self {
            login: env::var(ENV_LOGIN).unwrap_or(defaults.login),
            password: env::var(ENV_PASSWORD).unwrap_or(defaults.password),
            login_url: env::var(ENV_LOGIN_URL).unwrap_or(defaults.login_url),
            model_url: env::var(ENV_MODEL_URL).unwrap_or(defaults.model_url),
            ..defaults
        }
    }

    pub fn defaults() -> Self {
        Self {
            login: DEFAULT_LOGIN.to_string(),
            password: String::new(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            model_url: DEFAULT_MODEL_URL.to_string(),
            profile_path: DEFAULT_PROFILE_PATH.to_string(),
            expected_user_id: DEFAULT_EXPECTED_USER_ID.to_string(),
            user_display_name: DEFAULT_USER_DISPLAY_NAME.to_string(),
        }
    }
}

impl BrowserSettings {
    pub fn from_env() -> Self {
        let defaults = Self::defaults();
        Self {
            headless: env::var(ENV_HEADLESS)
                .ok()
                .and_then(|s| parse_switch(&s))
                .unwrap_or(defaults.headless),
            implicit_wait_sec: env_u64(ENV_IMPLICIT_WAIT).unwrap_or(defaults.implicit_wait_sec),
            page_load_sec: env_u64(ENV_PAGE_LOAD).unwrap_or(defaults.page_load_sec),
            webdriver_url: env::var(ENV_WEBDRIVER_URL).ok().filter(|s| !s.trim().is_empty()),
            chromedriver_path: env::var(ENV_CHROMEDRIVER)
                .map(PathBuf::from)
                .unwrap_or(defaults.chromedriver_path),
            chromedriver_startup_sec: defaults.chromedriver_startup_sec,
        }
    }

    pub fn defaults() -> Self {
        Self {
            headless: false,
            implicit_wait_sec: DEFAULT_IMPLICIT_WAIT_SEC,
            page_load_sec: DEFAULT_PAGE_LOAD_SEC,
            webdriver_url: None,
            chromedriver_path: PathBuf::from(DEFAULT_CHROMEDRIVER),
            chromedriver_startup_sec: DEFAULT_CHROMEDRIVER_STARTUP_SEC,
        }
    }

    pub fn implicit_wait(&self) -> Duration {
        Duration::from_secs(self.implicit_wait_sec)
    }

    pub fn page_load(&self) -> Duration {
        Duration::from_secs(self.page_load_sec)
    }
}

impl WaitSettings {
    pub fn from_env() -> Self {
        let defaults = Self::defaults();
        Self {
            default_wait_sec: env_u64(ENV_DEFAULT_WAIT).unwrap_or(defaults.default_wait_sec),
            response_timeout_sec: env_u64(ENV_RESPONSE_TIMEOUT)
                .unwrap_or(defaults.response_timeout_sec),
            button_enable_timeout_sec: env_u64(ENV_BUTTON_TIMEOUT)
                .unwrap_or(defaults.button_enable_timeout_sec),
            ..defaults
        }
    }

    pub fn defaults() -> Self {
        Self {
            default_wait_sec: DEFAULT_WAIT_SEC,
            response_timeout_sec: DEFAULT_RESPONSE_TIMEOUT_SEC,
            button_enable_timeout_sec: DEFAULT_BUTTON_TIMEOUT_SEC,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            response_poll_ms: DEFAULT_RESPONSE_POLL_MS,
            button_poll_ms: DEFAULT_BUTTON_POLL_MS,
            post_login_pause_ms: DEFAULT_POST_LOGIN_PAUSE_MS,
            menu_pause_ms: DEFAULT_MENU_PAUSE_MS,
            input_pause_ms: DEFAULT_INPUT_PAUSE_MS,
        }
    }

    pub fn default_wait(&self) -> Duration {
        Duration::from_secs(self.default_wait_sec)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_sec)
    }

    pub fn button_enable_timeout(&self) -> Duration {
        Duration::from_secs(self.button_enable_timeout_sec)
    }
}

impl ReportSettings {
    pub fn from_env() -> Self {
        Self {
            reports_dir: env::var(ENV_REPORTS_DIR).ok().map(PathBuf::from),
            screenshots_dir: env::var(ENV_SCREENSHOTS_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SCREENSHOTS_DIR)),
        }
    }

    pub fn defaults() -> Self {
        Self {
            reports_dir: None,
            screenshots_dir: PathBuf::from(DEFAULT_SCREENSHOTS_DIR),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse an on/off style switch
/// Supports: "on"/"off", "true"/"false", "1"/"0", "yes"/"no"
fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

/// Get the configured headless mode (convenience function)
pub fn headless() -> bool {
    get().browser.headless
}
