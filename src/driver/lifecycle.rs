//! Driver lifecycle: deterministic Chrome configuration, session start and
//! guaranteed release.

use std::time::Duration;
use tracing::{info, warn};

use super::backend::{DriverFactory, WebDriver};
use super::service::{ChromeDriverService, resolve_binary};
use super::types::{DriverError, DriverResult, Timeouts};
use super::webdriver::ChromeDriver;
use crate::config::BrowserSettings;
use crate::harness::types::{HarnessError, HarnessResult};
use crate::report::TestReport;
use crate::wait::Wait;

/// Arguments applied in every mode
pub const COMMON_ARGS: [&str; 6] = [
    "--disable-notifications",
    "--disable-extensions",
    "--disable-dev-shm-usage",
    "--ignore-certificate-errors",
    "--disable-web-security",
    "--allow-running-insecure-content",
];

/// Arguments applied only in headless mode
pub const HEADLESS_ARGS: [&str; 4] = ["--headless", "--disable-gpu", "--no-sandbox", "--window-size=1920,1080"];

/// Arguments applied only in headed mode
pub const HEADED_ARGS: [&str; 1] = ["--start-maximized"];

/// Timeout of the explicit wait handed out with every driver
pub const EXPLICIT_WAIT: Duration = Duration::from_secs(30);

/// Chrome command-line options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromeOptions {
    headless: bool,
    args: Vec<String>,
}

impl ChromeOptions {
    /// The fixed argument set for the given mode
    pub fn for_mode(headless: bool) -> Self {
        let mode_args: &[&str] = if headless { &HEADLESS_ARGS } else { &HEADED_ARGS };
        let args = mode_args
            .iter()
            .chain(COMMON_ARGS.iter())
            .map(|s| s.to_string())
            .collect();
        Self { headless, args }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn is_headless(&self) -> bool {
        self.headless
    }
}

/// Starts real Chrome sessions
///
/// Connects to `webdriver_url` when one is configured, otherwise spawns a
/// private chromedriver per session.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    settings: BrowserSettings,
}

impl ChromeLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

impl DriverFactory for ChromeLauncher {
    fn launch(&self, options: &ChromeOptions) -> DriverResult<Box<dyn WebDriver>> {
        if let Some(url) = &self.settings.webdriver_url {
            return Ok(Box::new(ChromeDriver::new_session(url, options)?));
        }

        let binary = resolve_binary(&self.settings.chromedriver_path).ok_or_else(|| {
            DriverError::Launch(format!(
                "chromedriver not found: {}",
                self.settings.chromedriver_path.display()
            ))
        })?;
        let service = ChromeDriverService::start(
            &binary,
            Duration::from_secs(self.settings.chromedriver_startup_sec),
        )?;
        let driver = ChromeDriver::new_session(service.url(), options)?.with_service(service);
        Ok(Box::new(driver))
    }
}

/// A configured driver together with its explicit wait
pub struct DriverSession {
    pub driver: Box<dyn WebDriver>,
    pub wait: Wait,
    pub timeouts: Timeouts,
}

/// Launch and configure a driver
///
/// Applies the timeouts profile (implicit wait, page load) and returns the
/// driver with a 30 s explicit wait. Any failure surfaces as
/// `HarnessError::DriverInit`, and a half-started browser is quit first.
pub fn setup(factory: &dyn DriverFactory, settings: &BrowserSettings, poll_interval: Duration) -> HarnessResult<DriverSession> {
    let options = ChromeOptions::for_mode(settings.headless);
    let driver = factory.launch(&options).map_err(HarnessError::DriverInit)?;

    let timeouts = Timeouts {
        implicit: settings.implicit_wait(),
        page_load: settings.page_load(),
    };
    if let Err(e) = driver.set_timeouts(&timeouts) {
        let _ = driver.quit();
        return Err(HarnessError::DriverInit(e));
    }

    info!(headless = settings.headless, "Driver ready");
    Ok(DriverSession {
        driver,
        wait: Wait::new(EXPLICIT_WAIT).with_poll_interval(poll_interval),
        timeouts,
    })
}

/// Quit the driver; never fails
///
/// Errors are recorded on the report (when it still accepts steps) and logged.
pub fn teardown(driver: Box<dyn WebDriver>, report: &mut TestReport) {
    match driver.quit() {
        Ok(()) => report.info("Драйвер браузера закрыт"),
        Err(e) => {
            warn!("Failed to quit driver: {}", e);
            report.warning(&format!("Ошибка при закрытии драйвера: {}", e));
        }
    }
    drop(driver);
}
