//! Bounded polling of DOM conditions.
//!
//! Every wait has an absolute deadline. Predicate errors (missing or stale
//! elements, transient protocol failures) count as "not yet" and are
//! retried until the deadline passes.

use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use crate::driver::{By, DriverResult, Timeouts, WebDriver, WebElement, find_all};
use crate::harness::types::{HarnessError, HarnessResult};

/// Default polling interval of an explicit wait
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Elements that may hold the model's answer
pub const RESPONSE_CONTAINERS: &str = ".content, .response, .answer, .message, .coping, \
     [class*='response'], [class*='answer'], [class*='message']";

/// Loading indicators that mean a request is still in flight
pub const LOADING_INDICATORS: &str = ".ladda-spinner, .loading, .spinner, [class*='loading']";

/// The copy button shown next to an answer
pub const COPY_BUTTON: &str = ".coping";

/// Texts that appear in response containers before any answer arrives
pub const RESPONSE_PLACEHOLDERS: [&str; 3] = ["Your answer will be shown here", "Temperature:", "Copy Answer"];

/// Minimum length (in characters) of text accepted as an answer
pub const MIN_RESPONSE_CHARS: usize = 10;

/// Explicit wait bound to a timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wait {
    timeout: Duration,
    poll_interval: Duration,
}

impl Wait {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Poll `predicate` until it yields a value or the timeout expires
    pub fn until<T>(
        &self,
        driver: &dyn WebDriver,
        what: &str,
        predicate: impl FnMut(&dyn WebDriver) -> DriverResult<Option<T>>,
    ) -> HarnessResult<T> {
        self.until_with_timeout(driver, what, self.timeout, predicate)
    }

    /// Same as [`Wait::until`] with an explicit timeout
    pub fn until_with_timeout<T>(
        &self,
        driver: &dyn WebDriver,
        what: &str,
        timeout: Duration,
        mut predicate: impl FnMut(&dyn WebDriver) -> DriverResult<Option<T>>,
    ) -> HarnessResult<T> {
        poll_until(timeout, self.poll_interval, || predicate(driver)).ok_or_else(|| {
            HarnessError::WaitTimeout {
                what: what.to_string(),
                timeout,
            }
        })
    }

    /// First displayed element matching `by`
    pub fn until_visible<'a>(&self, driver: &'a dyn WebDriver, by: &By) -> HarnessResult<WebElement<'a>> {
        let found = self.until(driver, &format!("visibility of {}", by), |d| {
            for element in d.find_elements(by)? {
                if d.is_displayed(&element)? {
                    return Ok(Some(element));
                }
            }
            Ok(None)
        })?;
        Ok(WebElement::new(driver, found))
    }

    /// Current URL once it contains `fragment`
    pub fn until_url_contains(&self, driver: &dyn WebDriver, fragment: &str) -> HarnessResult<String> {
        self.until(driver, &format!("URL containing '{}'", fragment), |d| {
            let url = d.current_url()?;
            Ok(url.contains(fragment).then_some(url))
        })
    }
}

/// Core polling loop shared by every wait
///
/// Checks immediately, then every `interval`; the last check happens at the
/// deadline so the call never returns later than `timeout` plus one check.
pub fn poll_until<T>(
    timeout: Duration,
    interval: Duration,
    mut check: impl FnMut() -> DriverResult<Option<T>>,
) -> Option<T> {
    let deadline = Instant::now() + timeout;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match check() {
            Ok(Some(value)) => return Some(value),
            Ok(None) => {}
            Err(e) => trace!("Wait predicate failed (attempt {}): {}", attempts, e),
        }

        let now = Instant::now();
        if now >= deadline {
            debug!("Wait gave up after {} attempts", attempts);
            return None;
        }
        thread::sleep(interval.min(deadline - now));
    }
}

/// How a response was recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEvidence {
    /// A response container shows real text
    Text(String),
    /// Loaders are gone and the copy button is visible
    CopyButtonReady,
}

/// Wait until the model's answer is on the page
///
/// Succeeds on either a visible response container with more than
/// [`MIN_RESPONSE_CHARS`] characters of non-placeholder text, or on no
/// visible loading indicator together with a visible copy button.
///
/// The session's implicit wait is off while polling, so a selector with no
/// match costs one round trip rather than the implicit wait, and is restored
/// afterwards.
pub fn wait_for_response(
    driver: &dyn WebDriver,
    timeout: Duration,
    poll_interval: Duration,
) -> HarnessResult<ResponseEvidence> {
    without_implicit_wait(driver, || {
        poll_until(timeout, poll_interval, || response_ready(driver))
    })
    .ok_or(HarnessError::ResponseTimeout(timeout))
}

/// Run `f` with the implicit wait set to zero, then restore the previous one
pub fn without_implicit_wait<T>(driver: &dyn WebDriver, f: impl FnOnce() -> T) -> T {
    let saved = match driver.timeouts() {
        Ok(saved) => saved,
        Err(e) => {
            warn!("Cannot read session timeouts, polling with the implicit wait: {}", e);
            return f();
        }
    };

    let polling = Timeouts {
        implicit: Duration::ZERO,
        ..saved
    };
    if let Err(e) = driver.set_timeouts(&polling) {
        warn!("Cannot suspend the implicit wait: {}", e);
    }

    let result = f();

    if let Err(e) = driver.set_timeouts(&saved) {
        warn!("Cannot restore the implicit wait of {:?}: {}", saved.implicit, e);
    }
    result
}

/// One check of the response condition
pub fn response_ready(driver: &dyn WebDriver) -> DriverResult<Option<ResponseEvidence>> {
    for container in find_all(driver, &By::css(RESPONSE_CONTAINERS))? {
        if !container.is_visible() {
            continue;
        }
        let text = container.text()?;
        let text = text.trim();
        if is_answer(text) {
            return Ok(Some(ResponseEvidence::Text(text.to_string())));
        }
    }

    let loading = find_all(driver, &By::css(LOADING_INDICATORS))?
        .iter()
        .any(WebElement::is_visible);
    if loading {
        return Ok(None);
    }

    let copy_visible = find_all(driver, &By::css(COPY_BUTTON))?
        .iter()
        .any(WebElement::is_visible);
    Ok(copy_visible.then_some(ResponseEvidence::CopyButtonReady))
}

/// Text long enough and not a known placeholder
pub fn is_answer(text: &str) -> bool {
    text.chars().count() > MIN_RESPONSE_CHARS && !RESPONSE_PLACEHOLDERS.iter().any(|p| text.contains(p))
}

/// Wait until `button` is enabled again
pub fn wait_for_button_enabled(
    button: &WebElement<'_>,
    timeout: Duration,
    poll_interval: Duration,
) -> HarnessResult<()> {
    poll_until(timeout, poll_interval, || Ok(button.is_enabled()?.then_some(())))
        .ok_or(HarnessError::ButtonStuckDisabled(timeout))
}
