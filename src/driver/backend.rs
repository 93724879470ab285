//! WebDriver backend abstraction.
//!
//! This module provides a unified interface for different browser backends:
//! - `ChromeDriver` talking the W3C WebDriver protocol to a real Chrome
//! - `MockBrowser` (testing with an in-process fake DOM)

use super::lifecycle::ChromeOptions;
use super::types::{By, DriverError, DriverResult, ElementRef, Timeouts};

/// Trait for browser automation backends
///
/// All methods take `&self`; backends synchronise internally so a handle
/// can be borrowed by waits and page helpers at the same time.
pub trait WebDriver: Send + Sync {
    /// Navigate the current window to `url`
    fn goto(&self, url: &str) -> DriverResult<()>;

    /// URL of the current page
    fn current_url(&self) -> DriverResult<String>;

    /// Serialized DOM of the current page
    fn page_source(&self) -> DriverResult<String>;

    /// All elements matching the locator, in document order
    fn find_elements(&self, by: &By) -> DriverResult<Vec<ElementRef>>;

    /// Elements matching the locator below `parent`
    fn find_child_elements(&self, parent: &ElementRef, by: &By) -> DriverResult<Vec<ElementRef>>;

    fn is_displayed(&self, element: &ElementRef) -> DriverResult<bool>;

    fn is_enabled(&self, element: &ElementRef) -> DriverResult<bool>;

    /// Rendered text of the element
    fn text(&self, element: &ElementRef) -> DriverResult<String>;

    /// Content attribute of the element
    fn attribute(&self, element: &ElementRef, name: &str) -> DriverResult<Option<String>>;

    /// IDL property of the element (e.g. the live `value` of an input)
    fn property(&self, element: &ElementRef, name: &str) -> DriverResult<Option<String>>;

    fn click(&self, element: &ElementRef) -> DriverResult<()>;

    fn clear(&self, element: &ElementRef) -> DriverResult<()>;

    fn send_keys(&self, element: &ElementRef, text: &str) -> DriverResult<()>;

    /// PNG screenshot of the viewport
    fn screenshot_png(&self) -> DriverResult<Vec<u8>>;

    fn set_timeouts(&self, timeouts: &Timeouts) -> DriverResult<()>;

    fn timeouts(&self) -> DriverResult<Timeouts>;

    fn set_window_size(&self, width: u32, height: u32) -> DriverResult<()>;

    /// End the session and release the browser
    fn quit(&self) -> DriverResult<()>;

    /// First element matching the locator
    fn find_element(&self, by: &By) -> DriverResult<ElementRef> {
        self.find_elements(by)?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::NoSuchElement(by.to_string()))
    }
}

/// An element bound to the driver that produced it
#[derive(Clone)]
pub struct WebElement<'a> {
    driver: &'a dyn WebDriver,
    id: ElementRef,
}

impl<'a> WebElement<'a> {
    pub fn new(driver: &'a dyn WebDriver, id: ElementRef) -> Self {
        Self { driver, id }
    }

    pub fn id(&self) -> &ElementRef {
        &self.id
    }

    pub fn is_displayed(&self) -> DriverResult<bool> {
        self.driver.is_displayed(&self.id)
    }

    pub fn is_enabled(&self) -> DriverResult<bool> {
        self.driver.is_enabled(&self.id)
    }

    pub fn text(&self) -> DriverResult<String> {
        self.driver.text(&self.id)
    }

    pub fn attribute(&self, name: &str) -> DriverResult<Option<String>> {
        self.driver.attribute(&self.id, name)
    }

    /// Live value of an input or textarea
    pub fn value(&self) -> DriverResult<String> {
        Ok(self.driver.property(&self.id, "value")?.unwrap_or_default())
    }

    pub fn click(&self) -> DriverResult<()> {
        self.driver.click(&self.id)
    }

    pub fn clear(&self) -> DriverResult<()> {
        self.driver.clear(&self.id)
    }

    pub fn send_keys(&self, text: &str) -> DriverResult<()> {
        self.driver.send_keys(&self.id, text)
    }

    pub fn find_all(&self, by: &By) -> DriverResult<Vec<WebElement<'a>>> {
        let driver = self.driver;
        Ok(driver
            .find_child_elements(&self.id, by)?
            .into_iter()
            .map(|id| WebElement::new(driver, id))
            .collect())
    }

    pub fn find(&self, by: &By) -> DriverResult<WebElement<'a>> {
        self.find_all(by)?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::NoSuchElement(by.to_string()))
    }

    /// Displayed, swallowing lookup errors (stale or detached counts as hidden)
    pub fn is_visible(&self) -> bool {
        self.is_displayed().unwrap_or(false)
    }
}

impl std::fmt::Debug for WebElement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebElement").field("id", &self.id).finish()
    }
}

/// All elements matching `by`, bound to `driver`
pub fn find_all<'a>(driver: &'a dyn WebDriver, by: &By) -> DriverResult<Vec<WebElement<'a>>> {
    Ok(driver
        .find_elements(by)?
        .into_iter()
        .map(|id| WebElement::new(driver, id))
        .collect())
}

/// First element matching `by`, bound to `driver`
pub fn find<'a>(driver: &'a dyn WebDriver, by: &By) -> DriverResult<WebElement<'a>> {
    Ok(WebElement::new(driver, driver.find_element(by)?))
}

/// First displayed element matching `by`, if any
pub fn find_visible<'a>(driver: &'a dyn WebDriver, by: &By) -> DriverResult<Option<WebElement<'a>>> {
    Ok(find_all(driver, by)?.into_iter().find(|e| e.is_visible()))
}

/// Something that can start a browser session
///
/// Implemented by `ChromeLauncher` for real Chrome and by any closure
/// with the matching signature, which is how tests plug in a mock.
pub trait DriverFactory: Send + Sync {
    fn launch(&self, options: &ChromeOptions) -> DriverResult<Box<dyn WebDriver>>;
}

impl<F> DriverFactory for F
where
    F: Fn(&ChromeOptions) -> DriverResult<Box<dyn WebDriver>> + Send + Sync,
{
    fn launch(&self, options: &ChromeOptions) -> DriverResult<Box<dyn WebDriver>> {
        self(options)
    }
}
