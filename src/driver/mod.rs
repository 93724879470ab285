pub mod backend;
pub mod lifecycle;
pub mod mock;
pub mod service;
pub mod types;
pub mod webdriver;

pub use backend::{DriverFactory, WebDriver, WebElement, find, find_all, find_visible};
pub use lifecycle::{ChromeLauncher, ChromeOptions, DriverSession, setup, teardown};
pub use mock::{MockBrowser, MockSite};
pub use service::ChromeDriverService;
pub use types::{By, DriverError, DriverResult, ElementRef, Timeouts};
pub use webdriver::ChromeDriver;
