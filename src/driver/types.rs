// Core types shared by every WebDriver backend

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// W3C key under which element references are serialized
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Element locator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum By {
    /// Element id attribute
    Id(String),
    /// CSS selector (comma unions allowed)
    Css(String),
    /// `name` attribute
    Name(String),
    /// Exact visible text of a link
    LinkText(String),
    /// Substring of the visible text of a link
    PartialLinkText(String),
    /// Element tag name
    TagName(String),
}

impl By {
    pub fn id(id: impl Into<String>) -> Self {
        By::Id(id.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        By::Css(selector.into())
    }

    pub fn link_text(text: impl Into<String>) -> Self {
        By::LinkText(text.into())
    }

    pub fn partial_link_text(text: impl Into<String>) -> Self {
        By::PartialLinkText(text.into())
    }

    /// W3C `using` / `value` pair for this locator
    pub fn to_w3c(&self) -> (&'static str, String) {
        match self {
            By::Id(id) => ("css selector", format!("[id=\"{}\"]", escape_quotes(id))),
            By::Css(css) => ("css selector", css.clone()),
            By::Name(name) => ("css selector", format!("[name=\"{}\"]", escape_quotes(name))),
            By::LinkText(text) => ("link text", text.clone()),
            By::PartialLinkText(text) => ("partial link text", text.clone()),
            By::TagName(tag) => ("tag name", tag.clone()),
        }
    }
}

impl std::fmt::Display for By {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            By::Id(id) => write!(f, "By.Id: {}", id),
            By::Css(css) => write!(f, "By.CssSelector: {}", css),
            By::Name(name) => write!(f, "By.Name: {}", name),
            By::LinkText(text) => write!(f, "By.LinkText: {}", text),
            By::PartialLinkText(text) => write!(f, "By.PartialLinkText: {}", text),
            By::TagName(tag) => write!(f, "By.TagName: {}", tag),
        }
    }
}

fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Opaque reference to an element inside one browser session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef(pub String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Session timeouts profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub implicit: Duration,
    pub page_load: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            implicit: Duration::from_secs(0),
            page_load: Duration::from_secs(300),
        }
    }
}

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Error types for driver operations
#[derive(Debug)]
pub enum DriverError {
    /// No element matched the locator
    NoSuchElement(String),

    /// The element reference belongs to a page that is gone
    StaleElement(String),

    /// The browser reported a timeout
    Timeout(String),

    /// W3C error reported by the remote end
    Protocol { error: String, message: String },

    /// HTTP transport failure
    Transport(String),

    /// Browser or driver process could not be started
    Launch(String),

    /// Response body did not have the expected shape
    InvalidResponse(String),

    /// I/O error
    Io(std::io::Error),
}

impl DriverError {
    /// Map a W3C error code to the matching variant
    pub fn from_w3c(error: &str, message: &str) -> Self {
        match error {
            "no such element" => DriverError::NoSuchElement(message.to_string()),
            "stale element reference" => DriverError::StaleElement(message.to_string()),
            "timeout" | "script timeout" => DriverError::Timeout(message.to_string()),
            "session not created" => DriverError::Launch(message.to_string()),
            _ => DriverError::Protocol {
                error: error.to_string(),
                message: message.to_string(),
            },
        }
    }

    pub fn is_no_such_element(&self) -> bool {
        matches!(self, DriverError::NoSuchElement(_))
    }
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverError::NoSuchElement(what) => write!(f, "No such element: {}", what),
            DriverError::StaleElement(what) => write!(f, "Stale element reference: {}", what),
            DriverError::Timeout(msg) => write!(f, "Browser timeout: {}", msg),
            DriverError::Protocol { error, message } => {
                write!(f, "WebDriver error '{}': {}", error, message)
            }
            DriverError::Transport(msg) => write!(f, "Transport error: {}", msg),
            DriverError::Launch(msg) => write!(f, "Launch error: {}", msg),
            DriverError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            DriverError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DriverError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> Self {
        DriverError::Io(err)
    }
}

impl From<reqwest::Error> for DriverError {
    fn from(err: reqwest::Error) -> Self {
        DriverError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(err: serde_json::Error) -> Self {
        DriverError::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_to_w3c() {
        assert_eq!(
            By::id("loginform-login").to_w3c(),
            ("css selector", "[id=\"loginform-login\"]".to_string())
        );
        assert_eq!(By::link_text("Home").to_w3c(), ("link text", "Home".to_string()));
        assert_eq!(
            By::Name("login-button".into()).to_w3c(),
            ("css selector", "[name=\"login-button\"]".to_string())
        );
    }

    #[test]
    fn test_from_w3c_codes() {
        assert!(DriverError::from_w3c("no such element", "x").is_no_such_element());
        assert!(matches!(
            DriverError::from_w3c("stale element reference", "x"),
            DriverError::StaleElement(_)
        ));
        assert!(matches!(
            DriverError::from_w3c("unknown error", "boom"),
            DriverError::Protocol { .. }
        ));
    }
}
