//! W3C WebDriver client for Chrome.
//!
//! Speaks the JSON wire protocol of chromedriver (or any W3C compliant
//! remote end) over blocking HTTP. Error bodies of the form
//! `{"value": {"error": ..., "message": ...}}` are decoded into
//! [`DriverError`] variants.

use base64::Engine;
use reqwest::Method;
use reqwest::blocking::Client;
use serde_json::{Value, json};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::backend::WebDriver;
use super::lifecycle::ChromeOptions;
use super::service::ChromeDriverService;
use super::types::{By, DriverError, DriverResult, ELEMENT_KEY, ElementRef, Timeouts};

/// HTTP timeout for a single WebDriver command
const COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// A live Chrome session
pub struct ChromeDriver {
    client: Client,
    base_url: String,
    session_id: String,
    /// Locally spawned chromedriver, stopped when the session is dropped
    service: Mutex<Option<ChromeDriverService>>,
}

impl ChromeDriver {
    /// Create a new session on the WebDriver server at `server_url`
    pub fn new_session(server_url: &str, options: &ChromeOptions) -> DriverResult<Self> {
        let client = Client::builder().timeout(COMMAND_TIMEOUT).build()?;
        let base_url = server_url.trim_end_matches('/').to_string();

        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "acceptInsecureCerts": true,
                    "goog:chromeOptions": { "args": options.args() }
                }
            }
        });

        let value = send(&client, Method::POST, &format!("{}/session", base_url), Some(capabilities))?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::InvalidResponse(format!("no sessionId in {}", value)))?
            .to_string();

        info!(session = %session_id, "Chrome session created at {}", base_url);

        Ok(Self {
            client,
            base_url,
            session_id,
            service: Mutex::new(None),
        })
    }

    /// Attach a spawned chromedriver so it lives exactly as long as the session
    pub fn with_service(self, service: ChromeDriverService) -> Self {
        if let Ok(mut slot) = self.service.lock() {
            *slot = Some(service);
        }
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.base_url, self.session_id, path)
    }

    fn get(&self, path: &str) -> DriverResult<Value> {
        send(&self.client, Method::GET, &self.url(path), None)
    }

    fn post(&self, path: &str, body: Value) -> DriverResult<Value> {
        send(&self.client, Method::POST, &self.url(path), Some(body))
    }

    fn element_path(element: &ElementRef, suffix: &str) -> String {
        format!("/element/{}{}", element.as_str(), suffix)
    }
}

impl WebDriver for ChromeDriver {
    fn goto(&self, url: &str) -> DriverResult<()> {
        self.post("/url", json!({ "url": url }))?;
        Ok(())
    }

    fn current_url(&self) -> DriverResult<String> {
        as_string(self.get("/url")?)
    }

    fn page_source(&self) -> DriverResult<String> {
        as_string(self.get("/source")?)
    }

    fn find_elements(&self, by: &By) -> DriverResult<Vec<ElementRef>> {
        let (using, value) = by.to_w3c();
        parse_elements(self.post("/elements", json!({ "using": using, "value": value }))?)
    }

    fn find_child_elements(&self, parent: &ElementRef, by: &By) -> DriverResult<Vec<ElementRef>> {
        let (using, value) = by.to_w3c();
        parse_elements(self.post(
            &Self::element_path(parent, "/elements"),
            json!({ "using": using, "value": value }),
        )?)
    }

    fn is_displayed(&self, element: &ElementRef) -> DriverResult<bool> {
        as_bool(self.get(&Self::element_path(element, "/displayed"))?)
    }

    fn is_enabled(&self, element: &ElementRef) -> DriverResult<bool> {
        as_bool(self.get(&Self::element_path(element, "/enabled"))?)
    }

    fn text(&self, element: &ElementRef) -> DriverResult<String> {
        as_string(self.get(&Self::element_path(element, "/text"))?)
    }

    fn attribute(&self, element: &ElementRef, name: &str) -> DriverResult<Option<String>> {
        as_optional_string(self.get(&Self::element_path(element, &format!("/attribute/{}", name)))?)
    }

    fn property(&self, element: &ElementRef, name: &str) -> DriverResult<Option<String>> {
        as_optional_string(self.get(&Self::element_path(element, &format!("/property/{}", name)))?)
    }

    fn click(&self, element: &ElementRef) -> DriverResult<()> {
        self.post(&Self::element_path(element, "/click"), json!({}))?;
        Ok(())
    }

    fn clear(&self, element: &ElementRef) -> DriverResult<()> {
        self.post(&Self::element_path(element, "/clear"), json!({}))?;
        Ok(())
    }

    fn send_keys(&self, element: &ElementRef, text: &str) -> DriverResult<()> {
        self.post(&Self::element_path(element, "/value"), json!({ "text": text }))?;
        Ok(())
    }

    fn screenshot_png(&self) -> DriverResult<Vec<u8>> {
        let encoded = as_string(self.get("/screenshot")?)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| DriverError::InvalidResponse(format!("screenshot is not base64: {}", e)))
    }

    fn set_timeouts(&self, timeouts: &Timeouts) -> DriverResult<()> {
        self.post(
            "/timeouts",
            json!({
                "implicit": timeouts.implicit.as_millis() as u64,
                "pageLoad": timeouts.page_load.as_millis() as u64,
            }),
        )?;
        Ok(())
    }

    fn timeouts(&self) -> DriverResult<Timeouts> {
        let value = self.get("/timeouts")?;
        let millis = |key: &str| value.get(key).and_then(Value::as_u64).unwrap_or(0);
        Ok(Timeouts {
            implicit: Duration::from_millis(millis("implicit")),
            page_load: Duration::from_millis(millis("pageLoad")),
        })
    }

    fn set_window_size(&self, width: u32, height: u32) -> DriverResult<()> {
        self.post("/window/rect", json!({ "width": width, "height": height }))?;
        Ok(())
    }

    fn quit(&self) -> DriverResult<()> {
        let result = send(&self.client, Method::DELETE, &self.url(""), None).map(|_| ());
        if let Ok(mut slot) = self.service.lock() {
            if let Some(mut service) = slot.take() {
                service.stop();
            }
        }
        debug!(session = %self.session_id, "Chrome session closed");
        result
    }
}

/// Send one command and unwrap the W3C `value` envelope
fn send(client: &Client, method: Method, url: &str, body: Option<Value>) -> DriverResult<Value> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send()?;
    let status = response.status();
    let payload: Value = response.json().unwrap_or(Value::Null);
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        let message = value.get("message").and_then(Value::as_str).unwrap_or("");
        return Err(DriverError::from_w3c(error, message));
    }

    if !status.is_success() {
        warn!("WebDriver returned HTTP {} for {}", status, url);
        return Err(DriverError::Protocol {
            error: format!("http {}", status.as_u16()),
            message: payload.to_string(),
        });
    }

    Ok(value)
}

fn parse_elements(value: Value) -> DriverResult<Vec<ElementRef>> {
    let items = value
        .as_array()
        .ok_or_else(|| DriverError::InvalidResponse(format!("expected element list, got {}", value)))?;
    items
        .iter()
        .map(|item| {
            item.get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(ElementRef::new)
                .ok_or_else(|| DriverError::InvalidResponse(format!("not an element: {}", item)))
        })
        .collect()
}

fn as_string(value: Value) -> DriverResult<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(DriverError::InvalidResponse(format!("expected string, got {}", other))),
    }
}

fn as_optional_string(value: Value) -> DriverResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(DriverError::InvalidResponse(format!("expected string, got {}", other))),
    }
}

fn as_bool(value: Value) -> DriverResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| DriverError::InvalidResponse(format!("expected bool, got {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_elements() {
        let value = json!([{ (ELEMENT_KEY): "a" }, { (ELEMENT_KEY): "b" }]);
        let elements = parse_elements(value).unwrap();
        assert_eq!(elements, vec![ElementRef::new("a"), ElementRef::new("b")]);
    }

    #[test]
    fn test_parse_elements_rejects_garbage() {
        assert!(parse_elements(json!({"x": 1})).is_err());
        assert!(parse_elements(json!([{"id": "a"}])).is_err());
    }

    #[test]
    fn test_optional_string() {
        assert_eq!(as_optional_string(Value::Null).unwrap(), None);
        assert_eq!(as_optional_string(json!("v")).unwrap(), Some("v".to_string()));
        assert_eq!(as_optional_string(json!(true)).unwrap(), Some("true".to_string()));
    }
}
