//! Wire-level tests of the Chrome WebDriver client and the status probe.

use base64::Engine;
use ecosystem_autotests::driver::service::{check_status, wait_until_ready};
use ecosystem_autotests::driver::{By, ChromeDriver, ChromeOptions, DriverError, Timeouts, WebDriver, find};
use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;

const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

fn session(server: &MockServer) -> ChromeDriver {
    server.mock(|when, then| {
        when.method(POST).path("/session");
        then.status(200)
            .json_body(json!({ "value": { "sessionId": "s1", "capabilities": {} } }));
    });
    ChromeDriver::new_session(&server.base_url(), &ChromeOptions::for_mode(true)).unwrap()
}

#[test]
fn test_new_session_sends_chrome_args() {
    let server = MockServer::start();
    let options = ChromeOptions::for_mode(true);
    let create = server.mock(|when, then| {
        when.method(POST).path("/session").json_body(json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "acceptInsecureCerts": true,
                    "goog:chromeOptions": { "args": options.args() }
                }
            }
        }));
        then.status(200)
            .json_body(json!({ "value": { "sessionId": "abc", "capabilities": {} } }));
    });

    let driver = ChromeDriver::new_session(&server.base_url(), &options).unwrap();

    create.assert();
    assert!(options.args().iter().any(|a| a == "--headless"));
    assert_eq!(driver.session_id(), "abc");
}

#[test]
fn test_session_not_created() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/session");
        then.status(500).json_body(json!({
            "value": { "error": "session not created", "message": "Chrome failed to start" }
        }));
    });

    let err = ChromeDriver::new_session(&server.base_url(), &ChromeOptions::for_mode(false)).err().unwrap();
    assert!(matches!(err, DriverError::Launch(ref m) if m == "Chrome failed to start"));
}

#[test]
fn test_navigation_and_url() {
    let server = MockServer::start();
    let driver = session(&server);

    let goto = server.mock(|when, then| {
        when.method(POST)
            .path("/session/s1/url")
            .json_body(json!({ "url": "https://ecosystem.test/auth/login.html" }));
        then.status(200).json_body(json!({ "value": null }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/session/s1/url");
        then.status(200)
            .json_body(json!({ "value": "https://ecosystem.test/auth/login.html" }));
    });

    driver.goto("https://ecosystem.test/auth/login.html").unwrap();
    goto.assert();
    assert_eq!(driver.current_url().unwrap(), "https://ecosystem.test/auth/login.html");
}

#[test]
fn test_find_and_interact() {
    let server = MockServer::start();
    let driver = session(&server);

    server.mock(|when, then| {
        when.method(POST)
            .path("/session/s1/elements")
            .json_body(json!({ "using": "css selector", "value": "[id=\"textarea_request\"]" }));
        then.status(200).json_body(json!({ "value": [{ (ELEMENT_KEY): "e1" }] }));
    });
    let keys = server.mock(|when, then| {
        when.method(POST)
            .path("/session/s1/element/e1/value")
            .json_body(json!({ "text": "Привет" }));
        then.status(200).json_body(json!({ "value": null }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/session/s1/element/e1/property/value");
        then.status(200).json_body(json!({ "value": "Привет" }));
    });

    let input = find(&driver, &By::id("textarea_request")).unwrap();
    input.send_keys("Привет").unwrap();

    keys.assert();
    assert_eq!(input.value().unwrap(), "Привет");
}

#[test]
fn test_empty_result_is_no_such_element() {
    let server = MockServer::start();
    let driver = session(&server);
    server.mock(|when, then| {
        when.method(POST).path("/session/s1/elements");
        then.status(200).json_body(json!({ "value": [] }));
    });

    let err = find(&driver, &By::link_text("Account settings")).err().unwrap();
    assert!(err.is_no_such_element());
}

#[test]
fn test_w3c_errors_are_decoded() {
    let server = MockServer::start();
    let driver = session(&server);
    server.mock(|when, then| {
        when.method(POST).path("/session/s1/element/gone/click");
        then.status(404).json_body(json!({
            "value": { "error": "stale element reference", "message": "element is not attached" }
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/session/s1/source");
        then.status(502).body("bad gateway");
    });

    let err = driver
        .click(&ecosystem_autotests::driver::ElementRef::new("gone"))
        .unwrap_err();
    assert!(matches!(err, DriverError::StaleElement(_)));

    let err = driver.page_source().unwrap_err();
    assert!(matches!(err, DriverError::Protocol { ref error, .. } if error == "http 502"));
}

#[test]
fn test_screenshot_is_decoded() {
    let server = MockServer::start();
    let driver = session(&server);
    let png = [0x89u8, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    let encoded = base64::engine::general_purpose::STANDARD.encode(png);
    server.mock(|when, then| {
        when.method(GET).path("/session/s1/screenshot");
        then.status(200).json_body(json!({ "value": encoded }));
    });

    assert_eq!(driver.screenshot_png().unwrap(), png.to_vec());
}

#[test]
fn test_timeouts_and_quit() {
    let server = MockServer::start();
    let driver = session(&server);

    let set = server.mock(|when, then| {
        when.method(POST)
            .path("/session/s1/timeouts")
            .json_body(json!({ "implicit": 10000, "pageLoad": 30000 }));
        then.status(200).json_body(json!({ "value": null }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/session/s1/timeouts");
        then.status(200)
            .json_body(json!({ "value": { "implicit": 10000, "pageLoad": 30000, "script": 30000 } }));
    });
    let quit = server.mock(|when, then| {
        when.method(DELETE).path("/session/s1");
        then.status(200).json_body(json!({ "value": null }));
    });

    let timeouts = Timeouts {
        implicit: Duration::from_secs(10),
        page_load: Duration::from_secs(30),
    };
    driver.set_timeouts(&timeouts).unwrap();
    set.assert();
    let read = driver.timeouts().unwrap();
    assert_eq!(read.implicit, Duration::from_secs(10));
    assert_eq!(read.page_load, Duration::from_secs(30));

    driver.quit().unwrap();
    quit.assert();
}

#[test]
fn test_status_ready() {
    let mut server = mockito::Server::new();
    let status = server
        .mock("GET", "/status")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"value":{"ready":true,"message":"ChromeDriver ready for new sessions."}}"#)
        .create();

    assert!(check_status(&server.url(), Duration::from_secs(2)).unwrap());
    status.assert();
    wait_until_ready(&server.url(), Duration::from_secs(2)).unwrap();
}

#[test]
fn test_status_not_ready() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/status")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"value":{"ready":false}}"#)
        .create();

    assert!(!check_status(&server.url(), Duration::from_secs(2)).unwrap());
    let err = wait_until_ready(&server.url(), Duration::from_millis(300)).unwrap_err();
    assert!(matches!(err, DriverError::Launch(_)));
}

#[test]
fn test_status_server_error() {
    let mut server = mockito::Server::new();
    server.mock("GET", "/status").with_status(503).create();

    assert!(!check_status(&server.url(), Duration::from_secs(2)).unwrap());
}
