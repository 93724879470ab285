//! Domain operations against the AI Ecosystem site.
//!
//! Every operation is a method on [`TestContext`](crate::harness::TestContext)
//! and records its progress as report steps. Failures are recorded as an
//! ERROR step and returned to the caller.

pub mod auth;
pub mod locator;
pub mod model;

pub use auth::mask_sensitive_data;
pub use locator::{Located, LocatorChain, Strategy, TextFilter};

/// Selector set identifying the user menu toggle
pub const USER_MENU: &str = ".dropdown-toggle, .user-menu, .dropdown-user, [data-toggle='dropdown'], .user-name";

/// Narrower set used when the display name cannot be matched
pub const USER_MENU_FALLBACK: &str = ".dropdown-toggle, .user-menu, .dropdown-user";

/// Any of these being visible means a user is logged in
pub const LOGGED_IN_MARKERS: &str = ".dropdown-toggle, .user-menu, .dropdown-user";

/// Login field of the login form
pub const LOGIN_INPUT: &str = "loginform-login";

pub const PASSWORD_INPUT: &str = "loginform-password";

/// Icon inside the login form's submit button
pub const LOGIN_SUBMIT: &str = ".icon-circle-right2";

/// Request textarea on the model page
pub const REQUEST_INPUT: &str = "textarea_request";

pub const SEND_BUTTON: &str = "send_request";

pub const CLEAR_BUTTON: &str = "clear_request";

/// Path of the model (ChatGPT) page
pub const MODEL_PATH: &str = "/request/model.html";

/// Window size used by the layout-sensitive scenarios
pub const BROWSER_SIZE: (u32, u32) = (1936, 1048);
