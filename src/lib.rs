//! Regscout scrapes a demo business-registry site whose search API is
//! gated behind an `x-search-session` header. The header value can only be
//! minted by the site's own front end, so the core of this crate is the
//! session bootstrap: drive a real browser through the UI, observe its
//! network traffic, cookies, and web storage until the value appears, and
//! cache it so the interactive captcha step is not repeated. Around that
//! sit a paginating API client, a rendered-HTML fallback, and JSON export.

pub mod browser;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod html;
pub mod records;
pub mod session;
pub mod stealth;
pub mod throttle;

pub use error::{Error, Result};
