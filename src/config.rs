//! Runtime defaults and environment overrides.
//!
//! Regscout is configured through CLI flags and `REGSCOUT_*` environment
//! variables; there is no config file.

use std::path::PathBuf;

/// The demo business-registry site this tool targets.
pub const DEFAULT_BASE_URL: &str = "https://scraping-trial-test.vercel.app";

/// Path of the session-gated search API on the target site.
pub const SEARCH_API_PATH: &str = "/api/search";

/// Path of the server-rendered results page (used for the Referer header and
/// the HTML fallback mode).
pub const RESULTS_PAGE_PATH: &str = "/search/results";

/// User agent for the driven browser. A desktop Chrome string; the launch
/// also disables the AutomationControlled blink feature so the UA and the
/// runtime fingerprint agree.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// User agent for direct API calls. The API is picky about headers and
/// expects a browser-like request; this mirrors what the site's UI sends.
pub const API_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15";

/// How long the bootstrap waits for the UI flow to produce a session.
pub const DEFAULT_CAPTURE_TIMEOUT_SECS: u64 = 240;

/// Default lifetime of a cached session before a fresh capture is forced.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 12 * 60 * 60;

/// Minimum spacing between consecutive API requests.
pub const DEFAULT_MIN_REQUEST_DELAY_MS: u64 = 500;

/// The regscout home directory (`~/.regscout/`), overridable via
/// `REGSCOUT_HOME`. Holds the session cache.
pub fn regscout_home() -> PathBuf {
    if let Ok(p) = std::env::var("REGSCOUT_HOME") {
        return PathBuf::from(p);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".regscout")
}

/// Session TTL, overridable via `REGSCOUT_SESSION_TTL_SECS`.
pub fn session_ttl() -> chrono::Duration {
    let secs = std::env::var("REGSCOUT_SESSION_TTL_SECS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(DEFAULT_SESSION_TTL_SECS as i64);
    chrono::Duration::seconds(secs)
}
