//! Search-session model and credential-source scanners.
//!
//! The target API rejects requests unless they carry a fresh
//! `x-search-session` header. The value originates in the site's own
//! front-end traffic, so it can show up in several places while a browser
//! drives the UI: the outgoing request headers, the response headers, a
//! cookie, or web storage. The scanners here pick it out of each source;
//! [`bootstrap`] wires them into the live browser flow.

pub mod bootstrap;
pub mod cache;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The request header the search API requires.
pub const SESSION_HEADER: &str = "x-search-session";

/// Header alias some responses use for the same token.
pub const SESSION_TOKEN_HEADER: &str = "x-search-token";

/// Where a session value was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSource {
    RequestHeader,
    ResponseHeader,
    Cookie,
    WebStorage,
    Guessed,
}

impl SessionSource {
    pub fn describe(&self) -> &'static str {
        match self {
            SessionSource::RequestHeader => "outgoing /api/search request header",
            SessionSource::ResponseHeader => "/api/search response header",
            SessionSource::Cookie => "browser cookie",
            SessionSource::WebStorage => "local/session storage",
            SessionSource::Guessed => "random identifier (not captured)",
        }
    }
}

/// A session value usable as the `x-search-session` header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSession {
    pub value: String,
    pub source: SessionSource,
    pub captured_at: DateTime<Utc>,
}

impl SearchSession {
    pub fn new(value: impl Into<String>, source: SessionSource) -> Self {
        Self {
            value: value.into(),
            source,
            captured_at: Utc::now(),
        }
    }

    /// The weak variant preserved from the early scraper experiments: a
    /// random identifier sent as the header value with no browser involved.
    pub fn guessed() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), SessionSource::Guessed)
    }

    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.captured_at
    }

    /// A short prefix safe to log. Session values never appear in full in
    /// log output.
    pub fn redacted(&self) -> String {
        let prefix: String = self.value.chars().take(8).collect();
        if self.value.chars().count() > 8 {
            format!("{prefix}\u{2026}")
        } else {
            prefix
        }
    }
}

/// Look up the session header in a lowercased header map. Responses may
/// carry the token under an alias; requests never do.
pub fn find_session_header(
    headers: &HashMap<String, String>,
    allow_token_alias: bool,
) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .or_else(|| {
            if allow_token_alias {
                headers.get(SESSION_TOKEN_HEADER)
            } else {
                None
            }
        })
        .filter(|v| !v.is_empty())
        .cloned()
}

/// Heuristic for cookie names and storage keys that may hold the session.
pub fn looks_session_like(key: &str) -> bool {
    let lower = key.to_lowercase();
    lower.contains("session") || lower.contains("search") || lower.contains("x-search")
}

/// Pick the first session-like cookie out of a jar. Returns (name, value).
pub fn scan_cookies<'a>(
    cookies: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Option<(String, String)> {
    cookies
        .into_iter()
        .find(|(name, value)| looks_session_like(name) && !value.is_empty())
        .map(|(name, value)| (name.to_string(), value.to_string()))
}

/// Scan a `JSON.stringify(localStorage)` dump for a session-like key.
/// Storage values are always strings; anything else is ignored.
pub fn scan_storage_json(raw: &str) -> Option<(String, String)> {
    let parsed: serde_json::Value = serde_json::from_str(raw).ok()?;
    let map = parsed.as_object()?;
    for (key, value) in map {
        if !looks_session_like(key) {
            continue;
        }
        if let Some(v) = value.as_str() {
            if !v.is_empty() {
                return Some((key.clone(), v.to_string()));
            }
        }
    }
    None
}

/// Flatten a CDP `Headers` object (serialized to JSON) into a lowercased
/// name/value map.
pub fn lower_header_map(headers: &serde_json::Value) -> HashMap<String, String> {
    let mut out = HashMap::new();
    if let Some(map) = headers.as_object() {
        for (name, value) in map {
            if let Some(v) = value.as_str() {
                out.insert(name.to_lowercase(), v.to_string());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_session_header() {
        let mut headers = HashMap::new();
        headers.insert("accept".to_string(), "application/json".to_string());
        headers.insert(SESSION_HEADER.to_string(), "sess-abc".to_string());

        assert_eq!(
            find_session_header(&headers, false).as_deref(),
            Some("sess-abc")
        );
    }

    #[test]
    fn test_token_alias_only_on_responses() {
        let mut headers = HashMap::new();
        headers.insert(SESSION_TOKEN_HEADER.to_string(), "tok-xyz".to_string());

        assert_eq!(find_session_header(&headers, false), None);
        assert_eq!(
            find_session_header(&headers, true).as_deref(),
            Some("tok-xyz")
        );
    }

    #[test]
    fn test_empty_header_value_is_a_miss() {
        let mut headers = HashMap::new();
        headers.insert(SESSION_HEADER.to_string(), String::new());
        assert_eq!(find_session_header(&headers, true), None);
    }

    #[test]
    fn test_lower_header_map_lowercases_names() {
        let raw = serde_json::json!({
            "X-Search-Session": "sess-42",
            "Content-Type": "application/json",
            "X-Count": 3
        });

        let map = lower_header_map(&raw);
        assert_eq!(map.get("x-search-session").unwrap(), "sess-42");
        assert_eq!(map.get("content-type").unwrap(), "application/json");
        // Non-string values are dropped rather than stringified.
        assert!(!map.contains_key("x-count"));
    }

    #[test]
    fn test_scan_cookies_picks_first_match() {
        let jar = [
            ("theme", "dark"),
            ("search_sid", "cookie-val"),
            ("session_backup", "other"),
        ];
        let (name, value) = scan_cookies(jar).unwrap();
        assert_eq!(name, "search_sid");
        assert_eq!(value, "cookie-val");
    }

    #[test]
    fn test_scan_cookies_ignores_empty_values() {
        let jar = [("session_id", ""), ("pref", "x")];
        assert!(scan_cookies(jar).is_none());
    }

    #[test]
    fn test_scan_storage_json() {
        let raw = r#"{"theme":"dark","xSearchSessionId":"store-val","count":"3"}"#;
        let (key, value) = scan_storage_json(raw).unwrap();
        assert_eq!(key, "xSearchSessionId");
        assert_eq!(value, "store-val");
    }

    #[test]
    fn test_scan_storage_rejects_garbage() {
        assert!(scan_storage_json("not json").is_none());
        assert!(scan_storage_json("[1, 2]").is_none());
        assert!(scan_storage_json(r#"{"theme":"dark"}"#).is_none());
        // Session-like key with a non-string value is skipped.
        assert!(scan_storage_json(r#"{"session_meta": {"a": 1}}"#).is_none());
    }

    #[test]
    fn test_redacted_truncates() {
        let session = SearchSession::new("0123456789abcdef", SessionSource::Cookie);
        assert_eq!(session.redacted(), "01234567\u{2026}");

        let short = SearchSession::new("abc", SessionSource::Cookie);
        assert_eq!(short.redacted(), "abc");
    }

    #[test]
    fn test_guessed_session() {
        let a = SearchSession::guessed();
        let b = SearchSession::guessed();
        assert_eq!(a.source, SessionSource::Guessed);
        assert_ne!(a.value, b.value);
    }
}
