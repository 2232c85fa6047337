//! Direct client for the session-gated search API.
//!
//! The API expects a browser-like request: the exact header set the site's
//! UI sends, plus the captured `x-search-session`. Pagination follows the
//! API-reported total. Transport hiccups are retried with backoff; HTTP
//! status errors are not.

use crate::config;
use crate::error::{Error, Result};
use crate::records::{ApiRecord, ApiResponse};
use crate::session::{SearchSession, SESSION_HEADER};
use crate::throttle::Throttle;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER, USER_AGENT};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Exponential backoff for transient transport failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let millis = self.base_delay.as_millis() as u64;
        let delay = Duration::from_millis(millis.saturating_mul(1 << attempt.min(16)));
        delay.min(self.max_delay)
    }
}

/// One page of search results.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub results: Vec<ApiRecord>,
    pub total: u64,
    pub page: u32,
}

/// Client for `/api/search`, bound to one base URL and one session.
pub struct SearchClient {
    http: reqwest::Client,
    base_url: Url,
    session: SearchSession,
    throttle: Throttle,
    retry: RetryPolicy,
}

impl SearchClient {
    pub fn new(base_url: &str, session: &SearchSession) -> Result<Self> {
        Self::with_policy(
            base_url,
            session,
            RetryPolicy::default(),
            Duration::from_millis(config::DEFAULT_MIN_REQUEST_DELAY_MS),
        )
    }

    pub fn with_policy(
        base_url: &str,
        session: &SearchSession,
        retry: RetryPolicy,
        min_request_delay: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .default_headers(Self::default_headers(&base_url)?)
            .build()?;

        Ok(Self {
            http,
            base_url,
            session: session.clone(),
            throttle: Throttle::new(min_request_delay),
            retry,
        })
    }

    /// The header set the site's UI sends on every search call.
    fn default_headers(base_url: &Url) -> Result<HeaderMap> {
        let origin = base_url.as_str().trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(config::API_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
        headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));
        headers.insert(ORIGIN, HeaderValue::from_str(&origin)?);
        Ok(headers)
    }

    fn api_url(&self) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(config::SEARCH_API_PATH);
        url
    }

    /// The Referer the UI would send for this query.
    fn referer(&self, query: &str) -> String {
        let mut url = self.base_url.clone();
        url.set_path(config::RESULTS_PAGE_PATH);
        url.query_pairs_mut().append_pair("q", query);
        url.to_string()
    }

    /// Fetch a single page of results.
    pub async fn fetch_page(&self, query: &str, page: u32) -> Result<SearchPage> {
        self.throttle.wait().await;

        info!("fetching page {page} for query '{query}'");
        let response = self.send_with_retry(query, page).await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::SessionRejected {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::ApiStatus {
                status: status.as_u16(),
                page,
                snippet: snippet(&body),
            });
        }

        let parsed: ApiResponse = serde_json::from_str(&body).map_err(|e| {
            warn!("page {page} body did not parse as JSON: {e}");
            Error::ApiDecode {
                page,
                snippet: snippet(&body),
            }
        })?;

        info!("fetched {} rows from page {page}", parsed.results.len());
        Ok(SearchPage {
            results: parsed.results,
            total: parsed.total,
            page,
        })
    }

    /// Fetch pages from 1 until the API-reported total is reached, a page
    /// comes back empty, or the optional page cap is hit.
    pub async fn fetch_all(&self, query: &str, max_pages: Option<u32>) -> Result<Vec<ApiRecord>> {
        let mut all: Vec<ApiRecord> = Vec::new();
        let mut page = 1u32;

        loop {
            let search_page = self.fetch_page(query, page).await?;

            if search_page.results.is_empty() {
                info!("no results returned on page {page}, stopping");
                break;
            }

            all.extend(search_page.results);
            info!("collected {} / {} records", all.len(), search_page.total);

            if search_page.total > 0 && all.len() as u64 >= search_page.total {
                info!("reached API total ({}), done", search_page.total);
                break;
            }
            if let Some(cap) = max_pages {
                if page >= cap {
                    warn!("stopping at page cap ({cap}) before the API total");
                    break;
                }
            }

            page += 1;
        }

        Ok(all)
    }

    /// Send the request, retrying connect and timeout failures.
    async fn send_with_retry(&self, query: &str, page: u32) -> Result<reqwest::Response> {
        let mut attempt = 0u32;
        loop {
            let request = self
                .http
                .get(self.api_url())
                .query(&[("q", query), ("page", &page.to_string())])
                .header(REFERER, self.referer(query))
                .header(SESSION_HEADER, &self.session.value);

            match request.send().await {
                Ok(response) => return Ok(response),
                Err(e) if is_transient(&e) && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        "page {page} request failed (attempt {}/{}): {e}, retrying in {:?}",
                        attempt + 1,
                        self.retry.max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect()
}

/// First 250 characters of a body, flattened to one line for logging.
pub(crate) fn snippet(body: &str) -> String {
    body.chars()
        .take(250)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionSource;

    #[test]
    fn test_retry_delay_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
        };

        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(10), Duration::from_millis(500));
    }

    #[test]
    fn test_snippet_flattens_and_truncates() {
        let body = "line one\nline two\r\nline three";
        assert_eq!(snippet(body), "line one line two  line three");

        let long = "x".repeat(400);
        assert_eq!(snippet(&long).len(), 250);
    }

    #[test]
    fn test_referer_includes_query() {
        let session = SearchSession::new("tok", SessionSource::RequestHeader);
        let client = SearchClient::new("https://registry.example", &session).unwrap();
        assert_eq!(
            client.referer("Silver Tech"),
            "https://registry.example/search/results?q=Silver+Tech"
        );
    }

    #[test]
    fn test_api_url() {
        let session = SearchSession::new("tok", SessionSource::RequestHeader);
        let client = SearchClient::new("https://registry.example", &session).unwrap();
        assert_eq!(
            client.api_url().as_str(),
            "https://registry.example/api/search"
        );
    }
}
