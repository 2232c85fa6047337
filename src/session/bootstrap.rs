//! Browser-driven session capture.
//!
//! The search API only accepts requests carrying an `x-search-session`
//! header minted by the site's own front end, behind a reCAPTCHA. The
//! bootstrap opens a real browser on the site, lets the human run one
//! search, and watches four credential sources until one of them yields the
//! value:
//!
//! 1. headers of outgoing `/api/search` requests,
//! 2. headers of `/api/search` responses (including the `x-search-token`
//!    alias),
//! 3. cookies,
//! 4. localStorage and sessionStorage.
//!
//! Observers are attached before the human is told to start typing, so no
//! exchange can slip past. The first hit wins, is cached to disk, and the
//! browser is closed on every exit path.

use crate::browser::{BrowserOptions, DrivenBrowser};
use crate::cli::output;
use crate::config;
use crate::error::{Error, Result};
use crate::session::cache::SessionCache;
use crate::session::{
    find_session_header, lower_header_map, scan_cookies, scan_storage_json, SearchSession,
    SessionSource,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EventRequestWillBeSent, EventResponseReceived,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Options for a capture run.
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    pub base_url: String,
    /// Overall deadline for the interactive flow.
    pub timeout: Duration,
    /// Period of the credential poll loop.
    pub poll_interval: Duration,
    /// Headless capture only works when the site skips the captcha (e.g. a
    /// replayed profile); the default is a visible window.
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            base_url: config::DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(config::DEFAULT_CAPTURE_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(1),
            headless: false,
            chrome_path: None,
        }
    }
}

/// A network exchange observed on the driven page.
enum Observed {
    Request {
        url: String,
        headers: HashMap<String, String>,
    },
    Response {
        url: String,
        headers: HashMap<String, String>,
    },
}

/// Drive the browser flow and return a captured session.
///
/// When `cache` is given, the captured value is persisted before returning;
/// a cache write failure is logged, never fatal.
pub async fn capture_session(
    opts: &BootstrapOptions,
    cache: Option<&SessionCache>,
) -> Result<SearchSession> {
    let driven = DrivenBrowser::launch(&BrowserOptions {
        headless: opts.headless,
        chrome_path: opts.chrome_path.clone(),
        ..BrowserOptions::default()
    })
    .await?;

    info!("browser launched, opening {}", opts.base_url);
    let page = match driven.open_page(&opts.base_url).await {
        Ok(p) => p,
        Err(e) => {
            let _ = driven.close().await;
            return Err(e);
        }
    };

    // Attach both observers before telling the human to interact.
    let rx = match attach_observers(&page).await {
        Ok(rx) => rx,
        Err(e) => {
            let _ = driven.close().await;
            return Err(e);
        }
    };

    print_instructions();

    let outcome = poll_for_session(&page, rx, opts).await;
    drop(page);
    if let Err(e) = driven.close().await {
        warn!("browser teardown failed: {e}");
    }

    let session = outcome?;
    info!(
        "captured x-search-session {} from {}",
        session.redacted(),
        session.source.describe()
    );
    if let Some(cache) = cache {
        cache.store_best_effort(&session);
    }
    Ok(session)
}

/// Forward `/api/search` request and response events into a channel the
/// poll loop can drain.
async fn attach_observers(page: &Page) -> Result<mpsc::UnboundedReceiver<Observed>> {
    let (tx, rx) = mpsc::unbounded_channel();

    let mut requests = page
        .event_listener::<EventRequestWillBeSent>()
        .await
        .map_err(|e| Error::Browser(format!("could not listen for requests: {e}")))?;
    let request_tx = tx.clone();
    tokio::spawn(async move {
        while let Some(event) = requests.next().await {
            if !event.request.url.contains(config::SEARCH_API_PATH) {
                continue;
            }
            let headers = serde_json::to_value(&event.request.headers)
                .map(|v| lower_header_map(&v))
                .unwrap_or_default();
            let _ = request_tx.send(Observed::Request {
                url: event.request.url.clone(),
                headers,
            });
        }
    });

    let mut responses = page
        .event_listener::<EventResponseReceived>()
        .await
        .map_err(|e| Error::Browser(format!("could not listen for responses: {e}")))?;
    tokio::spawn(async move {
        while let Some(event) = responses.next().await {
            if !event.response.url.contains(config::SEARCH_API_PATH) {
                continue;
            }
            let headers = serde_json::to_value(&event.response.headers)
                .map(|v| lower_header_map(&v))
                .unwrap_or_default();
            let _ = tx.send(Observed::Response {
                url: event.response.url.clone(),
                headers,
            });
        }
    });

    Ok(rx)
}

/// The capture loop: drain observed exchanges, then fall back to cookies
/// and web storage, once per poll interval until the deadline.
async fn poll_for_session(
    page: &Page,
    mut rx: mpsc::UnboundedReceiver<Observed>,
    opts: &BootstrapOptions,
) -> Result<SearchSession> {
    let deadline = tokio::time::Instant::now() + opts.timeout;

    loop {
        while let Ok(observed) = rx.try_recv() {
            match observed {
                Observed::Request { url, headers } => {
                    let found = find_session_header(&headers, false);
                    info!("observed request {url} (has session: {})", found.is_some());
                    if let Some(value) = found {
                        return Ok(SearchSession::new(value, SessionSource::RequestHeader));
                    }
                }
                Observed::Response { url, headers } => {
                    let found = find_session_header(&headers, true);
                    info!("observed response {url} (has session: {})", found.is_some());
                    if let Some(value) = found {
                        return Ok(SearchSession::new(value, SessionSource::ResponseHeader));
                    }
                }
            }
        }

        if let Some(session) = scan_page_cookies(page).await {
            return Ok(session);
        }
        if let Some(session) = scan_page_storage(page).await {
            return Ok(session);
        }

        let now = tokio::time::Instant::now();
        if now >= deadline {
            warn!(
                "no x-search-session observed within {}s",
                opts.timeout.as_secs()
            );
            return Err(Error::CaptureTimeout {
                waited_secs: opts.timeout.as_secs(),
            });
        }

        let remaining = deadline - now;
        debug!(
            "waiting for /api/search activity ({}s remaining)",
            remaining.as_secs()
        );
        tokio::time::sleep(opts.poll_interval.min(remaining)).await;
    }
}

/// Check the page's cookie jar for a session-like value.
async fn scan_page_cookies(page: &Page) -> Option<SearchSession> {
    let cookies = match page.get_cookies().await {
        Ok(c) => c,
        Err(e) => {
            debug!("could not read cookies: {e}");
            return None;
        }
    };

    let jar: Vec<(&str, &str)> = cookies
        .iter()
        .map(|c| (c.name.as_str(), c.value.as_str()))
        .collect();
    scan_cookies(jar).map(|(name, value)| {
        info!("found session-like cookie {name}");
        SearchSession::new(value, SessionSource::Cookie)
    })
}

/// Check localStorage and sessionStorage for a session-like key.
async fn scan_page_storage(page: &Page) -> Option<SearchSession> {
    for (store, js) in [
        ("localStorage", "JSON.stringify(window.localStorage)"),
        ("sessionStorage", "JSON.stringify(window.sessionStorage)"),
    ] {
        let raw = match page.evaluate(js).await {
            Ok(eval) => eval.into_value::<String>().ok(),
            Err(e) => {
                debug!("could not read {store}: {e}");
                None
            }
        };
        if let Some((key, value)) = raw.as_deref().and_then(scan_storage_json) {
            info!("found session-like {store} key {key}");
            return Some(SearchSession::new(value, SessionSource::WebStorage));
        }
    }
    None
}

/// Tell the human what the browser window is waiting for.
fn print_instructions() {
    if output::is_quiet() {
        return;
    }
    eprintln!();
    eprintln!("  Action required in the browser window:");
    eprintln!("    1. Type any search term on the page");
    eprintln!("    2. Complete the reCAPTCHA if prompted");
    eprintln!("    3. Wait for the results to load");
    eprintln!();
}
