//! `regscout scrape <query>` -- run a full scrape to a JSON file.

use crate::browser::{BrowserOptions, DrivenBrowser};
use crate::cli::output::{self, Styled};
use crate::client::SearchClient;
use crate::config;
use crate::error::Error;
use crate::export;
use crate::html;
use crate::records::BusinessRecord;
use crate::session::bootstrap::{self, BootstrapOptions};
use crate::session::cache::SessionCache;
use crate::session::{SearchSession, SessionSource};
use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// How to talk to the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Call the session-gated JSON API directly (default).
    Api,
    /// Render the results page in a headless browser and parse the table.
    Html,
}

/// How to obtain the `x-search-session` value in API mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SessionStrategy {
    /// Capture from a real browser flow, with disk caching.
    Browser,
    /// Send a random identifier. Works only against lax deployments of the
    /// demo site; never cached, never recovered.
    Guess,
}

pub struct ScrapeOpts {
    pub query: String,
    pub output: PathBuf,
    pub mode: Mode,
    pub base_url: String,
    pub max_pages: Option<u32>,
    pub strategy: SessionStrategy,
    pub fresh_session: bool,
    pub headless: bool,
    pub capture_timeout: u64,
}

/// Run the scrape command.
pub async fn run(opts: ScrapeOpts) -> Result<()> {
    info!("starting scrape for query '{}'", opts.query);

    let records = match opts.mode {
        Mode::Api => scrape_api(&opts).await?,
        Mode::Html => scrape_html(&opts).await?,
    };

    export::write_json(&records, &opts.output)
        .with_context(|| format!("writing {}", opts.output.display()))?;
    export::log_sample(&records);

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "query": opts.query,
            "records": records.len(),
            "output": opts.output.display().to_string(),
        }));
        return Ok(());
    }

    if !output::is_quiet() {
        let s = Styled::new();
        eprintln!();
        eprintln!(
            "  {} {} records for '{}' written to {}",
            s.ok_sym(),
            s.bold(&records.len().to_string()),
            opts.query,
            opts.output.display()
        );
    }

    Ok(())
}

/// API mode: resolve a session, page through the API, remap.
async fn scrape_api(opts: &ScrapeOpts) -> Result<Vec<BusinessRecord>> {
    let cache = SessionCache::default_cache();
    let bootstrap_opts = BootstrapOptions {
        base_url: opts.base_url.clone(),
        timeout: Duration::from_secs(opts.capture_timeout),
        headless: opts.headless,
        ..BootstrapOptions::default()
    };

    let session = resolve_session(opts, &cache, &bootstrap_opts).await?;
    let client = SearchClient::new(&opts.base_url, &session)?;

    let raw = match client.fetch_all(&opts.query, opts.max_pages).await {
        Ok(raw) => raw,
        // A rejected browser session usually just aged out server-side:
        // drop the cache, capture once more, retry. Guessed sessions fail
        // fast instead of launching a browser the caller opted out of.
        Err(Error::SessionRejected { status }) if session.source != SessionSource::Guessed => {
            warn!("session rejected with status {status}, capturing a fresh one");
            cache.clear().ok();
            let fresh = bootstrap::capture_session(&bootstrap_opts, Some(&cache))
                .await
                .context("re-capturing session after rejection")?;
            let client = SearchClient::new(&opts.base_url, &fresh)?;
            client
                .fetch_all(&opts.query, opts.max_pages)
                .await
                .context("scraping with the re-captured session")?
        }
        Err(e) => return Err(e).context("scraping the search API"),
    };

    info!("fetched {} raw records total", raw.len());
    Ok(raw.into_iter().map(Into::into).collect())
}

/// HTML mode: render the results page headless and parse the table. No
/// session needed.
async fn scrape_html(opts: &ScrapeOpts) -> Result<Vec<BusinessRecord>> {
    let driven = DrivenBrowser::launch(&BrowserOptions {
        headless: true,
        ..BrowserOptions::default()
    })
    .await
    .context("launching headless browser")?;

    let mut url = url::Url::parse(&opts.base_url).context("parsing base URL")?;
    url.set_path(config::RESULTS_PAGE_PATH);
    url.query_pairs_mut().append_pair("q", &opts.query);

    let rendered = driven.fetch_rendered(url.as_str()).await;
    driven.close().await.ok();
    let rendered = rendered.context("rendering the results page")?;

    let records = html::parse_results(&rendered);
    info!("parsed {} records from rendered page", records.len());
    Ok(records)
}

/// Pick the session: guessed, forced-fresh, cached, or newly captured.
async fn resolve_session(
    opts: &ScrapeOpts,
    cache: &SessionCache,
    bootstrap_opts: &BootstrapOptions,
) -> Result<SearchSession> {
    if opts.strategy == SessionStrategy::Guess {
        let session = SearchSession::guessed();
        info!("using guessed session {}", session.redacted());
        return Ok(session);
    }

    if opts.fresh_session {
        cache.clear().ok();
    } else if let Some(cached) = cache.load() {
        return Ok(cached);
    }

    info!("no usable cached session, bootstrapping via browser flow");
    bootstrap::capture_session(bootstrap_opts, Some(cache))
        .await
        .context("capturing x-search-session (complete the captcha and run a search)")
}
