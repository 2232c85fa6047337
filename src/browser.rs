//! Browser launch and teardown using chromiumoxide.
//!
//! One wrapper shared by the session bootstrap (headful, human in the loop)
//! and the rendered-HTML fallback mode (headless).

use crate::error::{Error, Result};
use crate::{config, stealth};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Launch options for a driven browser.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Headless launch. The bootstrap runs headful because the reCAPTCHA
    /// needs a human; the HTML fallback runs headless.
    pub headless: bool,
    pub user_agent: String,
    /// Explicit Chrome binary; when unset, discovery runs.
    pub chrome_path: Option<PathBuf>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: false,
            user_agent: config::BROWSER_USER_AGENT.to_string(),
            chrome_path: None,
        }
    }
}

/// Find a Chrome/Chromium binary: `REGSCOUT_CHROME_PATH`, then PATH, then
/// the macOS application bundle.
pub fn find_chrome() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("REGSCOUT_CHROME_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    for name in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
        "chrome",
    ] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let bundle =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if bundle.exists() {
            return Some(bundle);
        }
    }

    None
}

/// A launched browser plus the handler task that keeps its CDP connection
/// alive.
pub struct DrivenBrowser {
    browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
}

impl DrivenBrowser {
    /// Launch a browser with the given options.
    pub async fn launch(opts: &BrowserOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", opts.user_agent))
            .window_size(1440, 900);

        if !opts.headless {
            builder = builder.with_head();
        }
        if std::env::var("REGSCOUT_NO_SANDBOX").is_ok() {
            builder = builder.no_sandbox();
        }
        if let Some(path) = opts.chrome_path.clone().or_else(find_chrome) {
            debug!("using browser binary {}", path.display());
            builder = builder.chrome_executable(path);
        }

        let chrome_config = builder.build().map_err(Error::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| Error::BrowserLaunch(e.to_string()))?;

        // The handler stream must be polled for the whole browser lifetime.
        let handler_task = tokio::spawn(async move {
            loop {
                match handler.next().await {
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        debug!("browser handler event error: {e}");
                        continue;
                    }
                    None => break,
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Open a page at the given URL with the stealth patches applied.
    pub async fn open_page(&self, url: &str) -> Result<Page> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| Error::Browser(format!("could not open {url}: {e}")))?;

        if let Err(e) = page.evaluate(stealth::stealth_patch()).await {
            debug!("stealth patch failed: {e}");
        }

        Ok(page)
    }

    /// Render a URL and return the resulting DOM as HTML.
    pub async fn fetch_rendered(&self, url: &str) -> Result<String> {
        let page = self.open_page(url).await?;

        // Give client-side rendering a moment to settle.
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let html = page
            .content()
            .await
            .map_err(|e| Error::Browser(format!("could not read content of {url}: {e}")))?;

        let _ = page.close().await;
        Ok(html)
    }

    /// Close the browser and stop the handler task.
    pub async fn close(mut self) -> Result<()> {
        let _ = self.browser.close().await;
        self.handler_task.abort();
        Ok(())
    }
}
