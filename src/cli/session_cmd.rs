//! `regscout session <capture|show|clear>` -- manage the cached session.

use crate::cli::output::{self, Styled};
use crate::session::bootstrap::{self, BootstrapOptions};
use crate::session::cache::SessionCache;
use anyhow::{Context, Result};
use std::time::Duration;

/// Force a fresh interactive capture and cache the result.
pub async fn capture(base_url: String, headless: bool, timeout_secs: u64) -> Result<()> {
    let cache = SessionCache::default_cache();
    cache.clear().ok();

    let opts = BootstrapOptions {
        base_url,
        timeout: Duration::from_secs(timeout_secs),
        headless,
        ..BootstrapOptions::default()
    };

    let session = bootstrap::capture_session(&opts, Some(&cache))
        .await
        .context("capturing x-search-session")?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "captured": true,
            "source": session.source.describe(),
            "cache": cache.path().display().to_string(),
        }));
        return Ok(());
    }

    let s = Styled::new();
    eprintln!();
    eprintln!(
        "  {} Captured {} from {}",
        s.ok_sym(),
        s.bold(&session.redacted()),
        session.source.describe()
    );
    eprintln!("  Cached at {}", cache.path().display());
    Ok(())
}

/// Show the cached session, if any.
pub fn show() -> Result<()> {
    let cache = SessionCache::default_cache();
    let session = cache.load();

    if output::is_json() {
        output::print_json(&match &session {
            Some(sess) => serde_json::json!({
                "present": true,
                "value_prefix": sess.redacted(),
                "source": sess.source.describe(),
                "age_secs": sess.age().num_seconds().max(0),
                "cache": cache.path().display().to_string(),
            }),
            None => serde_json::json!({
                "present": false,
                "cache": cache.path().display().to_string(),
            }),
        });
        return Ok(());
    }

    let s = Styled::new();
    match session {
        Some(sess) => {
            eprintln!("  Session:  {}", s.bold(&sess.redacted()));
            eprintln!("  Source:   {}", sess.source.describe());
            eprintln!(
                "  Age:      {}",
                output::format_duration(sess.age().num_seconds().max(0) as u64)
            );
            eprintln!("  Cache:    {}", cache.path().display());
        }
        None => {
            eprintln!("  No cached session at {}", cache.path().display());
            eprintln!("  Run 'regscout session capture' to create one.");
        }
    }
    Ok(())
}

/// Remove the cached session.
pub fn clear() -> Result<()> {
    let cache = SessionCache::default_cache();
    let removed = cache.clear().context("removing session cache")?;

    if output::is_json() {
        output::print_json(&serde_json::json!({ "removed": removed }));
        return Ok(());
    }

    let s = Styled::new();
    if removed {
        eprintln!("  {} Session cache cleared.", s.ok_sym());
    } else {
        eprintln!("  Nothing to clear.");
    }
    Ok(())
}
