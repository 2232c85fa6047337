//! Environment readiness check.
//!
//! Verifies the pieces a scrape needs before the interactive captcha step
//! wastes anyone's time: a Chrome binary, a writable home directory, and a
//! reachable target.

use crate::browser;
use crate::cli::output::{self, Styled};
use crate::config;
use crate::session::cache::SessionCache;
use anyhow::Result;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Run the doctor diagnostic.
pub async fn run(base_url: &str) -> Result<()> {
    if output::is_json() {
        return run_json(base_url).await;
    }

    let s = Styled::new();
    let mut ready = true;

    eprintln!(
        "  {} {}",
        s.bold("Regscout"),
        s.dim(&format!("v{}", env!("CARGO_PKG_VERSION")))
    );
    eprintln!();

    // Browser
    match browser::find_chrome() {
        Some(path) => {
            let version = chrome_version(&path).unwrap_or_else(|| "unknown version".to_string());
            output::print_check(
                s.ok_sym(),
                "Chrome:",
                &format!("{version} at {}", path.display()),
            );
        }
        None => {
            output::print_check(s.fail_sym(), "Chrome:", "NOT FOUND");
            output::print_detail("Install Chrome/Chromium, or set REGSCOUT_CHROME_PATH.");
            ready = false;
        }
    }

    // Home directory
    let home = config::regscout_home();
    if home_writable(&home) {
        output::print_check(s.ok_sym(), "Home dir:", &format!("{} (writable)", home.display()));
    } else {
        output::print_check(
            s.fail_sym(),
            "Home dir:",
            &format!("{} is not writable", home.display()),
        );
        output::print_detail("Fix permissions or set REGSCOUT_HOME.");
        ready = false;
    }

    // Cached session
    match SessionCache::default_cache().load() {
        Some(session) => output::print_check(
            s.ok_sym(),
            "Session:",
            &format!(
                "cached, {} old (from {})",
                output::format_duration(session.age().num_seconds().max(0) as u64),
                session.source.describe()
            ),
        ),
        None => output::print_check(
            s.warn_sym(),
            "Session:",
            "none cached (first scrape will open a browser)",
        ),
    }

    // Target reachability
    match probe_target(base_url).await {
        Ok(status) => {
            output::print_check(s.ok_sym(), "Target:", &format!("{base_url} (status {status})"))
        }
        Err(e) => {
            output::print_check(s.warn_sym(), "Target:", &format!("{base_url} unreachable"));
            output::print_detail(&e.to_string());
        }
    }

    if ready {
        output::print_status(&s, &s.green("READY"), "run 'regscout scrape <query>'");
    } else {
        output::print_status(&s, &s.red("NOT READY"), "fix issues above");
    }

    Ok(())
}

/// JSON output mode for doctor.
async fn run_json(base_url: &str) -> Result<()> {
    let chrome = browser::find_chrome();
    let chrome_ver = chrome.as_deref().and_then(chrome_version);
    let home = config::regscout_home();
    let session = SessionCache::default_cache().load();
    let target_status = probe_target(base_url).await.ok();

    output::print_json(&serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "chrome_path": chrome.map(|p| p.display().to_string()),
        "chrome_version": chrome_ver,
        "home": home.display().to_string(),
        "home_writable": home_writable(&home),
        "session_cached": session.is_some(),
        "session_source": session.map(|sess| sess.source.describe().to_string()),
        "target": base_url,
        "target_status": target_status,
    }));
    Ok(())
}

fn chrome_version(path: &Path) -> Option<String> {
    let out = Command::new(path).arg("--version").output().ok()?;
    if out.status.success() {
        Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
    } else {
        None
    }
}

fn home_writable(home: &Path) -> bool {
    if std::fs::create_dir_all(home).is_err() {
        return false;
    }
    let probe = home.join(".doctor-probe");
    let ok = std::fs::write(&probe, b"ok").is_ok();
    let _ = std::fs::remove_file(&probe);
    ok
}

/// HEAD the base URL with a short timeout.
async fn probe_target(base_url: &str) -> Result<u16> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let response = client.head(base_url).send().await?;
    Ok(response.status().as_u16())
}
