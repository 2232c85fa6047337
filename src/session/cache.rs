//! On-disk session cache.
//!
//! Capturing a session means a human solved a reCAPTCHA, so the value is
//! worth keeping. One JSON file under the regscout home directory, with a
//! TTL; expired or unreadable files behave as a miss.

use crate::config;
use crate::error::Result;
use crate::session::SearchSession;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Single-file session cache with a TTL.
pub struct SessionCache {
    path: PathBuf,
    ttl: chrono::Duration,
}

impl SessionCache {
    pub fn new(path: PathBuf, ttl: chrono::Duration) -> Self {
        Self { path, ttl }
    }

    /// Cache at the default location (`~/.regscout/session.json`) with the
    /// configured TTL.
    pub fn default_cache() -> Self {
        Self::new(config::regscout_home().join("session.json"), config::session_ttl())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached session if it is present, parseable, and younger
    /// than the TTL. Expired files are removed on read.
    pub fn load(&self) -> Option<SearchSession> {
        if !self.path.exists() {
            return None;
        }

        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                debug!("could not read session cache: {e}");
                return None;
            }
        };

        let session: SearchSession = match serde_json::from_str(&content) {
            Ok(s) => s,
            Err(e) => {
                debug!("session cache is not valid JSON: {e}");
                return None;
            }
        };

        if Utc::now() - session.captured_at > self.ttl {
            info!("cached session expired, removing it");
            let _ = std::fs::remove_file(&self.path);
            return None;
        }

        info!(
            "using cached session {} (captured {})",
            session.redacted(),
            session.captured_at.format("%Y-%m-%d %H:%M:%S")
        );
        Some(session)
    }

    /// Persist a session so the next run skips the interactive capture.
    pub fn store(&self, session: &SearchSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, content)?;
        info!("cached session to {}", self.path.display());
        Ok(())
    }

    /// Persist a session, logging instead of failing. A cache write failure
    /// must never lose a freshly captured session.
    pub fn store_best_effort(&self, session: &SearchSession) {
        if let Err(e) = self.store(session) {
            warn!("could not cache session: {e}");
        }
    }

    /// Remove the cache file. Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionSource;

    fn cache_in(dir: &tempfile::TempDir, ttl_secs: i64) -> SessionCache {
        SessionCache::new(
            dir.path().join("session.json"),
            chrono::Duration::seconds(ttl_secs),
        )
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir, 3600);

        let session = SearchSession::new("sess-roundtrip", SessionSource::RequestHeader);
        cache.store(&session).unwrap();

        let loaded = cache.load().unwrap();
        assert_eq!(loaded.value, "sess-roundtrip");
        assert_eq!(loaded.source, SessionSource::RequestHeader);
    }

    #[test]
    fn test_missing_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir, 3600);
        assert!(cache.load().is_none());
    }

    #[test]
    fn test_expired_entry_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir, 0);

        let mut session = SearchSession::new("sess-old", SessionSource::Cookie);
        session.captured_at = Utc::now() - chrono::Duration::hours(1);
        cache.store(&session).unwrap();

        assert!(cache.load().is_none());
        assert!(!cache.path().exists());
    }

    #[test]
    fn test_corrupt_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir, 3600);

        std::fs::write(cache.path(), "{ nope").unwrap();
        assert!(cache.load().is_none());
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir, 3600);

        assert!(!cache.clear().unwrap());
        cache
            .store(&SearchSession::new("v", SessionSource::WebStorage))
            .unwrap();
        assert!(cache.clear().unwrap());
        assert!(cache.load().is_none());
    }

    #[test]
    fn test_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::new(
            dir.path().join("nested/deeper/session.json"),
            chrono::Duration::seconds(60),
        );
        cache
            .store(&SearchSession::new("v", SessionSource::Cookie))
            .unwrap();
        assert!(cache.load().is_some());
    }
}
