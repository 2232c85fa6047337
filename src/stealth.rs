//! Fingerprint patches for the driven browser.
//!
//! The registry site fronts its search with reCAPTCHA; a page that reports
//! `navigator.webdriver = true` gets a much harder challenge. These patches
//! are evaluated on every page regscout drives.

/// JavaScript that hides the most common automation signals.
pub const STEALTH_PATCH: &str = r#"
(() => {
    Object.defineProperty(navigator, 'webdriver', {
        get: () => false,
        configurable: true,
    });

    if (!window.chrome) {
        window.chrome = {};
    }
    if (!window.chrome.runtime) {
        window.chrome.runtime = {
            connect: function() {},
            sendMessage: function() {},
        };
    }

    Object.defineProperty(navigator, 'languages', {
        get: () => ['en-US', 'en'],
        configurable: true,
    });

    Object.defineProperty(navigator, 'plugins', {
        get: () => [1, 2, 3],
        configurable: true,
    });
})();
"#;

/// Get the stealth patch script.
pub fn stealth_patch() -> &'static str {
    STEALTH_PATCH
}
