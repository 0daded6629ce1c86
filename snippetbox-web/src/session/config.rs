//! Session configuration types.

use serde::{Deserialize, Serialize};

/// Session configuration.
///
/// Configure cookie settings, expiration and the anti-forgery token.
///
/// # Example
///
/// ```toml
/// [session]
/// cookie_name = "session"
/// expiry_secs = 43200
/// secure = true
/// http_only = true
/// same_site = "lax"
/// csrf_token_length = 32
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session cookie name.
    ///
    /// Default: `"session"`
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Session lifetime in seconds.
    ///
    /// - `0`: Session cookie (expires when browser closes)
    /// - `> 0`: Persistent cookie with specified lifetime
    ///
    /// Default: `43200` (12 hours)
    #[serde(default = "default_expiry_secs")]
    pub expiry_secs: u64,

    /// Cookie path.
    ///
    /// Default: `"/"`
    #[serde(default = "default_cookie_path")]
    pub cookie_path: String,

    /// Secure cookie flag (HTTPS only).
    ///
    /// Set to `false` for local development without HTTPS.
    ///
    /// Default: `true`
    #[serde(default = "default_secure")]
    pub secure: bool,

    /// HttpOnly cookie flag.
    ///
    /// Default: `true`
    #[serde(default = "default_http_only")]
    pub http_only: bool,

    /// SameSite cookie policy: `"strict"`, `"lax"` or `"none"`.
    ///
    /// Default: `"lax"`
    #[serde(default = "default_same_site")]
    pub same_site: String,

    /// Length of generated CSRF tokens.
    ///
    /// Default: `32`
    #[serde(default = "default_csrf_token_length")]
    pub csrf_token_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            expiry_secs: default_expiry_secs(),
            cookie_path: default_cookie_path(),
            secure: default_secure(),
            http_only: default_http_only(),
            same_site: default_same_site(),
            csrf_token_length: default_csrf_token_length(),
        }
    }
}

// Default value functions
fn default_cookie_name() -> String {
    "session".to_string()
}

fn default_expiry_secs() -> u64 {
    43200 // 12 hours
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_secure() -> bool {
    true
}

fn default_http_only() -> bool {
    true
}

fn default_same_site() -> String {
    "lax".to_string()
}

fn default_csrf_token_length() -> usize {
    32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.cookie_name, "session");
        assert_eq!(config.expiry_secs, 43200);
        assert!(config.secure);
        assert!(config.http_only);
        assert_eq!(config.same_site, "lax");
        assert_eq!(config.csrf_token_length, 32);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"secure": false}"#).unwrap();
        assert!(!config.secure);
        assert_eq!(config.cookie_path, "/");
    }
}
