//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: `SNIPPETBOX_`, nested keys separated by `__`)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/snippetbox/config.toml
//! 4. System directory: /etc/snippetbox/config.toml
//! 5. Default values
//!
//! ```bash
//! SNIPPETBOX_SERVICE__PORT=8080 SNIPPETBOX_SESSION__SECURE=false snippetbox
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::session::SessionConfig;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "SNIPPETBOX_";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// Where page templates come from
    #[serde(default)]
    pub templates: TemplateConfig,

    /// Session cookie and CSRF token settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Middleware configuration
    #[serde(default)]
    pub middleware: MiddlewareConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level or `EnvFilter` directive (e.g. `info,tower_http=debug`)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            port: default_port(),
            log_level: default_log_level(),
            timeout_secs: default_timeout(),
            environment: default_environment(),
        }
    }
}

/// Template source configuration
///
/// ```toml
/// [templates]
/// dir = "ui/html"
/// embedded_fallback = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Directory holding `base.tmpl`, `partials/` and `pages/`
    #[serde(default = "default_template_dir")]
    pub dir: PathBuf,

    /// Use the pages compiled into the binary when `dir` does not exist
    #[serde(default = "default_true")]
    pub embedded_fallback: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            dir: default_template_dir(),
            embedded_fallback: true,
        }
    }
}

/// Middleware configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Request tracking configuration (request IDs, header masking)
    #[serde(default)]
    pub request_tracking: RequestTrackingConfig,

    /// Request body size limit in KB
    #[serde(default = "default_body_limit_kb")]
    pub body_limit_kb: usize,

    /// Enable panic recovery middleware
    #[serde(default = "default_true")]
    pub catch_panic: bool,

    /// Response security headers
    #[serde(default)]
    pub security_headers: SecurityHeadersConfig,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            request_tracking: RequestTrackingConfig::default(),
            body_limit_kb: default_body_limit_kb(),
            catch_panic: true,
            security_headers: SecurityHeadersConfig::default(),
        }
    }
}

/// Request tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestTrackingConfig {
    /// Enable request ID generation
    #[serde(default = "default_true")]
    pub request_id_enabled: bool,

    /// Request ID header name
    #[serde(default = "default_request_id_header")]
    pub request_id_header: String,

    /// Copy the request ID onto the response
    #[serde(default = "default_true")]
    pub propagate_headers: bool,

    /// Enable sensitive header masking in logs
    #[serde(default = "default_true")]
    pub mask_sensitive_headers: bool,
}

impl Default for RequestTrackingConfig {
    fn default() -> Self {
        Self {
            request_id_enabled: true,
            request_id_header: default_request_id_header(),
            propagate_headers: true,
            mask_sensitive_headers: true,
        }
    }
}

/// Security headers added to every response that does not set them itself.
///
/// Empty strings disable the corresponding header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityHeadersConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_csp")]
    pub content_security_policy: String,

    #[serde(default = "default_referrer_policy")]
    pub referrer_policy: String,

    #[serde(default = "default_true")]
    pub x_content_type_options: bool,

    #[serde(default = "default_frame_options")]
    pub x_frame_options: String,

    /// Send `X-XSS-Protection: 0` (disables the legacy browser filter)
    #[serde(default = "default_true")]
    pub x_xss_protection: bool,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            content_security_policy: default_csp(),
            referrer_policy: default_referrer_policy(),
            x_content_type_options: true,
            x_frame_options: default_frame_options(),
            x_xss_protection: true,
        }
    }
}

fn default_service_name() -> String {
    "snippetbox".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("ui/html")
}

fn default_true() -> bool {
    true
}

fn default_body_limit_kb() -> usize {
    64
}

fn default_request_id_header() -> String {
    "x-request-id".to_string()
}

fn default_csp() -> String {
    "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com"
        .to_string()
}

fn default_referrer_policy() -> String {
    "origin-when-cross-origin".to_string()
}

fn default_frame_options() -> String {
    "deny".to_string()
}

impl Config {
    /// Load configuration from all sources
    ///
    /// Config files are merged lowest priority first, so `./config.toml`
    /// overrides the XDG file, which overrides `/etc/snippetbox/config.toml`.
    /// Environment variables override all file-based configs.
    pub fn load() -> Result<Self> {
        let config_paths = Self::find_config_paths();

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        let config = figment.merge(Self::env()).extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// This bypasses the search path. Environment variables still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Self::env())
            .extract()?;

        Ok(config)
    }

    fn env() -> Env {
        Env::prefixed(ENV_PREFIX).split("__")
    }

    /// Candidate config file paths, highest priority first
    pub fn find_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix("snippetbox");
        if let Some(path) = xdg_dirs.find_config_file("config.toml") {
            paths.push(path);
        }

        paths.push(PathBuf::from("/etc/snippetbox/config.toml"));
        paths
    }

    /// Total time a request may take before the server answers 408
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.service.timeout_secs)
    }

    /// Request body limit in bytes
    pub fn body_limit_bytes(&self) -> usize {
        self.middleware.body_limit_kb.saturating_mul(1024)
    }
}
