//! HTTP session plumbing for server-rendered pages.
//!
//! Sessions are cookie-based and stored in memory. The rest of the crate
//! only touches them through the helpers in this module:
//!
//! - [`Identity`]: the authentication predicate and login/logout
//! - [`flash`]: one-shot messages for the post/redirect/get pattern
//! - [`TokenIssuer`]: anti-forgery tokens embedded in forms
//!
//! ```toml
//! # config.toml
//! [session]
//! cookie_name = "session"
//! expiry_secs = 43200
//! secure = false  # true in production
//! ```

mod auth;
mod config;
mod csrf;
pub mod flash;

pub use auth::{Identity, AUTH_USER_KEY};
pub use config::SessionConfig;
pub use csrf::{SessionTokenIssuer, TokenIssuer, CSRF_SESSION_KEY};

// Re-export tower-sessions types for convenience
pub use tower_sessions::{Expiry, Session, SessionManagerLayer};
pub use tower_sessions_memory_store::MemoryStore;

use time::Duration;
use tower_sessions::cookie::SameSite;

/// Create an in-memory `SessionManagerLayer` from configuration.
///
/// # Example
///
/// ```rust
/// use snippetbox_web::session::{create_memory_session_layer, SessionConfig};
///
/// let layer = create_memory_session_layer(&SessionConfig::default());
/// ```
pub fn create_memory_session_layer(config: &SessionConfig) -> SessionManagerLayer<MemoryStore> {
    let expiry = if config.expiry_secs == 0 {
        Expiry::OnSessionEnd
    } else {
        Expiry::OnInactivity(Duration::seconds(
            i64::try_from(config.expiry_secs).unwrap_or(i64::MAX),
        ))
    };

    let same_site = match config.same_site.to_lowercase().as_str() {
        "strict" => SameSite::Strict,
        "none" => SameSite::None,
        _ => SameSite::Lax,
    };

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(config.cookie_name.clone())
        .with_expiry(expiry)
        .with_secure(config.secure)
        .with_http_only(config.http_only)
        .with_same_site(same_site)
        .with_path(config.cookie_path.clone())
}

/// A detached session backed by a fresh memory store.
#[cfg(test)]
pub(crate) fn test_session() -> Session {
    use std::sync::Arc;

    Session::new(None, Arc::new(MemoryStore::default()), None)
}
