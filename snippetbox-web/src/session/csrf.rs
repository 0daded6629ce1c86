//! Anti-forgery token issuance.
//!
//! Pages embed the token returned by a [`TokenIssuer`] in their forms:
//!
//! ```html
//! <form method="post">
//!   <input type="hidden" name="csrf_token" value="{{ csrf_token }}">
//! </form>
//! ```
//!
//! The default issuer keeps one random token per session. Checking submitted
//! tokens is left to whatever middleware fronts the form handlers.

use std::fmt;

use async_trait::async_trait;
use rand::Rng;
use tower_sessions::Session;

use crate::error::Error;

/// Session key holding the issued token.
pub const CSRF_SESSION_KEY: &str = "_csrf_token";

/// Hands out the anti-forgery token for a request.
#[async_trait]
pub trait TokenIssuer: Send + Sync + fmt::Debug {
    /// Token to embed in forms rendered for `session`.
    async fn token_for(&self, session: &Session) -> Result<String, Error>;
}

/// Issues one random alphanumeric token per session.
///
/// The token is created on first use and reused for the rest of the session.
#[derive(Debug, Clone)]
pub struct SessionTokenIssuer {
    length: usize,
}

impl SessionTokenIssuer {
    /// Create an issuer producing tokens of `length` characters.
    #[must_use]
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    /// Generate a new random token.
    #[must_use]
    pub fn generate(&self) -> String {
        rand::rng()
            .sample_iter(&rand::distr::Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }

    /// Replace the session's token with a fresh one.
    ///
    /// Call this after login to prevent token fixation.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn regenerate(&self, session: &Session) -> Result<String, Error> {
        let token = self.generate();
        session
            .insert(CSRF_SESSION_KEY, &token)
            .await
            .map_err(|e| Error::Session(format!("Failed to store CSRF token: {e}")))?;
        Ok(token)
    }
}

#[async_trait]
impl TokenIssuer for SessionTokenIssuer {
    async fn token_for(&self, session: &Session) -> Result<String, Error> {
        if let Some(token) = session
            .get::<String>(CSRF_SESSION_KEY)
            .await
            .map_err(|e| Error::Session(format!("Failed to read CSRF token: {e}")))?
        {
            return Ok(token);
        }

        self.regenerate(session).await
    }
}
