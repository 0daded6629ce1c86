//! Session-backed authentication state.
//!
//! [`Identity`] is the one place that decides whether a request is
//! authenticated. It is loaded from the session once, typed at the request
//! boundary, and everything else (the render context included) asks it
//! rather than inspecting the session.
//!
//! ```rust,ignore
//! async fn login(request: PageRequest) -> Result<Response, Error> {
//!     let user_id = authenticate(&form).await?;
//!     Identity::login(request.session(), user_id).await?;
//!     Ok(Redirect::to("/snippet/create").into_response())
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::Error;

/// Session key holding the authenticated user's id.
pub const AUTH_USER_KEY: &str = "authenticatedUserID";

/// Authentication state of the current request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity {
    user_id: Option<i64>,
}

impl Identity {
    /// An unauthenticated identity.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Identity for a raw session value.
    #[must_use]
    pub fn from_user_id(user_id: Option<i64>) -> Self {
        Self { user_id }
    }

    /// Whether the request is authenticated: an id is present and positive.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.user_id, Some(id) if id > 0)
    }

    /// The authenticated user's id.
    #[must_use]
    pub fn user_id(&self) -> Option<i64> {
        self.user_id.filter(|_| self.is_authenticated())
    }

    /// Read the identity stored in `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn load(session: &Session) -> Result<Self, Error> {
        let user_id = session
            .get::<i64>(AUTH_USER_KEY)
            .await
            .map_err(|e| Error::Session(format!("Failed to read authenticated user: {e}")))?;
        Ok(Self { user_id })
    }

    /// Record `user_id` as authenticated, under a fresh session id.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn login(session: &Session, user_id: i64) -> Result<(), Error> {
        session
            .cycle_id()
            .await
            .map_err(|e| Error::Session(format!("Failed to regenerate session ID: {e}")))?;
        session
            .insert(AUTH_USER_KEY, user_id)
            .await
            .map_err(|e| Error::Session(format!("Failed to store authenticated user: {e}")))
    }

    /// Forget the authenticated user, under a fresh session id.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn logout(session: &Session) -> Result<(), Error> {
        session
            .cycle_id()
            .await
            .map_err(|e| Error::Session(format!("Failed to regenerate session ID: {e}")))?;
        session
            .remove::<i64>(AUTH_USER_KEY)
            .await
            .map_err(|e| Error::Session(format!("Failed to clear authenticated user: {e}")))?;
        Ok(())
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get session from request extensions (set by SessionManagerLayer)
        let session = parts.extensions.get::<Session>().cloned().ok_or_else(|| {
            Error::Session("Session not found in request extensions for identity".to_string())
        })?;

        Self::load(&session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_session;

    #[test]
    fn test_is_authenticated() {
        assert!(!Identity::anonymous().is_authenticated());
        assert!(!Identity::from_user_id(None).is_authenticated());
        assert!(!Identity::from_user_id(Some(0)).is_authenticated());
        assert!(!Identity::from_user_id(Some(-4)).is_authenticated());
        assert!(Identity::from_user_id(Some(1)).is_authenticated());
        assert!(Identity::from_user_id(Some(i64::MAX)).is_authenticated());
    }

    #[test]
    fn test_user_id_only_when_authenticated() {
        assert_eq!(Identity::from_user_id(Some(0)).user_id(), None);
        assert_eq!(Identity::from_user_id(Some(9)).user_id(), Some(9));
    }

    #[tokio::test]
    async fn test_login_logout_roundtrip() {
        let session = test_session();
        assert!(!Identity::load(&session).await.unwrap().is_authenticated());

        Identity::login(&session, 42).await.unwrap();
        let identity = Identity::load(&session).await.unwrap();
        assert!(identity.is_authenticated());
        assert_eq!(identity.user_id(), Some(42));

        Identity::logout(&session).await.unwrap();
        assert!(!Identity::load(&session).await.unwrap().is_authenticated());
    }
}
