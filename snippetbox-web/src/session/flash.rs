//! One-shot flash messages.
//!
//! A flash message is stored in the session by one request (typically right
//! before a redirect) and removed by the first request that reads it.
//!
//! ```rust,ignore
//! use snippetbox_web::session::flash;
//!
//! async fn create(request: PageRequest) -> Response {
//!     flash::put(request.session(), "Snippet successfully created!").await?;
//!     Redirect::to("/").into_response()
//! }
//! ```

use tower_sessions::Session;

use crate::error::Error;

/// Session key holding the pending flash message.
pub const FLASH_KEY: &str = "flash";

/// Store `message`, replacing any message not yet shown.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn put(session: &Session, message: impl Into<String>) -> Result<(), Error> {
    session
        .insert(FLASH_KEY, message.into())
        .await
        .map_err(|e| Error::Session(format!("Failed to write flash message: {e}")))
}

/// Read and remove the pending message.
///
/// # Errors
///
/// Returns an error if the session cannot be accessed.
pub async fn pop(session: &Session) -> Result<Option<String>, Error> {
    session
        .remove::<String>(FLASH_KEY)
        .await
        .map_err(|e| Error::Session(format!("Failed to read flash message: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_session;

    #[tokio::test]
    async fn test_pop_consumes_message() {
        let session = test_session();
        put(&session, "Saved").await.unwrap();

        assert_eq!(pop(&session).await.unwrap().as_deref(), Some("Saved"));
        assert_eq!(pop(&session).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_replaces_pending_message() {
        let session = test_session();
        put(&session, "first").await.unwrap();
        put(&session, "second").await.unwrap();

        assert_eq!(pop(&session).await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_pop_empty_session() {
        assert_eq!(pop(&test_session()).await.unwrap(), None);
    }
}
