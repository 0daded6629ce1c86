//! Error types and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::templates::RegistryError;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the crate
///
/// Large error variants are boxed to reduce stack size
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Template registry could not be built
    #[error("Template registry error: {0}")]
    Templates(#[from] RegistryError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Session error
    #[error("Session error: {0}")]
    Session(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Every variant is a server-side defect; the detail goes to the log only.
        match &self {
            Error::Config(e) => tracing::error!("Configuration error: {}", e),
            Error::Templates(e) => tracing::error!("Template registry error: {}", e),
            Error::Io(e) => tracing::error!("I/O error: {}", e),
            Error::Session(msg) => tracing::error!("Session error: {}", msg),
            Error::Internal(msg) => tracing::error!("Internal error: {}", msg),
        }

        crate::responses::generic_status(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

// Manual From implementations for boxed errors
impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_into_response_does_not_leak_detail() {
        let response = Error::Internal("db password is hunter2".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(body, "Internal Server Error");
        assert!(!body.contains("hunter2"));
    }

    #[test]
    fn test_session_error_display() {
        let err = Error::Session("store unavailable".to_string());
        assert_eq!(err.to_string(), "Session error: store unavailable");
    }

    #[test]
    fn test_from_figment_error() {
        let err: Error = figment::Error::from("bad value".to_string()).into();
        assert!(matches!(err, Error::Config(_)));
    }
}
