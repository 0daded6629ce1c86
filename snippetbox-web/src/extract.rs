//! Request-scoped extractors shared by page handlers.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, Method, Uri},
};
use tower_sessions::Session;

use crate::error::Error;

/// Method and request URI of the current request.
///
/// This is what the server-error path logs; it is cheap to clone and carries
/// no body or header data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    /// HTTP method.
    pub method: Method,
    /// Path plus query string, as sent by the client.
    pub uri: String,
}

impl RequestMeta {
    /// Create request metadata from a method and request URI.
    #[must_use]
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
        }
    }

    /// Build metadata from an [`Uri`], keeping only path and query.
    #[must_use]
    pub fn from_uri(method: Method, uri: &Uri) -> Self {
        let uri = uri
            .path_and_query()
            .map_or_else(|| uri.path().to_string(), |pq| pq.as_str().to_string());
        Self { method, uri }
    }
}

impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_uri(parts.method.clone(), &parts.uri))
    }
}

/// Everything the page pipeline needs from an incoming request.
///
/// Holds the request line and the session handle installed by the session
/// layer. It is owned by the handler that extracted it and never shared with
/// another request.
#[derive(Debug, Clone)]
pub struct PageRequest {
    meta: RequestMeta,
    session: Session,
}

impl PageRequest {
    /// Create a page request from its parts.
    #[must_use]
    pub fn new(meta: RequestMeta, session: Session) -> Self {
        Self { meta, session }
    }

    /// Method and URI of the request.
    #[must_use]
    pub fn meta(&self) -> &RequestMeta {
        &self.meta
    }

    /// Session bound to the request.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl<S> FromRequestParts<S> for PageRequest
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get session from request extensions (set by SessionManagerLayer)
        let session = parts.extensions.get::<Session>().cloned().ok_or_else(|| {
            Error::Session(
                "Session not found in request extensions. Is SessionManagerLayer configured?"
                    .to_string(),
            )
        })?;

        Ok(Self {
            meta: RequestMeta::from_uri(parts.method.clone(), &parts.uri),
            session,
        })
    }
}
