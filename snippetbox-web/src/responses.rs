//! Error responses for server-rendered pages
//!
//! Two helpers cover every failure a page handler can produce:
//!
//! - [`server_error`] for defects on our side (missing page, template failure,
//!   session store trouble). The cause is logged with the request method and
//!   URI; the client only ever sees a generic `500 Internal Server Error`.
//! - [`client_error`] for problems with the request itself (malformed form
//!   body, wrong content type). Nothing is logged.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use snippetbox_web::responses::{client_error, server_error};
//!
//! async fn handler(meta: RequestMeta) -> Response {
//!     match load_snippet().await {
//!         Ok(Some(snippet)) => render(snippet),
//!         Ok(None) => client_error(StatusCode::NOT_FOUND),
//!         Err(err) => server_error(&meta, &err),
//!     }
//! }
//! ```

use std::fmt::Display;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::extract::RequestMeta;

/// Log a server-side failure and answer with a generic 500.
///
/// The log line carries `method`, `uri` and the underlying cause. The body is
/// the canonical reason phrase so internals never reach the client.
pub fn server_error(meta: &RequestMeta, err: &dyn Display) -> Response {
    tracing::error!(method = %meta.method, uri = %meta.uri, "{}", err);
    generic_status(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Answer with `status` and its canonical reason phrase, without logging.
pub fn client_error(status: StatusCode) -> Response {
    generic_status(status)
}

/// Plain-text response whose body is the status' canonical reason phrase.
pub(crate) fn generic_status(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or("Unknown Status");
    let mut response = (status, reason.to_string()).into_response();
    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response
}
