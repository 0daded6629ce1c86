//! Request tracking middleware
//!
//! Tags every request with an ID (generated unless the client sent one),
//! echoes it on the response and masks credentials before request headers
//! reach the trace logs.

use axum::{
    http::{header, HeaderName},
    Router,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
};

use crate::config::RequestTrackingConfig;

/// Sensitive headers that should be masked in logs
pub const SENSITIVE_HEADERS: [HeaderName; 3] =
    [header::AUTHORIZATION, header::COOKIE, header::SET_COOKIE];

const DEFAULT_REQUEST_ID_HEADER: &str = "x-request-id";

/// Resolve the configured request ID header, falling back to `x-request-id`.
pub fn request_id_header(config: &RequestTrackingConfig) -> HeaderName {
    HeaderName::try_from(config.request_id_header.as_str()).unwrap_or_else(|_| {
        tracing::warn!(
            "Invalid request ID header name {:?}, using {}",
            config.request_id_header,
            DEFAULT_REQUEST_ID_HEADER
        );
        HeaderName::from_static(DEFAULT_REQUEST_ID_HEADER)
    })
}

/// Create a request ID layer that assigns a UUID to requests without one
pub fn request_id_layer(header: HeaderName) -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(header, MakeRequestUuid)
}

/// Create a request ID propagation layer
pub fn request_id_propagation_layer(header: HeaderName) -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(header)
}

/// Create a sensitive headers layer
pub fn sensitive_headers_layer() -> SetSensitiveRequestHeadersLayer {
    SetSensitiveRequestHeadersLayer::new(SENSITIVE_HEADERS)
}

/// Apply the enabled tracking layers.
///
/// Must be applied after the trace layer so the ID is assigned before the
/// request span is created.
pub fn apply_request_tracking(mut app: Router, config: &RequestTrackingConfig) -> Router {
    let header = request_id_header(config);

    if config.mask_sensitive_headers {
        app = app.layer(sensitive_headers_layer());
    }
    if config.propagate_headers {
        app = app.layer(request_id_propagation_layer(header.clone()));
    }
    if config.request_id_enabled {
        app = app.layer(request_id_layer(header));
    }

    app
}
