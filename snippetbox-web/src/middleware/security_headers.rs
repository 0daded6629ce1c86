//! Security headers middleware
//!
//! Applies standard HTTP security headers (CSP, X-Content-Type-Options, etc.)
//! using `tower_http::set_header::SetResponseHeaderLayer`. Handlers that set
//! one of these headers themselves keep their value.

use axum::http::{header, HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::SecurityHeadersConfig;

fn apply_header(app: Router, name: HeaderName, value: &str) -> Router {
    if value.is_empty() {
        return app;
    }
    match HeaderValue::from_str(value) {
        Ok(hv) => app.layer(SetResponseHeaderLayer::if_not_present(name, hv)),
        Err(_) => {
            tracing::warn!("Skipping invalid value for {}: {:?}", name, value);
            app
        }
    }
}

/// Apply security headers to the router based on configuration.
pub fn apply_security_headers(mut app: Router, config: &SecurityHeadersConfig) -> Router {
    if !config.enabled {
        return app;
    }

    app = apply_header(
        app,
        header::CONTENT_SECURITY_POLICY,
        &config.content_security_policy,
    );
    app = apply_header(app, header::REFERRER_POLICY, &config.referrer_policy);
    app = apply_header(app, header::X_FRAME_OPTIONS, &config.x_frame_options);

    if config.x_content_type_options {
        app = app.layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ));
    }

    // X-XSS-Protection: 0 (modern recommendation: disable the browser XSS filter)
    if config.x_xss_protection {
        app = app.layer(SetResponseHeaderLayer::if_not_present(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("0"),
        ));
    }

    app
}
