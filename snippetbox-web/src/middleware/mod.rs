//! Middleware applied around every route

pub mod request_tracking;
pub mod security_headers;

pub use request_tracking::{
    apply_request_tracking, request_id_header, request_id_layer, request_id_propagation_layer,
    sensitive_headers_layer, SENSITIVE_HEADERS,
};
pub use security_headers::apply_security_headers;
