//! # snippetbox-web
//!
//! Server-rendered page pipeline for the snippetbox application.
//!
//! ## Features
//!
//! - **Template registry**: page templates compiled once at startup from
//!   `ui/html` (or the copy embedded in the binary), read-only afterwards
//! - **Render context**: flash message, authentication state, CSRF token and
//!   current year assembled fresh for every request
//! - **Buffered rendering**: pages render into a buffer and only complete
//!   output reaches the client; failures become a logged, generic 500
//! - **Form decoding**: urlencoded bodies mapped onto `Deserialize` types,
//!   with bad values reported per field and unusable target types treated as
//!   bugs
//! - **Sessions**: cookie sessions with flash messages and a single
//!   authentication predicate
//!
//! ## Example
//!
//! ```rust,no_run
//! use snippetbox_web::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::builder().config(config.clone()).build()?;
//!
//!     Server::new(config).serve(router(state)).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod form;
pub mod middleware;
pub mod observability;
pub mod responses;
pub mod routes;
pub mod server;
pub mod session;
pub mod state;
pub mod templates;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, TemplateConfig};
    pub use crate::error::{Error, Result};
    pub use crate::extract::{PageRequest, RequestMeta};
    pub use crate::form::{FieldError, PostForm, Validator};
    pub use crate::observability::{init_tracing, shutdown_tracing};
    pub use crate::responses::{client_error, server_error};
    pub use crate::routes::router;
    pub use crate::server::Server;
    pub use crate::session::{flash, Identity, SessionConfig};
    pub use crate::state::{AppState, AppStateBuilder};
    pub use crate::templates::{RenderContext, Renderer, TemplateRegistry};

    pub use axum::{
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Redirect, Response},
        routing::{get, post},
        Router,
    };
}
