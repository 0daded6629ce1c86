//! Server-rendered pages.
//!
//! This module turns a page identifier plus request-derived data into an HTML
//! response:
//!
//! 1. [`TemplateRegistry`] is built once at startup from `ui/html` (or the
//!    pages embedded in the binary) and never changes afterwards.
//! 2. [`ContextBuilder`] assembles a fresh [`RenderContext`] per request from
//!    the session (flash message, authentication state, CSRF token) and the
//!    clock.
//! 3. [`Renderer`] executes the page into a buffer and only then produces the
//!    response, so failed renders never leak partial output.
//!
//! # Layout
//!
//! ```text
//! ui/html/
//!   base.tmpl            root layout, registered as "base"
//!   partials/nav.tmpl    shared by every page
//!   pages/home.tmpl      page id "home.tmpl"
//! ```
//!
//! ```html
//! <!-- ui/html/pages/home.tmpl -->
//! {% extends "base" %}
//! {% block title %}Home{% endblock %}
//! {% block main %}
//!   <h2>Latest Snippets</h2>
//! {% endblock %}
//! ```
//!
//! ```rust,ignore
//! use snippetbox_web::prelude::*;
//!
//! async fn home(State(state): State<AppState>, request: PageRequest) -> Response {
//!     let ctx = state.context(&request).await;
//!     state.render(&request, StatusCode::OK, "home.tmpl", &ctx)
//! }
//! ```

mod context;
mod helpers;
mod registry;
mod render;

pub use context::{Clock, ContextBuilder, FixedClock, RenderContext, SystemClock, RESERVED_KEYS};
pub use helpers::{human_date, pluralize, truncate};
pub use registry::{
    EmbeddedPages, PageTemplate, RegistryBuilder, RegistryError, TemplateRegistry, ROOT_TEMPLATE,
};
pub use render::{RenderError, Renderer};
