//! Buffered page rendering.
//!
//! A page is executed into an in-memory buffer first. Only when execution
//! completes is a response built from the status and the buffer, so a
//! half-rendered page can never reach the client. Failures go through
//! [`server_error`](crate::responses::server_error) instead.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use super::{RenderContext, TemplateRegistry};
use crate::extract::RequestMeta;
use crate::responses::server_error;

/// Why a page could not be rendered. Both cases are server-side defects.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The requested page is not in the registry.
    #[error("the template {0} does not exist")]
    RegistryMiss(String),

    /// The page failed while executing.
    #[error("failed to execute template {page}: {source}")]
    ExecutionFailure {
        /// Page being rendered.
        page: String,
        /// Engine error.
        #[source]
        source: minijinja::Error,
    },
}

/// Renders registered pages into HTML responses.
///
/// Cloning is cheap: the registry is shared behind an [`Arc`] and never
/// mutated after construction.
///
/// # Example
///
/// ```rust,ignore
/// async fn home(State(state): State<AppState>, request: PageRequest) -> Response {
///     let ctx = state.context(&request).await.with("snippets", &snippets);
///     state.renderer().render(request.meta(), StatusCode::OK, "home.tmpl", &ctx)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Renderer {
    registry: Arc<TemplateRegistry>,
}

impl Renderer {
    /// Create a renderer that owns `registry`.
    #[must_use]
    pub fn new(registry: TemplateRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// The registry pages are looked up in.
    #[must_use]
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Render `page` with `status`, reporting failures as a generic 500.
    pub fn render(
        &self,
        meta: &RequestMeta,
        status: StatusCode,
        page: &str,
        ctx: &RenderContext,
    ) -> Response {
        match self.try_render(status, page, ctx) {
            Ok(response) => response,
            Err(err) => server_error(meta, &err),
        }
    }

    /// Render `page` with `status`, returning failures to the caller.
    pub fn try_render(
        &self,
        status: StatusCode,
        page: &str,
        ctx: &RenderContext,
    ) -> Result<Response, RenderError> {
        let template = self
            .registry
            .lookup(page)
            .ok_or_else(|| RenderError::RegistryMiss(page.to_string()))?;

        let buffer = template
            .execute(ctx)
            .map_err(|source| RenderError::ExecutionFailure {
                page: page.to_string(),
                source,
            })?;

        Ok((status, Html(buffer)).into_response())
    }
}
