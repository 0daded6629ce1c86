//! Application state management

use std::sync::Arc;

use axum::{http::StatusCode, response::Response};

use crate::{
    config::Config,
    error::Result,
    extract::PageRequest,
    session::{SessionTokenIssuer, TokenIssuer},
    templates::{Clock, ContextBuilder, RenderContext, Renderer, SystemClock, TemplateRegistry},
};

/// Application state shared across handlers
///
/// Holds the renderer (sole owner of the template registry) and the context
/// builder. Everything is read-only after startup, so cloning per request is
/// just reference counting.
#[derive(Debug, Clone)]
pub struct AppState {
    config: Arc<Config>,
    renderer: Renderer,
    contexts: ContextBuilder,
}

impl AppState {
    /// Create a builder for AppState
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the page renderer (and through it, the template registry)
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Get the render context builder
    pub fn contexts(&self) -> &ContextBuilder {
        &self.contexts
    }

    /// Build a fresh render context for `request`.
    pub async fn context(&self, request: &PageRequest) -> RenderContext {
        self.contexts.build(request).await
    }

    /// Render `page` for `request`; failures become a logged, generic 500.
    pub fn render(
        &self,
        request: &PageRequest,
        status: StatusCode,
        page: &str,
        ctx: &RenderContext,
    ) -> Response {
        self.renderer.render(request.meta(), status, page, ctx)
    }
}

/// Builder for AppState
///
/// Anything not supplied is derived from the configuration: templates are
/// loaded from `templates.dir`, the clock is the system clock and CSRF tokens
/// come from a [`SessionTokenIssuer`].
#[derive(Debug, Default)]
pub struct AppStateBuilder {
    config: Option<Config>,
    registry: Option<TemplateRegistry>,
    clock: Option<Arc<dyn Clock>>,
    token_issuer: Option<Arc<dyn TokenIssuer>>,
}

impl AppStateBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Use an already built registry instead of loading one
    pub fn registry(mut self, registry: TemplateRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the clock that supplies the current year
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the CSRF token issuer
    pub fn token_issuer(mut self, issuer: Arc<dyn TokenIssuer>) -> Self {
        self.token_issuer = Some(issuer);
        self
    }

    /// Build the AppState
    ///
    /// # Errors
    ///
    /// Fails if the template registry cannot be built. The service must not
    /// start serving in that case.
    pub fn build(self) -> Result<AppState> {
        let config = self.config.unwrap_or_default();

        let registry = match self.registry {
            Some(registry) => registry,
            None => TemplateRegistry::load(&config.templates)?,
        };

        if registry.is_empty() {
            tracing::warn!("Template registry has no pages; every render will fail");
        } else {
            tracing::info!(
                pages = registry.len(),
                "Template registry built: {}",
                registry.page_ids().collect::<Vec<_>>().join(", ")
            );
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let token_issuer = self.token_issuer.unwrap_or_else(|| {
            Arc::new(SessionTokenIssuer::new(config.session.csrf_token_length))
        });

        Ok(AppState {
            config: Arc::new(config),
            renderer: Renderer::new(registry),
            contexts: ContextBuilder::new(clock, token_issuer),
        })
    }
}
