//! Request-scoped render context.
//!
//! Every render gets a fresh [`RenderContext`] carrying the fields the layout
//! relies on (current year, flash message, authentication state and CSRF
//! token) plus whatever page data the handler adds. Templates see it as one
//! flat map:
//!
//! ```html
//! <footer>&copy; {{ current_year }}</footer>
//! {% if flash %}<div class="flash">{{ flash }}</div>{% endif %}
//! <input type="hidden" name="csrf_token" value="{{ csrf_token }}">
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use minijinja::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::extract::PageRequest;
use crate::session::{flash, Identity, TokenIssuer};

/// Keys owned by the framework. Page data cannot override them.
pub const RESERVED_KEYS: &[&str] = &["current_year", "flash", "is_authenticated", "csrf_token"];

/// Per-request data envelope handed to a page template.
///
/// Created fresh for each render and never cached. `is_authenticated` is
/// taken from an [`Identity`] at construction, so it always reflects the
/// session the context was built from.
#[derive(Debug, Clone)]
pub struct RenderContext {
    current_year: i32,
    flash: Option<String>,
    is_authenticated: bool,
    csrf_token: String,
    page: BTreeMap<String, Value>,
}

impl RenderContext {
    /// Create a context from framework-derived values.
    #[must_use]
    pub fn new(
        current_year: i32,
        flash: Option<String>,
        identity: &Identity,
        csrf_token: impl Into<String>,
    ) -> Self {
        Self {
            current_year,
            flash,
            is_authenticated: identity.is_authenticated(),
            csrf_token: csrf_token.into(),
            page: BTreeMap::new(),
        }
    }

    /// Add page data under `key`.
    ///
    /// Serialization problems surface when the page is executed. Reserved
    /// keys are ignored.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.insert(key, value);
        self
    }

    /// Add page data under `key` in place. See [`with`](Self::with).
    pub fn insert(&mut self, key: impl Into<String>, value: impl Serialize) {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            tracing::warn!("Ignoring page data for reserved template key `{}`", key);
            return;
        }
        self.page.insert(key, Value::from_serialize(&value));
    }

    /// Year shown in the footer.
    #[must_use]
    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    /// Flash message popped from the session, if any.
    #[must_use]
    pub fn flash(&self) -> Option<&str> {
        self.flash.as_deref()
    }

    /// Authentication state at construction time.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    /// Anti-forgery token for forms on the page.
    #[must_use]
    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    /// Page data stored under `key`.
    #[must_use]
    pub fn page_value(&self, key: &str) -> Option<&Value> {
        self.page.get(key)
    }
}

impl Serialize for RenderContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(RESERVED_KEYS.len() + self.page.len()))?;
        map.serialize_entry("current_year", &self.current_year)?;
        map.serialize_entry("flash", &self.flash)?;
        map.serialize_entry("is_authenticated", &self.is_authenticated)?;
        map.serialize_entry("csrf_token", &self.csrf_token)?;
        for (key, value) in &self.page {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Source of the current time. Only the year is used for rendering.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Builds a [`RenderContext`] from the current request.
///
/// Building never fails: a session value that cannot be read is logged and
/// treated as absent. Reading the flash message removes it from the session,
/// so only one context ever observes a given message.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenIssuer>,
}

impl ContextBuilder {
    /// Create a builder from its two collaborators.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self { clock, tokens }
    }

    /// Assemble the context for `request`.
    pub async fn build(&self, request: &PageRequest) -> RenderContext {
        let session = request.session();

        let identity = Identity::load(session).await.unwrap_or_else(|e| {
            tracing::warn!("Treating request as unauthenticated: {}", e);
            Identity::anonymous()
        });

        let flash = flash::pop(session).await.unwrap_or_else(|e| {
            tracing::warn!("Dropping flash message: {}", e);
            None
        });

        let csrf_token = self.tokens.token_for(session).await.unwrap_or_else(|e| {
            tracing::warn!("Rendering without CSRF token: {}", e);
            String::new()
        });

        RenderContext::new(self.clock.now().year(), flash, &identity, csrf_token)
    }
}
