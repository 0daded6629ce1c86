//! Template functions registered in every page set.
//!
//! Available in templates as filters:
//!
//! ```html
//! <time>{{ snippet.created|human_date }}</time>
//! <p>{{ snippet.content|truncate(80) }}</p>
//! <span>{{ count }} {{ count|pluralize("snippet", "snippets") }}</span>
//! ```

use chrono::{DateTime, Utc};
use minijinja::{Environment, Error, ErrorKind};

/// Register every helper on `env`.
pub(crate) fn register(env: &mut Environment<'static>) {
    env.add_filter("human_date", human_date);
    env.add_filter("truncate", truncate);
    env.add_filter("pluralize", pluralize);
}

/// Format an RFC 3339 timestamp as `02 Jan 2006 at 15:04` (UTC).
///
/// An empty string renders as an empty string.
///
/// # Example
///
/// ```rust
/// use snippetbox_web::templates::human_date;
///
/// assert_eq!(
///     human_date("2024-03-17T10:15:00Z").unwrap(),
///     "17 Mar 2024 at 10:15"
/// );
/// ```
pub fn human_date(value: &str) -> Result<String, Error> {
    if value.is_empty() {
        return Ok(String::new());
    }

    let parsed = DateTime::parse_from_rfc3339(value).map_err(|e| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("human_date expects an RFC 3339 timestamp, got {value:?}: {e}"),
        )
    })?;

    Ok(parsed
        .with_timezone(&Utc)
        .format("%d %b %Y at %H:%M")
        .to_string())
}

/// Truncate text with ellipsis.
///
/// # Example
///
/// ```rust
/// use snippetbox_web::templates::truncate;
///
/// assert_eq!(truncate("Hello, World!", 5), "He...");
/// assert_eq!(truncate("Hi", 10), "Hi");
/// ```
#[must_use]
pub fn truncate(value: &str, max_len: usize) -> String {
    if value.chars().count() <= max_len {
        return value.to_string();
    }

    let kept: String = value.chars().take(max_len.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Pick the singular or plural form of a word based on count.
///
/// # Example
///
/// ```rust
/// use snippetbox_web::templates::pluralize;
///
/// assert_eq!(pluralize(1, "snippet", "snippets"), "snippet");
/// assert_eq!(pluralize(2, "snippet", "snippets"), "snippets");
/// assert_eq!(pluralize(0, "snippet", "snippets"), "snippets");
/// ```
#[must_use]
pub fn pluralize(count: i64, singular: &str, plural: &str) -> String {
    if count == 1 {
        singular.to_string()
    } else {
        plural.to_string()
    }
}
