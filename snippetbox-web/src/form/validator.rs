//! Post-decode validation of form input.
//!
//! A [`Validator`] collects user-facing messages keyed by field name so a
//! page can re-render the form with each problem next to its input.
//!
//! ```rust
//! use snippetbox_web::form::{Validator, not_blank, max_chars};
//!
//! let title = "";
//! let mut v = Validator::default();
//! v.check_field(not_blank(title), "title", "This field cannot be blank");
//! v.check_field(max_chars(title, 100), "title", "This field cannot be more than 100 characters long");
//! assert!(!v.valid());
//! assert_eq!(v.field_errors()["title"], "This field cannot be blank");
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::decoder::FieldError;

/// Loose email shape check used by signup-style forms.
pub static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("Email regex should be valid")
});

/// Accumulated validation messages for one form submission.
///
/// Serializes as `{ "field_errors": {...}, "non_field_errors": [...] }` so it
/// can be handed straight to a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Validator {
    field_errors: BTreeMap<String, String>,
    non_field_errors: Vec<String>,
}

impl Validator {
    /// True when no errors have been recorded.
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Record `message` for `field`. The first message per field wins.
    pub fn add_field_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.field_errors
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    /// Record a message that belongs to the form as a whole.
    pub fn add_non_field_error(&mut self, message: impl Into<String>) {
        self.non_field_errors.push(message.into());
    }

    /// Record `message` for `field` unless `ok` holds.
    pub fn check_field(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_field_error(field, message);
        }
    }

    /// Fold a decode-time conversion failure into the form's errors.
    pub fn add_decode_error(&mut self, err: FieldError) {
        self.add_field_error(err.field, err.message);
    }

    /// Fold every decode-time failure into the form's errors.
    pub fn add_decode_errors(&mut self, errors: impl IntoIterator<Item = FieldError>) {
        for err in errors {
            self.add_decode_error(err);
        }
    }

    /// Messages keyed by field name.
    pub fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }

    /// Messages not tied to a single field.
    pub fn non_field_errors(&self) -> &[String] {
        &self.non_field_errors
    }
}

impl From<Vec<FieldError>> for Validator {
    fn from(errors: Vec<FieldError>) -> Self {
        let mut validator = Self::default();
        validator.add_decode_errors(errors);
        validator
    }
}

/// True if `value` contains something other than whitespace.
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// True if `value` has at most `n` characters.
pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

/// True if `value` has at least `n` characters.
pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

/// True if `value` is one of `permitted`.
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

/// True if `rx` matches `value`.
pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}
