//! Form submission handling.
//!
//! Submitted bodies go through three steps:
//!
//! 1. [`PostForm`] parses the urlencoded body (client errors on bad input).
//! 2. [`PostForm::decode`] maps the fields onto a `Deserialize` type. Every
//!    value that does not convert comes back as a [`FieldError`].
//! 3. A [`Validator`] applies the page's own rules and carries the messages
//!    back into the re-rendered form.

mod decoder;
mod extract;
mod validator;

pub use decoder::{decode, decode_body, DecodeError, FieldError, FormFields, REQUIRED_MESSAGE};
pub use extract::{FormRejection, PostForm};
pub use validator::{
    matches, max_chars, min_chars, not_blank, permitted_value, Validator, EMAIL_RX,
};
