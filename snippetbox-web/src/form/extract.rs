//! Axum extractor for submitted forms.

use std::any::type_name;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, FromRequest, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

use super::decoder::{decode, DecodeError, FieldError, FormFields};
use crate::responses::client_error;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A parsed `application/x-www-form-urlencoded` request body.
///
/// Extraction only parses the body. Typing it is a separate step so handlers
/// can turn conversion failures into form errors:
///
/// ```rust,ignore
/// async fn create(request: PageRequest, form: PostForm) -> Response {
///     let input: SnippetForm = match form.decode() {
///         Ok(input) => input,
///         Err(errors) => return redisplay(Validator::from(errors)),
///     };
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PostForm {
    fields: FormFields,
}

impl PostForm {
    /// Wrap already parsed fields.
    pub fn new(fields: FormFields) -> Self {
        Self { fields }
    }

    /// The raw submitted fields, e.g. to redisplay values that failed to decode.
    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    /// Decode the form into `T`.
    ///
    /// # Errors
    ///
    /// Returns a [`FieldError`] for every value that does not convert into
    /// its field's type and for every missing required field.
    ///
    /// # Panics
    ///
    /// Panics if `T` can never be populated from a form (see
    /// [`DecodeError::Structural`]). That is a bug in the handler, not bad
    /// input, and must not be served as if it were.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, Vec<FieldError>> {
        match decode(&self.fields) {
            Ok(value) => Ok(value),
            Err(DecodeError::Field(errors)) => Err(errors),
            Err(err) => panic!("cannot decode form into `{}`: {err}", type_name::<T>()),
        }
    }
}

/// Why a request body could not be read as a form.
#[derive(Debug, thiserror::Error)]
pub enum FormRejection {
    #[error("expected a request with `Content-Type: application/x-www-form-urlencoded`")]
    UnsupportedContentType,

    #[error(transparent)]
    Body(#[from] BytesRejection),

    #[error(transparent)]
    Parse(DecodeError),
}

impl FormRejection {
    /// Status sent to the client: 413 for an oversized body, otherwise 400.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Body(rejection) => rejection.status(),
            Self::UnsupportedContentType | Self::Parse(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for FormRejection {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "rejected form submission");
        client_error(self.status())
    }
}

fn has_form_content_type(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

impl<S> FromRequest<S> for PostForm
where
    S: Send + Sync,
{
    type Rejection = FormRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !has_form_content_type(&req) {
            return Err(FormRejection::UnsupportedContentType);
        }

        let body = Bytes::from_request(req, state).await?;
        let fields = FormFields::parse(&body).map_err(FormRejection::Parse)?;
        Ok(Self { fields })
    }
}
