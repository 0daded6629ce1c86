//! Mapping of `application/x-www-form-urlencoded` bodies onto typed targets.
//!
//! Decoding distinguishes two kinds of failure:
//!
//! - [`FieldError`]: a submitted value could not be converted into its
//!   field's type, or a required field was not submitted. This is user input
//!   and gets reported back on the form. Every failing field is reported, not
//!   just the first one.
//! - [`DecodeError::Structural`]: the target type has a shape a form can
//!   never populate (a bare integer, a tuple, a nested struct...). This is a
//!   bug in the caller. The target is checked against placeholder values
//!   before the body is looked at, so the outcome does not depend on what
//!   was submitted.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use percent_encoding::percent_decode;
use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, Visitor};

/// Message used when a required field was not submitted.
pub const REQUIRED_MESSAGE: &str = "This field is required";

/// A submitted value could not be converted into its field's type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value for field `{field}`: {message}")]
pub struct FieldError {
    /// Name of the offending form field.
    pub field: String,
    /// User-facing description of the problem.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors produced while decoding a form.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The body is not valid urlencoded data.
    #[error("malformed form body: {0}")]
    Parse(String),

    /// One or more submitted values failed conversion, in submission order
    /// followed by required fields that were not submitted.
    #[error("invalid form input: {}", describe(.0))]
    Field(Vec<FieldError>),

    /// The target type cannot be populated from a form.
    #[error("form target is not decodable: {0}")]
    Structural(String),
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// What ends a single pass over the target.
#[derive(Debug, thiserror::Error)]
enum Failure {
    #[error(transparent)]
    Invalid(FieldError),

    #[error("missing field `{0}`")]
    Missing(&'static str),

    #[error("{0}")]
    Structural(String),
}

impl Failure {
    fn structural(what: impl fmt::Display) -> Self {
        Self::Structural(what.to_string())
    }

    /// Name the field an error came from, unless it already names one.
    fn within(self, field: &str) -> Self {
        match self {
            Self::Invalid(mut err) if err.field.is_empty() => {
                err.field = field.to_string();
                Self::Invalid(err)
            }
            other => other,
        }
    }
}

impl de::Error for Failure {
    // Raised by `Deserialize` impls themselves (custom parsers, validating
    // newtypes). The enclosing field is filled in by `within`.
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Invalid(FieldError::new("", msg.to_string()))
    }

    fn missing_field(field: &'static str) -> Self {
        Self::Missing(field)
    }
}

/// A parsed form body: field names mapped to every value submitted for them.
///
/// Fields keep the order in which they first appeared in the body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    fields: Vec<(String, Vec<String>)>,
}

impl FormFields {
    /// Parse a urlencoded body.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Parse`] if the body contains a malformed
    /// percent escape or a name or value that does not decode to UTF-8.
    pub fn parse(body: &[u8]) -> Result<Self, DecodeError> {
        check_encoding(body)?;
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|e| DecodeError::Parse(e.to_string()))?;
        Ok(Self::from_pairs(pairs))
    }

    /// Build from name/value pairs, grouping repeated names.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields: Vec<(String, Vec<String>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (name, value) in pairs {
            let name = name.into();
            match index.get(&name) {
                Some(&i) => fields[i].1.push(value.into()),
                None => {
                    index.insert(name.clone(), fields.len());
                    fields.push((name, vec![value.into()]));
                }
            }
        }

        Self { fields }
    }

    /// First value submitted for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// Every value submitted for `name`, in submission order.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or_default()
    }

    /// Number of distinct field names.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if nothing was submitted.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// The urlencoded parser repairs bad escapes and invalid UTF-8 silently, so
// both are rejected up front.
fn check_encoding(body: &[u8]) -> Result<(), DecodeError> {
    for part in body.split(|&b| matches!(b, b'&' | b'=')) {
        if let Some(escape) = bad_escape(part) {
            return Err(DecodeError::Parse(format!("invalid URL escape {escape:?}")));
        }
        percent_decode(part)
            .decode_utf8()
            .map_err(|e| DecodeError::Parse(format!("form body is not valid UTF-8: {e}")))?;
    }
    Ok(())
}

/// The first `%` not followed by two hex digits, with what follows it.
fn bad_escape(raw: &[u8]) -> Option<String> {
    raw.iter().enumerate().find_map(|(i, &b)| {
        if b != b'%' {
            return None;
        }
        match raw.get(i + 1..i + 3) {
            Some(hex) if hex.iter().all(u8::is_ascii_hexdigit) => None,
            _ => Some(String::from_utf8_lossy(&raw[i..raw.len().min(i + 3)]).into_owned()),
        }
    })
}

/// Decode parsed fields into `T`.
///
/// # Errors
///
/// Returns [`DecodeError::Structural`] when `T` is not something a form can
/// describe, whatever was submitted. Otherwise returns [`DecodeError::Field`]
/// listing every submitted value that does not convert and every required
/// field that is missing.
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use snippetbox_web::form::{decode, FormFields};
///
/// #[derive(Deserialize)]
/// struct SnippetForm {
///     title: String,
///     expires: u32,
/// }
///
/// let fields = FormFields::parse(b"title=Hello&expires=7").unwrap();
/// let form: SnippetForm = decode(&fields).unwrap();
/// assert_eq!(form.expires, 7);
/// ```
pub fn decode<T: DeserializeOwned>(fields: &FormFields) -> Result<T, DecodeError> {
    check_shape::<T>()?;

    let mut missing: Vec<&'static str> = Vec::new();
    loop {
        let errors = RefCell::new(Vec::new());
        let result = T::deserialize(FormDeserializer {
            source: Source::Body {
                fields,
                missing: &missing,
            },
            errors: &errors,
        });
        let mut errors = errors.into_inner();

        match result {
            Ok(value) if errors.is_empty() => return Ok(value),
            Ok(_) => return Err(DecodeError::Field(errors)),
            // serde reports required fields one at a time; go again with a
            // stand-in for each one found so far.
            Err(Failure::Missing(name)) if !missing.contains(&name) => missing.push(name),
            Err(Failure::Missing(name)) => {
                errors.push(FieldError::new(name, REQUIRED_MESSAGE));
                return Err(DecodeError::Field(errors));
            }
            Err(Failure::Invalid(err)) => {
                if !errors.iter().any(|e| e.field == err.field) {
                    errors.push(err);
                }
                return Err(DecodeError::Field(errors));
            }
            Err(Failure::Structural(what)) => return Err(DecodeError::Structural(what)),
        }
    }
}

/// Parse a raw body and decode it into `T`.
///
/// # Errors
///
/// See [`FormFields::parse`] and [`decode`].
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
    decode(&FormFields::parse(body)?)
}

/// Run `T` against a placeholder for every field it declares.
fn check_shape<T: DeserializeOwned>() -> Result<(), DecodeError> {
    let errors = RefCell::new(Vec::new());
    match T::deserialize(FormDeserializer {
        source: Source::Placeholders,
        errors: &errors,
    }) {
        Err(Failure::Structural(what)) => Err(DecodeError::Structural(what)),
        _ => Ok(()),
    }
}

#[derive(Clone, Copy)]
enum Source<'a> {
    /// A submitted body, plus the required fields found missing so far.
    Body {
        fields: &'a FormFields,
        missing: &'a [&'static str],
    },
    /// No body; every declared field gets a placeholder.
    Placeholders,
}

/// Where a field's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Submitted,
    /// Required but not submitted: reported, then filled with a placeholder.
    Missing,
    Placeholder,
}

#[derive(Clone, Copy)]
struct Entry<'a> {
    name: &'a str,
    values: &'a [String],
    slot: Slot,
}

/// Top level of a form: only record-like targets are accepted.
struct FormDeserializer<'a> {
    source: Source<'a>,
    errors: &'a RefCell<Vec<FieldError>>,
}

impl<'a> FormDeserializer<'a> {
    fn fields(self, declared: &'static [&'static str]) -> FieldsAccess<'a> {
        let entries: Vec<Entry<'a>> = match self.source {
            Source::Body { fields, missing } => fields
                .fields
                .iter()
                .map(|(name, values)| Entry {
                    name: name.as_str(),
                    values: values.as_slice(),
                    slot: Slot::Submitted,
                })
                .chain(missing.iter().map(|&name| Entry {
                    name,
                    values: &[],
                    slot: Slot::Missing,
                }))
                .collect(),
            Source::Placeholders => declared
                .iter()
                .map(|&name| Entry {
                    name,
                    values: &[],
                    slot: Slot::Placeholder,
                })
                .collect(),
        };

        FieldsAccess {
            entries: entries.into_iter(),
            current: None,
            errors: self.errors,
        }
    }
}

macro_rules! reject_top_level {
    ($($method:ident => $what:literal),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
                Err(Failure::structural(concat!("a form cannot be decoded into ", $what)))
            }
        )*
    };
}

impl<'de, 'a> de::Deserializer<'de> for FormDeserializer<'a> {
    type Error = Failure;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_map(visitor)
    }

    // Maps declare no fields; one placeholder entry stands in for the values.
    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_map(self.fields(&[""]))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_map(self.fields(fields))
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_some(self)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    reject_top_level! {
        deserialize_bool => "a boolean",
        deserialize_i8 => "an integer",
        deserialize_i16 => "an integer",
        deserialize_i32 => "an integer",
        deserialize_i64 => "an integer",
        deserialize_i128 => "an integer",
        deserialize_u8 => "an integer",
        deserialize_u16 => "an integer",
        deserialize_u32 => "an integer",
        deserialize_u64 => "an integer",
        deserialize_u128 => "an integer",
        deserialize_f32 => "a float",
        deserialize_f64 => "a float",
        deserialize_char => "a char",
        deserialize_str => "a string",
        deserialize_string => "a string",
        deserialize_bytes => "bytes",
        deserialize_byte_buf => "bytes",
        deserialize_unit => "unit",
        deserialize_seq => "a sequence",
        deserialize_identifier => "an identifier",
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(Failure::structural(format_args!(
            "a form cannot be decoded into unit struct `{name}`"
        )))
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(Failure::structural("a form cannot be decoded into a tuple"))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(Failure::structural(format_args!(
            "a form cannot be decoded into tuple struct `{name}`"
        )))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(Failure::structural(format_args!(
            "a form cannot be decoded into enum `{name}`"
        )))
    }
}

struct FieldsAccess<'a> {
    entries: std::vec::IntoIter<Entry<'a>>,
    current: Option<Entry<'a>>,
    errors: &'a RefCell<Vec<FieldError>>,
}

impl<'de, 'a> de::MapAccess<'de> for FieldsAccess<'a> {
    type Error = Failure;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        let Some(entry) = self.entries.next() else {
            return Ok(None);
        };
        self.current = Some(entry);

        seed.deserialize(entry.name.into_deserializer())
            .map(Some)
            .map_err(|e: Failure| e.within(entry.name))
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Self::Error> {
        let entry = self
            .current
            .take()
            .ok_or_else(|| Failure::structural("form value requested before its key"))?;

        seed.deserialize(ValueDeserializer {
            field: entry.name,
            values: entry.values,
            slot: entry.slot,
            in_seq: false,
            errors: self.errors,
        })
        .map_err(|e| e.within(entry.name))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

/// The values submitted for a single field.
///
/// A value that does not convert is recorded and replaced by a placeholder,
/// so the remaining fields are still checked.
struct ValueDeserializer<'a> {
    field: &'a str,
    values: &'a [String],
    slot: Slot,
    in_seq: bool,
    errors: &'a RefCell<Vec<FieldError>>,
}

impl<'a> ValueDeserializer<'a> {
    fn first(&self) -> &'a str {
        self.values.first().map_or("", String::as_str)
    }

    fn record(&self, message: &str) {
        self.errors
            .borrow_mut()
            .push(FieldError::new(self.field, message));
    }

    /// The submitted text, or `None` where a placeholder stands in.
    fn raw(&self) -> Option<&'a str> {
        match self.slot {
            Slot::Submitted => Some(self.first()),
            Slot::Missing => {
                self.record(REQUIRED_MESSAGE);
                None
            }
            Slot::Placeholder => None,
        }
    }

    fn convert<T: Default>(&self, parse: impl FnOnce(&str) -> Option<T>, message: &str) -> T {
        match self.raw() {
            Some(raw) => parse(raw).unwrap_or_else(|| {
                self.record(message);
                T::default()
            }),
            None => T::default(),
        }
    }

    fn nested(&self, what: &str) -> Failure {
        nested(self.field, what)
    }
}

fn nested(field: &str, what: &str) -> Failure {
    Failure::structural(format_args!(
        "field `{field}` is {what}, which a form value cannot populate"
    ))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "yes" | "ok" | "1" | "t" | "true" => Some(true),
        "" | "off" | "no" | "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

fn single_char(raw: &str) -> Option<char> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

macro_rules! parse_scalar {
    ($($method:ident => $visit:ident : $ty:ty, $message:literal;)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
                visitor.$visit(self.convert(|raw| raw.trim().parse::<$ty>().ok(), $message))
            }
        )*
    };
}

impl<'de, 'a> de::Deserializer<'de> for ValueDeserializer<'a> {
    type Error = Failure;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_str(self.raw().unwrap_or_default())
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_bool(self.convert(parse_bool, "This field must be yes or no"))
    }

    parse_scalar! {
        deserialize_i8 => visit_i8: i8, "This field must be a whole number";
        deserialize_i16 => visit_i16: i16, "This field must be a whole number";
        deserialize_i32 => visit_i32: i32, "This field must be a whole number";
        deserialize_i64 => visit_i64: i64, "This field must be a whole number";
        deserialize_i128 => visit_i128: i128, "This field must be a whole number";
        deserialize_u8 => visit_u8: u8, "This field must be a whole number";
        deserialize_u16 => visit_u16: u16, "This field must be a whole number";
        deserialize_u32 => visit_u32: u32, "This field must be a whole number";
        deserialize_u64 => visit_u64: u64, "This field must be a whole number";
        deserialize_u128 => visit_u128: u128, "This field must be a whole number";
        deserialize_f32 => visit_f32: f32, "This field must be a number";
        deserialize_f64 => visit_f64: f64, "This field must be a number";
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_char(self.convert(single_char, "This field must be a single character"))
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_str(self.raw().unwrap_or_default())
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_string(self.raw().unwrap_or_default().to_string())
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_bytes(self.raw().unwrap_or_default().as_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_byte_buf(self.raw().unwrap_or_default().as_bytes().to_vec())
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.slot {
            Slot::Submitted if self.first().is_empty() => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(self.nested("a unit value"))
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(self.nested("a unit struct"))
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        if self.in_seq {
            return Err(self.nested("a nested sequence"));
        }
        let stand_in = self.raw().is_none();
        visitor.visit_seq(ValuesAccess {
            field: self.field,
            iter: self.values.iter(),
            stand_in,
            errors: self.errors,
        })
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(self.nested("a tuple"))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(self.nested("a tuple struct"))
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(self.nested("a map"))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(self.nested("a struct"))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let Some(&fallback) = variants.first() else {
            return Err(self.nested("an enum without variants"));
        };

        let variant = match self.raw().map(str::trim) {
            Some(raw) if variants.iter().any(|v| *v == raw) => raw,
            Some(_) => {
                self.record(&format!("This field must be one of: {}", variants.join(", ")));
                fallback
            }
            None => fallback,
        };

        visitor.visit_enum(UnitVariant {
            field: self.field,
            variant,
        })
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }
}

struct ValuesAccess<'a> {
    field: &'a str,
    iter: std::slice::Iter<'a, String>,
    /// Yield one placeholder element so the element type gets checked.
    stand_in: bool,
    errors: &'a RefCell<Vec<FieldError>>,
}

impl<'de, 'a> de::SeqAccess<'de> for ValuesAccess<'a> {
    type Error = Failure;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Self::Error> {
        let (values, slot) = if self.stand_in {
            self.stand_in = false;
            (<&[String]>::default(), Slot::Placeholder)
        } else {
            match self.iter.next() {
                Some(value) => (std::slice::from_ref(value), Slot::Submitted),
                None => return Ok(None),
            }
        };

        seed.deserialize(ValueDeserializer {
            field: self.field,
            values,
            slot,
            in_seq: true,
            errors: self.errors,
        })
        .map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len() + usize::from(self.stand_in))
    }
}

/// Enums are selected by name, e.g. a `<select>`; only unit variants fit.
struct UnitVariant<'a> {
    field: &'a str,
    variant: &'a str,
}

impl<'de, 'a> de::EnumAccess<'de> for UnitVariant<'a> {
    type Error = Failure;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self), Self::Error> {
        let name: de::value::StrDeserializer<'_, Failure> = self.variant.into_deserializer();
        let variant = seed.deserialize(name)?;
        Ok((variant, self))
    }
}

impl<'de, 'a> de::VariantAccess<'de> for UnitVariant<'a> {
    type Error = Failure;

    fn unit_variant(self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, _seed: T) -> Result<T::Value, Self::Error> {
        Err(nested(self.field, "an enum with data"))
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(nested(self.field, "an enum with data"))
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(nested(self.field, "an enum with data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Deserialize, PartialEq)]
    struct SnippetForm {
        title: String,
        content: String,
        expires: u32,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Visibility {
        Public,
        Private,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Everything {
        name: String,
        nickname: Option<String>,
        age: Option<u8>,
        subscribed: bool,
        ratio: f64,
        initial: char,
        visibility: Visibility,
        #[serde(default)]
        tags: Vec<String>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct LoginForm {
        email: String,
        #[serde(default)]
        remember: bool,
        #[serde(default)]
        attempts: u32,
    }

    #[derive(Debug, Deserialize)]
    struct Address {
        _street: String,
    }

    #[derive(Debug, Deserialize)]
    struct WithNested {
        _name: String,
        _address: Address,
    }

    #[derive(Debug, Deserialize)]
    struct WithOptionalNested {
        _name: String,
        _address: Option<Address>,
    }

    #[derive(Debug, Deserialize)]
    struct WithNestedList {
        #[serde(default)]
        _addresses: Vec<Address>,
    }

    #[derive(Debug, Deserialize)]
    struct WithTuple {
        _pair: (u32, u32),
    }

    #[derive(Debug, Deserialize)]
    struct Wrapper(SnippetForm);

    #[derive(Debug, Deserialize)]
    struct Unit;

    fn field_errors<T: std::fmt::Debug>(result: Result<T, DecodeError>) -> Vec<FieldError> {
        match result {
            Err(DecodeError::Field(errors)) => errors,
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    fn failing_fields<T: std::fmt::Debug>(result: Result<T, DecodeError>) -> Vec<String> {
        field_errors(result).into_iter().map(|e| e.field).collect()
    }

    fn assert_structural<T: std::fmt::Debug>(result: Result<T, DecodeError>) {
        match result {
            Err(DecodeError::Structural(_)) => {}
            other => panic!("expected structural error, got {other:?}"),
        }
    }

    fn assert_parse_error(body: &[u8]) {
        match FormFields::parse(body) {
            Err(DecodeError::Parse(_)) => {}
            other => panic!("expected parse error for {body:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_groups_repeated_names() {
        let fields = FormFields::parse(b"tag=a&title=x&tag=b&tag=c").unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("tag"), Some("a"));
        assert_eq!(fields.get_all("tag"), ["a", "b", "c"]);
        assert_eq!(fields.get("title"), Some("x"));
        assert!(fields.get_all("missing").is_empty());
    }

    #[test]
    fn test_parse_percent_decoding() {
        let fields =
            FormFields::parse(b"title=Hello+world%21&content=a%26b&note=100%25zz&name=caf%C3%A9")
                .unwrap();
        assert_eq!(fields.get("title"), Some("Hello world!"));
        assert_eq!(fields.get("content"), Some("a&b"));
        assert_eq!(fields.get("note"), Some("100%zz"));
        assert_eq!(fields.get("name"), Some("café"));
    }

    #[test]
    fn test_parse_empty_body() {
        assert!(FormFields::parse(b"").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_escapes() {
        assert_parse_error(b"a=%zz");
        assert_parse_error(b"a=%");
        assert_parse_error(b"a=%4");
        assert_parse_error(b"title=ok&a=%4g");
        assert_parse_error(b"%zz=1");

        let err = FormFields::parse(b"a=%zz").unwrap_err();
        assert_eq!(err.to_string(), "malformed form body: invalid URL escape \"%zz\"");
    }

    #[test]
    fn test_parse_rejects_invalid_utf8() {
        assert_parse_error(b"a=\xff\xfe");
        assert_parse_error(b"a=%ff%fe");
        assert_parse_error(b"%C3=x");
    }

    #[test]
    fn test_decode_body_reports_parse_errors() {
        assert!(matches!(
            decode_body::<SnippetForm>(b"title=%zz&content=c&expires=1"),
            Err(DecodeError::Parse(_))
        ));
    }

    #[test]
    fn test_decode_struct() {
        let form: SnippetForm =
            decode_body(b"title=O+snail&content=Climb+Mount+Fuji&expires=365").unwrap();
        assert_eq!(
            form,
            SnippetForm {
                title: "O snail".to_string(),
                content: "Climb Mount Fuji".to_string(),
                expires: 365,
            }
        );
    }

    #[test]
    fn test_decode_every_scalar_kind() {
        let form: Everything = decode_body(
            b"name=Ann&nickname=&age=41&subscribed=on&ratio=0.5&initial=A&visibility=private&tags=x&tags=y",
        )
        .unwrap();
        assert_eq!(
            form,
            Everything {
                name: "Ann".to_string(),
                nickname: None,
                age: Some(41),
                subscribed: true,
                ratio: 0.5,
                initial: 'A',
                visibility: Visibility::Private,
                tags: vec!["x".to_string(), "y".to_string()],
            }
        );
    }

    #[test]
    fn test_decode_absent_optional_and_defaulted_fields() {
        let form: Everything =
            decode_body(b"name=Ann&subscribed=off&ratio=1&initial=z&visibility=public").unwrap();
        assert_eq!(form.nickname, None);
        assert_eq!(form.age, None);
        assert!(!form.subscribed);
        assert!(form.tags.is_empty());
    }

    #[test]
    fn test_unchecked_checkbox_uses_default() {
        let form: LoginForm = decode_body(b"email=a%40b.com").unwrap();
        assert_eq!(
            form,
            LoginForm {
                email: "a@b.com".to_string(),
                remember: false,
                attempts: 0,
            }
        );
    }

    #[test]
    fn test_scalar_uses_first_value() {
        let form: SnippetForm = decode_body(b"title=a&title=b&content=c&expires=1&expires=7").unwrap();
        assert_eq!(form.title, "a");
        assert_eq!(form.expires, 1);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let form: SnippetForm =
            decode_body(b"csrf_token=abc&title=t&content=c&expires=7").unwrap();
        assert_eq!(form.expires, 7);
    }

    #[test]
    fn test_non_numeric_into_integer_is_field_error() {
        let errors = field_errors(decode_body::<SnippetForm>(b"title=t&content=c&expires=soon"));
        assert_eq!(
            errors,
            [FieldError::new("expires", "This field must be a whole number")]
        );
    }

    #[test]
    fn test_out_of_range_integer_is_field_error() {
        let result: Result<Everything, _> =
            decode_body(b"name=n&age=300&subscribed=1&ratio=1&initial=a&visibility=public");
        assert_eq!(failing_fields(result), ["age"]);
    }

    #[test]
    fn test_unknown_variant_is_field_error() {
        let errors = field_errors(decode_body::<Everything>(
            b"name=n&subscribed=1&ratio=1&initial=a&visibility=secret",
        ));
        assert_eq!(
            errors,
            [FieldError::new("visibility", "This field must be one of: public, private")]
        );
    }

    #[test]
    fn test_every_failing_field_is_reported() {
        let result: Result<Everything, _> = decode_body(
            b"name=n&age=300&subscribed=maybe&ratio=half&initial=ab&visibility=secret",
        );
        assert_eq!(
            failing_fields(result),
            ["age", "subscribed", "ratio", "initial", "visibility"]
        );
    }

    #[test]
    fn test_every_missing_required_field_is_reported() {
        let errors = field_errors(decode_body::<SnippetForm>(b""));
        assert_eq!(
            errors,
            [
                FieldError::new("title", REQUIRED_MESSAGE),
                FieldError::new("content", REQUIRED_MESSAGE),
                FieldError::new("expires", REQUIRED_MESSAGE),
            ]
        );
    }

    #[test]
    fn test_conversion_and_missing_errors_together() {
        let result: Result<SnippetForm, _> = decode_body(b"content=c&expires=soon");
        assert_eq!(failing_fields(result), ["expires", "title"]);
    }

    #[test]
    fn test_bad_values_in_a_list_are_reported() {
        #[derive(Debug, Deserialize)]
        struct Picks {
            _ids: Vec<u32>,
        }

        let result: Result<Picks, _> = decode_body(b"_ids=1&_ids=x&_ids=3");
        assert_eq!(failing_fields(result), ["_ids"]);
    }

    #[test]
    fn test_top_level_shapes_are_structural_regardless_of_body() {
        for body in [&b""[..], b"a=1", b"title=t&content=c&expires=1", b"1"] {
            assert_structural(decode_body::<i32>(body));
            assert_structural(decode_body::<String>(body));
            assert_structural(decode_body::<(String, String)>(body));
            assert_structural(decode_body::<Vec<String>>(body));
            assert_structural(decode_body::<Unit>(body));
            assert_structural(decode_body::<Visibility>(body));
        }
    }

    #[test]
    fn test_nested_shapes_are_structural_regardless_of_body() {
        for body in [&b""[..], b"_name=a", b"_name=a&_address=b"] {
            assert_structural(decode_body::<WithNested>(body));
            assert_structural(decode_body::<WithOptionalNested>(body));
        }
        assert_structural(decode_body::<WithNestedList>(b""));
        assert_structural(decode_body::<WithTuple>(b""));
        assert_structural(decode_body::<WithTuple>(b"_pair=1&_pair=2"));
        assert_structural(decode_body::<BTreeMap<String, Address>>(b""));
    }

    #[test]
    fn test_map_and_newtype_targets() {
        let map: BTreeMap<String, u32> = decode_body(b"a=1&b=2").unwrap();
        assert_eq!(map.get("b"), Some(&2));

        let empty: BTreeMap<String, u32> = decode_body(b"").unwrap();
        assert!(empty.is_empty());

        let wrapped: Wrapper = decode_body(b"title=t&content=c&expires=3").unwrap();
        assert_eq!(wrapped.0.expires, 3);

        assert_eq!(
            failing_fields(decode_body::<BTreeMap<String, u32>>(b"a=1&b=x")),
            ["b"]
        );
    }

    #[test]
    fn test_error_display_lists_fields() {
        let err = decode_body::<SnippetForm>(b"title=t&content=c&expires=x").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid form input: invalid value for field `expires`: This field must be a whole number"
        );
    }
}
