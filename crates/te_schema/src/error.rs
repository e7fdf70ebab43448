use std::borrow::Cow;

use serde_json::Value;
use thiserror::Error;

// -----------------------------------------------------------------------------
// ConfigError

/// An error raised while resolving the [`FieldTable`](crate::FieldTable) of a schema.
///
/// Resolution happens once; the error is cached with the schema and returned
/// again by every later attempt to use it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("schema `{schema}` has no field `{field}` to override")]
    UnknownField {
        schema: &'static str,
        field: Cow<'static, str>,
    },

    #[error("schema `{schema}` declares field `{field}` more than once")]
    DuplicateField {
        schema: &'static str,
        field: &'static str,
    },

    #[error("override hook of schema `{schema}` failed: {message}")]
    Hook {
        schema: &'static str,
        message: Cow<'static, str>,
    },
}

impl ConfigError {
    /// Creates a [`ConfigError::Hook`], for override hooks rejecting the
    /// merged table.
    #[inline]
    pub fn hook(schema: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self::Hook {
            schema,
            message: message.into(),
        }
    }
}

// -----------------------------------------------------------------------------
// HookError

/// The failure type of user supplied converters and pipeline stages.
///
/// The engine attaches the schema and field to it before handing it to the
/// caller, see [`Error::Conversion`] and [`Error::Rejected`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HookError {
    /// The value is not acceptable.
    #[error("{0}")]
    Message(Cow<'static, str>),

    /// The stage needed [`Object::parent`](crate::Object::parent), but it is unset or gone.
    #[error("parent object is not set")]
    MissingParent,

    /// An engine call made from inside the stage failed.
    #[error(transparent)]
    Access(Box<Error>),
}

impl HookError {
    /// Creates a [`HookError::Message`].
    #[inline]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Message(message.into())
    }

    pub(crate) fn into_rejection(self, schema: &'static str, field: &'static str) -> Error {
        match self {
            Self::MissingParent => Error::MissingParent { schema, field },
            Self::Access(inner) => *inner,
            source => Error::Rejected {
                schema,
                field,
                source,
            },
        }
    }

    pub(crate) fn into_conversion(self, schema: &'static str, field: &'static str) -> Error {
        match self {
            Self::MissingParent => Error::MissingParent { schema, field },
            Self::Access(inner) => *inner,
            source => Error::Conversion {
                schema,
                field,
                source,
            },
        }
    }

    pub(crate) fn into_hook_failure(self, schema: &'static str, hook: &'static str) -> Error {
        match self {
            Self::Access(inner) => *inner,
            source => Error::Hook {
                schema,
                hook,
                source,
            },
        }
    }
}

impl From<Error> for HookError {
    #[inline]
    fn from(value: Error) -> Self {
        Self::Access(Box::new(value))
    }
}

impl From<&'static str> for HookError {
    #[inline]
    fn from(value: &'static str) -> Self {
        Self::Message(Cow::Borrowed(value))
    }
}

impl From<String> for HookError {
    #[inline]
    fn from(value: String) -> Self {
        Self::Message(Cow::Owned(value))
    }
}

// -----------------------------------------------------------------------------
// Error

/// The error type of every accessor, load and dump operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("schema `{schema}` has no field `{field}`")]
    UnknownField { schema: &'static str, field: String },

    #[error("cannot convert field `{field}` of `{schema}`: {source}")]
    Conversion {
        schema: &'static str,
        field: &'static str,
        source: HookError,
    },

    #[error("field `{field}` of `{schema}` rejected the value: {source}")]
    Rejected {
        schema: &'static str,
        field: &'static str,
        source: HookError,
    },

    #[error("field `{field}` of `{schema}` needs a parent object, but none is set")]
    MissingParent {
        schema: &'static str,
        field: &'static str,
    },

    #[error("field `{field}` of `{schema}` expects {expected}, found {found}")]
    Shape {
        schema: &'static str,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("schema `{schema}` loads from an object, found {found}")]
    NotAMapping {
        schema: &'static str,
        found: &'static str,
    },

    #[error("field `{field}` of `{schema}` holds `{expected}` objects, found a `{found}` object")]
    SchemaMismatch {
        schema: &'static str,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("`{hook}` hook of `{schema}` failed: {source}")]
    Hook {
        schema: &'static str,
        hook: &'static str,
        source: HookError,
    },

    #[error("field `{field}` of `{schema}` is virtual and holds no value")]
    Virtual {
        schema: &'static str,
        field: &'static str,
    },

    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for schema operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Describes the JSON kind of `value` for error messages.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, HookError};

    #[test]
    fn hook_errors_gain_field_context() {
        let err = HookError::new("too small").into_rejection("Invoice", "amount");
        assert_eq!(
            err.to_string(),
            "field `amount` of `Invoice` rejected the value: too small"
        );

        let err = HookError::MissingParent.into_conversion("Line", "total");
        assert!(matches!(
            err,
            Error::MissingParent {
                schema: "Line",
                field: "total"
            }
        ));
    }

    #[test]
    fn nested_access_errors_pass_through() {
        let inner = Error::UnknownField {
            schema: "Invoice",
            field: "missing".into(),
        };
        let err = HookError::from(inner).into_rejection("Line", "total");
        assert!(matches!(err, Error::UnknownField { schema: "Invoice", .. }));
    }
}
