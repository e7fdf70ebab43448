use core::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::{FieldValue, HookError, Object};

// -----------------------------------------------------------------------------
// Function types

/// Maps one representation of a value to another.
///
/// Load converters map external data to the internal value, dump converters
/// map it back. They are never called with `null`.
pub type Converter = Arc<dyn Fn(Value) -> Result<Value, HookError> + Send + Sync>;

/// One step of a getter or setter chain.
///
/// Receives the object being accessed (for cross-field context) and the
/// value produced by the previous step.
pub type Stage = Arc<dyn Fn(&Object, FieldValue) -> Result<FieldValue, HookError> + Send + Sync>;

/// Produces a fresh default value for each object that needs one.
pub type Factory = Arc<dyn Fn() -> Value + Send + Sync>;

/// Wraps a closure into a [`Converter`].
#[inline]
pub fn converter<F>(f: F) -> Converter
where
    F: Fn(Value) -> Result<Value, HookError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps a closure into a [`Stage`].
#[inline]
pub fn stage<F>(f: F) -> Stage
where
    F: Fn(&Object, FieldValue) -> Result<FieldValue, HookError> + Send + Sync + 'static,
{
    Arc::new(f)
}

// -----------------------------------------------------------------------------
// DefaultValue

/// The default of a field, used when an object reads a field it never wrote.
#[derive(Clone)]
pub enum DefaultValue {
    /// Cloned into every object.
    Value(Value),
    /// Called once per object.
    Factory(Factory),
}

impl DefaultValue {
    /// Returns the value, calling the factory if there is one.
    #[inline]
    pub fn produce(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Runs `value` through `stages` in order.
pub(crate) fn run_stages(
    stages: &[Stage],
    object: &Object,
    mut value: FieldValue,
) -> Result<FieldValue, HookError> {
    for stage in stages {
        value = stage(object, value)?;
    }
    Ok(value)
}
