use serde_json::Value;

use crate::{HookError, Object};

// -----------------------------------------------------------------------------
// FieldValue

/// The internal value of a field, as stored by an [`Object`].
///
/// Plain fields hold JSON [`Data`](FieldValue::Data). Fields declared with
/// [`FieldSpec::object_of`](crate::FieldSpec::object_of) hold a nested
/// [`Object`], and fields declared with
/// [`FieldSpec::list_of`](crate::FieldSpec::list_of) hold a sequence of them.
///
/// Cloning is cheap for nested objects: the handles are shared, not copied.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use te_schema::FieldValue;
///
/// let value = FieldValue::from(41);
/// let value = value.map_data(|v| Ok(json!(v.as_i64().unwrap() + 1))).unwrap();
/// assert_eq!(value, json!(42));
/// ```
#[derive(Clone, Debug)]
pub enum FieldValue {
    Data(Value),
    Object(Object),
    Objects(Vec<Object>),
}

impl FieldValue {
    /// The `null` value.
    pub const NULL: FieldValue = FieldValue::Data(Value::Null);

    /// Returns the JSON data, if this is [`FieldValue::Data`].
    #[inline]
    pub fn as_data(&self) -> Option<&Value> {
        match self {
            Self::Data(value) => Some(value),
            _ => None,
        }
    }

    /// Consumes `self`, returning the JSON data, if this is [`FieldValue::Data`].
    #[inline]
    pub fn into_data(self) -> Option<Value> {
        match self {
            Self::Data(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the nested object, if this is [`FieldValue::Object`].
    #[inline]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns the nested objects, if this is [`FieldValue::Objects`].
    #[inline]
    pub fn as_objects(&self) -> Option<&[Object]> {
        match self {
            Self::Objects(objects) => Some(objects),
            _ => None,
        }
    }

    /// Consumes `self`, returning the nested objects, if this is [`FieldValue::Objects`].
    #[inline]
    pub fn into_objects(self) -> Option<Vec<Object>> {
        match self {
            Self::Objects(objects) => Some(objects),
            _ => None,
        }
    }

    /// Returns `true` for JSON `null`.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Data(Value::Null))
    }

    /// Applies `f` to JSON data, passing nested objects through unchanged.
    ///
    /// Convenient for stages that only care about plain values.
    pub fn map_data<F>(self, f: F) -> Result<Self, HookError>
    where
        F: FnOnce(Value) -> Result<Value, HookError>,
    {
        match self {
            Self::Data(value) => f(value).map(Self::Data),
            other => Ok(other),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Data(value) => crate::error::kind_of(value),
            Self::Object(_) => "an object instance",
            Self::Objects(_) => "a list of object instances",
        }
    }
}

impl Default for FieldValue {
    #[inline]
    fn default() -> Self {
        Self::NULL
    }
}

// -----------------------------------------------------------------------------
// Comparison

impl PartialEq for FieldValue {
    /// Data compares by value, nested objects by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Data(a), Self::Data(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Objects(a), Self::Objects(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.ptr_eq(y))
            }
            _ => false,
        }
    }
}

impl PartialEq<Value> for FieldValue {
    fn eq(&self, other: &Value) -> bool {
        matches!(self, Self::Data(value) if value == other)
    }
}

impl PartialEq<FieldValue> for Value {
    #[inline]
    fn eq(&self, other: &FieldValue) -> bool {
        other == self
    }
}

// -----------------------------------------------------------------------------
// Conversions

impl From<Value> for FieldValue {
    #[inline]
    fn from(value: Value) -> Self {
        Self::Data(value)
    }
}

impl From<Object> for FieldValue {
    #[inline]
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl From<Vec<Object>> for FieldValue {
    #[inline]
    fn from(value: Vec<Object>) -> Self {
        Self::Objects(value)
    }
}

macro_rules! impl_from_json {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::Data(Value::from(value))
                }
            }
        )*
    };
}

impl_from_json!(bool, i32, i64, u32, u64, f64, String, &str);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::FieldValue;

    #[test]
    fn map_data_skips_objects() {
        let value = FieldValue::Objects(Vec::new());
        let mapped = value.map_data(|_| Err("never called".into())).unwrap();
        assert_eq!(mapped, FieldValue::Objects(Vec::new()));
    }

    #[test]
    fn compares_with_json() {
        assert_eq!(FieldValue::from("x"), json!("x"));
        assert_eq!(json!(true), FieldValue::from(true));
        assert_ne!(FieldValue::NULL, json!(0));
        assert!(FieldValue::default().is_null());
        assert_eq!(FieldValue::from(json!([1, 2])).kind(), "an array");
    }
}
