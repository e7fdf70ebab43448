use log::{trace, warn};
use serde_json::{Map, Value};
use te_utils::hash::HashSet;

use crate::error::kind_of;
use crate::field::FieldShape;
use crate::{DumpMode, Error, FieldValue, Object, Result, Schema};

impl Object {
    /// Creates an instance of `S` and loads `data` into it.
    pub fn from_value<S: Schema>(data: &Value) -> Result<Self> {
        let object = Self::new::<S>()?;
        object.load(data)?;
        Ok(object)
    }

    /// Creates an instance of `S` from JSON bytes, see [`Object::decode`].
    pub fn from_slice<S: Schema>(bytes: &[u8]) -> Result<Self> {
        let object = Self::new::<S>()?;
        object.decode(bytes)?;
        Ok(object)
    }

    /// Loads a mapping, see [`Object::load_map`].
    ///
    /// `null` loads nothing; any other non-mapping value is an
    /// [`Error::NotAMapping`].
    pub fn load(&self, data: &Value) -> Result<()> {
        match data {
            Value::Null => Ok(()),
            Value::Object(map) => self.load_map(map.clone()),
            other => Err(Error::NotAMapping {
                schema: self.schema_name(),
                found: kind_of(other),
            }),
        }
    }

    /// Writes every entry of `data` to the field of that name (or mapping
    /// name) through [`Object::set`].
    ///
    /// Keys matching no field are skipped. A nested `object_of` field merges
    /// the entry into its current object instead of replacing it. An empty
    /// mapping loads nothing and skips the load hooks.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use te_schema::{FieldDecls, Object, Root, Schema};
    ///
    /// struct User;
    ///
    /// impl Schema for User {
    ///     const NAME: &'static str = "User";
    ///     type Base = Root;
    ///
    ///     fn declare(fields: &mut FieldDecls) {
    ///         fields.field("name").mapping("userName");
    ///         fields.field("admin").default(false);
    ///     }
    /// }
    ///
    /// let user = Object::from_value::<User>(&json!({ "userName": "ada", "extra": 1 })).unwrap();
    /// assert_eq!(user.get("name").unwrap(), json!("ada"));
    /// assert_eq!(user.to_value().unwrap(), json!({ "userName": "ada", "admin": false }));
    /// ```
    pub fn load_map(&self, data: Map<String, Value>) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let data = (self.table().hooks.pre_loads)(self, data)
            .map_err(|e| e.into_hook_failure(self.schema_name(), "pre_loads"))?;

        let mut seen: HashSet<&'static str> = HashSet::default();
        for (key, value) in data {
            let Some(spec) = self.table().find(&key) else {
                trace!("`{}` has no field `{key}`, skipped", self.schema_name());
                continue;
            };
            if !seen.insert(spec.name()) {
                warn!(
                    "field `{}` of `{}` is loaded more than once, `{key}` wins",
                    spec.name(),
                    self.schema_name()
                );
            }

            if let FieldShape::Object(_) = spec.shape()
                && !spec.is_virtual()
                && value.is_object()
                && let FieldValue::Object(child) = spec.direct_get(self)?
            {
                child.load(&value)?;
            } else {
                spec.set(self, value)?;
            }
        }

        (self.table().hooks.post_loads)(self)
            .map_err(|e| e.into_hook_failure(self.schema_name(), "post_loads"))
    }

    /// Copies the stored values of `other` into this object.
    ///
    /// Goes through a raw dump of `other`, so the values are written again
    /// through this schema's converters and setters.
    pub fn load_from_object(&self, other: &Object) -> Result<()> {
        self.load_map(other.dumps_with(DumpMode::Raw)?)
    }

    /// Loads a JSON document, as produced by [`Object::encode`].
    pub fn decode(&self, bytes: &[u8]) -> Result<()> {
        let data: Value = serde_json::from_slice(bytes)?;
        self.load(&data)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};

    use crate::{DumpMode, Error, FieldDecls, HookError, Object, Root, Schema, convert};

    struct Address;

    impl Schema for Address {
        const NAME: &'static str = "Address";
        type Base = Root;

        fn declare(fields: &mut FieldDecls) {
            fields.field("city").default("Montreal");
            fields.field("zip");
        }
    }

    struct Customer;

    impl Schema for Customer {
        const NAME: &'static str = "Customer";
        type Base = Root;

        fn declare(fields: &mut FieldDecls) {
            fields.field("id").converter(convert::int(), convert::string());
            fields.field("address").object_of::<Address>();
            fields.field("tags").list();
        }

        fn pre_loads(_: &Object, mut data: Map<String, Value>) -> Result<Map<String, Value>, HookError> {
            if let Some(legacy) = data.remove("customer_id") {
                data.insert("id".to_owned(), legacy);
            }
            Ok(data)
        }

        fn post_loads(object: &Object) -> Result<(), HookError> {
            if object.get("id")?.is_null() {
                return Err(HookError::new("id is required"));
            }
            Ok(())
        }
    }

    #[test]
    fn load_merges_nested_objects() {
        let customer = Object::from_value::<Customer>(&json!({
            "id": "7",
            "address": { "zip": "H2X" },
            "unknown": true,
        }))
        .unwrap();

        let address = customer.get("address").unwrap();
        let address = address.as_object().unwrap();
        assert_eq!(address.get("city").unwrap(), json!("Montreal"));
        assert_eq!(address.get("zip").unwrap(), json!("H2X"));
        assert!(address.parent().unwrap().ptr_eq(&customer));

        customer.load(&json!({ "address": { "city": "Quebec" } })).unwrap();
        let same = customer.get("address").unwrap();
        assert!(same.as_object().unwrap().ptr_eq(address));
        assert_eq!(address.get("zip").unwrap(), json!("H2X"));
        assert_eq!(address.get("city").unwrap(), json!("Quebec"));
    }

    #[test]
    fn load_hooks_run_around_entries() {
        let customer = Object::from_value::<Customer>(&json!({ "customer_id": 12 })).unwrap();
        assert_eq!(customer.get("id").unwrap(), json!(12));

        let err = Object::from_value::<Customer>(&json!({ "tags": [] })).unwrap_err();
        assert!(matches!(
            err,
            Error::Hook {
                schema: "Customer",
                hook: "post_loads",
                ..
            }
        ));

        // nothing to load, hooks are skipped
        Object::from_value::<Customer>(&json!({})).unwrap();
        Object::from_value::<Customer>(&json!(null)).unwrap();
    }

    #[test]
    fn non_mappings_are_rejected() {
        let err = Object::from_value::<Address>(&json!([1, 2])).unwrap_err();
        assert!(matches!(
            err,
            Error::NotAMapping {
                schema: "Address",
                found: "an array"
            }
        ));
        assert!(matches!(
            Object::from_slice::<Address>(b"{ not json"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn encode_decode_round_trip() {
        let customer = Object::from_value::<Customer>(&json!({
            "id": 3,
            "address": { "zip": "G1A" },
            "tags": ["a", "b"],
        }))
        .unwrap();

        let bytes = customer.encode().unwrap();
        let copy = Object::from_slice::<Customer>(&bytes).unwrap();
        assert!(!copy.ptr_eq(&customer));
        assert_eq!(
            copy.dumps_with(DumpMode::Raw).unwrap(),
            customer.dumps_with(DumpMode::Raw).unwrap()
        );

        let other = Object::new::<Customer>().unwrap();
        other.load_from_object(&customer).unwrap();
        assert_eq!(other.to_value().unwrap(), customer.to_value().unwrap());
        assert_eq!(
            other.to_value().unwrap(),
            json!({ "id": "3", "address": { "city": "Montreal", "zip": "G1A" }, "tags": ["a", "b"] })
        );
    }

    #[test]
    fn loaded_lists_replace_the_previous_content() {
        let customer = Object::from_value::<Customer>(&json!({ "id": 1, "tags": ["a"] })).unwrap();
        customer.load(&json!({ "tags": ["b", "c"] })).unwrap();
        assert_eq!(customer.get("tags").unwrap(), json!(["b", "c"]));
    }
}
