//! The accessor protocol.
//!
//! - write: load converter, nested instantiation, setter chain, store.
//! - read: stored value (default materialized once), getter chain.
//! - bypass read: stored value (default materialized once), nothing else.
//!
//! A failing write leaves the stored value untouched. Reading never changes
//! the stored value, only the returned one.

use log::trace;
use serde_json::Value;

use crate::error::kind_of;
use crate::field::pipeline::run_stages;
use crate::field::{FieldShape, FieldSpec};
use crate::object::nested::{nest_list, nest_object};
use crate::{DumpMode, Error, FieldValue, HookError, Object, Result};

impl FieldSpec {
    /// Reads the field of `object` through the getter chain.
    ///
    /// The chain is seeded with the stored value, materializing the default
    /// on first read. A virtual field is seeded with its default instead.
    pub fn get(&self, object: &Object) -> Result<FieldValue> {
        let raw = if self.is_virtual() {
            self.default_value()
                .map(|default| FieldValue::Data(default.produce()))
                .unwrap_or_default()
        } else {
            self.direct_get(object)?
        };
        run_stages(self.getter_stages(), object, raw)
            .map_err(|e| e.into_rejection(object.schema_name(), self.name()))
    }

    /// Writes the field of `object`: the load converter, the nested
    /// instantiation rule and the setter chain run in that order before the
    /// result is stored.
    ///
    /// A virtual field runs the same steps and stores nothing.
    pub fn set(&self, object: &Object, value: impl Into<FieldValue>) -> Result<()> {
        self.check_owner(object)?;
        let value = self.load_value(object, value.into(), true)?;
        let value = run_stages(self.setter_stages(), object, value)
            .map_err(|e| e.into_rejection(object.schema_name(), self.name()))?;
        if !self.is_virtual() {
            object.store(self.name(), value);
        }
        Ok(())
    }

    /// Returns the stored value of `object` without running the getter chain.
    ///
    /// The default is materialized and stored if the field was never written.
    /// Fails with [`Error::Virtual`] for a virtual field.
    pub fn direct_get(&self, object: &Object) -> Result<FieldValue> {
        self.check_stored(object)?;
        if let Some(value) = object.stored(self.name()) {
            return Ok(value);
        }
        trace!("materializing default of `{}.{}`", object.schema_name(), self.name());
        let value = self.materialize_default(object)?;
        Ok(object.store_default(self.name(), value))
    }

    /// Stores `value` without running the setter chain.
    ///
    /// The load converter still runs unless `bypass_converter` is set, and
    /// nested fields still instantiate their objects.
    /// Fails with [`Error::Virtual`] for a virtual field.
    pub fn direct_set(&self, object: &Object, value: impl Into<FieldValue>, bypass_converter: bool) -> Result<()> {
        self.check_stored(object)?;
        let value = self.load_value(object, value.into(), !bypass_converter)?;
        object.store(self.name(), value);
        Ok(())
    }

    /// Forgets the stored value, so the next read materializes the default
    /// again. Does nothing for a virtual field.
    pub fn delete(&self, object: &Object) {
        if !self.is_virtual() {
            object.forget(self.name());
        }
    }

    // -------------------------------------------------------------------------
    // Internals

    fn check_owner(&self, object: &Object) -> Result<()> {
        match object.table().field(self.name()) {
            Some(_) => Ok(()),
            None => Err(Error::UnknownField {
                schema: object.schema_name(),
                field: self.name().to_owned(),
            }),
        }
    }

    fn check_stored(&self, object: &Object) -> Result<()> {
        self.check_owner(object)?;
        if self.is_virtual() {
            return Err(Error::Virtual {
                schema: object.schema_name(),
                field: self.name(),
            });
        }
        Ok(())
    }

    /// Applies the load converter (if `convert`) and the nested
    /// instantiation rule. `null` passes through for every shape.
    fn load_value(&self, object: &Object, value: FieldValue, convert: bool) -> Result<FieldValue> {
        if value.is_null() {
            return Ok(value);
        }
        match self.shape() {
            FieldShape::List(Some(schema)) => nest_list(self, object, schema, value, convert),
            FieldShape::Object(schema) => nest_object(self, object, schema, value, convert),
            FieldShape::Scalar | FieldShape::List(None) => {
                let data = match value {
                    FieldValue::Data(data) => data,
                    other => {
                        return Err(Error::Shape {
                            schema: object.schema_name(),
                            field: self.name(),
                            expected: "JSON data",
                            found: other.kind(),
                        });
                    }
                };
                if !convert {
                    return Ok(FieldValue::Data(data));
                }
                self.convert_data(object, data, FieldSpec::loads_convert)
                    .map(FieldValue::Data)
            }
        }
    }

    /// Runs `converter` on scalar data, or on each element of a plain list.
    fn convert_data<F>(&self, object: &Object, data: Value, converter: F) -> Result<Value>
    where
        F: Fn(&Self, Value) -> Result<Value, HookError>,
    {
        let result = match (self.shape(), data) {
            (_, Value::Null) => Ok(Value::Null),
            (FieldShape::List(None), Value::Array(items)) => items
                .into_iter()
                .map(|item| converter(self, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            (FieldShape::List(None), other) => {
                return Err(Error::Shape {
                    schema: object.schema_name(),
                    field: self.name(),
                    expected: "a list",
                    found: kind_of(&other),
                });
            }
            (_, data) => converter(self, data),
        };
        result.map_err(|e| e.into_conversion(object.schema_name(), self.name()))
    }

    /// Produces the value a never-written field starts with.
    ///
    /// The default is stored as is, without converter or setters. Nested
    /// defaults are instantiated with `object` as their parent.
    fn materialize_default(&self, object: &Object) -> Result<FieldValue> {
        let default = self.default_value().map(|default| default.produce());
        match (self.shape(), default) {
            (FieldShape::Scalar, default) => Ok(FieldValue::Data(default.unwrap_or_default())),
            (FieldShape::List(None), default) => {
                Ok(FieldValue::Data(default.unwrap_or_else(|| Value::Array(Vec::new()))))
            }
            (FieldShape::List(Some(_)), None) => Ok(FieldValue::Objects(Vec::new())),
            (FieldShape::List(Some(schema)), Some(default)) => {
                nest_list(self, object, schema, FieldValue::Data(default), false)
            }
            (FieldShape::Object(schema), default) => {
                let child = object.instantiate(schema, &default.unwrap_or_default())?;
                Ok(FieldValue::Object(child))
            }
        }
    }

    /// Produces the dumped form of the field of `object`.
    ///
    /// Reads the stored value (the getter chain of a virtual field), then in
    /// [`DumpMode::Exposed`] applies the dump converter, element-wise for
    /// lists. Nested objects are dumped with the same mode.
    pub(crate) fn dump_value(&self, object: &Object, mode: DumpMode) -> Result<Value> {
        let raw = if self.is_virtual() {
            self.get(object)?
        } else {
            self.direct_get(object)?
        };
        let data = match raw {
            FieldValue::Data(data) => data,
            FieldValue::Object(child) => Value::Object(child.dumps_with(mode)?),
            FieldValue::Objects(children) => Value::Array(
                children
                    .iter()
                    .map(|child| child.dumps_with(mode).map(Value::Object))
                    .collect::<Result<_>>()?,
            ),
        };
        match mode {
            DumpMode::Raw => Ok(data),
            DumpMode::Exposed => match (self.shape(), data) {
                (FieldShape::List(Some(_)), Value::Array(items)) => items
                    .into_iter()
                    .map(|item| self.dumps_convert(item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
                    .map_err(|e| e.into_conversion(object.schema_name(), self.name())),
                (_, data) => self.convert_data(object, data, FieldSpec::dumps_convert),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{DumpMode, Error, FieldDecls, FieldTableBuilder, FieldValue, HookError, Object, Root, Schema, convert};

    struct Sample;

    impl Schema for Sample {
        const NAME: &'static str = "Sample";
        type Base = Root;

        fn declare(fields: &mut FieldDecls) {
            fields.field("flag").default(true).getter(|_, v| {
                Ok(if v == json!(true) {
                    FieldValue::from("This is true !")
                } else {
                    v
                })
            });
            fields
                .field("amount")
                .converter(convert::int(), convert::string())
                .setter(|_, v| v.map_data(|v| Ok(json!(v.as_i64().unwrap_or(0) + 10))));
            fields.field("positive").setter(|_, v| {
                match v.as_data().and_then(|v| v.as_i64()) {
                    Some(n) if n > 0 => Ok(v),
                    _ => Err(HookError::new("must be positive")),
                }
            });
            fields
                .field("scores")
                .list()
                .converter(convert::int(), convert::string());
            fields.virtual_field("doubled").setter(|object, v| {
                let n = v.as_data().and_then(|v| v.as_i64()).unwrap_or(0);
                object.set("positive", n * 2)?;
                Ok(v)
            });
        }
    }

    #[test]
    fn bypass_skips_getters() {
        let sample = Object::new::<Sample>().unwrap();
        let spec = sample.field("flag").unwrap();

        assert_eq!(spec.get(&sample).unwrap(), json!("This is true !"));
        assert_eq!(spec.direct_get(&sample).unwrap(), json!(true));
        assert_eq!(sample.dumps().unwrap()["flag"], json!(true));
    }

    #[test]
    fn converter_then_setters() {
        let sample = Object::new::<Sample>().unwrap();
        sample.set("amount", "5").unwrap();

        assert_eq!(sample.get("amount").unwrap(), json!(15));
        assert_eq!(sample.dumps().unwrap()["amount"], json!("15"));
        assert_eq!(sample.dumps_with(DumpMode::Raw).unwrap()["amount"], json!(15));
    }

    #[test]
    fn converter_round_trip() {
        let sample = Object::new::<Sample>().unwrap();
        for x in ["0", "7", "-42"] {
            sample.field("amount").unwrap().direct_set(&sample, x, false).unwrap();
            assert_eq!(sample.dumps().unwrap()["amount"], json!(x));
        }
    }

    #[test]
    fn rejected_write_does_not_commit() {
        let sample = Object::new::<Sample>().unwrap();
        sample.set("positive", 3).unwrap();

        let err = sample.set("positive", -1).unwrap_err();
        assert!(matches!(
            err,
            Error::Rejected {
                schema: "Sample",
                field: "positive",
                ..
            }
        ));
        assert_eq!(sample.get("positive").unwrap(), json!(3));

        let err = sample.set("amount", "five").unwrap_err();
        assert!(matches!(err, Error::Conversion { field: "amount", .. }));
        assert!(!sample.is_stored("amount"));
    }

    #[test]
    fn direct_set_skips_setters() {
        let sample = Object::new::<Sample>().unwrap();
        let amount = sample.field("amount").unwrap();

        amount.direct_set(&sample, "5", false).unwrap();
        assert_eq!(sample.get("amount").unwrap(), json!(5));

        amount.direct_set(&sample, "5", true).unwrap();
        assert_eq!(sample.get("amount").unwrap(), json!("5"));
    }

    #[test]
    fn plain_list_converts_elements() {
        let sample = Object::new::<Sample>().unwrap();
        assert_eq!(sample.get("scores").unwrap(), json!([]));

        sample.set("scores", json!(["1", 2, "3"])).unwrap();
        assert_eq!(sample.get("scores").unwrap(), json!([1, 2, 3]));
        assert_eq!(sample.dumps().unwrap()["scores"], json!(["1", "2", "3"]));

        let err = sample.set("scores", json!("1")).unwrap_err();
        assert!(matches!(err, Error::Shape { expected: "a list", .. }));
    }

    #[test]
    fn virtual_fields_write_through_setters() {
        let sample = Object::new::<Sample>().unwrap();
        sample.set("doubled", 4).unwrap();

        assert_eq!(sample.get("positive").unwrap(), json!(8));
        assert!(sample.get("doubled").unwrap().is_null());
        assert!(matches!(
            sample.get_raw("doubled").unwrap_err(),
            Error::Virtual { field: "doubled", .. }
        ));

        // errors raised by nested accesses keep their own context
        let err = sample.set("doubled", 0).unwrap_err();
        assert!(matches!(err, Error::Rejected { field: "positive", .. }));

        let dump = sample.dumps_with(DumpMode::Raw).unwrap();
        assert!(!dump.contains_key("doubled"));
    }

    struct Other;

    impl Schema for Other {
        const NAME: &'static str = "Other";
        type Base = Root;

        fn declare(fields: &mut FieldDecls) {
            fields.field("unrelated");
        }

        fn override_fields(fields: &mut FieldTableBuilder) -> Result<(), crate::ConfigError> {
            fields.field_mut("unrelated")?.hide();
            Ok(())
        }
    }

    #[test]
    fn specs_only_serve_their_schema() {
        let other = Object::new::<Other>().unwrap();
        let spec = Sample::field_table().unwrap().field("amount").unwrap();
        assert!(matches!(spec.set(&other, 1), Err(Error::UnknownField { .. })));
        assert!(matches!(spec.direct_get(&other), Err(Error::UnknownField { .. })));
        assert!(other.dumps().unwrap().is_empty());
    }

    fn add(n: i64) -> impl Fn(&Object, FieldValue) -> Result<FieldValue, HookError> + Send + Sync + 'static {
        move |_, v| v.map_data(|v| Ok(json!(v.as_i64().unwrap_or(0) + n)))
    }

    fn times(n: i64) -> impl Fn(&Object, FieldValue) -> Result<FieldValue, HookError> + Send + Sync + 'static {
        move |_, v| v.map_data(|v| Ok(json!(v.as_i64().unwrap_or(0) * n)))
    }

    struct Scaled;

    impl Schema for Scaled {
        const NAME: &'static str = "Scaled";
        type Base = Root;

        fn declare(fields: &mut FieldDecls) {
            fields.field("n").setter(add(1)).setter(times(10));
        }
    }

    struct Rescaled;

    impl Schema for Rescaled {
        const NAME: &'static str = "Rescaled";
        type Base = Scaled;

        fn declare(_: &mut FieldDecls) {}

        fn override_fields(fields: &mut FieldTableBuilder) -> Result<(), crate::ConfigError> {
            <Scaled as Schema>::override_fields(fields)?;
            fields.field_mut("n")?.setter(add(-3));
            Ok(())
        }
    }

    #[test]
    fn setters_run_in_declaration_order() {
        let scaled = Object::new::<Scaled>().unwrap();
        scaled.set("n", 2).unwrap();
        assert_eq!(scaled.get("n").unwrap(), json!(30));

        // appended by the hook, runs after the inherited stages
        let rescaled = Object::new::<Rescaled>().unwrap();
        rescaled.set("n", 2).unwrap();
        assert_eq!(rescaled.get("n").unwrap(), json!(27));
        assert_eq!(Scaled::field_table().unwrap().field("n").unwrap().setters_len(), 2);
    }

    #[test]
    fn decoding_runs_setters_again() {
        let scaled = Object::new::<Scaled>().unwrap();
        scaled.set("n", 2).unwrap();

        let copy = Object::from_slice::<Scaled>(&scaled.encode().unwrap()).unwrap();
        assert_eq!(scaled.get_raw("n").unwrap(), json!(30));
        assert_eq!(copy.get_raw("n").unwrap(), json!(310));
    }
}
