use serde_json::Value;

use crate::error::kind_of;
use crate::{Error, FieldSpec, FieldValue, Object, Result, SchemaRef};

impl Object {
    /// Creates a `schema` instance owned by `self` and loads `data` into it.
    pub(crate) fn instantiate(&self, schema: SchemaRef, data: &Value) -> Result<Object> {
        let child = Object::from_table(schema.table()?, Some(self))?;
        child.load(data)?;
        Ok(child)
    }
}

/// Checks that a ready-made object may be stored in a field nesting `schema`
/// and makes `owner` its parent.
fn accept(spec: &FieldSpec, owner: &Object, schema: SchemaRef, object: Object) -> Result<Object> {
    if object.table().derives_from(schema.schema_id()) {
        object.set_parent(Some(owner));
        Ok(object)
    } else {
        Err(Error::SchemaMismatch {
            schema: owner.schema_name(),
            field: spec.name(),
            expected: schema.name(),
            found: object.schema_name(),
        })
    }
}

fn shape_error(spec: &FieldSpec, owner: &Object, expected: &'static str, found: &'static str) -> Error {
    Error::Shape {
        schema: owner.schema_name(),
        field: spec.name(),
        expected,
        found,
    }
}

/// Turns a written value into the objects of a `list_of` field.
///
/// Elements given as mappings are converted with the load converter (unless
/// `convert` is false) and instantiated; elements given as objects are
/// checked against `schema` and adopted by `owner`.
pub(crate) fn nest_list(
    spec: &FieldSpec,
    owner: &Object,
    schema: SchemaRef,
    value: FieldValue,
    convert: bool,
) -> Result<FieldValue> {
    match value {
        FieldValue::Data(Value::Array(items)) => {
            let mut objects = Vec::with_capacity(items.len());
            for item in items {
                let item = if convert {
                    spec.loads_convert(item)
                        .map_err(|e| e.into_conversion(owner.schema_name(), spec.name()))?
                } else {
                    item
                };
                match &item {
                    Value::Object(_) => objects.push(owner.instantiate(schema, &item)?),
                    other => return Err(shape_error(spec, owner, "a list of objects", kind_of(other))),
                }
            }
            Ok(FieldValue::Objects(objects))
        }
        FieldValue::Objects(objects) => objects
            .into_iter()
            .map(|object| accept(spec, owner, schema, object))
            .collect::<Result<Vec<_>>>()
            .map(FieldValue::Objects),
        other => Err(shape_error(spec, owner, "a list", other.kind())),
    }
}

/// Turns a written value into the object of an `object_of` field.
pub(crate) fn nest_object(
    spec: &FieldSpec,
    owner: &Object,
    schema: SchemaRef,
    value: FieldValue,
    convert: bool,
) -> Result<FieldValue> {
    match value {
        FieldValue::Data(data) => {
            let data = if convert {
                spec.loads_convert(data)
                    .map_err(|e| e.into_conversion(owner.schema_name(), spec.name()))?
            } else {
                data
            };
            match &data {
                Value::Object(_) => owner.instantiate(schema, &data).map(FieldValue::Object),
                other => Err(shape_error(spec, owner, "an object", kind_of(other))),
            }
        }
        FieldValue::Object(object) => accept(spec, owner, schema, object).map(FieldValue::Object),
        other => Err(shape_error(spec, owner, "an object", other.kind())),
    }
}
