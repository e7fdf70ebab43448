use core::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use serde_json::Value;

use crate::field::{Converter, DefaultValue, Stage};
use crate::{FieldValue, HookError, Object, Schema, SchemaRef};

// -----------------------------------------------------------------------------
// FieldFlags

bitflags! {
    /// Boolean properties of a [`FieldSpec`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FieldFlags: u8 {
        /// Skipped by exposed dumps.
        const HIDDEN  = 1 << 0;
        /// Stores nothing; reads and writes only run the pipeline.
        const VIRTUAL = 1 << 1;
    }
}

// -----------------------------------------------------------------------------
// FieldShape

/// What kind of value a field holds.
#[derive(Clone, Copy, Debug, Default)]
pub enum FieldShape {
    /// Any JSON value.
    #[default]
    Scalar,
    /// A sequence. With a schema, each element is an object of that schema;
    /// without one, elements are plain JSON values.
    List(Option<SchemaRef>),
    /// A single nested object of the given schema.
    Object(SchemaRef),
}

// -----------------------------------------------------------------------------
// FieldSpec

/// The configuration of one field: default, converters, getter and setter
/// chains, and the nested instantiation rule.
///
/// Every builder method mutates the spec in place and returns it, so calls
/// chain. Specs are only mutable while a schema is being resolved; a
/// resolved [`FieldTable`](crate::FieldTable) hands out shared references only.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use te_schema::{FieldSpec, convert};
///
/// let mut spec = FieldSpec::new();
/// spec.default(0)
///     .converter(convert::int(), convert::string())
///     .mapping("Amount");
///
/// assert_eq!(spec.default_value().unwrap().produce(), json!(0));
/// assert_eq!(spec.loads_convert(json!("12")).unwrap(), json!(12));
/// assert!(spec.matches("Amount"));
/// ```
#[derive(Clone, Default)]
pub struct FieldSpec {
    name: &'static str,
    mapping: Option<&'static str>,
    default: Option<DefaultValue>,
    loads: Option<Converter>,
    dumps: Option<Converter>,
    setters: Vec<Stage>,
    getters: Vec<Stage>,
    shape: FieldShape,
    flags: FieldFlags,
}

impl FieldSpec {
    /// Creates an unattached spec: no default, identity converters, empty
    /// chains, scalar shape.
    #[inline]
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    /// Creates a virtual spec, see [`FieldFlags::VIRTUAL`].
    ///
    /// A virtual field never stores a value. Reads run the getter chain
    /// seeded with the default; writes run the load converter and the setter
    /// chain for their side effects, usually writing other fields.
    #[inline]
    pub fn new_virtual() -> Self {
        Self {
            flags: FieldFlags::VIRTUAL,
            ..Default::default()
        }
    }

    pub(crate) fn attach(&mut self, name: &'static str) {
        self.name = name;
    }

    // -------------------------------------------------------------------------
    // Builder

    /// Sets a default value, cloned into every object that needs it.
    pub fn default(&mut self, value: impl Into<Value>) -> &mut Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Sets a default factory, called once for every object that needs it.
    pub fn default_with<F>(&mut self, factory: F) -> &mut Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Factory(Arc::new(factory)));
        self
    }

    /// Removes the default; unread fields then start as `null`.
    pub fn no_default(&mut self) -> &mut Self {
        self.default = None;
        self
    }

    /// Sets both converters.
    pub fn converter(&mut self, loads: Converter, dumps: Converter) -> &mut Self {
        self.loads = Some(loads);
        self.dumps = Some(dumps);
        self
    }

    /// Sets the load converter (external to internal).
    pub fn loads_converter<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Value) -> Result<Value, HookError> + Send + Sync + 'static,
    {
        self.loads = Some(Arc::new(f));
        self
    }

    /// Sets the dump converter (internal to external).
    pub fn dumps_converter<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(Value) -> Result<Value, HookError> + Send + Sync + 'static,
    {
        self.dumps = Some(Arc::new(f));
        self
    }

    /// Appends a stage to the setter chain.
    pub fn setter<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Object, FieldValue) -> Result<FieldValue, HookError> + Send + Sync + 'static,
    {
        self.setters.push(Arc::new(f));
        self
    }

    /// Appends stages to the setter chain, in order.
    pub fn setters(&mut self, stages: impl IntoIterator<Item = Stage>) -> &mut Self {
        self.setters.extend(stages);
        self
    }

    /// Empties the setter chain.
    pub fn clear_setters(&mut self) -> &mut Self {
        self.setters.clear();
        self
    }

    /// Appends a stage to the getter chain.
    pub fn getter<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Object, FieldValue) -> Result<FieldValue, HookError> + Send + Sync + 'static,
    {
        self.getters.push(Arc::new(f));
        self
    }

    /// Appends stages to the getter chain, in order.
    pub fn getters(&mut self, stages: impl IntoIterator<Item = Stage>) -> &mut Self {
        self.getters.extend(stages);
        self
    }

    /// Empties the getter chain.
    pub fn clear_getters(&mut self) -> &mut Self {
        self.getters.clear();
        self
    }

    /// Marks the field as a sequence of plain JSON values.
    ///
    /// Converters apply to each element.
    pub fn list(&mut self) -> &mut Self {
        self.shape = FieldShape::List(None);
        self
    }

    /// Marks the field as a sequence of `S` objects, built element-wise from
    /// the written data.
    pub fn list_of<S: Schema>(&mut self) -> &mut Self {
        self.shape = FieldShape::List(Some(SchemaRef::of::<S>()));
        self
    }

    /// Marks the field as a single nested `S` object.
    ///
    /// The default is a fresh `S` object owned by the field, and loading a
    /// mapping into the field merges it into that object.
    pub fn object_of<S: Schema>(&mut self) -> &mut Self {
        self.shape = FieldShape::Object(SchemaRef::of::<S>());
        self
    }

    /// Exposes the field under another key in [`DumpMode::Exposed`](crate::DumpMode::Exposed).
    pub fn mapping(&mut self, name: &'static str) -> &mut Self {
        self.mapping = Some(name);
        self
    }

    /// Leaves the field out of exposed dumps.
    pub fn hide(&mut self) -> &mut Self {
        self.flags.insert(FieldFlags::HIDDEN);
        self
    }

    /// Reverts [`hide`](Self::hide).
    pub fn unhide(&mut self) -> &mut Self {
        self.flags.remove(FieldFlags::HIDDEN);
        self
    }

    // -------------------------------------------------------------------------
    // Inspection

    /// Returns the field name, empty until the spec is declared on a schema.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the mapping name, if any.
    #[inline]
    pub fn mapping_name(&self) -> Option<&'static str> {
        self.mapping
    }

    /// Returns the key used by exposed dumps: the mapping name if set.
    #[inline]
    pub fn exposed_name(&self) -> &'static str {
        self.mapping.unwrap_or(self.name)
    }

    /// Returns `true` if `name` is the field name or its mapping name.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.mapping == Some(name)
    }

    #[inline]
    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    #[inline]
    pub fn shape(&self) -> FieldShape {
        self.shape
    }

    #[inline]
    pub fn flags(&self) -> FieldFlags {
        self.flags
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.flags.contains(FieldFlags::HIDDEN)
    }

    #[inline]
    pub fn is_virtual(&self) -> bool {
        self.flags.contains(FieldFlags::VIRTUAL)
    }

    /// Returns the schema of nested objects, for `list_of` and `object_of` fields.
    pub fn nested_schema(&self) -> Option<SchemaRef> {
        match self.shape {
            FieldShape::Scalar | FieldShape::List(None) => None,
            FieldShape::List(Some(schema)) | FieldShape::Object(schema) => Some(schema),
        }
    }

    #[inline]
    pub fn setters_len(&self) -> usize {
        self.setters.len()
    }

    #[inline]
    pub fn getters_len(&self) -> usize {
        self.getters.len()
    }

    pub(crate) fn setter_stages(&self) -> &[Stage] {
        &self.setters
    }

    pub(crate) fn getter_stages(&self) -> &[Stage] {
        &self.getters
    }

    // -------------------------------------------------------------------------
    // Converters

    /// Runs the load converter; `null` and unconverted fields pass through.
    pub fn loads_convert(&self, value: Value) -> Result<Value, HookError> {
        match &self.loads {
            Some(loads) if !value.is_null() => loads(value),
            _ => Ok(value),
        }
    }

    /// Runs the dump converter; `null` and unconverted fields pass through.
    pub fn dumps_convert(&self, value: Value) -> Result<Value, HookError> {
        match &self.dumps {
            Some(dumps) if !value.is_null() => dumps(value),
            _ => Ok(value),
        }
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("mapping", &self.mapping)
            .field("default", &self.default)
            .field("loads", &self.loads.is_some())
            .field("dumps", &self.dumps.is_some())
            .field("setters", &self.setters.len())
            .field("getters", &self.getters.len())
            .field("shape", &self.shape)
            .field("flags", &self.flags)
            .finish()
    }
}
