//! Schema instances.
//!
//! An [`Object`] is a shared handle to the raw value store of one instance.
//! Values are stored lazily: a field is absent until it is written, or until
//! its default is materialized by the first read.
//!
//! The `parent` of an object is a [`WeakObject`]. It is set by user code for
//! cross-object lookups inside pipeline stages, never owns the parent and is
//! never followed by dumps.

// -----------------------------------------------------------------------------
// Modules

mod load;

pub(crate) mod nested;

// -----------------------------------------------------------------------------
// Object

use core::any::TypeId;
use core::cell::RefCell;
use core::fmt;
use std::rc::{Rc, Weak};

use te_utils::hash::HashMap;

use crate::{Error, FieldSpec, FieldTable, FieldValue, HookError, Result, Schema};

pub(crate) struct ObjectData {
    values: HashMap<&'static str, FieldValue>,
    parent: Option<WeakObject>,
}

/// An instance of a [`Schema`].
///
/// Cloning an `Object` clones the handle: both clones see the same values.
/// Use [`Object::load_from_object`] to copy values into a separate instance.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use te_schema::{FieldDecls, Object, Root, Schema};
///
/// struct Flag;
///
/// impl Schema for Flag {
///     const NAME: &'static str = "Flag";
///     type Base = Root;
///
///     fn declare(fields: &mut FieldDecls) {
///         fields.field("enabled").default(true).getter(|_, v| {
///             Ok(if v == json!(true) { "This is true !".into() } else { v })
///         });
///     }
/// }
///
/// let flag = Object::new::<Flag>().unwrap();
/// assert_eq!(flag.get("enabled").unwrap(), json!("This is true !"));
/// assert_eq!(flag.get_raw("enabled").unwrap(), json!(true));
/// ```
#[derive(Clone)]
pub struct Object {
    table: &'static FieldTable,
    data: Rc<RefCell<ObjectData>>,
}

impl Object {
    /// Creates an empty instance of `S`.
    ///
    /// Fails if the table of `S` cannot be resolved or if its `post_init`
    /// hook fails.
    pub fn new<S: Schema>() -> Result<Self> {
        Self::from_table(S::field_table()?, None)
    }

    /// Creates an empty instance of `S` with `parent` already set.
    pub fn with_parent<S: Schema>(parent: &Object) -> Result<Self> {
        Self::from_table(S::field_table()?, Some(parent))
    }

    /// Creates an instance of the schema owning `table`.
    pub fn from_table(table: &'static FieldTable, parent: Option<&Object>) -> Result<Self> {
        let object = Self {
            table,
            data: Rc::new(RefCell::new(ObjectData {
                values: HashMap::default(),
                parent: parent.map(Object::downgrade),
            })),
        };
        (table.hooks.post_init)(&object)
            .map_err(|e| e.into_hook_failure(table.schema_name(), "post_init"))?;
        Ok(object)
    }

    // -------------------------------------------------------------------------
    // Schema

    /// Returns the table of the schema of this object.
    #[inline]
    pub fn table(&self) -> &'static FieldTable {
        self.table
    }

    #[inline]
    pub fn schema_name(&self) -> &'static str {
        self.table.schema_name()
    }

    /// Returns `true` if this object is an `S`, or an instance of a schema
    /// derived from `S`.
    #[inline]
    pub fn is_instance_of<S: Schema>(&self) -> bool {
        self.table.derives_from(TypeId::of::<S>())
    }

    /// Returns the spec of the field `name`, also accepting mapping names.
    pub fn field(&self, name: &str) -> Result<&'static FieldSpec> {
        self.table.find(name).ok_or_else(|| Error::UnknownField {
            schema: self.schema_name(),
            field: name.to_owned(),
        })
    }

    // -------------------------------------------------------------------------
    // Accessors

    /// Reads a field through its getter chain, see [`FieldSpec::get`].
    #[inline]
    pub fn get(&self, name: &str) -> Result<FieldValue> {
        self.field(name)?.get(self)
    }

    /// Writes a field through its converter and setter chain, see [`FieldSpec::set`].
    #[inline]
    pub fn set(&self, name: &str, value: impl Into<FieldValue>) -> Result<()> {
        self.field(name)?.set(self, value)
    }

    /// Reads the stored value without the getter chain, see [`FieldSpec::direct_get`].
    #[inline]
    pub fn get_raw(&self, name: &str) -> Result<FieldValue> {
        self.field(name)?.direct_get(self)
    }

    /// Forgets the stored value of a field, so its default applies again.
    #[inline]
    pub fn delete(&self, name: &str) -> Result<()> {
        self.field(name)?.delete(self);
        Ok(())
    }

    /// Forgets every stored value.
    pub fn reset(&self) {
        self.data.borrow_mut().values.clear();
    }

    /// Returns `true` if the field `name` holds a written or materialized value.
    pub fn is_stored(&self, name: &str) -> bool {
        self.data.borrow().values.contains_key(name)
    }

    pub(crate) fn stored(&self, name: &str) -> Option<FieldValue> {
        self.data.borrow().values.get(name).cloned()
    }

    pub(crate) fn store(&self, name: &'static str, value: FieldValue) {
        self.data.borrow_mut().values.insert(name, value);
    }

    /// Stores `value` unless a value was stored meanwhile, and returns the
    /// stored one.
    pub(crate) fn store_default(&self, name: &'static str, value: FieldValue) -> FieldValue {
        self.data
            .borrow_mut()
            .values
            .entry(name)
            .or_insert(value)
            .clone()
    }

    pub(crate) fn forget(&self, name: &str) {
        self.data.borrow_mut().values.remove(name);
    }

    // -------------------------------------------------------------------------
    // Parent

    /// Returns the parent object, if it is set and still alive.
    pub fn parent(&self) -> Option<Object> {
        self.data
            .borrow()
            .parent
            .as_ref()
            .and_then(WeakObject::upgrade)
    }

    /// Returns the parent object, or [`HookError::MissingParent`].
    ///
    /// Meant for pipeline stages, which can propagate the error with `?`.
    pub fn require_parent(&self) -> Result<Object, HookError> {
        self.parent().ok_or(HookError::MissingParent)
    }

    /// Sets or clears the parent object.
    pub fn set_parent(&self, parent: Option<&Object>) {
        self.data.borrow_mut().parent = parent.map(Object::downgrade);
    }

    // -------------------------------------------------------------------------
    // Identity

    /// Returns `true` if both handles point to the same instance.
    #[inline]
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    /// Creates a non-owning handle to this object.
    #[inline]
    pub fn downgrade(&self) -> WeakObject {
        WeakObject {
            table: self.table,
            data: Rc::downgrade(&self.data),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct(self.schema_name());
        match self.data.try_borrow() {
            Ok(data) => {
                for name in self.table.field_names() {
                    if let Some(value) = data.values.get(name) {
                        debug.field(name, value);
                    }
                }
            }
            Err(_) => {
                debug.field("values", &format_args!("<borrowed>"));
            }
        }
        debug.finish_non_exhaustive()
    }
}

impl fmt::Display for Object {
    /// Writes the exposed dump as JSON, see [`Object::to_json`].
    ///
    /// A failing dump is logged and written as `<Schema: dump failed>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dumps() {
            Ok(dump) => fmt::Display::fmt(&serde_json::Value::Object(dump), f),
            Err(err) => {
                log::warn!("cannot display `{}` object: {err}", self.schema_name());
                write!(f, "<{}: dump failed>", self.schema_name())
            }
        }
    }
}

// -----------------------------------------------------------------------------
// WeakObject

/// A non-owning handle to an [`Object`].
#[derive(Clone)]
pub struct WeakObject {
    table: &'static FieldTable,
    data: Weak<RefCell<ObjectData>>,
}

impl WeakObject {
    /// Returns the object if it is still alive.
    pub fn upgrade(&self) -> Option<Object> {
        self.data.upgrade().map(|data| Object {
            table: self.table,
            data,
        })
    }

    #[inline]
    pub fn schema_name(&self) -> &'static str {
        self.table.schema_name()
    }
}

impl fmt::Debug for WeakObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WeakObject").field(&self.schema_name()).finish()
    }
}
