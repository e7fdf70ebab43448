//! Per-schema field tables and their resolution.
//!
//! A [`FieldTable`] is resolved once per schema, see
//! [`Schema::field_table`](crate::Schema::field_table):
//!
//! 1. the base schema's declared fields are cloned,
//! 2. the schema's own [`FieldDecls`] are overlaid, a redeclared field keeps
//!    its inherited position,
//! 3. [`Schema::override_fields`](crate::Schema::override_fields) adjusts the
//!    merged specs through a [`FieldTableBuilder`],
//! 4. the result is frozen and stored in a static cell.
//!
//! Step 1 copies the *declared* layer, not the adjusted one. Adjustments made
//! by an ancestor's hook are replayed only when the schema's own hook chains
//! to it, so they are never applied twice.

// -----------------------------------------------------------------------------
// Modules

mod builder;
mod cell;

// -----------------------------------------------------------------------------
// Exports

pub use builder::{FieldDecls, FieldTableBuilder};
pub use cell::{FieldTableCell, GenericFieldTableCell};

pub(crate) use builder::resolve;

// -----------------------------------------------------------------------------
// FieldTable

use core::any::TypeId;
use core::fmt;

use serde_json::{Map, Value};
use te_utils::collections::OrderedMap;

use crate::{DumpMode, FieldSpec, HookError, Object, Schema};

/// The frozen mapping from field name to [`FieldSpec`] of one schema.
///
/// Iteration follows declaration order: inherited fields first, then the
/// fields the schema adds.
pub struct FieldTable {
    schema: &'static str,
    type_id: TypeId,
    base: Option<&'static FieldTable>,
    declared: OrderedMap<&'static str, FieldSpec>,
    fields: OrderedMap<&'static str, FieldSpec>,
    pub(crate) hooks: ObjectHooks,
}

impl FieldTable {
    #[cfg(test)]
    pub(crate) fn empty(schema: &'static str) -> Self {
        Self {
            schema,
            type_id: TypeId::of::<()>(),
            base: None,
            declared: OrderedMap::new(),
            fields: OrderedMap::new(),
            hooks: ObjectHooks::of::<crate::Root>(),
        }
    }

    /// Returns the name of the schema owning this table.
    #[inline]
    pub fn schema_name(&self) -> &'static str {
        self.schema
    }

    /// Returns the [`TypeId`] of the schema owning this table.
    #[inline]
    pub fn schema_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the table of the base schema, `None` for a root schema.
    #[inline]
    pub fn base(&self) -> Option<&'static FieldTable> {
        self.base
    }

    /// Returns `true` if this table belongs to the schema `type_id` or to a
    /// schema derived from it.
    pub fn derives_from(&self, type_id: TypeId) -> bool {
        let mut table = Some(self);
        while let Some(current) = table {
            if current.type_id == type_id {
                return true;
            }
            table = current.base;
        }
        false
    }

    /// Returns the spec of the field `name`.
    #[inline]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// Returns the spec matching `name`: the field of that name, otherwise
    /// the first field mapped to that name.
    pub fn find(&self, name: &str) -> Option<&FieldSpec> {
        self.field(name)
            .or_else(|| self.fields.values().find(|spec| spec.mapping_name() == Some(name)))
    }

    /// Returns the declaration position of the field `name`.
    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.index_of(name)
    }

    /// Iterates over the specs in declaration order.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &FieldSpec> {
        self.fields.values()
    }

    /// Iterates over the field names in declaration order.
    #[inline]
    pub fn field_names(&self) -> impl ExactSizeIterator<Item = &'static str> {
        self.fields.keys().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Debug for FieldTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldTable")
            .field("schema", &self.schema)
            .field("base", &self.base.map(FieldTable::schema_name))
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// ObjectHooks

/// The lifecycle hooks of a schema, captured as function pointers so that an
/// [`Object`] can run them without knowing its schema type.
#[derive(Clone, Copy)]
pub(crate) struct ObjectHooks {
    pub post_init: fn(&Object) -> Result<(), HookError>,
    pub pre_loads: fn(&Object, Map<String, Value>) -> Result<Map<String, Value>, HookError>,
    pub post_loads: fn(&Object) -> Result<(), HookError>,
    pub pre_dumps: fn(&Object, DumpMode) -> Result<(), HookError>,
    pub post_dumps: fn(&Object, DumpMode, &mut Map<String, Value>) -> Result<(), HookError>,
}

impl ObjectHooks {
    pub fn of<S: Schema>() -> Self {
        Self {
            post_init: S::post_init,
            pre_loads: S::pre_loads,
            post_loads: S::post_loads,
            pre_dumps: S::pre_dumps,
            post_dumps: S::post_dumps,
        }
    }
}
