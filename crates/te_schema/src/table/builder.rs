use core::any::TypeId;

use log::debug;
use te_utils::collections::OrderedMap;

use crate::table::{FieldTable, ObjectHooks};
use crate::schema::is_own_base;
use crate::{ConfigError, FieldSpec, Schema};

// -----------------------------------------------------------------------------
// FieldDecls

/// The fields a schema declares itself, see [`Schema::declare`].
///
/// Declaring a name that is inherited replaces the inherited spec entirely
/// while keeping its position. Declaring the same name twice in one schema is
/// a [`ConfigError::DuplicateField`].
pub struct FieldDecls {
    schema: &'static str,
    fields: OrderedMap<&'static str, FieldSpec>,
    duplicate: Option<&'static str>,
}

impl FieldDecls {
    fn new(schema: &'static str) -> Self {
        Self {
            schema,
            fields: OrderedMap::new(),
            duplicate: None,
        }
    }

    /// Returns the name of the schema being declared.
    #[inline]
    pub fn schema_name(&self) -> &'static str {
        self.schema
    }

    /// Declares a field with a fresh [`FieldSpec`] and returns it for
    /// configuration.
    pub fn field(&mut self, name: &'static str) -> &mut FieldSpec {
        self.insert(name, FieldSpec::new())
    }

    /// Declares a virtual field, see [`FieldSpec::new_virtual`].
    pub fn virtual_field(&mut self, name: &'static str) -> &mut FieldSpec {
        self.insert(name, FieldSpec::new_virtual())
    }

    /// Declares a field with a prepared spec.
    pub fn insert(&mut self, name: &'static str, mut spec: FieldSpec) -> &mut FieldSpec {
        if self.fields.contains_key(name) && self.duplicate.is_none() {
            self.duplicate = Some(name);
        }
        spec.attach(name);
        self.fields.insert_mut(name, spec)
    }

    fn finish(self) -> Result<OrderedMap<&'static str, FieldSpec>, ConfigError> {
        match self.duplicate {
            Some(field) => Err(ConfigError::DuplicateField {
                schema: self.schema,
                field,
            }),
            None => Ok(self.fields),
        }
    }
}

// -----------------------------------------------------------------------------
// FieldTableBuilder

/// The merged, not yet frozen table handed to [`Schema::override_fields`].
pub struct FieldTableBuilder {
    schema: &'static str,
    fields: OrderedMap<&'static str, FieldSpec>,
}

impl FieldTableBuilder {
    /// Returns the name of the schema being resolved.
    #[inline]
    pub fn schema_name(&self) -> &'static str {
        self.schema
    }

    /// Returns the spec of the field `name` for adjustment.
    ///
    /// Fails with [`ConfigError::UnknownField`] if neither the schema nor its
    /// ancestors declare `name`.
    pub fn field_mut(&mut self, name: &str) -> Result<&mut FieldSpec, ConfigError> {
        let schema = self.schema;
        self.fields
            .get_mut(name)
            .ok_or_else(|| ConfigError::UnknownField {
                schema,
                field: name.to_owned().into(),
            })
    }

    #[inline]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterates over the field names in declaration order.
    pub fn field_names(&self) -> impl ExactSizeIterator<Item = &'static str> {
        self.fields.keys().copied()
    }

    /// Adds or replaces a field. A new field goes last.
    pub fn insert(&mut self, name: &'static str, mut spec: FieldSpec) -> &mut FieldSpec {
        spec.attach(name);
        self.fields.insert_mut(name, spec)
    }
}

// -----------------------------------------------------------------------------
// Resolution

/// Builds the table of `S`. A schema that is its own base starts empty.
pub(crate) fn resolve<S: Schema>() -> Result<FieldTable, ConfigError> {
    let (base, mut declared) = if is_own_base::<S>() {
        (None, OrderedMap::new())
    } else {
        let base = <S::Base as Schema>::field_table()?;
        (Some(base), base.declared.clone())
    };

    let mut decls = FieldDecls::new(S::NAME);
    S::declare(&mut decls);
    for (name, spec) in decls.finish()?.iter() {
        declared.insert(*name, spec.clone());
    }

    let mut builder = FieldTableBuilder {
        schema: S::NAME,
        fields: declared.clone(),
    };
    S::override_fields(&mut builder)?;

    let table = FieldTable {
        schema: S::NAME,
        type_id: TypeId::of::<S>(),
        base,
        declared,
        fields: builder.fields,
        hooks: ObjectHooks::of::<S>(),
    };

    debug!(
        "resolved field table of `{}` ({} fields)",
        table.schema,
        table.fields.len()
    );
    #[cfg(all(debug_assertions, feature = "debug"))]
    log::trace!("{table:#?}");

    Ok(table)
}
