use core::any::TypeId;
use core::fmt;

use serde_json::{Map, Value};

use crate::table::{self, FieldTableCell, GenericFieldTableCell};
use crate::{ConfigError, DumpMode, FieldDecls, FieldTable, FieldTableBuilder, HookError, Object};

// -----------------------------------------------------------------------------
// Schema

/// A schema class: a set of named fields, inherited from [`Schema::Base`]
/// and extended by [`Schema::declare`].
///
/// Implementors are usually unit structs used only as type-level markers;
/// instances are [`Object`]s.
///
/// # Override hook
///
/// [`override_fields`](Schema::override_fields) runs once, when the table is
/// resolved, and may adjust any merged spec by name. The default delegates to
/// the base schema's hook. A schema that overrides it decides whether to call
/// `<Self::Base as Schema>::override_fields` first; omitting the call skips
/// the ancestor's adjustments.
///
/// # Lifecycle hooks
///
/// `post_init`, `pre_loads`, `post_loads`, `pre_dumps` and `post_dumps` run
/// around construction, [`Object::load`] and [`Object::dumps`]. They also
/// delegate to the base schema by default.
///
/// A schema whose `Base` is itself ends the chain like [`Root`]: its table
/// starts empty and its default hooks do nothing.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use te_schema::{ConfigError, FieldDecls, FieldTableBuilder, Object, Root, Schema};
///
/// struct Base;
///
/// impl Schema for Base {
///     const NAME: &'static str = "Base";
///     type Base = Root;
///
///     fn declare(fields: &mut FieldDecls) {
///         fields.field("n").default("x");
///     }
/// }
///
/// struct Child;
///
/// impl Schema for Child {
///     const NAME: &'static str = "Child";
///     type Base = Base;
///
///     fn declare(_: &mut FieldDecls) {}
///
///     fn override_fields(fields: &mut FieldTableBuilder) -> Result<(), ConfigError> {
///         <Base as Schema>::override_fields(fields)?;
///         fields
///             .field_mut("n")?
///             .default("y")
///             .getter(|_, v| Ok(if v.is_null() { json!(0).into() } else { v }));
///         Ok(())
///     }
/// }
///
/// assert_eq!(Object::new::<Base>().unwrap().get("n").unwrap(), json!("x"));
/// assert_eq!(Object::new::<Child>().unwrap().get("n").unwrap(), json!("y"));
/// ```
pub trait Schema: Sized + 'static {
    /// The schema name used in dumps, logs and errors.
    const NAME: &'static str;

    /// The schema this one inherits from, [`Root`] for none.
    type Base: Schema;

    /// Declares the fields this schema adds or redeclares.
    fn declare(fields: &mut FieldDecls);

    /// Adjusts the merged table before it is frozen.
    fn override_fields(fields: &mut FieldTableBuilder) -> Result<(), ConfigError> {
        if is_own_base::<Self>() {
            return Ok(());
        }
        <Self::Base as Schema>::override_fields(fields)
    }

    /// Returns the resolved table, resolving it on first use.
    ///
    /// There is rarely a reason to override this.
    fn field_table() -> Result<&'static FieldTable, ConfigError> {
        static CELL: GenericFieldTableCell = GenericFieldTableCell::new();
        CELL.get_or_insert::<Self>(table::resolve::<Self>)
    }

    /// Runs after construction, before any data is loaded.
    fn post_init(object: &Object) -> Result<(), HookError> {
        if is_own_base::<Self>() {
            return Ok(());
        }
        <Self::Base as Schema>::post_init(object)
    }

    /// Rewrites a mapping before it is loaded.
    fn pre_loads(object: &Object, data: Map<String, Value>) -> Result<Map<String, Value>, HookError> {
        if is_own_base::<Self>() {
            return Ok(data);
        }
        <Self::Base as Schema>::pre_loads(object, data)
    }

    /// Runs after a mapping was loaded.
    fn post_loads(object: &Object) -> Result<(), HookError> {
        if is_own_base::<Self>() {
            return Ok(());
        }
        <Self::Base as Schema>::post_loads(object)
    }

    /// Runs before the fields are dumped.
    fn pre_dumps(object: &Object, mode: DumpMode) -> Result<(), HookError> {
        if is_own_base::<Self>() {
            return Ok(());
        }
        <Self::Base as Schema>::pre_dumps(object, mode)
    }

    /// Adjusts a finished dump before it is returned.
    fn post_dumps(object: &Object, mode: DumpMode, dump: &mut Map<String, Value>) -> Result<(), HookError> {
        if is_own_base::<Self>() {
            return Ok(());
        }
        <Self::Base as Schema>::post_dumps(object, mode, dump)
    }
}

/// Returns `true` if `S` ends its inheritance chain.
#[inline]
pub(crate) fn is_own_base<S: Schema>() -> bool {
    TypeId::of::<S::Base>() == TypeId::of::<S>()
}

// -----------------------------------------------------------------------------
// Root

/// The schema without fields every inheritance chain ends at.
///
/// Its hooks do nothing.
pub enum Root {}

impl Schema for Root {
    const NAME: &'static str = "Root";
    type Base = Root;

    fn declare(_: &mut FieldDecls) {}

    fn override_fields(_: &mut FieldTableBuilder) -> Result<(), ConfigError> {
        Ok(())
    }

    fn field_table() -> Result<&'static FieldTable, ConfigError> {
        static CELL: FieldTableCell = FieldTableCell::new();
        CELL.get_or_init(table::resolve::<Self>)
    }

    fn post_init(_: &Object) -> Result<(), HookError> {
        Ok(())
    }

    fn pre_loads(_: &Object, data: Map<String, Value>) -> Result<Map<String, Value>, HookError> {
        Ok(data)
    }

    fn post_loads(_: &Object) -> Result<(), HookError> {
        Ok(())
    }

    fn pre_dumps(_: &Object, _: DumpMode) -> Result<(), HookError> {
        Ok(())
    }

    fn post_dumps(_: &Object, _: DumpMode, _: &mut Map<String, Value>) -> Result<(), HookError> {
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// SchemaRef

/// A type-erased reference to a schema, used by nested fields.
///
/// The table is looked up lazily, so a schema may nest itself.
#[derive(Clone, Copy)]
pub struct SchemaRef {
    name: &'static str,
    type_id: TypeId,
    table: fn() -> Result<&'static FieldTable, ConfigError>,
}

impl SchemaRef {
    #[inline]
    pub fn of<S: Schema>() -> Self {
        Self {
            name: S::NAME,
            type_id: TypeId::of::<S>(),
            table: S::field_table,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn schema_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the resolved table of the schema.
    #[inline]
    pub fn table(&self) -> Result<&'static FieldTable, ConfigError> {
        (self.table)()
    }
}

impl PartialEq for SchemaRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for SchemaRef {}

impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SchemaRef").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use serde_json::json;

    use super::{Root, Schema, SchemaRef};
    use crate::{ConfigError, DumpMode, FieldDecls, FieldTableBuilder, FieldValue, HookError, Object};

    struct Base;

    impl Schema for Base {
        const NAME: &'static str = "Base";
        type Base = Root;

        fn declare(fields: &mut FieldDecls) {
            fields.field("n").default("x");
        }
    }

    struct Child;

    impl Schema for Child {
        const NAME: &'static str = "Child";
        type Base = Base;

        fn declare(_: &mut FieldDecls) {}

        fn override_fields(fields: &mut FieldTableBuilder) -> Result<(), ConfigError> {
            <Base as Schema>::override_fields(fields)?;
            fields.field_mut("n")?.default("y").getter(|_, v| {
                Ok(if v.is_null() { FieldValue::from(0) } else { v })
            });
            Ok(())
        }
    }

    #[test]
    fn child_overrides_leave_the_parent_untouched() {
        // finalize the child first
        let child = Object::new::<Child>().unwrap();
        assert_eq!(child.get("n").unwrap(), json!("y"));

        let base = Object::new::<Base>().unwrap();
        assert_eq!(base.get("n").unwrap(), json!("x"));
        assert_eq!(Base::field_table().unwrap().field("n").unwrap().getters_len(), 0);
        assert_eq!(Child::field_table().unwrap().field("n").unwrap().getters_len(), 1);

        child.set("n", json!(null)).unwrap();
        assert_eq!(child.get("n").unwrap(), json!(0));
        base.set("n", json!(null)).unwrap();
        assert!(base.get("n").unwrap().is_null());
    }

    #[test]
    fn root_is_empty() {
        let table = Root::field_table().unwrap();
        assert!(table.is_empty());
        assert!(table.base().is_none());
        assert!(core::ptr::eq(table, Root::field_table().unwrap()));
        assert_eq!(Object::new::<Root>().unwrap().dumps().unwrap().len(), 0);
    }

    #[test]
    fn schema_refs_compare_by_type() {
        let base = SchemaRef::of::<Base>();
        assert_eq!(base, SchemaRef::of::<Base>());
        assert_ne!(base, SchemaRef::of::<Child>());
        assert_eq!(base.name(), "Base");
        assert_eq!(base.table().unwrap().schema_name(), "Base");
        assert_eq!(format!("{base:?}"), "SchemaRef(\"Base\")");
    }

    thread_local! {
        static DUMPS: Cell<usize> = const { Cell::new(0) };
    }

    struct Audited;

    impl Schema for Audited {
        const NAME: &'static str = "Audited";
        type Base = Root;

        fn declare(fields: &mut FieldDecls) {
            fields.field("created");
        }

        fn post_init(object: &Object) -> Result<(), HookError> {
            object.set("created", "now")?;
            Ok(())
        }

        fn pre_dumps(_: &Object, _: DumpMode) -> Result<(), HookError> {
            DUMPS.with(|dumps| dumps.set(dumps.get() + 1));
            Ok(())
        }
    }

    struct AuditedChild;

    impl Schema for AuditedChild {
        const NAME: &'static str = "AuditedChild";
        type Base = Audited;

        fn declare(fields: &mut FieldDecls) {
            fields.field("extra");
        }
    }

    struct Refusing;

    impl Schema for Refusing {
        const NAME: &'static str = "Refusing";
        type Base = Root;

        fn declare(_: &mut FieldDecls) {}

        fn post_init(_: &Object) -> Result<(), HookError> {
            Err(HookError::new("not today"))
        }
    }

    #[test]
    fn lifecycle_hooks_delegate_to_the_base() {
        let child = Object::new::<AuditedChild>().unwrap();
        assert_eq!(child.get("created").unwrap(), json!("now"));

        let before = DUMPS.with(Cell::get);
        child.dumps().unwrap();
        assert_eq!(DUMPS.with(Cell::get), before + 1);

        let err = Object::new::<Refusing>().unwrap_err();
        assert_eq!(err.to_string(), "`post_init` hook of `Refusing` failed: not today");
    }

    struct Standalone;

    impl Schema for Standalone {
        const NAME: &'static str = "Standalone";
        type Base = Standalone;

        fn declare(fields: &mut FieldDecls) {
            fields.field("x").default(1);
        }
    }

    #[test]
    fn self_based_schema_ends_the_chain() {
        let table = Standalone::field_table().unwrap();
        assert!(table.base().is_none());
        assert_eq!(table.field_names().collect::<Vec<_>>(), ["x"]);

        let object = Object::from_value::<Standalone>(&json!({ "x": 2 })).unwrap();
        assert_eq!(object.get("x").unwrap(), json!(2));
        assert_eq!(object.to_value().unwrap(), json!({ "x": 2 }));
    }
}
