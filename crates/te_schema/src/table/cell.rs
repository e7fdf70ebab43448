//! Containers for static storage of resolved field tables.
//!
//! [`Schema::field_table`](crate::Schema::field_table) keeps its table in a
//! `static` declared inside the trait method. That static is shared by every
//! implementor, so [`GenericFieldTableCell`] keys its content by [`TypeId`].
//! A schema overriding `field_table` with its own static can use the cheaper
//! [`FieldTableCell`] instead.
//!
//! Both cells cache failures too: a schema whose resolution failed reports
//! the same [`ConfigError`] on every use.

use core::any::TypeId;
use std::sync::{OnceLock, PoisonError, RwLock};

use te_utils::TypeIdMap;

use crate::{ConfigError, FieldTable};

type Resolved = Result<FieldTable, ConfigError>;

#[inline]
fn share(resolved: &'static Resolved) -> Result<&'static FieldTable, ConfigError> {
    resolved.as_ref().map_err(Clone::clone)
}

// -----------------------------------------------------------------------------
// FieldTableCell

/// Static storage of the table of one schema.
///
/// Internally an [`OnceLock`].
pub struct FieldTableCell(OnceLock<Resolved>);

impl FieldTableCell {
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the stored table, resolving it with `f` on first use.
    #[inline]
    pub fn get_or_init<F>(&'static self, f: F) -> Result<&'static FieldTable, ConfigError>
    where
        F: FnOnce() -> Resolved,
    {
        share(self.0.get_or_init(f))
    }
}

impl Default for FieldTableCell {
    fn default() -> Self {
        Self::new()
    }
}

// -----------------------------------------------------------------------------
// GenericFieldTableCell

/// Static storage of the tables of many schemas, keyed by [`TypeId`].
///
/// Resolution runs without holding the lock, since resolving a schema first
/// resolves its base through the same cell. If two threads resolve the same
/// schema at once, both compute a table and the first one published wins.
pub struct GenericFieldTableCell(RwLock<TypeIdMap<&'static Resolved>>);

impl GenericFieldTableCell {
    #[inline]
    pub const fn new() -> Self {
        Self(RwLock::new(TypeIdMap::new()))
    }

    /// Returns the table stored for `S`, resolving it with `f` on first use.
    #[inline(always)]
    pub fn get_or_insert<S: 'static>(
        &'static self,
        f: impl FnOnce() -> Resolved,
    ) -> Result<&'static FieldTable, ConfigError> {
        self.get_or_insert_by_type_id(TypeId::of::<S>(), f)
    }

    #[inline(never)]
    fn get_or_insert_by_type_id(
        &'static self,
        type_id: TypeId,
        f: impl FnOnce() -> Resolved,
    ) -> Result<&'static FieldTable, ConfigError> {
        match self.get_by_type_id(type_id) {
            Some(resolved) => share(resolved),
            None => share(self.insert_by_type_id(type_id, f())),
        }
    }

    #[inline(never)]
    fn get_by_type_id(&self, type_id: TypeId) -> Option<&'static Resolved> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .copied()
    }

    #[inline(never)]
    fn insert_by_type_id(&self, type_id: TypeId, value: Resolved) -> &'static Resolved {
        *self
            .0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(type_id, || Box::leak(Box::new(value)))
    }
}

impl Default for GenericFieldTableCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldTableCell, GenericFieldTableCell};
    use crate::{ConfigError, FieldTable};

    struct A;
    struct B;

    #[test]
    fn generic_cell_separates_types() {
        static CELL: GenericFieldTableCell = GenericFieldTableCell::new();

        let a = CELL.get_or_insert::<A>(|| Ok(FieldTable::empty("A"))).unwrap();
        let b = CELL.get_or_insert::<B>(|| Ok(FieldTable::empty("B"))).unwrap();
        let again = CELL
            .get_or_insert::<A>(|| unreachable!("resolved twice"))
            .unwrap();

        assert_eq!(a.schema_name(), "A");
        assert_eq!(b.schema_name(), "B");
        assert!(core::ptr::eq(a, again));
    }

    #[test]
    fn failures_are_cached() {
        static CELL: FieldTableCell = FieldTableCell::new();

        let failure = ConfigError::Hook {
            schema: "Broken",
            message: "nope".into(),
        };
        let first = CELL.get_or_init(|| Err(failure.clone()));
        let second = CELL.get_or_init(|| Ok(FieldTable::empty("Broken")));

        assert_eq!(first.unwrap_err(), failure);
        assert_eq!(second.unwrap_err(), failure);
    }
}
