//! Dumping objects to external data.
//!
//! [`Object::dumps`] walks the fields in declaration order and reads stored
//! values, not getter results. [`DumpMode`] picks between the exposed form
//! and the raw stored state.
//!
//! `Object` also implements [`Serialize`] through its exposed dump, so it
//! plugs into any serde format.

use ::serde::ser::Error as _;
use ::serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{Object, Result};

// -----------------------------------------------------------------------------
// DumpMode

/// Selects the form of a dump.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DumpMode {
    /// External form: hidden fields are skipped, mapping names are used and
    /// dump converters are applied. Virtual fields are dumped through their
    /// getter chain.
    #[default]
    Exposed,
    /// Stored state: every stored field under its real name, without
    /// converters. Virtual fields are skipped. Loading a raw dump writes
    /// every value through the setter chain again, so it reproduces the
    /// original only when the setters leave their result unchanged.
    Raw,
}

impl DumpMode {
    #[inline]
    pub fn is_raw(self) -> bool {
        matches!(self, Self::Raw)
    }
}

// -----------------------------------------------------------------------------
// Dumps

impl Object {
    /// Dumps the object in [`DumpMode::Exposed`].
    #[inline]
    pub fn dumps(&self) -> Result<Map<String, Value>> {
        self.dumps_with(DumpMode::Exposed)
    }

    /// Dumps the object.
    ///
    /// Missing values are materialized from their defaults first. A single
    /// failing field fails the whole dump.
    pub fn dumps_with(&self, mode: DumpMode) -> Result<Map<String, Value>> {
        let table = self.table();
        (table.hooks.pre_dumps)(self, mode)
            .map_err(|e| e.into_hook_failure(table.schema_name(), "pre_dumps"))?;

        let mut dump = Map::new();
        for spec in table.iter() {
            let key = match mode {
                DumpMode::Exposed if spec.is_hidden() => continue,
                DumpMode::Raw if spec.is_virtual() => continue,
                DumpMode::Exposed => spec.exposed_name(),
                DumpMode::Raw => spec.name(),
            };
            dump.insert(key.to_owned(), spec.dump_value(self, mode)?);
        }

        (table.hooks.post_dumps)(self, mode, &mut dump)
            .map_err(|e| e.into_hook_failure(table.schema_name(), "post_dumps"))?;
        Ok(dump)
    }

    /// Returns the exposed dump as a JSON value.
    #[inline]
    pub fn to_value(&self) -> Result<Value> {
        self.dumps().map(Value::Object)
    }

    /// Renders a dump as a JSON string.
    pub fn to_json(&self, mode: DumpMode) -> Result<String> {
        Ok(serde_json::to_string(&self.dumps_with(mode)?)?)
    }

    /// Encodes the raw dump as JSON bytes, see [`Object::decode`].
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.dumps_with(DumpMode::Raw)?)?)
    }
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        self.dumps().map_err(S::Error::custom)?.serialize(serializer)
    }
}
