//! A declarative schema engine.
//!
//! A [`Schema`] declares named fields. Each field is a [`FieldSpec`]: a
//! pipeline made of a default value, a pair of load/dump converters, a chain
//! of setter stages run on every write, a chain of getter stages run on every
//! read, and optionally a rule instantiating nested typed objects.
//!
//! The first use of a schema resolves its [`FieldTable`] once: inherited
//! specs are cloned from the base schema, the schema's own declarations are
//! overlaid, then [`Schema::override_fields`] may adjust any spec before the
//! table is frozen for the rest of the process.
//!
//! Instances are [`Object`] handles. They store raw values lazily and expose
//! them through [`Object::get`] / [`Object::set`], while [`Object::dumps`]
//! turns the stored state back into JSON-shaped data.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use te_schema::{FieldDecls, Object, Root, Schema, convert};
//!
//! struct Invoice;
//!
//! impl Schema for Invoice {
//!     const NAME: &'static str = "Invoice";
//!     type Base = Root;
//!
//!     fn declare(fields: &mut FieldDecls) {
//!         fields
//!             .field("amount")
//!             .converter(convert::int(), convert::string())
//!             .setter(|_, value| value.map_data(|v| Ok(json!(v.as_i64().unwrap_or(0) + 10))));
//!         fields.field("currency").default("EUR");
//!     }
//! }
//!
//! let invoice = Object::new::<Invoice>().unwrap();
//! invoice.set("amount", "5").unwrap();
//!
//! assert_eq!(invoice.get("amount").unwrap(), json!(15));
//! assert_eq!(
//!     invoice.to_value().unwrap(),
//!     json!({ "amount": "15", "currency": "EUR" })
//! );
//! ```

// -----------------------------------------------------------------------------
// Modules

mod error;
mod schema;
mod value;

pub mod field;
pub mod object;
pub mod serde;
pub mod table;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use error::{ConfigError, Error, HookError, Result};
pub use field::{FieldSpec, convert};
pub use object::{Object, WeakObject};
pub use schema::{Root, Schema, SchemaRef};
pub use self::serde::DumpMode;
pub use table::{FieldDecls, FieldTable, FieldTableBuilder};
pub use value::FieldValue;

/// Re-export of the external value model.
pub use serde_json::{Map, Value};
