//! Field specifications and the accessor protocol.
//!
//! - [`FieldSpec`]: the pipeline configuration of one field.
//! - [`DefaultValue`], [`Converter`], [`Stage`]: the pieces of that pipeline.
//! - [`convert`]: ready-made converters.

// -----------------------------------------------------------------------------
// Modules

mod access;
mod pipeline;
mod spec;

pub mod convert;

// -----------------------------------------------------------------------------
// Exports

pub use pipeline::{Converter, DefaultValue, Factory, Stage, converter, stage};
pub use spec::{FieldFlags, FieldShape, FieldSpec};
