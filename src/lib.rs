#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use te_schema as schema;
pub use te_utils as utils;
