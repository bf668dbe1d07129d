//! Avro schema types and parsing.
//!
//! This module defines the Avro schema type system used by the codec,
//! its JSON serialization, and the JSON parser.

mod parser;
mod types;

pub use parser::{parse_schema, SchemaParser};
pub use types::*;
