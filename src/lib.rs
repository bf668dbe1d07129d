//! Type-directed Avro codec.
//!
//! Maps between a statically-described host data model and the Avro binary
//! format: schemas are inferred from type descriptors, host values are
//! extracted into the generic Avro form and back, and a cached projector
//! pairs writer and reader schemas for decoding with resolution.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use avrotype::descriptor::{FieldDescriptor, TypeDescriptor};
//! use avrotype::value::HostValue;
//!
//! let point = TypeDescriptor::record(
//!     "demo.Pt",
//!     vec![
//!         FieldDescriptor::new(0, "x", Arc::new(TypeDescriptor::Int)),
//!         FieldDescriptor::new(1, "y", Arc::new(TypeDescriptor::Int)),
//!     ],
//! );
//! avrotype::register_type(&point);
//!
//! let schema = avrotype::infer_schema(&point).unwrap();
//! let value = HostValue::Record {
//!     fqn: "demo.Pt".to_string(),
//!     fields: vec![HostValue::Int(1), HostValue::Int(2)],
//! };
//!
//! let bytes = avrotype::write(&value, &schema).unwrap();
//! let back = avrotype::read(&bytes, &schema, Some(&schema), 0).unwrap();
//! assert_eq!(back.into_host().unwrap(), value);
//! ```

pub mod binary;
mod cache;
pub mod descriptor;
pub mod error;
pub mod extract;
pub mod infer;
pub mod project;
pub mod read;
pub mod registry;
pub mod schema;
pub mod value;

use std::io;
use std::sync::Arc;

// Re-export main types
pub use descriptor::{ContainerShape, FieldDescriptor, TypeDescriptor};
pub use error::{CodecError, DecodeError, EncodeError, ReadError, SchemaError};
pub use infer::{infer_schema, infer_schema_for, infer_schema_of};
pub use project::{Decoded, Projector};
pub use registry::{lookup_type, register_type};
pub use schema::{parse_schema, AvroSchema};
pub use value::{AvroValue, HostValue};

/// Encode a host value against a schema, returning the buffer.
pub fn write(value: &HostValue, schema: &Arc<AvroSchema>) -> Result<Vec<u8>, CodecError> {
    cache::projector_of(schema, None).write(value)
}

/// Encode a host value against a schema into a caller-supplied sink.
///
/// The sink is flushed but not closed.
pub fn write_to(
    value: &HostValue,
    schema: &Arc<AvroSchema>,
    output: &mut impl io::Write,
) -> Result<(), CodecError> {
    cache::projector_of(schema, None).write_to(value, output)
}

/// Decode bytes written with `writer`, starting at `offset`.
///
/// With a reader schema the result is a materialized host value; without
/// one the raw generic form is returned.
pub fn read(
    bytes: &[u8],
    writer: &Arc<AvroSchema>,
    reader: Option<&Arc<AvroSchema>>,
    offset: usize,
) -> Result<Decoded, CodecError> {
    cache::projector_of(writer, reader).read(bytes, offset)
}

/// Decode from a caller-supplied stream, reading it to its end.
///
/// The stream is not closed.
pub fn read_from(
    input: &mut impl io::Read,
    writer: &Arc<AvroSchema>,
    reader: Option<&Arc<AvroSchema>>,
) -> Result<Decoded, CodecError> {
    cache::projector_of(writer, reader).read_from(input)
}
