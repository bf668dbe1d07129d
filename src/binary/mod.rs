//! Avro binary encoding and decoding.
//!
//! The encoder consumes the fully-resolved generic form; the decoder is
//! driven by the writer schema, optionally resolving to a distinct reader
//! schema as it goes.

pub mod decode;
pub mod encode;
pub mod resolve;
pub mod varint;

pub use decode::{decode_value, skip_value};
pub use encode::{encode_to_vec, encode_value};
pub use resolve::{apply_promotion, decode_resolved, json_to_avro_value, TypePromotion};
