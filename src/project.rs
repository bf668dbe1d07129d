//! Writer/reader schema projection.
//!
//! A [`Projector`] pairs a writer schema with an optional reader schema and
//! exposes encode and decode over that pair. A missing reader schema means
//! "same as writer, decoded as generic": the raw generic form is returned
//! with no host materialization.
//!
//! Projectors are cheap value objects; [`crate::cache`] keeps one per
//! `(writer, reader)` schema identity per thread.

use std::io::{Read, Write};
use std::sync::Arc;

use crate::binary::{decode_resolved, decode_value, encode_value};
use crate::error::{CodecError, DecodeError};
use crate::extract::extract;
use crate::read::{descriptor_for_schema, read_value};
use crate::schema::AvroSchema;
use crate::value::{AvroValue, HostValue};

/// The result of a projected decode.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The raw generic form; produced when no reader schema is present.
    Generic(AvroValue),
    /// A materialized host value.
    Host(HostValue),
}

impl Decoded {
    /// The host value, when one was materialized.
    pub fn into_host(self) -> Option<HostValue> {
        match self {
            Decoded::Host(value) => Some(value),
            Decoded::Generic(_) => None,
        }
    }

    /// The generic form, when no reader schema was present.
    pub fn into_generic(self) -> Option<AvroValue> {
        match self {
            Decoded::Generic(value) => Some(value),
            Decoded::Host(_) => None,
        }
    }
}

/// A cached pairing of writer and reader schemas exposing encode/decode.
#[derive(Debug, Clone)]
pub struct Projector {
    writer: Arc<AvroSchema>,
    reader: Option<Arc<AvroSchema>>,
}

impl Projector {
    /// Create a projector for a writer schema and an optional reader schema.
    pub fn new(writer: Arc<AvroSchema>, reader: Option<Arc<AvroSchema>>) -> Self {
        Self { writer, reader }
    }

    /// The schema values are extracted against: the reader when present,
    /// else the writer.
    pub fn projected(&self) -> &Arc<AvroSchema> {
        self.reader.as_ref().unwrap_or(&self.writer)
    }

    /// Encode a host value into a fresh buffer.
    pub fn write(&self, value: &HostValue) -> Result<Vec<u8>, CodecError> {
        let generic = extract(value, self.projected())?;
        let mut buffer = Vec::new();
        encode_value(&generic, &mut buffer);
        Ok(buffer)
    }

    /// Encode a host value into a caller-supplied sink.
    ///
    /// The sink is flushed on completion but never closed; ownership stays
    /// with the caller.
    pub fn write_to(&self, value: &HostValue, output: &mut dyn Write) -> Result<(), CodecError> {
        let buffer = self.write(value)?;
        output.write_all(&buffer)?;
        output.flush()?;
        Ok(())
    }

    /// Decode from a byte slice starting at `offset`.
    ///
    /// With a reader schema, the writer's bytes are resolved to the reader
    /// layout and materialized as a host value; without one the raw generic
    /// form is returned.
    pub fn read(&self, bytes: &[u8], offset: usize) -> Result<Decoded, CodecError> {
        let mut cursor = bytes.get(offset..).ok_or(DecodeError::UnexpectedEof)?;

        match &self.reader {
            None => Ok(Decoded::Generic(decode_value(&mut cursor, &self.writer)?)),
            Some(reader) => {
                let generic = if Arc::ptr_eq(reader, &self.writer) {
                    decode_value(&mut cursor, &self.writer)?
                } else {
                    decode_resolved(&mut cursor, &self.writer, reader)?
                };
                let descriptor = descriptor_for_schema(reader)?;
                Ok(Decoded::Host(read_value(generic, reader, &descriptor)?))
            }
        }
    }

    /// Decode from a caller-supplied stream, reading it to its end.
    ///
    /// The stream is read but never closed; ownership stays with the caller.
    pub fn read_from(&self, input: &mut dyn Read) -> Result<Decoded, CodecError> {
        let mut buffer = Vec::new();
        input.read_to_end(&mut buffer)?;
        self.read(&buffer, 0)
    }
}
