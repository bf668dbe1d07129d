//! Error types for the codec

use std::io;
use thiserror::Error;

/// Errors detected while building or inferring schemas.
///
/// These are configuration errors: they are fatal for the type in question
/// and surface at the first use of that type.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Invalid schema format
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    /// Unsupported descriptor or schema type
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),
    /// Schema parsing error
    #[error("Parse error: {0}")]
    ParseError(String),
    /// A fixed-size binding on a string or bytes field without a size
    #[error("Fixed binding on field '{0}' requires an explicit size")]
    MissingFixedSize(String),
    /// Two union variants declared the same index
    #[error("Duplicate union index {index} in '{fqn}'")]
    DuplicateUnionIndex { fqn: String, index: u32 },
}

/// Errors that can occur while extracting a host value into the generic form.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Value does not match any member of the target union
    #[error("Value {value} matches no member of union {union}")]
    NoUnionMatch { value: String, union: String },
    /// Value shape incompatible with the target schema
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    /// Enum symbol not present in the schema
    #[error("Unknown enum symbol '{symbol}' for enum '{name}'")]
    UnknownSymbol { symbol: String, name: String },
    /// Value does not fit the declared fixed size
    #[error("Value for fixed '{name}' exceeds size {size}: {actual} bytes")]
    FixedOverflow {
        name: String,
        size: usize,
        actual: usize,
    },
    /// IO error while writing to a caller-supplied sink
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Errors that can occur while decoding Avro binary data.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Invalid Avro data
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// Unexpected end of data
    #[error("Unexpected end of input")]
    UnexpectedEof,
    /// Type mismatch during writer/reader resolution
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Invalid varint encoding
    #[error("Invalid varint encoding")]
    InvalidVarint,
    /// String is not valid UTF-8
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Errors that can occur while materializing a host value from the generic form.
#[derive(Debug, Error)]
pub enum ReadError {
    /// A record schema names a type the registry does not know
    #[error("Unknown record type '{0}'")]
    UnknownType(String),
    /// Decoded symbol is not declared by the host enum
    #[error("Symbol '{symbol}' is not declared by enum '{fqn}'")]
    SymbolNotDeclared { symbol: String, fqn: String },
    /// Generic value does not fit the target descriptor
    #[error("Cannot read {value} as {target}")]
    Shape { value: String, target: String },
    /// A record constructor rejected its arguments
    #[error("Constructor for '{fqn}' failed: {message}")]
    Constructor { fqn: String, message: String },
    /// Illegal top-level Avro type for materialization
    #[error("Illegal top-level Avro type: {0}")]
    IllegalTopLevel(String),
}

/// Top-level codec error surfaced by the facade.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Schema configuration error
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    /// Extraction error
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),
    /// Binary decoding error
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    /// Host materialization error
    #[error("Read error: {0}")]
    Read(#[from] ReadError),
    /// IO error on a caller-supplied stream
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
