//! Avro binary decoder for primitive and complex types.
//!
//! Decodes Avro binary data into the generic in-memory form, driven by the
//! writer schema. Logical wrappers decode as their base type; their
//! interpretation happens during host materialization, where the reader
//! schema is in hand.

use crate::binary::varint;
use crate::error::DecodeError;
use crate::schema::{AvroSchema, EnumSchema, RecordSchema};
use crate::value::AvroValue;

/// Decode a null value (no-op, consumes no bytes).
#[inline]
pub fn decode_null(_data: &mut &[u8]) -> Result<(), DecodeError> {
    Ok(())
}

/// Decode a boolean value.
///
/// Avro booleans are encoded as a single byte: 0x00 for false, 0x01 for true.
#[inline]
pub fn decode_boolean(data: &mut &[u8]) -> Result<bool, DecodeError> {
    if data.is_empty() {
        return Err(DecodeError::UnexpectedEof);
    }
    let byte = data[0];
    *data = &data[1..];
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(DecodeError::InvalidData(format!(
            "Invalid boolean value: {}, expected 0 or 1",
            byte
        ))),
    }
}

/// Decode a 32-bit signed integer (zigzag varint encoded).
#[inline]
pub fn decode_int(data: &mut &[u8]) -> Result<i32, DecodeError> {
    let long = decode_long(data)?;
    // Check for overflow
    if long < i32::MIN as i64 || long > i32::MAX as i64 {
        return Err(DecodeError::InvalidData(format!(
            "Integer overflow: {} does not fit in i32",
            long
        )));
    }
    Ok(long as i32)
}

/// Decode a 64-bit signed integer (zigzag varint encoded).
#[inline]
pub fn decode_long(data: &mut &[u8]) -> Result<i64, DecodeError> {
    varint::decode_zigzag(data)
}

/// Decode a 32-bit IEEE 754 floating-point number (little-endian).
#[inline]
pub fn decode_float(data: &mut &[u8]) -> Result<f32, DecodeError> {
    if data.len() < 4 {
        return Err(DecodeError::UnexpectedEof);
    }
    let bytes: [u8; 4] = [data[0], data[1], data[2], data[3]];
    *data = &data[4..];
    Ok(f32::from_le_bytes(bytes))
}

/// Decode a 64-bit IEEE 754 floating-point number (little-endian).
#[inline]
pub fn decode_double(data: &mut &[u8]) -> Result<f64, DecodeError> {
    if data.len() < 8 {
        return Err(DecodeError::UnexpectedEof);
    }
    let bytes: [u8; 8] = [
        data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
    ];
    *data = &data[8..];
    Ok(f64::from_le_bytes(bytes))
}

/// Decode a byte array (length-prefixed).
#[inline]
pub fn decode_bytes(data: &mut &[u8]) -> Result<Vec<u8>, DecodeError> {
    let len = decode_long(data)?;
    if len < 0 {
        return Err(DecodeError::InvalidData(format!(
            "Negative bytes length: {}",
            len
        )));
    }
    let len = len as usize;

    if data.len() < len {
        return Err(DecodeError::UnexpectedEof);
    }

    let bytes = data[..len].to_vec();
    *data = &data[len..];
    Ok(bytes)
}

/// Decode a UTF-8 string (length-prefixed).
#[inline]
pub fn decode_string(data: &mut &[u8]) -> Result<String, DecodeError> {
    let bytes = decode_bytes(data)?;
    String::from_utf8(bytes).map_err(DecodeError::from)
}

/// Decode a fixed-size byte array.
#[inline]
pub fn decode_fixed(data: &mut &[u8], size: usize) -> Result<Vec<u8>, DecodeError> {
    if data.len() < size {
        return Err(DecodeError::UnexpectedEof);
    }
    let bytes = data[..size].to_vec();
    *data = &data[size..];
    Ok(bytes)
}

/// Decode an enum value.
///
/// Avro enums are encoded as a varint index into the symbol list.
#[inline]
pub fn decode_enum(data: &mut &[u8], schema: &EnumSchema) -> Result<(i32, String), DecodeError> {
    let index = decode_int(data)?;

    if index < 0 || index as usize >= schema.symbols.len() {
        return Err(DecodeError::InvalidData(format!(
            "Enum index {} out of range for enum '{}' with {} symbols",
            index,
            schema.name,
            schema.symbols.len()
        )));
    }

    let symbol = schema.symbols[index as usize].clone();
    Ok((index, symbol))
}

/// Decode an array of values.
///
/// Avro arrays are encoded as a series of blocks. Each block consists of a
/// long count (negative counts are followed by a byte size), the encoded
/// items, and a zero count terminates the array.
pub fn decode_array(
    data: &mut &[u8],
    item_schema: &AvroSchema,
) -> Result<Vec<AvroValue>, DecodeError> {
    let mut items = Vec::new();

    loop {
        let count = decode_long(data)?;

        if count == 0 {
            break;
        }

        let item_count = if count < 0 {
            // Negative count means the block has a byte size prefix
            let _byte_size = decode_long(data)?;
            (-count) as usize
        } else {
            count as usize
        };

        items.reserve(item_count);

        for _ in 0..item_count {
            let value = decode_value(data, item_schema)?;
            items.push(value);
        }
    }

    Ok(items)
}

/// Decode a map with string keys.
///
/// Avro maps are encoded like arrays, as blocks of key-value pairs.
pub fn decode_map(
    data: &mut &[u8],
    value_schema: &AvroSchema,
) -> Result<Vec<(String, AvroValue)>, DecodeError> {
    let mut entries = Vec::new();

    loop {
        let count = decode_long(data)?;

        if count == 0 {
            break;
        }

        let entry_count = if count < 0 {
            let _byte_size = decode_long(data)?;
            (-count) as usize
        } else {
            count as usize
        };

        entries.reserve(entry_count);

        for _ in 0..entry_count {
            let key = decode_string(data)?;
            let value = decode_value(data, value_schema)?;
            entries.push((key, value));
        }
    }

    Ok(entries)
}

/// Decode a union value.
///
/// Avro unions are encoded as a varint member index followed by the value
/// encoded per that member's schema.
pub fn decode_union(
    data: &mut &[u8],
    members: &[AvroSchema],
) -> Result<(i32, AvroValue), DecodeError> {
    let index = decode_int(data)?;

    if index < 0 || index as usize >= members.len() {
        return Err(DecodeError::InvalidData(format!(
            "Union index {} out of range (0..{})",
            index,
            members.len()
        )));
    }

    let member_schema = &members[index as usize];
    let value = decode_value(data, member_schema)?;

    Ok((index, value))
}

/// Decode a record value.
///
/// Avro records are encoded as a sequence of field values in schema order,
/// with no field markers or delimiters.
pub fn decode_record(
    data: &mut &[u8],
    schema: &RecordSchema,
) -> Result<Vec<(String, AvroValue)>, DecodeError> {
    let mut fields = Vec::with_capacity(schema.fields.len());

    for field in &schema.fields {
        let value = decode_value(data, &field.schema)?;
        fields.push((field.name.clone(), value));
    }

    Ok(fields)
}

/// Decode any Avro value based on its schema.
///
/// This is the main entry point for decoding Avro data. It dispatches
/// to the appropriate decoder based on the schema type.
pub fn decode_value(data: &mut &[u8], schema: &AvroSchema) -> Result<AvroValue, DecodeError> {
    match schema {
        AvroSchema::Null => {
            decode_null(data)?;
            Ok(AvroValue::Null)
        }
        AvroSchema::Boolean => {
            let v = decode_boolean(data)?;
            Ok(AvroValue::Boolean(v))
        }
        AvroSchema::Int => {
            let v = decode_int(data)?;
            Ok(AvroValue::Int(v))
        }
        AvroSchema::Long => {
            let v = decode_long(data)?;
            Ok(AvroValue::Long(v))
        }
        AvroSchema::Float => {
            let v = decode_float(data)?;
            Ok(AvroValue::Float(v))
        }
        AvroSchema::Double => {
            let v = decode_double(data)?;
            Ok(AvroValue::Double(v))
        }
        AvroSchema::Bytes => {
            let v = decode_bytes(data)?;
            Ok(AvroValue::Bytes(v))
        }
        AvroSchema::String => {
            let v = decode_string(data)?;
            Ok(AvroValue::String(v))
        }

        AvroSchema::Record(record_schema) => {
            let fields = decode_record(data, record_schema)?;
            Ok(AvroValue::Record(fields))
        }
        AvroSchema::Enum(enum_schema) => {
            let (index, symbol) = decode_enum(data, enum_schema)?;
            Ok(AvroValue::Enum(index, symbol))
        }
        AvroSchema::Array(item_schema) => {
            let items = decode_array(data, item_schema)?;
            Ok(AvroValue::Array(items))
        }
        AvroSchema::Map(value_schema) => {
            let entries = decode_map(data, value_schema)?;
            Ok(AvroValue::Map(entries))
        }
        AvroSchema::Union(members) => {
            let (index, value) = decode_union(data, members)?;
            Ok(AvroValue::Union(index, Box::new(value)))
        }
        AvroSchema::Fixed(fixed_schema) => {
            let bytes = decode_fixed(data, fixed_schema.size)?;
            Ok(AvroValue::Fixed(bytes))
        }

        // Logical types decode as their base; interpretation is the
        // reader layer's concern.
        AvroSchema::Logical(logical) => decode_value(data, &logical.base),
    }
}

/// Skip over a fixed-size value.
#[inline]
pub fn skip_fixed(data: &mut &[u8], size: usize) -> Result<(), DecodeError> {
    if data.len() < size {
        return Err(DecodeError::UnexpectedEof);
    }
    *data = &data[size..];
    Ok(())
}

/// Skip over a bytes or string value.
#[inline]
pub fn skip_bytes(data: &mut &[u8]) -> Result<(), DecodeError> {
    let len = decode_long(data)?;
    if len < 0 {
        return Err(DecodeError::InvalidData(format!(
            "Negative bytes length: {}",
            len
        )));
    }
    skip_fixed(data, len as usize)
}

/// Skip over an array value.
pub fn skip_array(data: &mut &[u8], item_schema: &AvroSchema) -> Result<(), DecodeError> {
    loop {
        let count = decode_long(data)?;
        if count == 0 {
            break;
        }

        if count < 0 {
            // Block has a byte size - we can skip directly
            let byte_size = decode_long(data)?;
            if byte_size < 0 {
                return Err(DecodeError::InvalidData(format!(
                    "Negative block byte size: {}",
                    byte_size
                )));
            }
            skip_fixed(data, byte_size as usize)?;
            continue;
        }

        for _ in 0..count {
            skip_value(data, item_schema)?;
        }
    }
    Ok(())
}

/// Skip over a map value.
pub fn skip_map(data: &mut &[u8], value_schema: &AvroSchema) -> Result<(), DecodeError> {
    loop {
        let count = decode_long(data)?;
        if count == 0 {
            break;
        }

        if count < 0 {
            let byte_size = decode_long(data)?;
            if byte_size < 0 {
                return Err(DecodeError::InvalidData(format!(
                    "Negative block byte size: {}",
                    byte_size
                )));
            }
            skip_fixed(data, byte_size as usize)?;
            continue;
        }

        for _ in 0..count {
            skip_bytes(data)?; // Skip key (string)
            skip_value(data, value_schema)?;
        }
    }
    Ok(())
}

/// Skip over any Avro value based on its schema.
///
/// Used during writer/reader resolution to pass over writer-only fields
/// without fully decoding them.
pub fn skip_value(data: &mut &[u8], schema: &AvroSchema) -> Result<(), DecodeError> {
    match schema {
        AvroSchema::Null => Ok(()),
        AvroSchema::Boolean => skip_fixed(data, 1),
        AvroSchema::Int | AvroSchema::Long => varint::skip_varint(data),
        AvroSchema::Float => skip_fixed(data, 4),
        AvroSchema::Double => skip_fixed(data, 8),
        AvroSchema::Bytes | AvroSchema::String => skip_bytes(data),
        AvroSchema::Fixed(fixed_schema) => skip_fixed(data, fixed_schema.size),
        AvroSchema::Enum(_) => varint::skip_varint(data),
        AvroSchema::Array(item_schema) => skip_array(data, item_schema),
        AvroSchema::Map(value_schema) => skip_map(data, value_schema),
        AvroSchema::Union(members) => {
            let index = decode_int(data)?;
            if index < 0 || index as usize >= members.len() {
                return Err(DecodeError::InvalidData(format!(
                    "Union index {} out of range (0..{})",
                    index,
                    members.len()
                )));
            }
            skip_value(data, &members[index as usize])
        }
        AvroSchema::Record(record_schema) => {
            for field in &record_schema.fields {
                skip_value(data, &field.schema)?;
            }
            Ok(())
        }
        AvroSchema::Logical(logical) => skip_value(data, &logical.base),
    }
}
