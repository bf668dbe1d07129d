//! Avro binary encoder for the generic form.
//!
//! The generic form is fully resolved before it reaches this module: unions
//! and enums carry their member index, maps and records are already in
//! schema order. Encoding therefore needs no schema and cannot fail.
//!
//! Layout per the Avro specification:
//! - ints and longs are zigzag varints
//! - floats and doubles are little-endian IEEE 754
//! - bytes and strings are length-prefixed
//! - arrays and maps are written as a single block followed by a zero count

use crate::binary::varint::encode_zigzag;
use crate::value::AvroValue;

/// Encode a generic value into the output buffer.
pub fn encode_value(value: &AvroValue, out: &mut Vec<u8>) {
    match value {
        AvroValue::Null => {}
        AvroValue::Boolean(b) => out.push(*b as u8),
        AvroValue::Int(i) => encode_zigzag(*i as i64, out),
        AvroValue::Long(l) => encode_zigzag(*l, out),
        AvroValue::Float(f) => out.extend_from_slice(&f.to_le_bytes()),
        AvroValue::Double(d) => out.extend_from_slice(&d.to_le_bytes()),
        AvroValue::Bytes(b) => {
            encode_zigzag(b.len() as i64, out);
            out.extend_from_slice(b);
        }
        AvroValue::String(s) => {
            encode_zigzag(s.len() as i64, out);
            out.extend_from_slice(s.as_bytes());
        }
        AvroValue::Record(fields) => {
            for (_, field) in fields {
                encode_value(field, out);
            }
        }
        AvroValue::Enum(index, _) => encode_zigzag(*index as i64, out),
        AvroValue::Array(items) => {
            if !items.is_empty() {
                encode_zigzag(items.len() as i64, out);
                for item in items {
                    encode_value(item, out);
                }
            }
            encode_zigzag(0, out);
        }
        AvroValue::Map(entries) => {
            if !entries.is_empty() {
                encode_zigzag(entries.len() as i64, out);
                for (key, value) in entries {
                    encode_zigzag(key.len() as i64, out);
                    out.extend_from_slice(key.as_bytes());
                    encode_value(value, out);
                }
            }
            encode_zigzag(0, out);
        }
        AvroValue::Union(index, inner) => {
            encode_zigzag(*index as i64, out);
            encode_value(inner, out);
        }
        AvroValue::Fixed(b) => out.extend_from_slice(b),
    }
}

/// Encode a generic value into a fresh buffer.
pub fn encode_to_vec(value: &AvroValue) -> Vec<u8> {
    let mut out = Vec::new();
    encode_value(value, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_record_of_ints() {
        // zig-zag: 1 -> 02, 2 -> 04
        let record = AvroValue::Record(vec![
            ("x".to_string(), AvroValue::Int(1)),
            ("y".to_string(), AvroValue::Int(2)),
        ]);
        assert_eq!(encode_to_vec(&record), vec![0x02, 0x04]);
    }

    #[test]
    fn encode_null_is_empty() {
        assert!(encode_to_vec(&AvroValue::Null).is_empty());
    }

    #[test]
    fn encode_boolean() {
        assert_eq!(encode_to_vec(&AvroValue::Boolean(false)), vec![0x00]);
        assert_eq!(encode_to_vec(&AvroValue::Boolean(true)), vec![0x01]);
    }

    #[test]
    fn encode_string_is_length_prefixed() {
        let value = AvroValue::String("foo".to_string());
        assert_eq!(encode_to_vec(&value), vec![0x06, b'f', b'o', b'o']);
    }

    #[test]
    fn encode_empty_array_is_single_zero() {
        assert_eq!(encode_to_vec(&AvroValue::Array(Vec::new())), vec![0x00]);
    }

    #[test]
    fn encode_array_block() {
        let value = AvroValue::Array(vec![AvroValue::Int(1), AvroValue::Int(2)]);
        // count 2 -> 04, items 02 04, terminator 00
        assert_eq!(encode_to_vec(&value), vec![0x04, 0x02, 0x04, 0x00]);
    }

    #[test]
    fn encode_union_prefixes_member_index() {
        let value = AvroValue::Union(1, Box::new(AvroValue::Double(2.0)));
        let mut expected = vec![0x02];
        expected.extend_from_slice(&2.0f64.to_le_bytes());
        assert_eq!(encode_to_vec(&value), expected);
    }

    #[test]
    fn encode_fixed_is_raw() {
        let value = AvroValue::Fixed(vec![0xDE, 0xAD]);
        assert_eq!(encode_to_vec(&value), vec![0xDE, 0xAD]);
    }
}
