//! Extraction of host values into the generic Avro form.
//!
//! Extraction is driven by the target field schema. Union fields carry the
//! member schemas the value may resolve to; the extractor selects the
//! member by the host value's runtime shape and tags the result with the
//! member index, so the generic form leaves here fully resolved.

use crate::error::EncodeError;
use crate::schema::{AvroSchema, LogicalName, LogicalSchema};
use crate::value::{AvroValue, HostValue};

static NULL_VALUE: HostValue = HostValue::Null;

/// Extract a host value into the generic form against a field schema.
pub fn extract(value: &HostValue, schema: &AvroSchema) -> Result<AvroValue, EncodeError> {
    match schema {
        AvroSchema::Union(members) => {
            let (index, member, unwrapped) = select_member(value, members)?;
            let inner = extract(unwrapped, member)?;
            Ok(AvroValue::Union(index as i32, Box::new(inner)))
        }
        _ => extract_plain(value, schema),
    }
}

/// Select the union member a host value resolves to.
///
/// Returns the member index, the member schema, and the value to recurse
/// with (options unwrap to their payload here).
fn select_member<'a>(
    value: &'a HostValue,
    members: &'a [AvroSchema],
) -> Result<(usize, &'a AvroSchema, &'a HostValue), EncodeError> {
    let no_match = || EncodeError::NoUnionMatch {
        value: value.kind().to_string(),
        union: AvroSchema::Union(members.to_vec()).to_json(),
    };

    match value {
        HostValue::Null | HostValue::Optional(None) => members
            .iter()
            .position(|m| matches!(m, AvroSchema::Null))
            .map(|i| (i, &members[i], &NULL_VALUE))
            .ok_or_else(no_match),

        HostValue::Optional(Some(inner)) => members
            .iter()
            .enumerate()
            .filter(|(_, m)| !matches!(m, AvroSchema::Null))
            .find(|(_, m)| member_admits(inner, m))
            .map(|(i, m)| (i, m, inner.as_ref()))
            .ok_or_else(no_match),

        other => members
            .iter()
            .enumerate()
            .find(|(_, m)| member_admits(other, m))
            .map(|(i, m)| (i, m, other))
            .ok_or_else(no_match),
    }
}

/// Whether a union member can represent a host value.
///
/// Sum variants match by the member schema's fully-qualified name; newtypes
/// by their `logicalType` marker; everything else by shape.
fn member_admits(value: &HostValue, member: &AvroSchema) -> bool {
    if let HostValue::Newtype { fqn, value: inner } = value {
        return match member.logical() {
            Some(LogicalName::Custom(marker)) => marker == fqn,
            _ => member_admits(inner, member),
        };
    }

    match (value, member.base()) {
        (HostValue::Null, AvroSchema::Null) => true,
        (HostValue::Boolean(_), AvroSchema::Boolean) => true,
        (HostValue::Int(_), AvroSchema::Int | AvroSchema::Long) => true,
        (HostValue::Long(_), AvroSchema::Long) => true,
        (HostValue::Float(_), AvroSchema::Float) => true,
        (HostValue::Double(_), AvroSchema::Double) => true,
        (HostValue::Str(_), AvroSchema::String) => true,
        (HostValue::Str(_), AvroSchema::Fixed(_)) => {
            member.logical() == Some(&LogicalName::StringBytes)
        }
        (HostValue::Bytes(_), AvroSchema::Bytes | AvroSchema::Fixed(_)) => true,
        (HostValue::Uuid(_), AvroSchema::Fixed(f)) => f.size == 16,
        (
            HostValue::List(_) | HostValue::Set(_) | HostValue::Deque(_),
            AvroSchema::Array(_),
        ) => true,
        (HostValue::Map(_), AvroSchema::Map(_)) => true,
        (HostValue::Enum { symbol }, AvroSchema::Enum(e)) => e.symbol_index(symbol).is_some(),
        (HostValue::Record { fqn, .. }, AvroSchema::Record(r)) => r.fullname() == *fqn,
        (HostValue::Optional(_), _) => false,
        _ => false,
    }
}

fn extract_plain(value: &HostValue, schema: &AvroSchema) -> Result<AvroValue, EncodeError> {
    match (value, schema) {
        (_, AvroSchema::Logical(logical)) => extract_logical(value, logical),

        (HostValue::Null | HostValue::Optional(None), AvroSchema::Null) => Ok(AvroValue::Null),

        // A present option against a concrete schema degenerates to its payload
        (HostValue::Optional(Some(inner)), schema) => extract(inner, schema),

        (HostValue::Boolean(b), AvroSchema::Boolean) => Ok(AvroValue::Boolean(*b)),
        (HostValue::Int(i), AvroSchema::Int) => Ok(AvroValue::Int(*i)),
        (HostValue::Int(i), AvroSchema::Long) => Ok(AvroValue::Long(*i as i64)),
        (HostValue::Long(l), AvroSchema::Long) => Ok(AvroValue::Long(*l)),
        (HostValue::Float(f), AvroSchema::Float) => Ok(AvroValue::Float(*f)),
        (HostValue::Double(d), AvroSchema::Double) => Ok(AvroValue::Double(*d)),
        (HostValue::Str(s), AvroSchema::String) => Ok(AvroValue::String(s.clone())),
        (HostValue::Bytes(b), AvroSchema::Bytes) => Ok(AvroValue::Bytes(b.clone())),

        (HostValue::Uuid(u), AvroSchema::Fixed(f)) if f.size == 16 => {
            Ok(AvroValue::Fixed(u.as_bytes().to_vec()))
        }

        (HostValue::Bytes(b), AvroSchema::Fixed(f)) => {
            if b.len() != f.size {
                return Err(EncodeError::FixedOverflow {
                    name: f.name.clone(),
                    size: f.size,
                    actual: b.len(),
                });
            }
            Ok(AvroValue::Fixed(b.clone()))
        }

        (
            HostValue::List(items) | HostValue::Set(items) | HostValue::Deque(items),
            AvroSchema::Array(item_schema),
        ) => {
            let extracted: Result<Vec<AvroValue>, EncodeError> =
                items.iter().map(|item| extract(item, item_schema)).collect();
            Ok(AvroValue::Array(extracted?))
        }

        (HostValue::Map(entries), AvroSchema::Map(value_schema)) => {
            let extracted: Result<Vec<(String, AvroValue)>, EncodeError> = entries
                .iter()
                .map(|(key, value)| Ok((key.clone(), extract(value, value_schema)?)))
                .collect();
            Ok(AvroValue::Map(extracted?))
        }

        (HostValue::Enum { symbol }, AvroSchema::Enum(enum_schema)) => {
            let index =
                enum_schema
                    .symbol_index(symbol)
                    .ok_or_else(|| EncodeError::UnknownSymbol {
                        symbol: symbol.clone(),
                        name: enum_schema.fullname(),
                    })?;
            Ok(AvroValue::Enum(index as i32, symbol.clone()))
        }

        (HostValue::Record { fqn, fields }, AvroSchema::Record(record_schema)) => {
            if fields.len() != record_schema.fields.len() {
                return Err(EncodeError::TypeMismatch(format!(
                    "Record '{}' has {} fields but schema '{}' declares {}",
                    fqn,
                    fields.len(),
                    record_schema.fullname(),
                    record_schema.fields.len()
                )));
            }
            let extracted: Result<Vec<(String, AvroValue)>, EncodeError> = fields
                .iter()
                .zip(&record_schema.fields)
                .map(|(value, field)| Ok((field.name.clone(), extract(value, &field.schema)?)))
                .collect();
            Ok(AvroValue::Record(extracted?))
        }

        // A newtype against a schema that lost its marker passes through
        (HostValue::Newtype { value, .. }, schema) => extract(value, schema),

        (value, schema) => Err(EncodeError::TypeMismatch(format!(
            "Cannot extract {} value against schema {}",
            value.kind(),
            schema.to_json()
        ))),
    }
}

/// Extract against a logical wrapper: fixed-size bindings and newtypes.
fn extract_logical(value: &HostValue, logical: &LogicalSchema) -> Result<AvroValue, EncodeError> {
    match (&logical.name, value, &*logical.base) {
        (LogicalName::Uuid, HostValue::Uuid(u), AvroSchema::Fixed(f)) if f.size == 16 => {
            Ok(AvroValue::Fixed(u.as_bytes().to_vec()))
        }

        (LogicalName::IntBytes, HostValue::Int(i), AvroSchema::Fixed(f)) if f.size == 4 => {
            Ok(AvroValue::Fixed(i.to_be_bytes().to_vec()))
        }

        (LogicalName::LongBytes, HostValue::Long(l), AvroSchema::Fixed(f)) if f.size == 8 => {
            Ok(AvroValue::Fixed(l.to_be_bytes().to_vec()))
        }

        // Strings pad with trailing zeros up to the declared size
        (LogicalName::StringBytes, HostValue::Str(s), AvroSchema::Fixed(f)) => {
            let bytes = s.as_bytes();
            if bytes.len() > f.size {
                return Err(EncodeError::FixedOverflow {
                    name: f.name.clone(),
                    size: f.size,
                    actual: bytes.len(),
                });
            }
            let mut padded = vec![0u8; f.size];
            padded[..bytes.len()].copy_from_slice(bytes);
            Ok(AvroValue::Fixed(padded))
        }

        (LogicalName::Custom(marker), HostValue::Newtype { fqn, value }, base) => {
            if marker != fqn {
                return Err(EncodeError::TypeMismatch(format!(
                    "Newtype '{}' does not match schema marker '{}'",
                    fqn, marker
                )));
            }
            extract(value, base)
        }

        // Any other value against a logical wrapper extracts as the base
        (_, value, base) => extract(value, base),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EnumSchema, FixedSchema};
    use uuid::Uuid;

    #[test]
    fn option_none_selects_null_member() {
        let schema = AvroSchema::Union(vec![AvroSchema::Null, AvroSchema::String]);
        let value = extract(&HostValue::none(), &schema).unwrap();
        assert_eq!(value, AvroValue::Union(0, Box::new(AvroValue::Null)));
    }

    #[test]
    fn option_some_selects_non_null_member() {
        let schema = AvroSchema::Union(vec![AvroSchema::Null, AvroSchema::String]);
        let value = extract(&HostValue::some(HostValue::Str("x".to_string())), &schema).unwrap();
        assert_eq!(
            value,
            AvroValue::Union(1, Box::new(AvroValue::String("x".to_string())))
        );
    }

    #[test]
    fn no_union_match_is_an_error() {
        let schema = AvroSchema::Union(vec![AvroSchema::Null, AvroSchema::String]);
        assert!(matches!(
            extract(&HostValue::Boolean(true), &schema),
            Err(EncodeError::NoUnionMatch { .. })
        ));
    }

    #[test]
    fn uuid_extracts_as_sixteen_byte_fixed() {
        let uuid = Uuid::from_u128(1);
        let schema = AvroSchema::Logical(LogicalSchema::new(
            AvroSchema::Fixed(FixedSchema::new("id", 16)),
            LogicalName::Uuid,
        ));
        let value = extract(&HostValue::Uuid(uuid), &schema).unwrap();
        match value {
            AvroValue::Fixed(bytes) => {
                assert_eq!(bytes.len(), 16);
                assert_eq!(bytes[15], 1);
                assert!(bytes[..15].iter().all(|&b| b == 0));
            }
            other => panic!("Expected fixed, got {:?}", other),
        }
    }

    #[test]
    fn fixed_string_pads_with_trailing_zeros() {
        let schema = AvroSchema::Logical(LogicalSchema::new(
            AvroSchema::Fixed(FixedSchema::new("code", 6)),
            LogicalName::StringBytes,
        ));
        let value = extract(&HostValue::Str("abc".to_string()), &schema).unwrap();
        assert_eq!(value, AvroValue::Fixed(vec![b'a', b'b', b'c', 0, 0, 0]));
    }

    #[test]
    fn fixed_string_overflow_is_an_error() {
        let schema = AvroSchema::Logical(LogicalSchema::new(
            AvroSchema::Fixed(FixedSchema::new("code", 2)),
            LogicalName::StringBytes,
        ));
        assert!(matches!(
            extract(&HostValue::Str("abc".to_string()), &schema),
            Err(EncodeError::FixedOverflow { .. })
        ));
    }

    #[test]
    fn enum_symbol_maps_to_index() {
        let schema = AvroSchema::Enum(EnumSchema::new("Side", vec!["L".into(), "R".into()]));
        let value = extract(
            &HostValue::Enum {
                symbol: "R".to_string(),
            },
            &schema,
        )
        .unwrap();
        assert_eq!(value, AvroValue::Enum(1, "R".to_string()));
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        let schema = AvroSchema::Enum(EnumSchema::new("Side", vec!["L".into(), "R".into()]));
        assert!(matches!(
            extract(
                &HostValue::Enum {
                    symbol: "X".to_string()
                },
                &schema
            ),
            Err(EncodeError::UnknownSymbol { .. })
        ));
    }

    #[test]
    fn newtype_extracts_as_inner_primitive() {
        let schema = AvroSchema::Logical(LogicalSchema::new(
            AvroSchema::String,
            LogicalName::Custom("com.example.Email".to_string()),
        ));
        let value = extract(
            &HostValue::Newtype {
                fqn: "com.example.Email".to_string(),
                value: Box::new(HostValue::Str("a@b.c".to_string())),
            },
            &schema,
        )
        .unwrap();
        assert_eq!(value, AvroValue::String("a@b.c".to_string()));
    }

    #[test]
    fn map_keys_are_sorted_for_determinism() {
        let mut entries = std::collections::BTreeMap::new();
        entries.insert("b".to_string(), HostValue::Int(2));
        entries.insert("a".to_string(), HostValue::Int(1));
        let schema = AvroSchema::Map(Box::new(AvroSchema::Int));
        let value = extract(&HostValue::Map(entries), &schema).unwrap();
        assert_eq!(
            value,
            AvroValue::Map(vec![
                ("a".to_string(), AvroValue::Int(1)),
                ("b".to_string(), AvroValue::Int(2)),
            ])
        );
    }
}
