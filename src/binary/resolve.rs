//! Writer/reader schema resolution during decoding.
//!
//! Implements schema resolution per the Avro specification:
//! - Field matching by name and alias, with reader-side field reordering
//! - Reader defaults for fields the writer never wrote
//! - Type promotions (int to long, float to double, string/bytes)
//! - Writer-only fields skipped without full decoding
//!
//! Resolution is recursive: nested records, arrays, maps and unions resolve
//! member by member while the bytes stream past exactly once.

use serde_json::Value;

use crate::binary::decode::{decode_int, decode_value, skip_value};
use crate::error::DecodeError;
use crate::schema::AvroSchema;
use crate::value::AvroValue;

/// Type promotions supported by Avro schema resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypePromotion {
    /// int → long
    IntToLong,
    /// int → float
    IntToFloat,
    /// int → double
    IntToDouble,
    /// long → float
    LongToFloat,
    /// long → double
    LongToDouble,
    /// float → double
    FloatToDouble,
    /// string → bytes
    StringToBytes,
    /// bytes → string
    BytesToString,
}

impl TypePromotion {
    /// Determine the promotion needed between writer and reader primitives.
    ///
    /// Returns `None` when the types are identical, `Some(promotion)` for a
    /// valid widening, or an error for incompatible primitives.
    pub fn from_schemas(
        writer: &AvroSchema,
        reader: &AvroSchema,
    ) -> Result<Option<Self>, DecodeError> {
        match (writer.base(), reader.base()) {
            (AvroSchema::Null, AvroSchema::Null)
            | (AvroSchema::Boolean, AvroSchema::Boolean)
            | (AvroSchema::Int, AvroSchema::Int)
            | (AvroSchema::Long, AvroSchema::Long)
            | (AvroSchema::Float, AvroSchema::Float)
            | (AvroSchema::Double, AvroSchema::Double)
            | (AvroSchema::Bytes, AvroSchema::Bytes)
            | (AvroSchema::String, AvroSchema::String) => Ok(None),

            (AvroSchema::Int, AvroSchema::Long) => Ok(Some(TypePromotion::IntToLong)),
            (AvroSchema::Int, AvroSchema::Float) => Ok(Some(TypePromotion::IntToFloat)),
            (AvroSchema::Int, AvroSchema::Double) => Ok(Some(TypePromotion::IntToDouble)),

            (AvroSchema::Long, AvroSchema::Float) => Ok(Some(TypePromotion::LongToFloat)),
            (AvroSchema::Long, AvroSchema::Double) => Ok(Some(TypePromotion::LongToDouble)),

            (AvroSchema::Float, AvroSchema::Double) => Ok(Some(TypePromotion::FloatToDouble)),

            (AvroSchema::String, AvroSchema::Bytes) => Ok(Some(TypePromotion::StringToBytes)),
            (AvroSchema::Bytes, AvroSchema::String) => Ok(Some(TypePromotion::BytesToString)),

            (writer, reader) => Err(DecodeError::TypeMismatch(format!(
                "Cannot promote {:?} to {:?}",
                writer, reader
            ))),
        }
    }
}

/// Apply a type promotion to a decoded value.
pub fn apply_promotion(
    value: AvroValue,
    promotion: TypePromotion,
) -> Result<AvroValue, DecodeError> {
    match (value, promotion) {
        (AvroValue::Int(v), TypePromotion::IntToLong) => Ok(AvroValue::Long(v as i64)),
        (AvroValue::Int(v), TypePromotion::IntToFloat) => Ok(AvroValue::Float(v as f32)),
        (AvroValue::Int(v), TypePromotion::IntToDouble) => Ok(AvroValue::Double(v as f64)),
        (AvroValue::Long(v), TypePromotion::LongToFloat) => Ok(AvroValue::Float(v as f32)),
        (AvroValue::Long(v), TypePromotion::LongToDouble) => Ok(AvroValue::Double(v as f64)),
        (AvroValue::Float(v), TypePromotion::FloatToDouble) => Ok(AvroValue::Double(v as f64)),
        (AvroValue::String(s), TypePromotion::StringToBytes) => {
            Ok(AvroValue::Bytes(s.into_bytes()))
        }
        (AvroValue::Bytes(b), TypePromotion::BytesToString) => {
            let s = String::from_utf8(b).map_err(|e| {
                DecodeError::InvalidData(format!("Cannot convert bytes to string: {}", e))
            })?;
            Ok(AvroValue::String(s))
        }
        (value, promotion) => Err(DecodeError::TypeMismatch(format!(
            "Cannot apply {:?} promotion to {:?}",
            promotion, value
        ))),
    }
}

/// Whether a writer schema can resolve against a reader schema.
///
/// Named types match by fully-qualified name; primitives match when equal
/// or promotable; containers match structurally.
fn member_matches(writer: &AvroSchema, reader: &AvroSchema) -> bool {
    match (writer.base(), reader.base()) {
        (AvroSchema::Record(w), AvroSchema::Record(r)) => {
            w.fullname() == r.fullname() || r.aliases.iter().any(|a| *a == w.fullname())
        }
        (AvroSchema::Enum(w), AvroSchema::Enum(r)) => w.fullname() == r.fullname(),
        (AvroSchema::Fixed(w), AvroSchema::Fixed(r)) => {
            w.fullname() == r.fullname() && w.size == r.size
        }
        (AvroSchema::Array(_), AvroSchema::Array(_)) => true,
        (AvroSchema::Map(_), AvroSchema::Map(_)) => true,
        (AvroSchema::Union(_), AvroSchema::Union(_)) => true,
        (w, r) => w.is_primitive() && r.is_primitive() && TypePromotion::from_schemas(w, r).is_ok(),
    }
}

/// Decode a value written with `writer`, producing a value laid out per
/// `reader`.
pub fn decode_resolved(
    data: &mut &[u8],
    writer: &AvroSchema,
    reader: &AvroSchema,
) -> Result<AvroValue, DecodeError> {
    match (writer, reader) {
        // Logical wrappers resolve as their bases; interpretation happens
        // during host materialization.
        (AvroSchema::Logical(w), r) => decode_resolved(data, &w.base, r),
        (w, AvroSchema::Logical(r)) => decode_resolved(data, w, &r.base),

        (AvroSchema::Record(w), AvroSchema::Record(r)) => decode_resolved_record(data, w, r),

        (AvroSchema::Array(w), AvroSchema::Array(r)) => {
            let mut items = Vec::new();
            loop {
                let count = crate::binary::decode::decode_long(data)?;
                if count == 0 {
                    break;
                }
                let item_count = if count < 0 {
                    let _byte_size = crate::binary::decode::decode_long(data)?;
                    (-count) as usize
                } else {
                    count as usize
                };
                items.reserve(item_count);
                for _ in 0..item_count {
                    items.push(decode_resolved(data, w, r)?);
                }
            }
            Ok(AvroValue::Array(items))
        }

        (AvroSchema::Map(w), AvroSchema::Map(r)) => {
            let mut entries = Vec::new();
            loop {
                let count = crate::binary::decode::decode_long(data)?;
                if count == 0 {
                    break;
                }
                let entry_count = if count < 0 {
                    let _byte_size = crate::binary::decode::decode_long(data)?;
                    (-count) as usize
                } else {
                    count as usize
                };
                entries.reserve(entry_count);
                for _ in 0..entry_count {
                    let key = crate::binary::decode::decode_string(data)?;
                    entries.push((key, decode_resolved(data, w, r)?));
                }
            }
            Ok(AvroValue::Map(entries))
        }

        (AvroSchema::Union(w_members), AvroSchema::Union(r_members)) => {
            let index = decode_int(data)?;
            let w_member = w_members.get(index as usize).ok_or_else(|| {
                DecodeError::InvalidData(format!(
                    "Union index {} out of range (0..{})",
                    index,
                    w_members.len()
                ))
            })?;
            let (r_index, r_member) = r_members
                .iter()
                .enumerate()
                .find(|(_, r)| member_matches(w_member, r))
                .ok_or_else(|| {
                    DecodeError::TypeMismatch(format!(
                        "Writer union member {:?} matches no reader member",
                        w_member
                    ))
                })?;
            let value = decode_resolved(data, w_member, r_member)?;
            Ok(AvroValue::Union(r_index as i32, Box::new(value)))
        }

        // Writer union against a non-union reader: the written member must
        // resolve against the reader schema directly.
        (AvroSchema::Union(w_members), r) => {
            let index = decode_int(data)?;
            let w_member = w_members.get(index as usize).ok_or_else(|| {
                DecodeError::InvalidData(format!(
                    "Union index {} out of range (0..{})",
                    index,
                    w_members.len()
                ))
            })?;
            decode_resolved(data, w_member, r)
        }

        // Non-union writer against a reader union: wrap with the matching
        // reader member's index.
        (w, AvroSchema::Union(r_members)) => {
            let (r_index, r_member) = r_members
                .iter()
                .enumerate()
                .find(|(_, r)| member_matches(w, r))
                .ok_or_else(|| {
                    DecodeError::TypeMismatch(format!(
                        "Writer schema {:?} matches no reader union member",
                        w
                    ))
                })?;
            let value = decode_resolved(data, w, r_member)?;
            Ok(AvroValue::Union(r_index as i32, Box::new(value)))
        }

        (AvroSchema::Enum(w), AvroSchema::Enum(r)) => {
            let (_, symbol) = crate::binary::decode::decode_enum(data, w)?;
            match r.symbol_index(&symbol) {
                Some(index) => Ok(AvroValue::Enum(index as i32, symbol)),
                None => Err(DecodeError::TypeMismatch(format!(
                    "Symbol '{}' not in reader enum '{}'",
                    symbol, r.name
                ))),
            }
        }

        (AvroSchema::Fixed(w), AvroSchema::Fixed(r)) if w.size == r.size => {
            let bytes = crate::binary::decode::decode_fixed(data, w.size)?;
            Ok(AvroValue::Fixed(bytes))
        }

        // Primitives: decode per writer, widen to the reader type.
        (w, r) => {
            let value = decode_value(data, w)?;
            match TypePromotion::from_schemas(w, r)? {
                Some(promotion) => apply_promotion(value, promotion),
                None => Ok(value),
            }
        }
    }
}

/// Decode a record written with `writer`, producing fields in `reader`
/// order with defaults for reader-only fields.
fn decode_resolved_record(
    data: &mut &[u8],
    writer: &crate::schema::RecordSchema,
    reader: &crate::schema::RecordSchema,
) -> Result<AvroValue, DecodeError> {
    // Decode writer fields in wire order, keeping the ones the reader wants.
    let mut decoded: Vec<Option<AvroValue>> = Vec::with_capacity(writer.fields.len());
    for w_field in &writer.fields {
        let wanted = reader
            .fields
            .iter()
            .find(|r_field| field_names_match(&w_field.name, r_field));
        match wanted {
            Some(r_field) => {
                decoded.push(Some(decode_resolved(data, &w_field.schema, &r_field.schema)?))
            }
            None => {
                skip_value(data, &w_field.schema)?;
                decoded.push(None);
            }
        }
    }

    // Assemble in reader field order.
    let mut fields = Vec::with_capacity(reader.fields.len());
    for r_field in &reader.fields {
        let writer_index = writer
            .fields
            .iter()
            .position(|w_field| field_names_match(&w_field.name, r_field));
        let value = match writer_index {
            Some(index) => decoded[index].take().ok_or_else(|| {
                DecodeError::InvalidData(format!("Writer field {} consumed twice", index))
            })?,
            None => match &r_field.default {
                Some(default) => json_to_avro_value(default, &r_field.schema)?,
                None => {
                    return Err(DecodeError::TypeMismatch(format!(
                        "Reader field '{}' not in writer schema and has no default",
                        r_field.name
                    )));
                }
            },
        };
        fields.push((r_field.name.clone(), value));
    }

    Ok(AvroValue::Record(fields))
}

/// Match a writer field name against a reader field's name or aliases.
fn field_names_match(writer_name: &str, reader_field: &crate::schema::FieldSchema) -> bool {
    reader_field.name == writer_name || reader_field.aliases.iter().any(|a| a == writer_name)
}

/// Convert a JSON default value to the generic form.
///
/// Used when a reader field has a default and the corresponding writer
/// field is missing. Union defaults belong to the union's first member.
pub fn json_to_avro_value(json: &Value, schema: &AvroSchema) -> Result<AvroValue, DecodeError> {
    match (json, schema) {
        (Value::Null, AvroSchema::Null) => Ok(AvroValue::Null),
        (Value::Bool(b), AvroSchema::Boolean) => Ok(AvroValue::Boolean(*b)),

        (Value::Number(n), AvroSchema::Int) => {
            let v = n
                .as_i64()
                .ok_or_else(|| DecodeError::InvalidData(format!("Cannot convert {} to int", n)))?;
            if v < i32::MIN as i64 || v > i32::MAX as i64 {
                return Err(DecodeError::InvalidData(format!(
                    "Value {} out of range for int",
                    v
                )));
            }
            Ok(AvroValue::Int(v as i32))
        }
        (Value::Number(n), AvroSchema::Long) => {
            let v = n
                .as_i64()
                .ok_or_else(|| DecodeError::InvalidData(format!("Cannot convert {} to long", n)))?;
            Ok(AvroValue::Long(v))
        }
        (Value::Number(n), AvroSchema::Float) => {
            let v = n.as_f64().ok_or_else(|| {
                DecodeError::InvalidData(format!("Cannot convert {} to float", n))
            })?;
            Ok(AvroValue::Float(v as f32))
        }
        (Value::Number(n), AvroSchema::Double) => {
            let v = n.as_f64().ok_or_else(|| {
                DecodeError::InvalidData(format!("Cannot convert {} to double", n))
            })?;
            Ok(AvroValue::Double(v))
        }

        (Value::String(s), AvroSchema::String) => Ok(AvroValue::String(s.clone())),

        // Avro encodes bytes defaults as ISO-8859-1 strings
        (Value::String(s), AvroSchema::Bytes) => {
            Ok(AvroValue::Bytes(s.chars().map(|c| c as u8).collect()))
        }
        (Value::String(s), AvroSchema::Fixed(fixed)) => {
            let bytes: Vec<u8> = s.chars().map(|c| c as u8).collect();
            if bytes.len() != fixed.size {
                return Err(DecodeError::InvalidData(format!(
                    "Fixed default has wrong size: expected {}, got {}",
                    fixed.size,
                    bytes.len()
                )));
            }
            Ok(AvroValue::Fixed(bytes))
        }

        (Value::String(s), AvroSchema::Enum(enum_schema)) => {
            let index = enum_schema.symbol_index(s).ok_or_else(|| {
                DecodeError::InvalidData(format!(
                    "Unknown enum symbol '{}' for enum '{}'",
                    s, enum_schema.name
                ))
            })?;
            Ok(AvroValue::Enum(index as i32, s.clone()))
        }

        (Value::Array(arr), AvroSchema::Array(item_schema)) => {
            let items: Result<Vec<AvroValue>, DecodeError> = arr
                .iter()
                .map(|item| json_to_avro_value(item, item_schema))
                .collect();
            Ok(AvroValue::Array(items?))
        }

        (Value::Object(obj), AvroSchema::Map(value_schema)) => {
            let entries: Result<Vec<(String, AvroValue)>, DecodeError> = obj
                .iter()
                .map(|(k, v)| Ok((k.clone(), json_to_avro_value(v, value_schema)?)))
                .collect();
            Ok(AvroValue::Map(entries?))
        }

        (Value::Object(obj), AvroSchema::Record(record_schema)) => {
            let fields: Result<Vec<(String, AvroValue)>, DecodeError> = record_schema
                .fields
                .iter()
                .map(|field| {
                    let value = match obj.get(&field.name) {
                        Some(v) => json_to_avro_value(v, &field.schema)?,
                        None => match &field.default {
                            Some(default) => json_to_avro_value(default, &field.schema)?,
                            None => {
                                return Err(DecodeError::InvalidData(format!(
                                    "Missing required field '{}' in default value",
                                    field.name
                                )));
                            }
                        },
                    };
                    Ok((field.name.clone(), value))
                })
                .collect();
            Ok(AvroValue::Record(fields?))
        }

        // A union default always matches the first member
        (json, AvroSchema::Union(members)) => {
            let first = members
                .first()
                .ok_or_else(|| DecodeError::InvalidData("Empty union".to_string()))?;
            let value = json_to_avro_value(json, first)?;
            Ok(AvroValue::Union(0, Box::new(value)))
        }

        (json, AvroSchema::Logical(logical)) => json_to_avro_value(json, &logical.base),

        (json, schema) => Err(DecodeError::InvalidData(format!(
            "Cannot convert JSON {:?} to schema {:?}",
            json, schema
        ))),
    }
}
