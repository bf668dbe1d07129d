//! Materialization of host values from the generic form.
//!
//! Reading is driven by the reader schema paired with a type descriptor.
//! Record descriptors are resolved from the Avro record's full name through
//! the per-thread descriptor cache; constructors are invoked with the
//! decoded field values in positional order.

use std::rc::Rc;
use std::sync::Arc;

use uuid::Uuid;

use crate::cache;
use crate::descriptor::{ContainerShape, TypeDescriptor};
use crate::error::ReadError;
use crate::schema::{AvroSchema, LogicalName, LogicalSchema, RecordSchema};
use crate::value::{AvroValue, HostValue};

/// Coerces a decoded sequence into the descriptor's container shape.
pub type Coercer = Rc<dyn Fn(Vec<HostValue>) -> HostValue>;

/// Resolves the variant descriptor a decoded union member belongs to.
pub type UnionReader = Rc<dyn Fn(usize, &AvroSchema) -> Result<Arc<TypeDescriptor>, ReadError>>;

/// Materialize a host value from the generic form.
pub fn read_value(
    value: AvroValue,
    schema: &AvroSchema,
    descriptor: &Arc<TypeDescriptor>,
) -> Result<HostValue, ReadError> {
    // An optional descriptor against a non-union schema wraps the payload;
    // the writer side may have dropped the null member entirely.
    if let TypeDescriptor::Optional(inner) = &**descriptor {
        if !matches!(schema, AvroSchema::Union(_)) {
            return match value {
                AvroValue::Null => Ok(HostValue::none()),
                other => Ok(HostValue::some(read_value(other, schema, inner)?)),
            };
        }
    }

    match schema {
        AvroSchema::Logical(logical) => read_logical(value, logical, descriptor),

        AvroSchema::Null => match value {
            AvroValue::Null => Ok(HostValue::Null),
            other => shape_error(&other, descriptor),
        },

        AvroSchema::Boolean
        | AvroSchema::Int
        | AvroSchema::Long
        | AvroSchema::Float
        | AvroSchema::Double
        | AvroSchema::String
        | AvroSchema::Bytes => read_primitive(value, descriptor),

        AvroSchema::Fixed(_) => match value {
            AvroValue::Fixed(bytes) => read_raw_fixed(bytes, descriptor),
            other => shape_error(&other, descriptor),
        },

        AvroSchema::Enum(_) => match (value, &**descriptor) {
            (AvroValue::Enum(_, symbol), TypeDescriptor::Enum(e)) => e.with_name(&symbol),
            (other, _) => shape_error(&other, descriptor),
        },

        AvroSchema::Array(item_schema) => {
            let AvroValue::Array(items) = value else {
                return shape_error(&value, descriptor);
            };
            let item_descriptor = match &**descriptor {
                TypeDescriptor::Sequence { item, .. } => Arc::clone(item),
                _ => return shape_error(&AvroValue::Array(items), descriptor),
            };
            let read: Result<Vec<HostValue>, ReadError> = items
                .into_iter()
                .map(|item| read_value(item, item_schema, &item_descriptor))
                .collect();
            let coerce = coercer(descriptor);
            Ok((*coerce)(read?))
        }

        AvroSchema::Map(value_schema) => {
            let AvroValue::Map(entries) = value else {
                return shape_error(&value, descriptor);
            };
            let value_descriptor = match &**descriptor {
                TypeDescriptor::Map(value) => Arc::clone(value),
                _ => return shape_error(&AvroValue::Map(entries), descriptor),
            };
            let mut map = std::collections::BTreeMap::new();
            for (key, entry) in entries {
                map.insert(key, read_value(entry, value_schema, &value_descriptor)?);
            }
            Ok(HostValue::Map(map))
        }

        AvroSchema::Union(members) => read_union(value, members, descriptor),

        AvroSchema::Record(record_schema) => read_record(value, record_schema, descriptor),
    }
}

/// Derive the descriptor a schema materializes into by default.
///
/// Records resolve through the registry by full name; enums fall back to a
/// structural descriptor built from the schema's own symbols; primitives
/// and containers are structural.
pub fn descriptor_for_schema(schema: &AvroSchema) -> Result<Arc<TypeDescriptor>, ReadError> {
    match schema {
        AvroSchema::Null => Ok(Arc::new(TypeDescriptor::Null)),
        AvroSchema::Boolean => Ok(Arc::new(TypeDescriptor::Boolean)),
        AvroSchema::Int => Ok(Arc::new(TypeDescriptor::Int)),
        AvroSchema::Long => Ok(Arc::new(TypeDescriptor::Long)),
        AvroSchema::Float => Ok(Arc::new(TypeDescriptor::Float)),
        AvroSchema::Double => Ok(Arc::new(TypeDescriptor::Double)),
        AvroSchema::String => Ok(Arc::new(TypeDescriptor::Str)),
        AvroSchema::Bytes | AvroSchema::Fixed(_) => Ok(Arc::new(TypeDescriptor::Bytes)),

        AvroSchema::Logical(logical) => match &logical.name {
            LogicalName::Uuid => Ok(Arc::new(TypeDescriptor::Uuid)),
            LogicalName::IntBytes => Ok(Arc::new(TypeDescriptor::Int)),
            LogicalName::LongBytes => Ok(Arc::new(TypeDescriptor::Long)),
            LogicalName::StringBytes => Ok(Arc::new(TypeDescriptor::Str)),
            LogicalName::Custom(fqn) => match cache::descriptor_of(fqn) {
                Some(descriptor) => Ok(descriptor),
                None => descriptor_for_schema(&logical.base),
            },
        },

        AvroSchema::Array(item) => Ok(TypeDescriptor::list(descriptor_for_schema(item)?)),
        AvroSchema::Map(value) => Ok(TypeDescriptor::map(descriptor_for_schema(value)?)),

        AvroSchema::Enum(e) => match cache::descriptor_of(&e.fullname()) {
            Some(descriptor) => Ok(descriptor),
            None => Ok(TypeDescriptor::enumeration(
                e.fullname(),
                e.symbols.iter().map(|s| s.as_str()).collect(),
            )),
        },

        AvroSchema::Record(r) => {
            let fullname = r.fullname();
            cache::descriptor_of(&fullname).ok_or(ReadError::UnknownType(fullname))
        }

        AvroSchema::Union(members) => {
            if members.len() == 2 && members.iter().any(|m| matches!(m, AvroSchema::Null)) {
                let inner = members
                    .iter()
                    .find(|m| !matches!(m, AvroSchema::Null))
                    .expect("two-member nullable union has a non-null member");
                return Ok(TypeDescriptor::optional(descriptor_for_schema(inner)?));
            }
            let variants: Result<Vec<(u32, Arc<TypeDescriptor>)>, ReadError> = members
                .iter()
                .enumerate()
                .map(|(i, member)| Ok((i as u32, descriptor_for_schema(member)?)))
                .collect();
            Ok(TypeDescriptor::union(String::new(), variants?))
        }
    }
}

fn read_primitive(
    value: AvroValue,
    descriptor: &Arc<TypeDescriptor>,
) -> Result<HostValue, ReadError> {
    // A peer that stripped the logical marker still materializes the
    // newtype when the descriptor declares one.
    if let TypeDescriptor::Newtype(n) = &**descriptor {
        let raw = read_primitive(value, &n.inner)?;
        return Ok(HostValue::Newtype {
            fqn: n.fqn.clone(),
            value: Box::new(raw),
        });
    }

    match (value, &**descriptor) {
        (AvroValue::Boolean(b), TypeDescriptor::Boolean) => Ok(HostValue::Boolean(b)),
        (AvroValue::Int(i), TypeDescriptor::Int) => Ok(HostValue::Int(i)),
        (AvroValue::Int(i), TypeDescriptor::Long) => Ok(HostValue::Long(i as i64)),
        (AvroValue::Long(l), TypeDescriptor::Long) => Ok(HostValue::Long(l)),
        (AvroValue::Float(f), TypeDescriptor::Float) => Ok(HostValue::Float(f)),
        (AvroValue::Float(f), TypeDescriptor::Double) => Ok(HostValue::Double(f as f64)),
        (AvroValue::Double(d), TypeDescriptor::Double) => Ok(HostValue::Double(d)),
        (AvroValue::String(s), TypeDescriptor::Str) => Ok(HostValue::Str(s)),
        (AvroValue::Bytes(b), TypeDescriptor::Bytes) => Ok(HostValue::Bytes(b)),
        (value, _) => shape_error(&value, descriptor),
    }
}

/// Apply a fixed schema's logical interpretation.
fn read_logical(
    value: AvroValue,
    logical: &LogicalSchema,
    descriptor: &Arc<TypeDescriptor>,
) -> Result<HostValue, ReadError> {
    match &logical.name {
        LogicalName::Uuid => match value {
            AvroValue::Fixed(bytes) if bytes.len() == 16 => {
                let uuid = Uuid::from_slice(&bytes).map_err(|e| ReadError::Shape {
                    value: format!("fixed[{}]", bytes.len()),
                    target: format!("uuid: {}", e),
                })?;
                Ok(HostValue::Uuid(uuid))
            }
            other => shape_error(&other, descriptor),
        },

        LogicalName::IntBytes => match value {
            AvroValue::Fixed(bytes) => Ok(HostValue::Int(big_endian_long(&bytes) as i32)),
            other => shape_error(&other, descriptor),
        },

        LogicalName::LongBytes => match value {
            AvroValue::Fixed(bytes) => Ok(HostValue::Long(big_endian_long(&bytes))),
            other => shape_error(&other, descriptor),
        },

        LogicalName::StringBytes => match value {
            AvroValue::Fixed(bytes) => {
                let end = bytes
                    .iter()
                    .rposition(|&b| b != 0)
                    .map_or(0, |last| last + 1);
                let s = String::from_utf8(bytes[..end].to_vec()).map_err(|e| ReadError::Shape {
                    value: "fixed".to_string(),
                    target: format!("string: {}", e),
                })?;
                Ok(HostValue::Str(s))
            }
            other => shape_error(&other, descriptor),
        },

        // A known fqn reconstructs the newtype; an unknown one returns the
        // underlying value unchanged, preserving forward compatibility.
        LogicalName::Custom(fqn) => {
            let inner_descriptor = match &**descriptor {
                TypeDescriptor::Newtype(n) => Arc::clone(&n.inner),
                _ => Arc::clone(descriptor),
            };
            let raw = read_value(value, &logical.base, &inner_descriptor)?;
            match cache::descriptor_of(fqn).as_deref() {
                Some(TypeDescriptor::Newtype(_)) => Ok(HostValue::Newtype {
                    fqn: fqn.clone(),
                    value: Box::new(raw),
                }),
                _ => Ok(raw),
            }
        }
    }
}

/// Big-endian integer interpretation of the full byte array.
fn big_endian_long(bytes: &[u8]) -> i64 {
    bytes.iter().fold(0i64, |acc, &b| (acc << 8) | b as i64)
}

/// Raw fixed bytes with no logical interpretation.
fn read_raw_fixed(
    bytes: Vec<u8>,
    descriptor: &Arc<TypeDescriptor>,
) -> Result<HostValue, ReadError> {
    match &**descriptor {
        TypeDescriptor::Uuid if bytes.len() == 16 => {
            let uuid = Uuid::from_slice(&bytes).expect("sixteen bytes form a uuid");
            Ok(HostValue::Uuid(uuid))
        }
        _ => Ok(HostValue::Bytes(bytes)),
    }
}

fn read_union(
    value: AvroValue,
    members: &[AvroSchema],
    descriptor: &Arc<TypeDescriptor>,
) -> Result<HostValue, ReadError> {
    let AvroValue::Union(index, inner) = value else {
        return Err(ReadError::IllegalTopLevel(format!(
            "{} datum against a union schema",
            value.kind()
        )));
    };
    let index = index as usize;
    let member = members.get(index).ok_or_else(|| ReadError::Shape {
        value: format!("union index {}", index),
        target: format!("union of {} members", members.len()),
    })?;

    // Option-shaped target: null maps to None, anything else to Some.
    if let TypeDescriptor::Optional(inner_descriptor) = &**descriptor {
        return match *inner {
            AvroValue::Null => Ok(HostValue::none()),
            payload => Ok(HostValue::some(read_value(
                payload,
                member,
                inner_descriptor,
            )?)),
        };
    }

    if matches!(member, AvroSchema::Null) {
        return Ok(HostValue::Null);
    }

    // Sealed sum: the variant's host descriptor is discovered through the
    // union reader, positionally for union descriptors and by full name
    // otherwise.
    let resolve = union_reader(descriptor);
    let variant = (*resolve)(index, member)?;
    read_value(*inner, member, &variant)
}

fn read_record(
    value: AvroValue,
    record_schema: &RecordSchema,
    descriptor: &Arc<TypeDescriptor>,
) -> Result<HostValue, ReadError> {
    let AvroValue::Record(values) = value else {
        return shape_error(&value, descriptor);
    };

    let fullname = record_schema.fullname();
    let target = match cache::descriptor_of(&fullname) {
        Some(found) if matches!(&*found, TypeDescriptor::Record(_)) => found,
        _ if matches!(&**descriptor, TypeDescriptor::Record(_)) => Arc::clone(descriptor),
        _ => return Err(ReadError::UnknownType(fullname)),
    };
    let TypeDescriptor::Record(record) = &*target else {
        unreachable!("target descriptor is a record");
    };

    if record.fields.len() != record_schema.fields.len()
        || values.len() != record_schema.fields.len()
    {
        return Err(ReadError::Shape {
            value: format!("record of {} fields", values.len()),
            target: format!("'{}' with {} fields", record.fqn, record.fields.len()),
        });
    }

    let mut args = Vec::with_capacity(values.len());
    for ((field_schema, field_descriptor), (_, field_value)) in record_schema
        .fields
        .iter()
        .zip(&record.fields)
        .zip(values)
    {
        args.push(read_value(
            field_value,
            &field_schema.schema,
            &field_descriptor.descriptor,
        )?);
    }

    let constructor =
        cache::constructor_of(&record.fqn).unwrap_or_else(|| Arc::clone(&record.constructor));
    (constructor)(args)
}

/// The cached container coercer for a sequence descriptor.
fn coercer(descriptor: &Arc<TypeDescriptor>) -> Coercer {
    cache::coercer_of(descriptor, || {
        let shape = match &**descriptor {
            TypeDescriptor::Sequence { shape, .. } => *shape,
            _ => ContainerShape::List,
        };
        Rc::new(move |items: Vec<HostValue>| match shape {
            ContainerShape::List => HostValue::List(items),
            ContainerShape::Deque => HostValue::Deque(items),
            ContainerShape::Set => {
                let mut unique: Vec<HostValue> = Vec::with_capacity(items.len());
                for item in items {
                    if !unique.contains(&item) {
                        unique.push(item);
                    }
                }
                HostValue::Set(unique)
            }
        })
    })
}

/// The cached union reader for a descriptor.
fn union_reader(descriptor: &Arc<TypeDescriptor>) -> UnionReader {
    cache::union_reader_of(descriptor, || match &**descriptor {
        TypeDescriptor::Union(u) => {
            let variants: Vec<Arc<TypeDescriptor>> = u
                .sorted_variants()
                .into_iter()
                .map(|(_, variant)| variant)
                .collect();
            Rc::new(move |index, member| match variants.get(index) {
                Some(variant) => Ok(Arc::clone(variant)),
                None => resolve_member(member),
            })
        }
        _ => Rc::new(|_, member| resolve_member(member)),
    })
}

/// Discover a union member's host descriptor by its full name, falling back
/// to a structural descriptor for unnamed members.
fn resolve_member(member: &AvroSchema) -> Result<Arc<TypeDescriptor>, ReadError> {
    match member.fullname() {
        Some(fullname) => match cache::descriptor_of(&fullname) {
            Some(descriptor) => Ok(descriptor),
            None => descriptor_for_schema(member),
        },
        None => descriptor_for_schema(member),
    }
}

fn shape_error(value: &AvroValue, descriptor: &Arc<TypeDescriptor>) -> Result<HostValue, ReadError> {
    Err(ReadError::Shape {
        value: value.kind().to_string(),
        target: descriptor.kind().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_widens_to_long_descriptor() {
        let descriptor = Arc::new(TypeDescriptor::Long);
        let value = read_value(AvroValue::Int(7), &AvroSchema::Int, &descriptor).unwrap();
        assert_eq!(value, HostValue::Long(7));
    }

    #[test]
    fn fixed_string_trims_trailing_zeros() {
        let logical = LogicalSchema::new(
            AvroSchema::Fixed(crate::schema::FixedSchema::new("code", 6)),
            LogicalName::StringBytes,
        );
        let descriptor = Arc::new(TypeDescriptor::Str);
        let value = read_value(
            AvroValue::Fixed(vec![b'a', b'b', b'c', 0, 0, 0]),
            &AvroSchema::Logical(logical),
            &descriptor,
        )
        .unwrap();
        assert_eq!(value, HostValue::Str("abc".to_string()));
    }

    #[test]
    fn fixed_int_reads_big_endian() {
        let logical = LogicalSchema::new(
            AvroSchema::Fixed(crate::schema::FixedSchema::new("count", 4)),
            LogicalName::IntBytes,
        );
        let descriptor = Arc::new(TypeDescriptor::Int);
        let value = read_value(
            AvroValue::Fixed(vec![0x00, 0x00, 0x01, 0x02]),
            &AvroSchema::Logical(logical),
            &descriptor,
        )
        .unwrap();
        assert_eq!(value, HostValue::Int(258));
    }

    #[test]
    fn unknown_logical_fqn_returns_underlying_value() {
        let logical = LogicalSchema::new(
            AvroSchema::String,
            LogicalName::Custom("test.read.NeverRegistered".to_string()),
        );
        let descriptor = Arc::new(TypeDescriptor::Str);
        let value = read_value(
            AvroValue::String("plain".to_string()),
            &AvroSchema::Logical(logical),
            &descriptor,
        )
        .unwrap();
        assert_eq!(value, HostValue::Str("plain".to_string()));
    }

    #[test]
    fn set_coercion_deduplicates() {
        let descriptor = TypeDescriptor::set(Arc::new(TypeDescriptor::Int));
        let value = read_value(
            AvroValue::Array(vec![AvroValue::Int(1), AvroValue::Int(1), AvroValue::Int(2)]),
            &AvroSchema::Array(Box::new(AvroSchema::Int)),
            &descriptor,
        )
        .unwrap();
        assert_eq!(value, HostValue::Set(vec![HostValue::Int(1), HostValue::Int(2)]));
    }

    #[test]
    fn nullable_union_reads_into_option() {
        let descriptor = TypeDescriptor::optional(Arc::new(TypeDescriptor::Str));
        let schema = AvroSchema::Union(vec![AvroSchema::Null, AvroSchema::String]);

        let none = read_value(
            AvroValue::Union(0, Box::new(AvroValue::Null)),
            &schema,
            &descriptor,
        )
        .unwrap();
        assert_eq!(none, HostValue::none());

        let some = read_value(
            AvroValue::Union(1, Box::new(AvroValue::String("x".to_string()))),
            &schema,
            &descriptor,
        )
        .unwrap();
        assert_eq!(some, HostValue::some(HostValue::Str("x".to_string())));
    }
}
