//! Schema inference from type descriptors.
//!
//! Translates a [`TypeDescriptor`] into an Avro schema, applying fixed-size
//! bindings, logical types, and field defaults. Results are memoized
//! per-thread on descriptor identity, so repeated use of a type pays for
//! inference once.

use std::sync::Arc;

use tracing::debug;

use crate::cache;
use crate::descriptor::{
    namespace_of, simple_name, FieldDescriptor, RecordDescriptor, TypeDescriptor, UnionDescriptor,
};
use crate::error::SchemaError;
use crate::extract::extract;
use crate::schema::{
    AvroSchema, EnumSchema, FieldSchema, FixedSchema, LogicalName, LogicalSchema, RecordSchema,
};
use crate::value::{AvroValue, HostValue};

/// Infer the Avro schema for a descriptor. Memoized on descriptor identity.
pub fn infer_schema(descriptor: &Arc<TypeDescriptor>) -> Result<Arc<AvroSchema>, SchemaError> {
    cache::schema_of(descriptor, || Ok(Arc::new(infer_uncached(descriptor)?)))
}

/// Infer the Avro schema for a registered type by fully-qualified name.
pub fn infer_schema_for(fqn: &str) -> Result<Arc<AvroSchema>, SchemaError> {
    let descriptor = cache::descriptor_of(fqn)
        .ok_or_else(|| SchemaError::UnsupportedType(format!("Unregistered type '{}'", fqn)))?;
    infer_schema(&descriptor)
}

/// Infer the Avro schema for a sample value.
///
/// Records, newtypes and enums resolve through the registry by their
/// fully-qualified name; collections infer structurally from their first
/// element, so empty untyped collections cannot be inferred.
pub fn infer_schema_of(value: &HostValue) -> Result<Arc<AvroSchema>, SchemaError> {
    match value {
        HostValue::Record { fqn, .. } | HostValue::Newtype { fqn, .. } => infer_schema_for(fqn),
        other => Ok(Arc::new(infer_value_schema(other)?)),
    }
}

fn infer_value_schema(value: &HostValue) -> Result<AvroSchema, SchemaError> {
    match value {
        HostValue::Null => Ok(AvroSchema::Null),
        HostValue::Boolean(_) => Ok(AvroSchema::Boolean),
        HostValue::Int(_) => Ok(AvroSchema::Int),
        HostValue::Long(_) => Ok(AvroSchema::Long),
        HostValue::Float(_) => Ok(AvroSchema::Float),
        HostValue::Double(_) => Ok(AvroSchema::Double),
        HostValue::Str(_) => Ok(AvroSchema::String),
        HostValue::Bytes(_) => Ok(AvroSchema::Bytes),
        HostValue::Uuid(_) => Ok(uuid_schema("UUID")),
        HostValue::Record { fqn, .. } | HostValue::Newtype { fqn, .. } => {
            Ok((*infer_schema_for(fqn)?).clone())
        }
        HostValue::Optional(Some(inner)) => Ok(AvroSchema::Union(vec![
            AvroSchema::Null,
            infer_value_schema(inner)?,
        ])),
        HostValue::List(items) | HostValue::Set(items) | HostValue::Deque(items) => {
            let first = items.first().ok_or_else(|| {
                SchemaError::UnsupportedType(
                    "Cannot infer an item schema from an empty sequence".to_string(),
                )
            })?;
            Ok(AvroSchema::Array(Box::new(infer_value_schema(first)?)))
        }
        HostValue::Map(entries) => {
            let first = entries.values().next().ok_or_else(|| {
                SchemaError::UnsupportedType(
                    "Cannot infer a value schema from an empty map".to_string(),
                )
            })?;
            Ok(AvroSchema::Map(Box::new(infer_value_schema(first)?)))
        }
        other => Err(SchemaError::UnsupportedType(format!(
            "Cannot infer a schema from a bare {} value",
            other.kind()
        ))),
    }
}

fn infer_uncached(descriptor: &Arc<TypeDescriptor>) -> Result<AvroSchema, SchemaError> {
    match &**descriptor {
        TypeDescriptor::Null => Ok(AvroSchema::Null),
        TypeDescriptor::Boolean => Ok(AvroSchema::Boolean),
        TypeDescriptor::Int => Ok(AvroSchema::Int),
        TypeDescriptor::Long => Ok(AvroSchema::Long),
        TypeDescriptor::Float => Ok(AvroSchema::Float),
        TypeDescriptor::Double => Ok(AvroSchema::Double),
        TypeDescriptor::Str => Ok(AvroSchema::String),
        TypeDescriptor::Bytes => Ok(AvroSchema::Bytes),
        TypeDescriptor::Uuid => Ok(uuid_schema("UUID")),

        TypeDescriptor::Optional(inner) => Ok(AvroSchema::Union(vec![
            AvroSchema::Null,
            (*infer_schema(inner)?).clone(),
        ])),

        TypeDescriptor::Sequence { item, .. } => Ok(AvroSchema::Array(Box::new(
            (*infer_schema(item)?).clone(),
        ))),

        TypeDescriptor::Map(value) => Ok(AvroSchema::Map(Box::new(
            (*infer_schema(value)?).clone(),
        ))),

        TypeDescriptor::Enum(e) => {
            let mut schema = EnumSchema::new(enum_name(&e.fqn), e.symbols.clone());
            if let Some(ns) = namespace_of(&e.fqn) {
                schema = schema.with_namespace(ns);
            }
            Ok(AvroSchema::Enum(schema))
        }

        TypeDescriptor::Newtype(n) => {
            let base = (*infer_schema(&n.inner)?).clone();
            if !base.is_primitive() {
                return Err(SchemaError::UnsupportedType(format!(
                    "Newtype '{}' must wrap a primitive, not {:?}",
                    n.fqn, base
                )));
            }
            Ok(AvroSchema::Logical(LogicalSchema::new(
                base,
                LogicalName::Custom(n.fqn.clone()),
            )))
        }

        TypeDescriptor::Union(u) => union_schema(u),

        TypeDescriptor::Record(r) => record_schema(r),
    }
}

fn uuid_schema(name: &str) -> AvroSchema {
    AvroSchema::Logical(LogicalSchema::new(
        AvroSchema::Fixed(FixedSchema::new(name, 16)),
        LogicalName::Uuid,
    ))
}

/// Strip the `Value` suffix hosts append to enum type names.
fn enum_name(fqn: &str) -> String {
    let simple = simple_name(fqn);
    match simple.strip_suffix("Value") {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => simple.to_string(),
    }
}

/// Emit a union whose member order is the ascending `unionIndex` order.
fn union_schema(descriptor: &UnionDescriptor) -> Result<AvroSchema, SchemaError> {
    let variants = descriptor.sorted_variants();
    for window in variants.windows(2) {
        if window[0].0 == window[1].0 {
            return Err(SchemaError::DuplicateUnionIndex {
                fqn: descriptor.fqn.clone(),
                index: window[0].0,
            });
        }
    }

    let members: Result<Vec<AvroSchema>, SchemaError> = variants
        .iter()
        .map(|(_, variant)| Ok((*infer_schema(variant)?).clone()))
        .collect();

    Ok(AvroSchema::Union(members?))
}

fn record_schema(descriptor: &RecordDescriptor) -> Result<AvroSchema, SchemaError> {
    debug!(fqn = %descriptor.fqn, "inferring record schema");

    let mut fields = Vec::with_capacity(descriptor.fields.len());
    for field in &descriptor.fields {
        fields.push(infer_field(field)?);
    }

    let mut record = RecordSchema::new(simple_name(&descriptor.fqn), fields);
    if let Some(ns) = namespace_of(&descriptor.fqn) {
        record = record.with_namespace(ns);
    }
    Ok(AvroSchema::Record(record))
}

fn infer_field(field: &FieldDescriptor) -> Result<FieldSchema, SchemaError> {
    let mut schema = match &field.fixed {
        Some(binding) => fixed_field_schema(field, binding.size)?,
        None => (*infer_schema(&field.descriptor)?).clone(),
    };

    let mut default_json = None;
    if let Some(producer) = &field.default {
        let default_value = (producer)();
        let generic = extract(&default_value, &schema).map_err(|e| {
            SchemaError::InvalidSchema(format!(
                "Default for field '{}' does not fit its schema: {}",
                field.name, e
            ))
        })?;

        // The Avro spec requires a union default to belong to the union's
        // first member; reorder the union so the matching member leads.
        if let (AvroSchema::Union(members), AvroValue::Union(index, inner)) = (&schema, &generic) {
            let adapted = adapt_union_for_default(members.clone(), *index as usize, inner);
            default_json = Some(inner.to_default_json());
            schema = AvroSchema::Union(adapted);
        } else {
            default_json = Some(generic.to_default_json());
        }
    }

    let mut field_schema = FieldSchema::new(field.name.clone(), schema);
    field_schema.aliases = field.aliases.clone();
    field_schema.doc = field.doc.clone();
    field_schema.default = default_json;
    Ok(field_schema)
}

/// A fixed binding overrides primitive inference on a field. Sizes are
/// implied for int, long and uuid; string and bytes require one.
fn fixed_field_schema(
    field: &FieldDescriptor,
    size: Option<usize>,
) -> Result<AvroSchema, SchemaError> {
    let fixed = |size| AvroSchema::Fixed(FixedSchema::new(field.name.clone(), size));
    match &*field.descriptor {
        TypeDescriptor::Int => Ok(AvroSchema::Logical(LogicalSchema::new(
            fixed(4),
            LogicalName::IntBytes,
        ))),
        TypeDescriptor::Long => Ok(AvroSchema::Logical(LogicalSchema::new(
            fixed(8),
            LogicalName::LongBytes,
        ))),
        TypeDescriptor::Uuid => Ok(AvroSchema::Logical(LogicalSchema::new(
            fixed(16),
            LogicalName::Uuid,
        ))),
        TypeDescriptor::Str => {
            let size = size.ok_or_else(|| SchemaError::MissingFixedSize(field.name.clone()))?;
            Ok(AvroSchema::Logical(LogicalSchema::new(
                fixed(size),
                LogicalName::StringBytes,
            )))
        }
        TypeDescriptor::Bytes => {
            let size = size.ok_or_else(|| SchemaError::MissingFixedSize(field.name.clone()))?;
            Ok(fixed(size))
        }
        other => Err(SchemaError::UnsupportedType(format!(
            "Fixed binding on field '{}' is not supported for {} types",
            field.name,
            other.kind()
        ))),
    }
}

/// Move the member the default belongs to in front of the union.
///
/// When the default seeds a non-empty array or map, the member's element or
/// value schema is re-inferred from that first element, which handles
/// heterogeneous-seed defaults.
fn adapt_union_for_default(
    mut members: Vec<AvroSchema>,
    index: usize,
    default: &AvroValue,
) -> Vec<AvroSchema> {
    if index >= members.len() {
        return members;
    }
    let mut member = members.remove(index);
    if let Some(refined) = refine_from_seed(&member, default) {
        member = refined;
    }
    members.insert(0, member);
    members
}

fn refine_from_seed(member: &AvroSchema, default: &AvroValue) -> Option<AvroSchema> {
    match (member, default) {
        (AvroSchema::Array(_), AvroValue::Array(items)) => {
            let first = items.first()?;
            Some(AvroSchema::Array(Box::new(schema_of_generic(first)?)))
        }
        (AvroSchema::Map(_), AvroValue::Map(entries)) => {
            let (_, first) = entries.first()?;
            Some(AvroSchema::Map(Box::new(schema_of_generic(first)?)))
        }
        _ => None,
    }
}

/// Structural schema of a generic value, where one is unambiguous.
fn schema_of_generic(value: &AvroValue) -> Option<AvroSchema> {
    match value {
        AvroValue::Null => Some(AvroSchema::Null),
        AvroValue::Boolean(_) => Some(AvroSchema::Boolean),
        AvroValue::Int(_) => Some(AvroSchema::Int),
        AvroValue::Long(_) => Some(AvroSchema::Long),
        AvroValue::Float(_) => Some(AvroSchema::Float),
        AvroValue::Double(_) => Some(AvroSchema::Double),
        AvroValue::Bytes(_) => Some(AvroSchema::Bytes),
        AvroValue::String(_) => Some(AvroSchema::String),
        AvroValue::Array(items) => {
            let first = items.first()?;
            Some(AvroSchema::Array(Box::new(schema_of_generic(first)?)))
        }
        AvroValue::Map(entries) => {
            let (_, first) = entries.first()?;
            Some(AvroSchema::Map(Box::new(schema_of_generic(first)?)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_name_strips_value_suffix() {
        assert_eq!(enum_name("com.example.ColorValue"), "Color");
        assert_eq!(enum_name("com.example.Color"), "Color");
        assert_eq!(enum_name("com.example.Value"), "Value");
    }

    #[test]
    fn duplicate_union_index_rejected() {
        let descriptor = UnionDescriptor {
            fqn: "test.infer.Dup".to_string(),
            variants: vec![
                (0, Arc::new(TypeDescriptor::Int)),
                (0, Arc::new(TypeDescriptor::Str)),
            ],
        };
        assert!(matches!(
            union_schema(&descriptor),
            Err(SchemaError::DuplicateUnionIndex { index: 0, .. })
        ));
    }

    #[test]
    fn adapt_union_moves_default_member_first() {
        let members = vec![AvroSchema::Null, AvroSchema::String];
        let adapted = adapt_union_for_default(members, 1, &AvroValue::String("x".to_string()));
        assert_eq!(adapted, vec![AvroSchema::String, AvroSchema::Null]);
    }

    #[test]
    fn adapt_union_refines_seeded_array() {
        let members = vec![
            AvroSchema::Null,
            AvroSchema::Array(Box::new(AvroSchema::String)),
        ];
        let seed = AvroValue::Array(vec![AvroValue::Long(1)]);
        let adapted = adapt_union_for_default(members, 1, &seed);
        assert_eq!(adapted[0], AvroSchema::Array(Box::new(AvroSchema::Long)));
    }
}
