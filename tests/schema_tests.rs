//! Tests for schema inference and schema JSON handling.

use std::sync::Arc;

use avrotype::descriptor::{FieldDescriptor, TypeDescriptor};
use avrotype::schema::{parse_schema, AvroSchema, LogicalName};
use avrotype::value::HostValue;
use avrotype::{infer_schema, infer_schema_for, infer_schema_of, register_type, SchemaError};
use serde_json::json;

fn int_desc() -> Arc<TypeDescriptor> {
    Arc::new(TypeDescriptor::Int)
}

fn str_desc() -> Arc<TypeDescriptor> {
    Arc::new(TypeDescriptor::Str)
}

// ============================================================================
// Record Inference
// ============================================================================

#[test]
fn test_infer_point_record() {
    let point = TypeDescriptor::record(
        "Pt",
        vec![
            FieldDescriptor::new(0, "x", int_desc()),
            FieldDescriptor::new(1, "y", int_desc()),
        ],
    );
    let schema = infer_schema(&point).unwrap();
    assert_eq!(
        schema.to_json(),
        r#"{"type":"record","name":"Pt","fields":[{"name":"x","type":"int"},{"name":"y","type":"int"}]}"#
    );
}

#[test]
fn test_record_namespace_from_fqn() {
    let desc = TypeDescriptor::record(
        "com.example.User",
        vec![FieldDescriptor::new(0, "id", Arc::new(TypeDescriptor::Long))],
    );
    let schema = infer_schema(&desc).unwrap();
    match &*schema {
        AvroSchema::Record(r) => {
            assert_eq!(r.name, "User");
            assert_eq!(r.namespace.as_deref(), Some("com.example"));
            assert_eq!(r.fullname(), "com.example.User");
        }
        other => panic!("Expected record, got {:?}", other),
    }
}

#[test]
fn test_field_aliases_and_doc_attach_to_schema() {
    let desc = TypeDescriptor::record(
        "com.example.Doc",
        vec![FieldDescriptor::new(0, "body", str_desc())
            .with_aliases(vec!["text".to_string()])
            .with_doc("the document body")],
    );
    let schema = infer_schema(&desc).unwrap();
    let json = schema.to_json_value();
    assert_eq!(json["fields"][0]["aliases"], json!(["text"]));
    assert_eq!(json["fields"][0]["doc"], json!("the document body"));
}

// ============================================================================
// Inference Memoization and Determinism
// ============================================================================

#[test]
fn test_inference_is_memoized_on_descriptor_identity() {
    let desc = TypeDescriptor::record(
        "com.example.Memo",
        vec![FieldDescriptor::new(0, "x", int_desc())],
    );
    let first = infer_schema(&desc).unwrap();
    let second = infer_schema(&desc).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_inference_is_deterministic_across_equivalent_descriptors() {
    let build = || {
        TypeDescriptor::record(
            "com.example.Det",
            vec![
                FieldDescriptor::new(0, "a", int_desc()),
                FieldDescriptor::new(1, "b", TypeDescriptor::optional(str_desc())),
            ],
        )
    };
    let first = infer_schema(&build()).unwrap();
    let second = infer_schema(&build()).unwrap();
    assert_eq!(first.to_json(), second.to_json());
}

// ============================================================================
// Option Shape
// ============================================================================

#[test]
fn test_option_infers_null_first_union() {
    let desc = TypeDescriptor::optional(str_desc());
    let schema = infer_schema(&desc).unwrap();
    assert_eq!(
        *schema,
        AvroSchema::Union(vec![AvroSchema::Null, AvroSchema::String])
    );
}

#[test]
fn test_option_field_with_none_default_keeps_null_first() {
    let desc = TypeDescriptor::record(
        "com.example.Named",
        vec![
            FieldDescriptor::new(0, "name", TypeDescriptor::optional(str_desc()))
                .with_default(HostValue::none),
        ],
    );
    let schema = infer_schema(&desc).unwrap();
    let json = schema.to_json_value();
    assert_eq!(json["fields"][0]["type"], json!(["null", "string"]));
    assert!(json["fields"][0].as_object().unwrap().contains_key("default"));
    assert_eq!(json["fields"][0]["default"], serde_json::Value::Null);
}

// ============================================================================
// Sum Types and Union Ordering
// ============================================================================

#[test]
fn test_union_members_ordered_by_ascending_index() {
    let circle = TypeDescriptor::record(
        "shapes.Circle",
        vec![FieldDescriptor::new(0, "r", Arc::new(TypeDescriptor::Double))],
    );
    let square = TypeDescriptor::record(
        "shapes.Square",
        vec![FieldDescriptor::new(0, "s", Arc::new(TypeDescriptor::Double))],
    );
    // Declared out of order on purpose
    let shape = TypeDescriptor::union("shapes.Shape", vec![(1, square), (0, circle)]);

    let schema = infer_schema(&shape).unwrap();
    match &*schema {
        AvroSchema::Union(members) => {
            assert_eq!(members[0].fullname().as_deref(), Some("shapes.Circle"));
            assert_eq!(members[1].fullname().as_deref(), Some("shapes.Square"));
        }
        other => panic!("Expected union, got {:?}", other),
    }
}

#[test]
fn test_duplicate_union_index_is_a_configuration_error() {
    let shape = TypeDescriptor::union("shapes.Bad", vec![(0, int_desc()), (0, str_desc())]);
    assert!(matches!(
        infer_schema(&shape),
        Err(SchemaError::DuplicateUnionIndex { index: 0, .. })
    ));
}

// ============================================================================
// Enums
// ============================================================================

#[test]
fn test_enum_strips_value_suffix_and_keeps_symbol_order() {
    let desc = TypeDescriptor::enumeration("com.example.ColorValue", vec!["RED", "GREEN", "BLUE"]);
    let schema = infer_schema(&desc).unwrap();
    match &*schema {
        AvroSchema::Enum(e) => {
            assert_eq!(e.name, "Color");
            assert_eq!(e.namespace.as_deref(), Some("com.example"));
            assert_eq!(e.symbols, vec!["RED", "GREEN", "BLUE"]);
        }
        other => panic!("Expected enum, got {:?}", other),
    }
}

// ============================================================================
// Newtypes
// ============================================================================

#[test]
fn test_newtype_is_inner_schema_with_logical_marker() {
    let desc = TypeDescriptor::newtype("pkg.Email", str_desc());
    let schema = infer_schema(&desc).unwrap();
    assert_eq!(
        schema.to_json(),
        r#"{"type":"string","logicalType":"pkg.Email"}"#
    );
}

#[test]
fn test_newtype_must_wrap_a_primitive() {
    let desc = TypeDescriptor::newtype("pkg.Bad", TypeDescriptor::list(int_desc()));
    assert!(matches!(
        infer_schema(&desc),
        Err(SchemaError::UnsupportedType(_))
    ));
}

// ============================================================================
// Fixed Bindings
// ============================================================================

#[test]
fn test_fixed_binding_sizes_are_implied_for_int_long_uuid() {
    let desc = TypeDescriptor::record(
        "fx.Sizes",
        vec![
            FieldDescriptor::new(0, "count", int_desc()).with_fixed(None),
            FieldDescriptor::new(1, "total", Arc::new(TypeDescriptor::Long)).with_fixed(None),
            FieldDescriptor::new(2, "id", Arc::new(TypeDescriptor::Uuid)).with_fixed(None),
        ],
    );
    let schema = infer_schema(&desc).unwrap();
    let json = schema.to_json_value();

    assert_eq!(json["fields"][0]["type"]["size"], json!(4));
    assert_eq!(json["fields"][0]["type"]["logicalType"], json!("int"));
    assert_eq!(json["fields"][1]["type"]["size"], json!(8));
    assert_eq!(json["fields"][1]["type"]["logicalType"], json!("long"));
    assert_eq!(json["fields"][2]["type"]["size"], json!(16));
    assert_eq!(json["fields"][2]["type"]["logicalType"], json!("uuid"));
}

#[test]
fn test_fixed_string_requires_explicit_size() {
    let desc = TypeDescriptor::record(
        "fx.Code",
        vec![FieldDescriptor::new(0, "code", str_desc()).with_fixed(None)],
    );
    match infer_schema(&desc) {
        Err(SchemaError::MissingFixedSize(field)) => assert_eq!(field, "code"),
        other => panic!("Expected MissingFixedSize, got {:?}", other.err()),
    }
}

#[test]
fn test_fixed_string_with_size_infers_fixed_schema() {
    let desc = TypeDescriptor::record(
        "fx.Tag",
        vec![FieldDescriptor::new(0, "tag", str_desc()).with_fixed(Some(8))],
    );
    let schema = infer_schema(&desc).unwrap();
    let json = schema.to_json_value();
    assert_eq!(json["fields"][0]["type"]["type"], json!("fixed"));
    assert_eq!(json["fields"][0]["type"]["size"], json!(8));
    assert_eq!(json["fields"][0]["type"]["logicalType"], json!("string"));
}

// ============================================================================
// Default Adaptation
// ============================================================================

#[test]
fn test_empty_map_default_moves_map_member_first() {
    let attrs = Arc::new(TypeDescriptor::Union(avrotype::descriptor::UnionDescriptor {
        fqn: "def.Attrs".to_string(),
        variants: vec![
            (0, Arc::new(TypeDescriptor::Null)),
            (1, TypeDescriptor::map(str_desc())),
        ],
    }));
    let desc = TypeDescriptor::record(
        "def.WithAttrs",
        vec![FieldDescriptor::new(0, "attrs", attrs)
            .with_default(|| HostValue::Map(Default::default()))],
    );
    let schema = infer_schema(&desc).unwrap();
    let json = schema.to_json_value();
    assert_eq!(json["fields"][0]["type"][0]["type"], json!("map"));
    assert_eq!(json["fields"][0]["type"][1], json!("null"));
    assert_eq!(json["fields"][0]["default"], json!({}));
}

#[test]
fn test_empty_list_default_moves_array_member_first() {
    let tags = Arc::new(TypeDescriptor::Union(avrotype::descriptor::UnionDescriptor {
        fqn: "def.Tags".to_string(),
        variants: vec![
            (0, Arc::new(TypeDescriptor::Null)),
            (1, TypeDescriptor::list(str_desc())),
        ],
    }));
    let desc = TypeDescriptor::record(
        "def.WithTags",
        vec![FieldDescriptor::new(0, "tags", tags).with_default(|| HostValue::List(Vec::new()))],
    );
    let schema = infer_schema(&desc).unwrap();
    let json = schema.to_json_value();
    assert_eq!(json["fields"][0]["type"][0]["type"], json!("array"));
    assert_eq!(json["fields"][0]["default"], json!([]));
}

#[test]
fn test_map_of_lists_with_empty_default() {
    let desc = TypeDescriptor::record(
        "def.Tagged",
        vec![
            FieldDescriptor::new(0, "tags", TypeDescriptor::map(TypeDescriptor::list(int_desc())))
                .with_default(|| HostValue::Map(Default::default())),
        ],
    );
    let schema = infer_schema(&desc).unwrap();
    let json = schema.to_json_value();
    assert_eq!(json["fields"][0]["type"]["type"], json!("map"));
    assert_eq!(json["fields"][0]["type"]["values"]["type"], json!("array"));
    assert_eq!(json["fields"][0]["type"]["values"]["items"], json!("int"));
    assert_eq!(json["fields"][0]["default"], json!({}));
}

#[test]
fn test_seeded_list_default_reinfers_item_schema() {
    let tags = Arc::new(TypeDescriptor::Union(avrotype::descriptor::UnionDescriptor {
        fqn: "def.Seeded".to_string(),
        variants: vec![
            (0, Arc::new(TypeDescriptor::Null)),
            (1, TypeDescriptor::list(str_desc())),
        ],
    }));
    let desc = TypeDescriptor::record(
        "def.WithSeed",
        vec![FieldDescriptor::new(0, "tags", tags)
            .with_default(|| HostValue::List(vec![HostValue::Str("seed".to_string())]))],
    );
    let schema = infer_schema(&desc).unwrap();
    let json = schema.to_json_value();
    assert_eq!(json["fields"][0]["type"][0]["items"], json!("string"));
    assert_eq!(json["fields"][0]["default"], json!(["seed"]));
}

// ============================================================================
// Inference from Names and Values
// ============================================================================

#[test]
fn test_infer_schema_for_registered_fqn() {
    let desc = TypeDescriptor::record("reg.ByName", vec![FieldDescriptor::new(0, "x", int_desc())]);
    register_type(&desc);
    let schema = infer_schema_for("reg.ByName").unwrap();
    assert_eq!(schema.fullname().as_deref(), Some("reg.ByName"));
}

#[test]
fn test_infer_schema_for_unregistered_fqn_fails() {
    assert!(matches!(
        infer_schema_for("reg.Missing"),
        Err(SchemaError::UnsupportedType(_))
    ));
}

#[test]
fn test_infer_schema_of_sample_values() {
    assert_eq!(
        *infer_schema_of(&HostValue::Long(1)).unwrap(),
        AvroSchema::Long
    );
    assert_eq!(
        *infer_schema_of(&HostValue::List(vec![HostValue::Int(1)])).unwrap(),
        AvroSchema::Array(Box::new(AvroSchema::Int))
    );

    let desc = TypeDescriptor::record("reg.Sample", vec![FieldDescriptor::new(0, "x", int_desc())]);
    register_type(&desc);
    let value = HostValue::Record {
        fqn: "reg.Sample".to_string(),
        fields: vec![HostValue::Int(1)],
    };
    assert_eq!(
        infer_schema_of(&value).unwrap().fullname().as_deref(),
        Some("reg.Sample")
    );
}

#[test]
fn test_infer_schema_of_empty_collection_fails() {
    assert!(infer_schema_of(&HostValue::List(Vec::new())).is_err());
}

// ============================================================================
// Schema JSON Parsing
// ============================================================================

#[test]
fn test_inferred_schema_json_parses_back_equal() {
    let desc = TypeDescriptor::record(
        "com.example.Round",
        vec![
            FieldDescriptor::new(0, "id", Arc::new(TypeDescriptor::Long)),
            FieldDescriptor::new(1, "name", TypeDescriptor::optional(str_desc())),
            FieldDescriptor::new(
                2,
                "scores",
                TypeDescriptor::list(Arc::new(TypeDescriptor::Double)),
            ),
        ],
    );
    let schema = infer_schema(&desc).unwrap();
    let reparsed = parse_schema(&schema.to_json()).unwrap();
    assert_eq!(*schema, reparsed);
}

#[test]
fn test_parse_recognizes_logical_names_by_value() {
    let parsed =
        parse_schema(r#"{"type":"fixed","name":"id","size":4,"logicalType":"int"}"#).unwrap();
    assert_eq!(parsed.logical(), Some(&LogicalName::IntBytes));
}
