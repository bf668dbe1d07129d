//! Host-side type descriptors.
//!
//! A [`TypeDescriptor`] is a tagged description of a host type, built once
//! (by hand or by a generator) and immutable for the process lifetime. It
//! drives schema inference, extraction, and reading. Record descriptors
//! carry a constructor closure in place of runtime reflection.

use std::fmt;
use std::sync::Arc;

use crate::error::ReadError;
use crate::value::HostValue;

/// Builds a host value from positional constructor arguments.
pub type Constructor = Arc<dyn Fn(Vec<HostValue>) -> Result<HostValue, ReadError> + Send + Sync>;

/// Produces a field's default value.
pub type DefaultFn = Arc<dyn Fn() -> HostValue + Send + Sync>;

/// The container flavor a sequence descriptor coerces into on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerShape {
    /// `Vec`-shaped sequence.
    List,
    /// Unique elements, insertion order preserved.
    Set,
    /// Double-ended queue shape.
    Deque,
}

/// A tagged description of a host type.
#[derive(Clone)]
pub enum TypeDescriptor {
    /// Unit type with no value.
    Null,
    /// Boolean.
    Boolean,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// UTF-8 string.
    Str,
    /// Byte array.
    Bytes,
    /// UUID, carried on the wire as a 16-byte big-endian fixed.
    Uuid,
    /// Nullable wrapper; maps to the Avro union `[null, T]`.
    Optional(Arc<TypeDescriptor>),
    /// Homogeneous sequence with a declared container shape.
    Sequence {
        /// The host container the reader coerces into.
        shape: ContainerShape,
        /// Element descriptor.
        item: Arc<TypeDescriptor>,
    },
    /// Map with string keys.
    Map(Arc<TypeDescriptor>),
    /// Enumeration with ordered symbols.
    Enum(EnumDescriptor),
    /// Labeled wrapper around a single primitive.
    Newtype(NewtypeDescriptor),
    /// Record with ordered named fields and a constructor.
    Record(RecordDescriptor),
    /// Sealed sum type; variants carry explicit union indices.
    Union(UnionDescriptor),
}

/// Descriptor for an enumeration.
#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    /// Fully-qualified host type name.
    pub fqn: String,
    /// Symbol names in declaration order.
    pub symbols: Vec<String>,
}

impl EnumDescriptor {
    /// The `withName` equivalent: validate a symbol against the declaration.
    pub fn with_name(&self, symbol: &str) -> Result<HostValue, ReadError> {
        if self.symbols.iter().any(|s| s == symbol) {
            Ok(HostValue::Enum {
                symbol: symbol.to_string(),
            })
        } else {
            Err(ReadError::SymbolNotDeclared {
                symbol: symbol.to_string(),
                fqn: self.fqn.clone(),
            })
        }
    }
}

/// Descriptor for a newtype wrapper around a primitive.
#[derive(Debug, Clone)]
pub struct NewtypeDescriptor {
    /// Fully-qualified host type name.
    pub fqn: String,
    /// The wrapped primitive descriptor.
    pub inner: Arc<TypeDescriptor>,
}

/// Descriptor for a record with ordered named fields.
#[derive(Clone)]
pub struct RecordDescriptor {
    /// Fully-qualified host type name.
    pub fqn: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
    /// Constructor invoked with field values in positional order.
    pub constructor: Constructor,
}

impl fmt::Debug for RecordDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordDescriptor")
            .field("fqn", &self.fqn)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Descriptor for a sealed sum type.
#[derive(Debug, Clone)]
pub struct UnionDescriptor {
    /// Fully-qualified host type name.
    pub fqn: String,
    /// `(unionIndex, variant)` pairs; inference sorts by ascending index.
    pub variants: Vec<(u32, Arc<TypeDescriptor>)>,
}

impl UnionDescriptor {
    /// Variants sorted by ascending union index.
    pub fn sorted_variants(&self) -> Vec<(u32, Arc<TypeDescriptor>)> {
        let mut variants = self.variants.clone();
        variants.sort_by_key(|(index, _)| *index);
        variants
    }
}

/// A single record field.
#[derive(Clone)]
pub struct FieldDescriptor {
    /// Zero-based position within the record.
    pub position: usize,
    /// Field name.
    pub name: String,
    /// Field type.
    pub descriptor: Arc<TypeDescriptor>,
    /// Schema aliases.
    pub aliases: Vec<String>,
    /// Documentation attached to the schema field.
    pub doc: Option<String>,
    /// Default-value producer.
    pub default: Option<DefaultFn>,
    /// Fixed-size binding overriding primitive inference.
    pub fixed: Option<FixedBinding>,
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("position", &self.position)
            .field("name", &self.name)
            .field("fixed", &self.fixed)
            .finish_non_exhaustive()
    }
}

/// Fixed-size binding on a field.
///
/// The size is implied for int (4), long (8) and uuid (16) fields; string
/// and bytes fields must declare one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBinding {
    /// Explicit byte size, where the field type does not imply one.
    pub size: Option<usize>,
}

impl FieldDescriptor {
    /// Create a field at the given position.
    pub fn new(position: usize, name: impl Into<String>, descriptor: Arc<TypeDescriptor>) -> Self {
        Self {
            position,
            name: name.into(),
            descriptor,
            aliases: Vec::new(),
            doc: None,
            default: None,
            fixed: None,
        }
    }

    /// Attach schema aliases.
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Attach documentation.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Attach a default-value producer.
    pub fn with_default(
        mut self,
        producer: impl Fn() -> HostValue + Send + Sync + 'static,
    ) -> Self {
        self.default = Some(Arc::new(producer));
        self
    }

    /// Attach a fixed-size binding. Pass `None` for types whose size is
    /// implied (int, long, uuid).
    pub fn with_fixed(mut self, size: Option<usize>) -> Self {
        self.fixed = Some(FixedBinding { size });
        self
    }
}

impl TypeDescriptor {
    /// Nullable wrapper.
    pub fn optional(inner: Arc<TypeDescriptor>) -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::Optional(inner))
    }

    /// List-shaped sequence.
    pub fn list(item: Arc<TypeDescriptor>) -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::Sequence {
            shape: ContainerShape::List,
            item,
        })
    }

    /// Set-shaped sequence.
    pub fn set(item: Arc<TypeDescriptor>) -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::Sequence {
            shape: ContainerShape::Set,
            item,
        })
    }

    /// Deque-shaped sequence.
    pub fn deque(item: Arc<TypeDescriptor>) -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::Sequence {
            shape: ContainerShape::Deque,
            item,
        })
    }

    /// Map with string keys.
    pub fn map(value: Arc<TypeDescriptor>) -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::Map(value))
    }

    /// Enumeration descriptor.
    pub fn enumeration(fqn: impl Into<String>, symbols: Vec<&str>) -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::Enum(EnumDescriptor {
            fqn: fqn.into(),
            symbols: symbols.into_iter().map(String::from).collect(),
        }))
    }

    /// Newtype wrapper around a primitive.
    pub fn newtype(fqn: impl Into<String>, inner: Arc<TypeDescriptor>) -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::Newtype(NewtypeDescriptor {
            fqn: fqn.into(),
            inner,
        }))
    }

    /// Record descriptor with the default constructor, which rebuilds a
    /// `HostValue::Record` tagged with the record's name.
    pub fn record(fqn: impl Into<String>, fields: Vec<FieldDescriptor>) -> Arc<TypeDescriptor> {
        let fqn = fqn.into();
        let tag = fqn.clone();
        Self::record_with(fqn, fields, move |values| {
            Ok(HostValue::Record {
                fqn: tag.clone(),
                fields: values,
            })
        })
    }

    /// Record descriptor with an explicit constructor.
    pub fn record_with(
        fqn: impl Into<String>,
        fields: Vec<FieldDescriptor>,
        constructor: impl Fn(Vec<HostValue>) -> Result<HostValue, ReadError> + Send + Sync + 'static,
    ) -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::Record(RecordDescriptor {
            fqn: fqn.into(),
            fields,
            constructor: Arc::new(constructor),
        }))
    }

    /// Sealed sum descriptor from `(unionIndex, variant)` pairs.
    pub fn union(
        fqn: impl Into<String>,
        variants: Vec<(u32, Arc<TypeDescriptor>)>,
    ) -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::Union(UnionDescriptor {
            fqn: fqn.into(),
            variants,
        }))
    }

    /// The fully-qualified name carried by named descriptors.
    pub fn fqn(&self) -> Option<&str> {
        match self {
            TypeDescriptor::Enum(e) => Some(&e.fqn),
            TypeDescriptor::Newtype(n) => Some(&n.fqn),
            TypeDescriptor::Record(r) => Some(&r.fqn),
            TypeDescriptor::Union(u) => Some(&u.fqn),
            _ => None,
        }
    }

    /// A short tag naming the descriptor, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            TypeDescriptor::Null => "null",
            TypeDescriptor::Boolean => "boolean",
            TypeDescriptor::Int => "int",
            TypeDescriptor::Long => "long",
            TypeDescriptor::Float => "float",
            TypeDescriptor::Double => "double",
            TypeDescriptor::Str => "string",
            TypeDescriptor::Bytes => "bytes",
            TypeDescriptor::Uuid => "uuid",
            TypeDescriptor::Optional(_) => "optional",
            TypeDescriptor::Sequence { .. } => "sequence",
            TypeDescriptor::Map(_) => "map",
            TypeDescriptor::Enum(_) => "enum",
            TypeDescriptor::Newtype(_) => "newtype",
            TypeDescriptor::Record(_) => "record",
            TypeDescriptor::Union(_) => "union",
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Enum(e) => e.fmt(f),
            TypeDescriptor::Newtype(n) => n.fmt(f),
            TypeDescriptor::Record(r) => r.fmt(f),
            TypeDescriptor::Union(u) => u.fmt(f),
            TypeDescriptor::Optional(inner) => f.debug_tuple("Optional").field(inner).finish(),
            TypeDescriptor::Sequence { shape, item } => f
                .debug_struct("Sequence")
                .field("shape", shape)
                .field("item", item)
                .finish(),
            TypeDescriptor::Map(value) => f.debug_tuple("Map").field(value).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// The trailing segment of a fully-qualified name.
pub fn simple_name(fqn: &str) -> &str {
    fqn.rsplit('.').next().unwrap_or(fqn)
}

/// The namespace of a fully-qualified name: everything before the trailing
/// segment, or `None` when the name has no dots.
pub fn namespace_of(fqn: &str) -> Option<&str> {
    fqn.rsplit_once('.').map(|(ns, _)| ns)
}
