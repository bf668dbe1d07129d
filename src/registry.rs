//! Global descriptor registry.
//!
//! The registry stands in for classpath visibility: it maps fully-qualified
//! host type names to their descriptors so that readers can discover record
//! and newtype descriptors by the names carried in schemas. Registration is
//! explicit and happens once at startup; lookups afterwards are read-only
//! and go through the per-thread descriptor cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::descriptor::TypeDescriptor;

static REGISTRY: RwLock<BTreeMap<String, Arc<TypeDescriptor>>> = RwLock::new(BTreeMap::new());

/// Register a descriptor and every named descriptor reachable from it.
///
/// Registration is idempotent; re-registering a name replaces the previous
/// descriptor, which is only sound while host type identity is stable.
pub fn register_type(descriptor: &Arc<TypeDescriptor>) {
    let mut registry = REGISTRY.write();
    register_walk(descriptor, &mut registry);
}

fn register_walk(
    descriptor: &Arc<TypeDescriptor>,
    registry: &mut BTreeMap<String, Arc<TypeDescriptor>>,
) {
    if let Some(fqn) = descriptor.fqn() {
        if registry
            .insert(fqn.to_string(), Arc::clone(descriptor))
            .is_none()
        {
            debug!(fqn, kind = descriptor.kind(), "registered type descriptor");
        }
    }

    match &**descriptor {
        TypeDescriptor::Optional(inner) => register_walk(inner, registry),
        TypeDescriptor::Sequence { item, .. } => register_walk(item, registry),
        TypeDescriptor::Map(value) => register_walk(value, registry),
        TypeDescriptor::Newtype(n) => register_walk(&n.inner, registry),
        TypeDescriptor::Record(r) => {
            for field in &r.fields {
                register_walk(&field.descriptor, registry);
            }
        }
        TypeDescriptor::Union(u) => {
            for (_, variant) in &u.variants {
                register_walk(variant, registry);
            }
        }
        _ => {}
    }
}

/// Look up a registered descriptor by fully-qualified name.
pub fn lookup_type(fqn: &str) -> Option<Arc<TypeDescriptor>> {
    REGISTRY.read().get(fqn).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldDescriptor;

    #[test]
    fn register_reaches_nested_types() {
        let side = TypeDescriptor::enumeration("test.registry.Side", vec!["L", "R"]);
        let record = TypeDescriptor::record(
            "test.registry.Move",
            vec![FieldDescriptor::new(0, "side", Arc::clone(&side))],
        );
        register_type(&record);

        assert!(lookup_type("test.registry.Move").is_some());
        assert!(lookup_type("test.registry.Side").is_some());
        assert!(lookup_type("test.registry.Absent").is_none());
    }
}
