//! Per-thread memoization of the codec's pure derivations.
//!
//! Every cache here shares one contract: thread-local, grow-only, keyed by
//! a pure function of its input, populated on first miss through a supplier.
//! Thread-locality keeps lookups lock-free on the hot path; each thread pays
//! a cold-start penalty instead. Descriptors and schemas are immutable and
//! `Arc`-shared, so pointer identity is a stable cache key for the process
//! lifetime.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;
use std::sync::Arc;
use std::thread::LocalKey;

use tracing::trace;

use crate::descriptor::{Constructor, TypeDescriptor};
use crate::error::SchemaError;
use crate::project::Projector;
use crate::read::{Coercer, UnionReader};
use crate::registry;
use crate::schema::AvroSchema;

thread_local! {
    static SCHEMAS: RefCell<HashMap<usize, Arc<AvroSchema>>> = RefCell::new(HashMap::new());
    static DESCRIPTORS: RefCell<HashMap<String, Option<Arc<TypeDescriptor>>>> =
        RefCell::new(HashMap::new());
    static CONSTRUCTORS: RefCell<HashMap<String, Option<Constructor>>> =
        RefCell::new(HashMap::new());
    static PROJECTORS: RefCell<HashMap<(usize, usize), Rc<Projector>>> =
        RefCell::new(HashMap::new());
    static COERCERS: RefCell<HashMap<usize, Coercer>> = RefCell::new(HashMap::new());
    static UNION_READERS: RefCell<HashMap<usize, UnionReader>> = RefCell::new(HashMap::new());
}

/// Generic thread-local memoization: look up `key`, populating through
/// `supply` on a miss.
///
/// The borrow is released while the supplier runs so suppliers may recurse
/// into the same cache.
pub(crate) fn memoized<K, V>(
    cache: &'static LocalKey<RefCell<HashMap<K, V>>>,
    key: K,
    supply: impl FnOnce() -> V,
) -> V
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    if let Some(hit) = cache.with(|c| c.borrow().get(&key).cloned()) {
        return hit;
    }
    let value = supply();
    cache.with(|c| c.borrow_mut().insert(key, value.clone()));
    value
}

/// Fallible variant of [`memoized`]: only successful results are cached, so
/// a transient failure does not poison the key.
pub(crate) fn memoized_try<K, V, E>(
    cache: &'static LocalKey<RefCell<HashMap<K, V>>>,
    key: K,
    supply: impl FnOnce() -> Result<V, E>,
) -> Result<V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    if let Some(hit) = cache.with(|c| c.borrow().get(&key).cloned()) {
        return Ok(hit);
    }
    let value = supply()?;
    cache.with(|c| c.borrow_mut().insert(key, value.clone()));
    Ok(value)
}

/// A stable identity key for an `Arc`-held value.
pub(crate) fn identity<T>(value: &Arc<T>) -> usize {
    Arc::as_ptr(value) as usize
}

/// Memoized schema inference result for a descriptor.
pub(crate) fn schema_of(
    descriptor: &Arc<TypeDescriptor>,
    supply: impl FnOnce() -> Result<Arc<AvroSchema>, SchemaError>,
) -> Result<Arc<AvroSchema>, SchemaError> {
    memoized_try(&SCHEMAS, identity(descriptor), || {
        trace!(kind = descriptor.kind(), "inferring schema");
        supply()
    })
}

/// Memoized registry lookup: fqn to descriptor.
pub(crate) fn descriptor_of(fqn: &str) -> Option<Arc<TypeDescriptor>> {
    memoized(&DESCRIPTORS, fqn.to_string(), || {
        trace!(fqn, "resolving descriptor");
        registry::lookup_type(fqn)
    })
}

/// Memoized constructor lookup: fqn to the record constructor.
pub(crate) fn constructor_of(fqn: &str) -> Option<Constructor> {
    memoized(&CONSTRUCTORS, fqn.to_string(), || {
        match descriptor_of(fqn).as_deref() {
            Some(TypeDescriptor::Record(record)) => Some(Arc::clone(&record.constructor)),
            _ => None,
        }
    })
}

/// The per-thread projector for a `(writer, reader)` schema pair, keyed by
/// schema identity.
pub(crate) fn projector_of(
    writer: &Arc<AvroSchema>,
    reader: Option<&Arc<AvroSchema>>,
) -> Rc<Projector> {
    let key = (identity(writer), reader.map_or(0, identity));
    memoized(&PROJECTORS, key, || {
        trace!("building projector");
        Rc::new(Projector::new(
            Arc::clone(writer),
            reader.map(Arc::clone),
        ))
    })
}

/// The cached container coercer for a sequence descriptor.
pub(crate) fn coercer_of(
    descriptor: &Arc<TypeDescriptor>,
    supply: impl FnOnce() -> Coercer,
) -> Coercer {
    memoized(&COERCERS, identity(descriptor), supply)
}

/// The cached union reader for a descriptor.
pub(crate) fn union_reader_of(
    descriptor: &Arc<TypeDescriptor>,
    supply: impl FnOnce() -> UnionReader,
) -> UnionReader {
    memoized(&UNION_READERS, identity(descriptor), supply)
}

#[cfg(test)]
mod tests {
    use super::*;

    thread_local! {
        static PROBE: RefCell<HashMap<u32, u32>> = RefCell::new(HashMap::new());
    }

    #[test]
    fn supplier_runs_once_per_key() {
        let mut calls = 0;
        let first = memoized(&PROBE, 1, || {
            calls += 1;
            10
        });
        let second = memoized(&PROBE, 1, || {
            calls += 1;
            20
        });
        assert_eq!(first, 10);
        assert_eq!(second, 10);
        assert_eq!(calls, 1);
    }

    #[test]
    fn failed_supplier_is_not_cached() {
        thread_local! {
            static FALLIBLE: RefCell<HashMap<u32, u32>> = RefCell::new(HashMap::new());
        }
        let failed: Result<u32, &str> = memoized_try(&FALLIBLE, 1, || Err("nope"));
        assert!(failed.is_err());
        let ok: Result<u32, &str> = memoized_try(&FALLIBLE, 1, || Ok(7));
        assert_eq!(ok.unwrap(), 7);
    }
}
