//! Fixed-size pool of reusable CAS instances.
//!
//! All pooled instances share one type system and one set of index
//! definitions. Checkout never blocks: an empty pool returns `None`.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::cas::Cas;
use crate::cas_error::CasIndexError;
use crate::config::IndexConfig;
use crate::index::IndexDefinition;
use crate::type_system::TypeSystem;

/// A [`Cas`] the pool did not take back, returned untouched with the reason.
#[derive(Debug, thiserror::Error)]
#[error("CAS not returned to the pool: {reason}")]
pub struct ReleaseError {
    pub cas: Box<Cas>,
    pub reason: CasIndexError,
}

impl ReleaseError {
    pub fn into_cas(self) -> Cas {
        *self.cas
    }
}

#[derive(Debug)]
pub struct CasPool {
    ts: Arc<TypeSystem>,
    free: Mutex<Vec<Cas>>,
    capacity: usize,
}

impl CasPool {
    /// Pool of `capacity` instances built from `definitions`.
    pub fn new(
        capacity: usize,
        ts: &Arc<TypeSystem>,
        definitions: &[IndexDefinition],
        config: &IndexConfig,
    ) -> Result<Self, CasIndexError> {
        let free = (0..capacity)
            .map(|_| Cas::with_config(ts, definitions.to_vec(), config.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("created CAS pool of {capacity}");
        Ok(Self {
            ts: Arc::clone(ts),
            free: Mutex::new(free),
            capacity,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Instances currently checked in.
    pub fn available(&self) -> usize {
        self.free.lock().len()
    }

    /// Take an instance, if one is free.
    pub fn checkout(&self) -> Option<Cas> {
        self.free.lock().pop()
    }

    /// Return an instance; it is reset before being handed out again.
    ///
    /// # Errors
    /// A [`ReleaseError`] carrying `cas` back, with
    /// [`CasIndexError::ForeignTypeSystem`] if it uses another type system or
    /// [`CasIndexError::CapacityExhausted`] if the pool is full.
    pub fn release(&self, mut cas: Cas) -> Result<(), ReleaseError> {
        if !Arc::ptr_eq(cas.type_system(), &self.ts) {
            return Err(ReleaseError {
                cas: Box::new(cas),
                reason: CasIndexError::ForeignTypeSystem("released CAS".to_string()),
            });
        }
        let mut free = self.free.lock();
        if free.len() >= self.capacity {
            return Err(ReleaseError {
                cas: Box::new(cas),
                reason: CasIndexError::CapacityExhausted(self.capacity),
            });
        }
        cas.reset();
        free.push(cas);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ANNOTATION_INDEX;
    use crate::type_system::TypeSystemBuilder;

    fn make_pool(n: usize) -> (CasPool, Arc<TypeSystem>) {
        let mut b = TypeSystemBuilder::new();
        b.with_annotation_type().unwrap();
        let ts = b.commit().unwrap();
        let defs = [IndexDefinition::annotation_index(&ts).unwrap()];
        (
            CasPool::new(n, &ts, &defs, &IndexConfig::default()).unwrap(),
            ts,
        )
    }

    #[test]
    fn checkout_is_non_blocking() {
        let (pool, _) = make_pool(1);
        let cas = pool.checkout().unwrap();
        assert!(pool.checkout().is_none());
        pool.release(cas).unwrap();
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn released_cas_is_reset() {
        let (pool, ts) = make_pool(1);
        let mut cas = pool.checkout().unwrap();
        let ann = ts.type_by_name("Annotation").unwrap();
        let fs = cas.create_fs(ann).unwrap().build();
        cas.add_fs(fs).unwrap();
        cas.create_view("extra").unwrap();
        pool.release(cas).unwrap();
        let cas = pool.checkout().unwrap();
        assert_eq!(cas.views().count(), 1);
        assert_eq!(
            cas.initial_view().indexes().size(ANNOTATION_INDEX).unwrap(),
            0
        );
    }

    #[test]
    fn foreign_and_surplus_instances_are_refused() {
        let (pool, ts) = make_pool(1);
        let (other, _) = make_pool(1);
        let stranger = other.checkout().unwrap();
        assert!(matches!(
            pool.release(stranger).unwrap_err().reason,
            CasIndexError::ForeignTypeSystem(_)
        ));
        let extra = Cas::new(&ts, Vec::new()).unwrap();
        assert_eq!(
            pool.release(extra).unwrap_err().reason,
            CasIndexError::CapacityExhausted(1)
        );
    }

    #[test]
    fn refused_cas_is_handed_back_intact() {
        let (pool, ts) = make_pool(0);
        let ann = ts.type_by_name("Annotation").unwrap();
        let mut cas = Cas::new(&ts, vec![IndexDefinition::annotation_index(&ts).unwrap()]).unwrap();
        let fs = cas.create_fs(ann).unwrap().build();
        cas.add_fs(Arc::clone(&fs)).unwrap();
        let err = pool.release(cas).unwrap_err();
        assert_eq!(err.reason, CasIndexError::CapacityExhausted(0));
        let cas = err.into_cas();
        assert!(cas.initial_view().indexes().contains(&fs));
        assert_eq!(pool.available(), 0);
    }
}
