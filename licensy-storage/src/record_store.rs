//! Persistence collaborator abstraction.
//!
//! Records are JSON documents addressed by `(namespace, key)`. The key
//! store and audit log only need three operations from a backend, so any
//! durable engine with atomic single-key writes and ordered keys can
//! stand in.

use crate::error::{StoreError, StoreResult};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::RwLock;

/// Filter applied to `(key, record)` pairs during a scan.
pub type ScanPredicate<'a> = &'a dyn Fn(&str, &str) -> bool;

/// A durable key/record store.
pub trait RecordStore: Send + Sync {
    /// Reads the record stored under `key`, if any.
    fn read(&self, namespace: &str, key: &str) -> StoreResult<Option<String>>;

    /// Writes `record` under `key`, replacing any previous record.
    ///
    /// The write is atomic: after it returns `Ok`, readers see either the
    /// whole new record or (before the call) the whole old one.
    fn write(&self, namespace: &str, key: &str, record: &str) -> StoreResult<()>;

    /// Returns up to `limit` records matching `predicate`, in ascending key
    /// order, starting strictly after `after` (or at the first key).
    ///
    /// A result shorter than `limit` means the namespace is exhausted.
    fn scan(
        &self,
        namespace: &str,
        after: Option<&str>,
        limit: usize,
        predicate: ScanPredicate<'_>,
    ) -> StoreResult<Vec<(String, String)>>;
}

/// In-memory record store.
///
/// Nothing survives the process. Used by tests and by servers started
/// without a database path.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    namespaces: RwLock<HashMap<String, BTreeMap<String, String>>>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::StorageUnavailable("memory store lock poisoned".to_string())
}

impl RecordStore for MemoryRecordStore {
    fn read(&self, namespace: &str, key: &str) -> StoreResult<Option<String>> {
        let namespaces = self.namespaces.read().map_err(|_| poisoned())?;
        Ok(namespaces
            .get(namespace)
            .and_then(|records| records.get(key))
            .cloned())
    }

    fn write(&self, namespace: &str, key: &str, record: &str) -> StoreResult<()> {
        let mut namespaces = self.namespaces.write().map_err(|_| poisoned())?;
        namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), record.to_string());
        Ok(())
    }

    fn scan(
        &self,
        namespace: &str,
        after: Option<&str>,
        limit: usize,
        predicate: ScanPredicate<'_>,
    ) -> StoreResult<Vec<(String, String)>> {
        let namespaces = self.namespaces.read().map_err(|_| poisoned())?;
        let Some(records) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let lower = match after {
            Some(after) => Bound::Excluded(after),
            None => Bound::Unbounded,
        };

        Ok(records
            .range::<str, _>((lower, Bound::Unbounded))
            .filter(|(key, record)| predicate(key.as_str(), record.as_str()))
            .take(limit)
            .map(|(key, record)| (key.clone(), record.clone()))
            .collect())
    }
}

/// A fault-injecting record store for testing.
pub mod mock {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, PoisonError};
    use std::time::Duration;

    /// Wraps another store and fails or delays operations on demand.
    ///
    /// Failures are configured per namespace so a test can, for example,
    /// keep license reads healthy while the audit namespace is down.
    #[derive(Debug)]
    pub struct FlakyRecordStore<S> {
        inner: S,
        failing_reads: Mutex<HashSet<String>>,
        failing_writes: Mutex<HashSet<String>>,
        delay: Mutex<Option<Duration>>,
        writes: AtomicUsize,
    }

    impl<S: RecordStore> FlakyRecordStore<S> {
        /// Wraps `inner` with all operations healthy.
        pub fn new(inner: S) -> Self {
            Self {
                inner,
                failing_reads: Mutex::new(HashSet::new()),
                failing_writes: Mutex::new(HashSet::new()),
                delay: Mutex::new(None),
                writes: AtomicUsize::new(0),
            }
        }

        /// Makes every read and scan of `namespace` fail.
        pub fn fail_reads(&self, namespace: &str) {
            self.failing_reads
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(namespace.to_string());
        }

        /// Makes every write to `namespace` fail.
        pub fn fail_writes(&self, namespace: &str) {
            self.failing_writes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(namespace.to_string());
        }

        /// Delays every operation by `delay` before running it.
        pub fn set_delay(&self, delay: Option<Duration>) {
            *self.delay.lock().unwrap_or_else(PoisonError::into_inner) = delay;
        }

        /// Clears all injected failures and delays.
        pub fn heal(&self) {
            self.failing_reads.lock().unwrap_or_else(PoisonError::into_inner).clear();
            self.failing_writes.lock().unwrap_or_else(PoisonError::into_inner).clear();
            *self.delay.lock().unwrap_or_else(PoisonError::into_inner) = None;
        }

        /// Number of successful writes passed through to the inner store.
        pub fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        /// Returns the wrapped store.
        pub fn inner(&self) -> &S {
            &self.inner
        }

        fn pause(&self) {
            let delay = *self.delay.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(delay) = delay {
                std::thread::sleep(delay);
            }
        }

        fn check(set: &Mutex<HashSet<String>>, namespace: &str) -> StoreResult<()> {
            if set.lock().unwrap_or_else(PoisonError::into_inner).contains(namespace) {
                return Err(StoreError::StorageUnavailable(format!(
                    "injected failure on namespace {namespace}"
                )));
            }
            Ok(())
        }
    }

    impl<S: RecordStore> RecordStore for FlakyRecordStore<S> {
        fn read(&self, namespace: &str, key: &str) -> StoreResult<Option<String>> {
            self.pause();
            Self::check(&self.failing_reads, namespace)?;
            self.inner.read(namespace, key)
        }

        fn write(&self, namespace: &str, key: &str, record: &str) -> StoreResult<()> {
            self.pause();
            Self::check(&self.failing_writes, namespace)?;
            self.inner.write(namespace, key, record)?;
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn scan(
            &self,
            namespace: &str,
            after: Option<&str>,
            limit: usize,
            predicate: ScanPredicate<'_>,
        ) -> StoreResult<Vec<(String, String)>> {
            self.pause();
            Self::check(&self.failing_reads, namespace)?;
            self.inner.scan(namespace, after, limit, predicate)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::FlakyRecordStore;
        use crate::record_store::{MemoryRecordStore, RecordStore};
        use std::sync::Arc;

        #[test]
        fn keeps_working_after_a_panic_poisons_its_locks() {
            let store = Arc::new(FlakyRecordStore::new(MemoryRecordStore::new()));
            store.fail_writes("usage");

            let poisoner = store.clone();
            let joined = std::thread::spawn(move || {
                let _reads = poisoner.failing_reads.lock().unwrap();
                let _writes = poisoner.failing_writes.lock().unwrap();
                let _delay = poisoner.delay.lock().unwrap();
                panic!("poison every lock");
            })
            .join();
            assert!(joined.is_err());
            assert!(store.failing_writes.is_poisoned());

            assert!(store.write("usage", "k", "v").is_err());
            store.write("licenses", "k", "v").unwrap();
            assert_eq!(store.read("licenses", "k").unwrap().as_deref(), Some("v"));

            store.heal();
            store.write("usage", "k", "v").unwrap();
            assert_eq!(store.write_count(), 2);
        }
    }
}
