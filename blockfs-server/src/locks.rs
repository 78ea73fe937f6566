//! Per-file lock map: `F[name]`.
//!
//! The global lock `G` lives alongside the tables it protects (see
//! [`crate::fs`]) since guarding plain data is what a `RwLock<T>` is for.
//! This module owns only the *other* half of §4.6's two-layer scheme: one
//! `RwLock<()>` per live file name, created on first touch and removed on
//! `DELETE`.
//!
//! The fixed acquisition order — outer `F[name]`, inner `G` — is enforced
//! by convention at the call sites in [`crate::fs`], not by this type; this
//! map only hands out the per-file lock itself.
//!
//! A `CREATE` racing a `DELETE` for the same name either shares the
//! existing entry or allocates a fresh one; both are correct, since the
//! entry's identity never matters, only that concurrent operations on the
//! same name serialize through the same lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

#[derive(Default)]
pub struct LockManager {
    files: RwLock<HashMap<String, Arc<RwLock<()>>>>,
}

impl LockManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the per-file lock for `name`, creating it if this is the
    /// first operation to touch that name. Use only where §9's lock-map
    /// growth rule permits creating an entry (`CREATE`, and `WRITE`'s
    /// lazy-create case).
    pub fn file_lock(&self, name: &str) -> Arc<RwLock<()>> {
        if let Some(lock) = self.files.read().get(name) {
            return Arc::clone(lock);
        }
        Arc::clone(
            self.files
                .write()
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(RwLock::new(()))),
        )
    }

    /// Returns the per-file lock for `name` if one already exists, without
    /// creating an entry. For operations like `READ` that must not grow
    /// the map for names that were never created.
    #[must_use]
    pub fn existing_file_lock(&self, name: &str) -> Option<Arc<RwLock<()>>> {
        self.files.read().get(name).map(Arc::clone)
    }

    /// Drops `name`'s entry from the map. Call only once no thread holds
    /// (or will acquire) a guard on the returned `Arc` from `file_lock`,
    /// i.e. after a `DELETE` has released its own write guard on it.
    pub fn forget_file(&self, name: &str) {
        self.files.write().remove(name);
    }
}
