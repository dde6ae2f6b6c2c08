// src/store/mod.rs

//! Run-identity correlation store.
//!
//! The host orchestrator and the lineage service issue independent run ids.
//! When a run is registered the lineage id is stored here under the host's
//! `(namespace, workflow, run)` key, so the completion path can find it again
//! from host identifiers alone.
//!
//! - [`key`] builds collision-free composite keys.
//! - [`record`] is the stored value.
//! - [`memory`] and [`file`] are the two backends.
//! - [`clock`] supplies "now" for retention.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::StoreSettings;
use crate::errors::Result;
use crate::types::StoreBackend;

pub mod clock;
pub mod file;
pub mod key;
pub mod memory;
pub mod record;

pub use clock::{Clock, SystemClock};
pub use file::{FileRunIdentityStore, RUN_IDS_FILE_PATH};
pub use key::RunKey;
pub use memory::MemoryRunIdentityStore;
pub use record::RunIdentityRecord;

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Storage for run-identity mappings.
///
/// Implementations must tolerate concurrent calls; atomicity of a single
/// operation is whatever the backend provides, the trait adds no locking of
/// its own. A missing or expired key is `Ok(None)`, never an error. Failures
/// to reach the backend surface as `LineageError::StoreUnavailable`.
pub trait RunIdentityStore: Send + Sync {
    /// Insert or overwrite the mapping for `key`.
    fn put<'a>(&'a self, key: &'a RunKey, record: RunIdentityRecord) -> StoreFuture<'a, ()>;

    /// Fetch the mapping for `key` unless it is missing or expired.
    fn get<'a>(&'a self, key: &'a RunKey) -> StoreFuture<'a, Option<RunIdentityRecord>>;

    /// Remove the mapping for `key`. Removing a missing key is not an error.
    fn delete<'a>(&'a self, key: &'a RunKey) -> StoreFuture<'a, ()>;

    /// Drop every record older than the retention window and return how many
    /// were removed.
    fn evict_expired(&self) -> StoreFuture<'_, usize>;
}

/// Build the backend selected in `[store]`.
pub fn build_store(settings: &StoreSettings) -> Arc<dyn RunIdentityStore> {
    build_store_with_clock(settings, Arc::new(SystemClock))
}

pub fn build_store_with_clock(
    settings: &StoreSettings,
    clock: Arc<dyn Clock>,
) -> Arc<dyn RunIdentityStore> {
    match settings.backend {
        StoreBackend::Memory => Arc::new(MemoryRunIdentityStore::with_clock(
            settings.retention,
            clock,
        )),
        StoreBackend::File => Arc::new(FileRunIdentityStore::with_clock(
            settings.path.clone(),
            settings.retention,
            clock,
        )),
    }
}
