// src/store/memory.rs

use std::collections::HashMap;
use std::future::ready;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::errors::{LineageError, Result};
use crate::store::{Clock, RunIdentityRecord, RunIdentityStore, RunKey, StoreFuture, SystemClock};

/// Keeps mappings in process memory only.
///
/// Suitable when the process that registers runs is also the one that sees
/// them finish (e.g. `lineagehook listen`).
#[derive(Debug)]
pub struct MemoryRunIdentityStore {
    map: RwLock<HashMap<String, RunIdentityRecord>>,
    retention: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl MemoryRunIdentityStore {
    pub fn new(retention: chrono::Duration) -> Self {
        Self::with_clock(retention, Arc::new(SystemClock))
    }

    pub fn with_clock(retention: chrono::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
            retention,
            clock,
        }
    }

    /// Number of stored records, expired ones included until evicted.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, RunIdentityRecord>>> {
        self.map
            .read()
            .map_err(|_| LineageError::StoreUnavailable("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, RunIdentityRecord>>> {
        self.map
            .write()
            .map_err(|_| LineageError::StoreUnavailable("memory store lock poisoned".to_string()))
    }

    fn put_now(&self, key: &RunKey, record: RunIdentityRecord) -> Result<()> {
        debug!(key = %key, lineage_run_id = %record.lineage_run_id, "stored run id (memory)");
        self.write()?.insert(key.storage_key(), record);
        Ok(())
    }

    fn get_now(&self, key: &RunKey) -> Result<Option<RunIdentityRecord>> {
        let storage_key = key.storage_key();
        let now = self.clock.now();

        let found = self.read()?.get(&storage_key).cloned();
        match found {
            Some(record) if record.is_expired(now, self.retention) => {
                // Drop it lazily, unless a fresh put replaced it meanwhile.
                let mut map = self.write()?;
                if map
                    .get(&storage_key)
                    .is_some_and(|current| current.is_expired(now, self.retention))
                {
                    map.remove(&storage_key);
                    debug!(key = %key, "dropped expired run id (memory)");
                }
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn delete_now(&self, key: &RunKey) -> Result<()> {
        if self.write()?.remove(&key.storage_key()).is_some() {
            debug!(key = %key, "deleted run id (memory)");
        }
        Ok(())
    }

    fn evict_now(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut map = self.write()?;
        let initial_len = map.len();
        map.retain(|_, record| !record.is_expired(now, self.retention));
        let removed = initial_len - map.len();
        if removed > 0 {
            info!(removed, "evicted expired run ids (memory)");
        }
        Ok(removed)
    }
}

impl RunIdentityStore for MemoryRunIdentityStore {
    fn put<'a>(&'a self, key: &'a RunKey, record: RunIdentityRecord) -> StoreFuture<'a, ()> {
        Box::pin(ready(self.put_now(key, record)))
    }

    fn get<'a>(&'a self, key: &'a RunKey) -> StoreFuture<'a, Option<RunIdentityRecord>> {
        Box::pin(ready(self.get_now(key)))
    }

    fn delete<'a>(&'a self, key: &'a RunKey) -> StoreFuture<'a, ()> {
        Box::pin(ready(self.delete_now(key)))
    }

    fn evict_expired(&self) -> StoreFuture<'_, usize> {
        Box::pin(ready(self.evict_now()))
    }
}
