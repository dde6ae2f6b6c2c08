use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use lineagehook::errors::LineageError;
use lineagehook::store::{
    MemoryRunIdentityStore, RunIdentityRecord, RunIdentityStore, RunKey, StoreFuture,
};

/// An in-memory store that can be told to fail or hang.
///
/// - `fail_puts(n)`: the next `n` writes fail with `StoreUnavailable`.
/// - `fail_reads(true)`: every `get` fails.
/// - `hang_puts(true)`: writes never complete.
#[derive(Debug)]
pub struct FlakyStore {
    inner: MemoryRunIdentityStore,
    put_failures_left: AtomicU32,
    fail_reads: AtomicBool,
    hang_puts: AtomicBool,
    put_attempts: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryRunIdentityStore::new(chrono::Duration::hours(48)),
            put_failures_left: AtomicU32::new(0),
            fail_reads: AtomicBool::new(false),
            hang_puts: AtomicBool::new(false),
            put_attempts: AtomicUsize::new(0),
        }
    }

    /// A store whose writes always fail.
    pub fn broken() -> Self {
        let store = Self::new();
        store.fail_puts(u32::MAX);
        store
    }

    pub fn fail_puts(&self, count: u32) {
        self.put_failures_left.store(count, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn hang_puts(&self, hang: bool) {
        self.hang_puts.store(hang, Ordering::SeqCst);
    }

    /// Number of `put` calls received, failed ones included.
    pub fn put_attempts(&self) -> usize {
        self.put_attempts.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.inner.len().expect("memory store lock poisoned")
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FlakyStore {
    fn default() -> Self {
        Self::new()
    }
}

fn unavailable(what: &str) -> LineageError {
    LineageError::StoreUnavailable(format!("flaky store: {what} failed"))
}

impl RunIdentityStore for FlakyStore {
    fn put<'a>(&'a self, key: &'a RunKey, record: RunIdentityRecord) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.put_attempts.fetch_add(1, Ordering::SeqCst);

            if self.hang_puts.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }

            let failing = self
                .put_failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if failing {
                return Err(unavailable("put"));
            }

            self.inner.put(key, record).await
        })
    }

    fn get<'a>(&'a self, key: &'a RunKey) -> StoreFuture<'a, Option<RunIdentityRecord>> {
        Box::pin(async move {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(unavailable("get"));
            }
            self.inner.get(key).await
        })
    }

    fn delete<'a>(&'a self, key: &'a RunKey) -> StoreFuture<'a, ()> {
        self.inner.delete(key)
    }

    fn evict_expired(&self) -> StoreFuture<'_, usize> {
        self.inner.evict_expired()
    }
}
