// src/store/file.rs

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::errors::{LineageError, Result};
use crate::store::{Clock, RunIdentityRecord, RunIdentityStore, RunKey, StoreFuture, SystemClock};

/// Relative path (from the store root) to the mappings file.
///
/// The effective path on disk is `<root>/.lineagehook/run_ids`.
pub const RUN_IDS_FILE_PATH: &str = ".lineagehook/run_ids";

/// Sidecar file whose exclusive lock guards every rewrite of the mappings.
const LOCK_FILE_PATH: &str = ".lineagehook/run_ids.lock";

/// One line of the mappings file.
#[derive(Debug, Serialize, Deserialize)]
struct StoredLine {
    key: String,
    #[serde(flatten)]
    record: RunIdentityRecord,
}

/// Stores mappings as JSON lines in `<root>/.lineagehook/run_ids`.
///
/// Any number of processes may share one root. Writes are read-modify-write
/// cycles under an exclusive lock on `run_ids.lock`, published by renaming a
/// fresh temp file over the mappings file, so readers never need the lock.
/// Every write also drops records that have outlived the retention window.
#[derive(Debug)]
pub struct FileRunIdentityStore {
    root: PathBuf,
    retention: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl FileRunIdentityStore {
    pub fn new(root: PathBuf, retention: chrono::Duration) -> Self {
        Self::with_clock(root, retention, Arc::new(SystemClock))
    }

    pub fn with_clock(root: PathBuf, retention: chrono::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            root,
            retention,
            clock,
        }
    }

    pub fn file_path(&self) -> PathBuf {
        self.root.join(RUN_IDS_FILE_PATH)
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE_PATH)
    }

    /// Apply `change` to the current contents and persist the result.
    ///
    /// Returns the number of expired records dropped along the way.
    async fn rewrite<F>(&self, change: F) -> Result<usize>
    where
        F: FnOnce(&mut HashMap<String, RunIdentityRecord>) + Send + 'static,
    {
        let path = self.file_path();
        let lock_path = self.lock_path();
        let clock = Arc::clone(&self.clock);
        let retention = self.retention;

        // The lock blocks, so the whole cycle runs off the async workers.
        tokio::task::spawn_blocking(move || -> Result<usize> {
            let _lock = RewriteLock::acquire(&lock_path)?;

            let mut map = read_all(&path)?;
            change(&mut map);

            let now = clock.now();
            let initial_len = map.len();
            map.retain(|_, record| !record.is_expired(now, retention));
            let expired = initial_len - map.len();

            save_all(&path, &map)?;
            Ok(expired)
        })
        .await
        .map_err(|e| LineageError::StoreUnavailable(format!("run id file task failed: {e}")))?
    }
}

impl RunIdentityStore for FileRunIdentityStore {
    fn put<'a>(&'a self, key: &'a RunKey, record: RunIdentityRecord) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let lineage_run_id = record.lineage_run_id.clone();
            let storage_key = key.storage_key();
            self.rewrite(move |map| {
                map.insert(storage_key, record);
            })
            .await?;
            debug!(key = %key, lineage_run_id = %lineage_run_id, "stored run id (file)");
            Ok(())
        })
    }

    fn get<'a>(&'a self, key: &'a RunKey) -> StoreFuture<'a, Option<RunIdentityRecord>> {
        Box::pin(async move {
            let map = load_all(&self.file_path()).await?;
            let now = self.clock.now();
            Ok(map
                .get(&key.storage_key())
                .filter(|record| !record.is_expired(now, self.retention))
                .cloned())
        })
    }

    fn delete<'a>(&'a self, key: &'a RunKey) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let storage_key = key.storage_key();

            // Nothing to rewrite when the key is not there.
            if !load_all(&self.file_path()).await?.contains_key(&storage_key) {
                return Ok(());
            }

            self.rewrite(move |map| {
                map.remove(&storage_key);
            })
            .await?;
            debug!(key = %key, "deleted run id (file)");
            Ok(())
        })
    }

    fn evict_expired(&self) -> StoreFuture<'_, usize> {
        Box::pin(async move {
            let removed = self.rewrite(|_| {}).await?;
            if removed > 0 {
                info!(removed, "evicted expired run ids (file)");
            }
            Ok(removed)
        })
    }
}

/// Exclusive lock on the sidecar file, released on drop.
struct RewriteLock(File);

impl RewriteLock {
    fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| store_error("creating run id directory", parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| store_error("opening run id lock", path, e))?;
        file.lock_exclusive()
            .map_err(|e| store_error("locking run id file", path, e))?;
        Ok(Self(file))
    }
}

impl Drop for RewriteLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.0) {
            warn!(error = %e, "failed to release run id lock");
        }
    }
}

fn store_error(action: &str, path: &Path, err: std::io::Error) -> LineageError {
    LineageError::StoreUnavailable(format!("{action} {:?}: {err}", path))
}

/// Load all stored mappings. A missing file is an empty store.
async fn load_all(path: &Path) -> Result<HashMap<String, RunIdentityRecord>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(parse_lines(path, &contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(store_error("reading run id file", path, e)),
    }
}

/// Blocking twin of [`load_all`], used while the rewrite lock is held.
fn read_all(path: &Path) -> Result<HashMap<String, RunIdentityRecord>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(parse_lines(path, &contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(store_error("reading run id file", path, e)),
    }
}

fn parse_lines(path: &Path, contents: &str) -> HashMap<String, RunIdentityRecord> {
    let mut map = HashMap::new();
    for (idx, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<StoredLine>(trimmed) {
            Ok(stored) => {
                map.insert(stored.key, stored.record);
            }
            Err(e) => {
                warn!(path = ?path, line = idx + 1, error = %e, "skipping unreadable run id entry");
            }
        }
    }
    map
}

/// Persist all mappings through a uniquely named temp file in the same
/// directory, then rename it over `path`.
fn save_all(path: &Path, map: &HashMap<String, RunIdentityRecord>) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| store_error("creating run id directory", dir, e))?;

    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    let mut out = String::new();
    for key in keys {
        let line = StoredLine {
            key: key.clone(),
            record: map[key].clone(),
        };
        out.push_str(&serde_json::to_string(&line)?);
        out.push('\n');
    }

    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| store_error("creating temp run id file in", dir, e))?;
    tmp.write_all(out.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| store_error("writing run id file", tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| store_error("replacing run id file", path, e.error))?;

    Ok(())
}
