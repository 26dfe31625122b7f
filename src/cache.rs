//! Cache store backing repeated lookups.
//!
//! [`CacheStore`] is the seam through which the resolver reads and writes
//! vendor records. The default [`MemoryCache`] keeps everything in process
//! memory for the process lifetime; alternate backends implement the same
//! trait and are injected into the resolver at construction.
//!
//! [`save_snapshot`] and [`load_snapshot`] persist any store as JSON so a
//! caller can carry a populated cache across restarts.

use crate::oui::OuiKey;
use crate::record::VendorRecord;
use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Storage for parsed vendor records keyed by OUI.
///
/// Implementations must tolerate concurrent calls from several threads.
/// Entries are never evicted.
pub trait CacheStore: Send + Sync {
    /// Return the cached record for `key`, if any.
    fn get(&self, key: &OuiKey) -> Option<VendorRecord>;

    /// Store `record` under `key`, replacing any previous entry.
    fn put(&self, key: OuiKey, record: VendorRecord);

    /// Return a copy of every cached entry.
    fn snapshot(&self) -> HashMap<OuiKey, VendorRecord>;

    /// Number of cached entries.
    fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Returns true when nothing is cached.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process cache guarded by a single exclusive lock.
///
/// # Examples
///
/// ```
/// use macvendor::cache::{CacheStore, MemoryCache};
/// use macvendor::oui::normalize;
/// use macvendor::record::VendorRecord;
///
/// let cache = MemoryCache::new();
/// let key = normalize("00:03:93").unwrap();
/// cache.put(key.clone(), VendorRecord::from(vec!["Apple".to_owned()]));
/// assert_eq!(cache.get(&key).unwrap().organization(), Some("Apple"));
/// ```
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<OuiKey, VendorRecord>>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the map half-updated, so
    // a poisoned lock is recovered rather than propagated.
    fn entries(&self) -> MutexGuard<'_, HashMap<OuiKey, VendorRecord>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &OuiKey) -> Option<VendorRecord> {
        self.entries().get(key).cloned()
    }

    fn put(&self, key: OuiKey, record: VendorRecord) {
        self.entries().insert(key, record);
    }

    fn snapshot(&self) -> HashMap<OuiKey, VendorRecord> {
        self.entries().clone()
    }

    fn len(&self) -> usize {
        self.entries().len()
    }
}

/// Errors arising from cache snapshot persistence.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The snapshot could not be encoded or decoded.
    #[error("invalid cache snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot file could not be read or written.
    #[error("cache snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write every entry of `store` to `writer` as a JSON object keyed by OUI.
///
/// Keys are written in sorted order so snapshots diff cleanly. Returns the
/// number of entries written.
///
/// # Errors
///
/// Returns [`SnapshotError`] when encoding or writing fails.
pub fn save_snapshot(store: &dyn CacheStore, writer: &mut dyn Write) -> Result<usize, SnapshotError> {
    let entries: BTreeMap<OuiKey, VendorRecord> = store.snapshot().into_iter().collect();
    serde_json::to_writer_pretty(&mut *writer, &entries)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(entries.len())
}

/// Insert every entry of a JSON snapshot read from `reader` into `store`.
///
/// Returns the number of entries inserted.
///
/// # Errors
///
/// Returns [`SnapshotError::Json`] when the snapshot is malformed,
/// including keys that are not valid OUIs.
pub fn load_snapshot(store: &dyn CacheStore, reader: &mut dyn Read) -> Result<usize, SnapshotError> {
    let entries: BTreeMap<OuiKey, VendorRecord> = serde_json::from_reader(reader)?;
    let count = entries.len();
    for (key, record) in entries {
        store.put(key, record);
    }
    Ok(count)
}
