//! Store Module
//!
//! The key-value facade that coordinates all components.
//!
//! ## Responsibilities
//! - Validate keys and values before anything is written
//! - Route reads through the index, never the chain
//! - Keep the index and the data file consistent under concurrent access
//! - Schedule TTL expirations
//! - Rebuild the index on startup

use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::error::{Result, SlotError};
use crate::expiry::{ExpiryScheduler, Generation};
use crate::list::{truncate_key, LinkedListStore, Node, MAX_VALUE_SIZE};
use crate::memcache::MemCache;
use crate::storage::Offset;

/// The key-value store
///
/// ## Concurrency Model
///
/// - **Mutations** (create/delete/expire): serialized by `write_lock`
/// - **Reads** (get): share `read_gate`
/// - **Delete**: holds `write_lock` and `read_gate` exclusively, so it never
///   overlaps an append or a read of the slots it splices
/// - **Exists**: goes straight to the index (internal RwLock)
///
/// Locks are always taken in the order `write_lock` → `read_gate`. Every
/// lock is owned by the instance; two stores never contend.
///
/// Share a store between threads with `Arc<KvStore>`.
pub struct KvStore {
    inner: Arc<Inner>,
}

struct Inner {
    /// Store configuration
    config: Config,

    /// Node chain over the data file
    list: LinkedListStore,

    /// key → offset index, authoritative for reads
    cache: MemCache,

    /// Pending TTL timers
    expiry: ExpiryScheduler,

    /// Serializes mutations
    write_lock: Mutex<()>,

    /// Shared by reads, exclusive for deletes
    read_gate: RwLock<()>,
}

/// Result of cross-checking the index against the chain
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// Keys in the index
    pub indexed: usize,

    /// Keys the chain walk found at their indexed offset
    pub reachable: usize,

    /// Keys behind a chain gap left by an unspliced delete. Harmless:
    /// lookups never walk the chain.
    pub unreachable: Vec<String>,

    /// Keys whose indexed slot or chain position disagrees with the index
    pub mismatched: Vec<String>,
}

impl VerifyReport {
    /// True when every indexed key points at its own node
    pub fn is_consistent(&self) -> bool {
        self.mismatched.is_empty()
    }
}

impl KvStore {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Validate the config
    /// 2. Open/create the data file
    /// 3. If the file already held data, scan it to rebuild the index
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let (list, recovered) = LinkedListStore::open(&config.path, config.max_file_size)?;
        let cache = MemCache::with_entries(recovered);

        tracing::info!(
            path = %config.path.display(),
            keys = cache.len(),
            cursor = %list.cursor(),
            "store opened"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                list,
                cache,
                expiry: ExpiryScheduler::new(),
                write_lock: Mutex::new(()),
                read_gate: RwLock::new(()),
            }),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data file
    pub fn open_path(path: &Path) -> Result<Self> {
        let mut config = Config::default();
        config.path = path.to_path_buf();
        Self::open(config)
    }

    /// Store `value` under `key`
    ///
    /// Checks run in a fixed order and the first failure wins: empty key,
    /// value too large, storage full, key already present. Nothing is
    /// written when a check fails.
    ///
    /// With a non-zero `ttl` the key is deleted once `ttl` has elapsed.
    pub fn create(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let inner = &self.inner;
        let _write_guard = inner.write_lock.lock();

        let key = truncate_key(key);
        if key.is_empty() {
            return Err(SlotError::EmptyKey);
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(SlotError::ValueTooLarge {
                size: value.len(),
                max: MAX_VALUE_SIZE,
            });
        }
        if inner.list.is_full() {
            return Err(SlotError::StorageFull);
        }
        if !inner.cache.get(key).is_root() {
            return Err(SlotError::KeyAlreadyExists);
        }

        let mut node = Node::new(key, value);
        inner.list.add_node(&mut node)?;
        if inner.config.sync_on_write {
            inner.list.sync()?;
        }
        inner.cache.write(key, node.pos);
        inner.expiry.cancel(key);

        if let Some(ttl) = ttl.filter(|ttl| !ttl.is_zero()) {
            if let Err(e) = self.schedule_delete(key, ttl) {
                // Undo the append so a failed create leaves no trace
                let _read_guard = inner.read_gate.write();
                inner.cache.delete(key);
                if let Err(undo) = inner.list.delete_node_by_pos(node.pos) {
                    tracing::warn!(key, pos = %node.pos, error = %undo, "could not undo append");
                }
                return Err(e);
            }
        }

        tracing::debug!(key, pos = %node.pos, size = value.len(), "created key");
        Ok(())
    }

    /// Get the value stored under `key`
    ///
    /// Any failure to read the indexed slot is reported as `KeyNotFound`.
    pub fn get(&self, key: &str) -> Result<Vec<u8>> {
        let inner = &self.inner;
        let key = truncate_key(key);
        let _read_guard = inner.read_gate.read();

        let pos = inner.cache.get(key);
        if pos.is_root() {
            return Err(SlotError::KeyNotFound);
        }

        match inner.list.get_node_by_pos(pos) {
            Ok(node) if node.key == key => Ok(node.value),
            Ok(node) => {
                tracing::warn!(key, pos = %pos, found = %node.key, "index points at another key");
                Err(SlotError::KeyNotFound)
            }
            Err(e) => {
                tracing::debug!(key, pos = %pos, error = %e, "read failed, reporting miss");
                Err(SlotError::KeyNotFound)
            }
        }
    }

    /// True if `key` is currently stored
    pub fn exists(&self, key: &str) -> bool {
        !self.inner.cache.get(truncate_key(key)).is_root()
    }

    /// Delete `key`
    ///
    /// Deleting a key that is not present succeeds and changes nothing.
    pub fn delete(&self, key: &str) -> Result<()> {
        let key = truncate_key(key);
        self.inner.delete(key, None)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.inner.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.cache.is_empty()
    }

    /// All live keys, sorted
    pub fn keys(&self) -> Vec<String> {
        self.inner.cache.keys()
    }

    /// Walk the chain for every indexed key and compare with the index
    ///
    /// O(n²) in the number of slots; intended for tests and maintenance.
    pub fn verify(&self) -> Result<VerifyReport> {
        let inner = &self.inner;
        let _write_guard = inner.write_lock.lock();
        let _read_guard = inner.read_gate.read();

        let entries = inner.cache.entries();
        let mut report = VerifyReport {
            indexed: entries.len(),
            ..VerifyReport::default()
        };

        for (key, pos) in entries {
            match inner.list.get_node_by_pos(pos) {
                Ok(node) if node.key == key => {}
                Ok(_) => {
                    report.mismatched.push(key);
                    continue;
                }
                Err(e) if e.is_not_found() => {
                    report.mismatched.push(key);
                    continue;
                }
                Err(e) => return Err(e),
            }

            match inner.list.traverse(&key) {
                Ok(node) if node.pos == pos => report.reachable += 1,
                Ok(_) => report.mismatched.push(key),
                Err(SlotError::KeyNotFound) => report.unreachable.push(key),
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    /// Close the store
    ///
    /// Cancels pending expirations, waits for in-flight operations and
    /// releases the data file. A timer that races the close sees `Closed`.
    pub fn close(self) -> Result<()> {
        let inner = &self.inner;
        let _write_guard = inner.write_lock.lock();
        let _read_guard = inner.read_gate.write();

        inner.expiry.cancel_all();
        inner.list.close()?;

        tracing::info!(path = %inner.config.path.display(), "store closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data file path
    pub fn path(&self) -> &Path {
        &self.inner.config.path
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the underlying node chain
    pub fn list(&self) -> &LinkedListStore {
        &self.inner.list
    }

    /// Offset of `key` in the data file, `None` if not stored
    pub fn offset_of(&self, key: &str) -> Option<Offset> {
        let pos = self.inner.cache.get(truncate_key(key));
        (!pos.is_root()).then_some(pos)
    }

    /// Number of TTL timers that have not fired yet
    pub fn pending_expirations(&self) -> usize {
        self.inner.expiry.pending()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Arrange for `key` to be deleted after `ttl`
    ///
    /// The timer holds only a weak reference, so it never keeps a dropped
    /// store alive.
    fn schedule_delete(&self, key: &str, ttl: Duration) -> Result<Generation> {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner.expiry.schedule(key, ttl, move |key, generation| {
            if let Some(inner) = weak.upgrade() {
                if let Err(e) = inner.delete(key, Some(generation)) {
                    tracing::warn!(key, error = %e, "expired key could not be deleted");
                }
            }
        })
    }
}

impl Inner {
    /// Tombstone `key` and drop it from the index
    ///
    /// `generation` is set when called from a TTL timer: the delete then
    /// only proceeds if that timer is still the one registered for `key`.
    fn delete(&self, key: &str, generation: Option<Generation>) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        let _read_guard = self.read_gate.write();

        match generation {
            Some(generation) => {
                if !self.expiry.take_if_current(key, generation) {
                    return Ok(());
                }
            }
            None => {
                self.expiry.cancel(key);
            }
        }

        let pos = self.cache.get(key);
        if pos.is_root() {
            return Ok(());
        }

        self.list.tombstone_node(pos)?;
        self.cache.delete(key);

        self.list.unlink_node(pos)?;
        if self.config.sync_on_write {
            self.list.sync()?;
        }

        tracing::debug!(key, pos = %pos, expired = generation.is_some(), "deleted key");
        Ok(())
    }
}
