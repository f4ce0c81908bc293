//! Storage Manager
//!
//! Owns the single data file and provides positional, fixed-length I/O.
//!
//! ## Responsibilities
//! - Create the data file (fresh mode) or open an existing one (recovery mode)
//! - Read/write exact byte ranges at slot offsets
//! - Track the written extent and enforce the size cap
//! - Scan every slot once at startup to rebuild the index

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::{Result, SlotError};
use crate::list::codec;

use super::Offset;

/// How the data file was obtained by `StorageManager::open`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// File was absent (or empty) and has been created
    Fresh,

    /// File already held data; the caller must rebuild state via `scan_all`
    Recovery,
}

/// Outcome of a whole-file scan
#[derive(Debug, Default)]
pub struct ScanResult {
    /// First offset past the last slot, where the next node will be appended
    pub next_free: Offset,

    /// Every slot holding a non-empty key, by key
    pub offsets: HashMap<String, Offset>,

    /// Number of slots visited (including root and tombstones)
    pub slots_scanned: u64,
}

/// Manages the data file
///
/// ## Concurrency:
/// - `file`: Protected by Mutex (seek + read/write must be atomic)
/// - `len`: Atomic, only advanced while `file` is locked
/// - All methods use `&self`
pub struct StorageManager {
    /// Path of the data file
    path: PathBuf,

    /// Open handle, `None` once closed
    file: Mutex<Option<File>>,

    /// Written extent in bytes
    len: AtomicU64,

    /// Size at which `is_full` starts returning true
    max_size: u64,
}

impl StorageManager {
    /// Open or create the data file at `path`
    ///
    /// Parent directories are created as needed. A pre-existing file with at
    /// least one byte opens in `OpenMode::Recovery`.
    pub fn open(path: &Path, max_size: u64) -> Result<(Self, OpenMode)> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let len = file.metadata()?.len();

        let mode = if len > 0 {
            OpenMode::Recovery
        } else {
            OpenMode::Fresh
        };

        tracing::debug!(path = %path.display(), len, ?mode, "opened data file");

        Ok((
            Self {
                path: path.to_path_buf(),
                file: Mutex::new(Some(file)),
                len: AtomicU64::new(len),
                max_size,
            },
            mode,
        ))
    }

    /// Write `bytes` at `pos`, overwriting whatever was there
    pub fn write(&self, bytes: &[u8], pos: Offset) -> Result<()> {
        let mut guard = self.file.lock();
        let file = guard.as_mut().ok_or(SlotError::Closed)?;

        file.seek(SeekFrom::Start(pos.as_u64()))?;
        file.write_all(bytes)?;

        let end = pos.as_u64() + bytes.len() as u64;
        self.len.fetch_max(end, Ordering::SeqCst);
        Ok(())
    }

    /// Read exactly `length` bytes at `pos`
    ///
    /// Returns `EndOfData` when the range reaches past the written extent.
    pub fn read(&self, length: u64, pos: Offset) -> Result<Vec<u8>> {
        let mut guard = self.file.lock();
        let file = guard.as_mut().ok_or(SlotError::Closed)?;

        if pos.as_u64() + length > self.len.load(Ordering::SeqCst) {
            return Err(SlotError::EndOfData { pos: pos.as_u64() });
        }

        let mut buf = vec![0u8; length as usize];
        file.seek(SeekFrom::Start(pos.as_u64()))?;
        match file.read_exact(&mut buf) {
            Ok(()) => Ok(buf),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                Err(SlotError::EndOfData { pos: pos.as_u64() })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// True once the file has reached the configured maximum size
    pub fn is_full(&self) -> bool {
        self.len() >= self.max_size
    }

    /// Decode every `capacity`-sized slot from offset 0 to end of file
    ///
    /// A trailing partial slot (torn append) is zero-padded before decoding,
    /// and the file is extended to the end of that slot. Only used while
    /// recovering; holds the file lock for the whole scan.
    pub fn scan_all(&self, capacity: u64) -> Result<ScanResult> {
        let mut guard = self.file.lock();
        let file = guard.as_mut().ok_or(SlotError::Closed)?;

        let len = self.len.load(Ordering::SeqCst);
        let mut result = ScanResult::default();
        let mut buf = vec![0u8; capacity as usize];
        let mut slot = Offset::ROOT;

        file.seek(SeekFrom::Start(0))?;
        while slot.as_u64() < len {
            let available = (len - slot.as_u64()).min(capacity) as usize;
            buf.fill(0);
            file.read_exact(&mut buf[..available])?;

            let node = codec::decode(&buf);
            if !node.is_empty() {
                if node.pos != slot {
                    tracing::warn!(
                        slot = %slot,
                        recorded = %node.pos,
                        "node records a different offset than its slot"
                    );
                }
                if let Some(previous) = result.offsets.insert(node.key, slot) {
                    tracing::warn!(
                        slot = %slot,
                        previous = %previous,
                        "duplicate key found during scan, keeping later slot"
                    );
                }
            }

            result.slots_scanned += 1;
            slot = slot.next(capacity);
        }

        // A torn tail slot is extended to full width so every indexed slot
        // can be read back at `capacity` bytes
        if slot.as_u64() > len {
            file.set_len(slot.as_u64())?;
            file.sync_all()?;
            self.len.store(slot.as_u64(), Ordering::SeqCst);
            tracing::warn!(
                from = len,
                to = slot.as_u64(),
                "padded partial tail slot left by an interrupted append"
            );
        }

        result.next_free = slot;
        Ok(result)
    }

    /// Current written extent in bytes
    pub fn len(&self) -> u64 {
        self.len.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured size cap
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Path of the data file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush file contents to disk
    pub fn sync(&self) -> Result<()> {
        let guard = self.file.lock();
        let file = guard.as_ref().ok_or(SlotError::Closed)?;
        file.sync_data()?;
        Ok(())
    }

    /// True once `close` has released the handle
    pub fn is_closed(&self) -> bool {
        self.file.lock().is_none()
    }

    /// Sync and release the file handle
    ///
    /// Only the first call does anything; later calls return `Ok(())`.
    pub fn close(&self) -> Result<()> {
        let taken = self.file.lock().take();
        if let Some(file) = taken {
            file.sync_all()?;
            tracing::debug!(path = %self.path.display(), "closed data file");
        }
        Ok(())
    }
}
