//! Linked list store
//!
//! Append-only chain of fixed-size nodes over the data file.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::Mutex;

use crate::error::{Result, SlotError};
use crate::storage::{OpenMode, Offset, StorageManager};

use super::{codec, Node, NODE_CAPACITY};

/// Chain of nodes persisted in one file
///
/// ## Layout invariants
/// - slot 0 holds the root sentinel and is never deleted
/// - every node's `pos` is a multiple of `capacity`
/// - a freshly appended node has `next_pos == pos + capacity`
/// - deleted slots are zero-filled and never reused
pub struct LinkedListStore {
    /// Backing file
    storage: StorageManager,

    /// Root sentinel (slot 0)
    root: Node,

    /// Where the next node will be appended
    cursor: Mutex<Offset>,

    /// Bytes reserved per slot
    capacity: u64,
}

impl LinkedListStore {
    /// Open or create the list at `path`
    ///
    /// A new file gets a root node written at offset 0. An existing file is
    /// scanned once; the offsets of all live nodes are returned so the caller
    /// can seed its index.
    pub fn open(path: &Path, max_size: u64) -> Result<(Self, HashMap<String, Offset>)> {
        let (storage, mode) = StorageManager::open(path, max_size)?;
        let capacity = NODE_CAPACITY;

        let mut store = Self {
            storage,
            root: Node::root(capacity),
            cursor: Mutex::new(Offset::ROOT),
            capacity,
        };

        match mode {
            OpenMode::Fresh => {
                let mut root = Node::root(capacity);
                store.add_node(&mut root)?;
                store.root = root;

                tracing::info!(path = %path.display(), "created new data file");
                Ok((store, HashMap::new()))
            }
            OpenMode::Recovery => {
                let scan = store.storage.scan_all(capacity)?;
                *store.cursor.get_mut() = scan.next_free;

                tracing::info!(
                    path = %path.display(),
                    slots = scan.slots_scanned,
                    live = scan.offsets.len(),
                    cursor = %scan.next_free,
                    "recovered data file"
                );
                Ok((store, scan.offsets))
            }
        }
    }

    /// Append `node` at the cursor
    ///
    /// Sets `node.pos` and `node.next_pos`. Tombstoned slots are never
    /// reused.
    pub fn add_node(&self, node: &mut Node) -> Result<()> {
        let mut cursor = self.cursor.lock();

        node.pos = *cursor;
        node.next_pos = cursor.next(self.capacity);

        self.storage.write(&codec::encode(node)?, node.pos)?;
        *cursor = node.next_pos;
        Ok(())
    }

    /// Read the node stored at `pos`
    ///
    /// Returns `KeyNotFound` when the slot is past the end of the file or
    /// holds no node. Other I/O failures propagate unchanged.
    pub fn get_node_by_pos(&self, pos: Offset) -> Result<Node> {
        let node = self.read_slot(pos)?;
        if node.is_empty() {
            return Err(SlotError::KeyNotFound);
        }
        Ok(node)
    }

    /// Tombstone the node at `pos` and splice it out of the chain
    ///
    /// The splice only happens when both neighbouring slots hold live nodes.
    /// Otherwise the chain keeps a gap, which is harmless because reads go
    /// through the index rather than the chain.
    pub fn delete_node_by_pos(&self, pos: Offset) -> Result<()> {
        self.tombstone_node(pos)?;
        self.unlink_node(pos)
    }

    /// Zero-fill the slot at `pos`
    ///
    /// Once this returns the node is gone; `unlink_node` only repairs the
    /// chain around it.
    pub fn tombstone_node(&self, pos: Offset) -> Result<()> {
        if pos.is_root() {
            return Err(SlotError::Corruption(
                "refusing to delete the root node".to_string(),
            ));
        }
        if !pos.is_aligned(self.capacity) {
            return Err(SlotError::Corruption(format!(
                "offset {} is not a slot boundary",
                pos
            )));
        }

        self.storage.write(&vec![0u8; self.capacity as usize], pos)
    }

    /// Point the node before `pos` at the node after it
    pub fn unlink_node(&self, pos: Offset) -> Result<()> {
        let prev_pos = match pos.prev(self.capacity) {
            Some(prev) => prev,
            None => return Ok(()),
        };
        let mut prev = self.read_slot(prev_pos)?;
        let next = self.read_slot(pos.next(self.capacity))?;

        if !prev.is_empty() && !next.is_empty() {
            prev.next_pos = next.pos;
            self.storage.write(&codec::encode(&prev)?, prev_pos)?;
            tracing::trace!(prev = %prev_pos, next = %next.pos, "spliced deleted node");
        }

        Ok(())
    }

    /// Find `key` by walking the chain from the root
    ///
    /// O(n) in the number of slots. Only meant as a cross-check against the
    /// index; stops at the first empty node.
    pub fn traverse(&self, key: &str) -> Result<Node> {
        if key.is_empty() {
            return Err(SlotError::KeyNotFound);
        }

        let max_steps = self.slot_count();
        let mut pos = self.root.next_pos;

        for _ in 0..max_steps {
            let node = self.read_slot(pos)?;
            if node.is_empty() {
                break;
            }
            if node.key == key {
                return Ok(node);
            }
            if node.next_pos <= pos {
                return Err(SlotError::Corruption(format!(
                    "chain loops back from {} to {}",
                    pos, node.next_pos
                )));
            }
            pos = node.next_pos;
        }

        Err(SlotError::KeyNotFound)
    }

    /// True once the backing file has reached its size cap
    pub fn is_full(&self) -> bool {
        self.storage.is_full()
    }

    /// Offset the next append will use
    pub fn cursor(&self) -> Offset {
        *self.cursor.lock()
    }

    /// The root sentinel
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Bytes reserved per slot
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Slots in use, root and tombstones included
    pub fn slot_count(&self) -> u64 {
        self.cursor().slot_index(self.capacity)
    }

    /// The underlying storage manager
    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    pub fn sync(&self) -> Result<()> {
        self.storage.sync()
    }

    pub fn close(&self) -> Result<()> {
        self.storage.close()
    }

    /// Decode one slot; a slot past the end of the file reads as empty
    fn read_slot(&self, pos: Offset) -> Result<Node> {
        match self.storage.read(self.capacity, pos) {
            Ok(block) => Ok(codec::decode(&block)),
            Err(SlotError::EndOfData { .. }) => Ok(Node::default()),
            Err(e) => Err(e),
        }
    }
}
