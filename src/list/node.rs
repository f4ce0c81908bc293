//! Node definitions
//!
//! Defines the record stored in each slot of the data file.

use serde::{Deserialize, Serialize};

use crate::storage::Offset;

use super::MAX_KEY_LENGTH;

/// A single record in the linked list
///
/// A node with an empty key means "no node here": it is what the codec
/// returns for tombstones, unwritten slots and unreadable bytes. The root
/// sentinel also has an empty key; it is told apart by its offset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Offset of this node's own slot
    pub pos: Offset,

    /// Offset of the logically next node
    pub next_pos: Offset,

    /// Key, at most `MAX_KEY_LENGTH` bytes
    pub key: String,

    /// Opaque value bytes
    pub value: Vec<u8>,
}

impl Node {
    /// Create an unplaced node. `pos`/`next_pos` are assigned on append.
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            pos: Offset::ROOT,
            next_pos: Offset::ROOT,
            key: key.into(),
            value: value.into(),
        }
    }

    /// The root sentinel for a file with the given slot capacity
    pub fn root(capacity: u64) -> Self {
        Self {
            pos: Offset::ROOT,
            next_pos: Offset::ROOT.next(capacity),
            key: String::new(),
            value: Vec::new(),
        }
    }

    /// True when this node stands for an absent or tombstoned slot
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

/// Cut `key` down to at most `MAX_KEY_LENGTH` bytes
///
/// Cuts on a char boundary so the result is always valid UTF-8. Every entry
/// point that takes a key runs it through here, so an over-long key maps to
/// the same stored key on every call.
pub fn truncate_key(key: &str) -> &str {
    if key.len() <= MAX_KEY_LENGTH {
        return key;
    }
    let mut end = MAX_KEY_LENGTH;
    while !key.is_char_boundary(end) {
        end -= 1;
    }
    &key[..end]
}
