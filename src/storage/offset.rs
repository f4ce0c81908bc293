//! Slot offsets
//!
//! Every node lives at a byte offset that is a multiple of the node
//! capacity. `Offset` keeps that arithmetic in one place.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Byte offset of a node slot in the data file
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Offset(u64);

impl Offset {
    /// Offset of the root sentinel. Doubles as the "absent" marker in the
    /// index, since no data key can ever live here.
    pub const ROOT: Offset = Offset(0);

    pub const fn new(pos: u64) -> Self {
        Offset(pos)
    }

    /// Offset of the `index`-th slot
    pub const fn from_slot(index: u64, capacity: u64) -> Self {
        Offset(index * capacity)
    }

    /// The slot immediately after this one
    pub fn next(self, capacity: u64) -> Self {
        Offset(self.0 + capacity)
    }

    /// The slot immediately before this one, `None` at the root
    pub fn prev(self, capacity: u64) -> Option<Self> {
        self.0.checked_sub(capacity).map(Offset)
    }

    pub fn is_root(self) -> bool {
        self.0 == 0
    }

    pub fn is_aligned(self, capacity: u64) -> bool {
        capacity != 0 && self.0 % capacity == 0
    }

    pub fn slot_index(self, capacity: u64) -> u64 {
        self.0 / capacity
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for Offset {
    fn from(pos: u64) -> Self {
        Offset(pos)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
