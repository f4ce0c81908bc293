//! Linked List Module
//!
//! Fixed-size node records chained by offset inside the data file.
//!
//! ## Responsibilities
//! - Encode/decode one node per slot
//! - Append nodes at the cursor (never reusing slots)
//! - Fetch a node by offset
//! - Tombstone a node and splice it out of the chain
//! - Rebuild the cursor and key offsets from a file scan
//!
//! ## Chain
//! ```text
//! ┌──────┐ next ┌──────┐ next ┌──────┐ next ┌──────┐
//! │ root │ ───▶ │  A   │ ───▶ │  B   │ ───▶ │  C   │ ───▶ (cursor)
//! └──────┘      └──────┘      └──────┘      └──────┘
//!
//! delete B:     ┌──────┐      ┌──────┐      ┌──────┐
//!               │  A   │ ─┐   │ 0000 │   ┌▶ │  C   │
//!               └──────┘  └───┼──────┼───┘  └──────┘
//! ```

pub mod codec;
mod node;
mod store;

pub use node::{truncate_key, Node};
pub use store::LinkedListStore;

// =============================================================================
// Size Limits
// =============================================================================

/// Longest key kept, in bytes. Longer keys are truncated.
pub const MAX_KEY_LENGTH: usize = 32;

/// Largest value accepted, in bytes (64 KiB)
pub const MAX_VALUE_SIZE: usize = 64 * 1024;

/// Slot header: CRC (4) + payload length (4)
pub const NODE_HEADER_SIZE: usize = 8;

/// Largest encoded node payload:
/// pos (8) + next_pos (8) + key len (8) + key + value len (8) + value
pub const MAX_PAYLOAD_SIZE: usize = 8 + 8 + 8 + MAX_KEY_LENGTH + 8 + MAX_VALUE_SIZE;

/// Bytes reserved for every slot in the data file
pub const NODE_CAPACITY: u64 = (NODE_HEADER_SIZE + MAX_PAYLOAD_SIZE) as u64;
