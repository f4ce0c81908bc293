//! Node codec
//!
//! Fixed-width encoding of one node into one slot.
//!
//! ## Slot Format
//! ```text
//! ┌──────────┬──────────┬──────────────────────────┬──────────────┐
//! │ CRC (4)  │ Len (4)  │ Payload (Len)            │ zero padding │
//! └──────────┴──────────┴──────────────────────────┴──────────────┘
//! ```
//!
//! Payload is the bincode (fixint, little-endian) encoding of
//! `pos (8) | next_pos (8) | key_len (8) | key | val_len (8) | value`.
//! CRC32 covers the payload only. An all-zero slot has `Len` 0 and decodes
//! to the empty node.

use bincode::Options;

use crate::error::{Result, SlotError};

use super::{Node, MAX_PAYLOAD_SIZE, NODE_CAPACITY, NODE_HEADER_SIZE};

fn payload_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_PAYLOAD_SIZE as u64)
}

/// Encode a node into a zero-padded block of exactly `NODE_CAPACITY` bytes
pub fn encode(node: &Node) -> Result<Vec<u8>> {
    let payload = payload_options()
        .serialize(node)
        .map_err(|e| SlotError::Serialization(e.to_string()))?;

    let mut block = vec![0u8; NODE_CAPACITY as usize];
    block[0..4].copy_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    block[4..8].copy_from_slice(&(payload.len() as u32).to_le_bytes());
    block[NODE_HEADER_SIZE..NODE_HEADER_SIZE + payload.len()].copy_from_slice(&payload);

    Ok(block)
}

/// Decode a slot
///
/// Never fails. Anything that is not a well-formed node (zeros, a torn
/// write, a CRC mismatch, short input) decodes to the empty node, and the
/// caller decides what "empty" means.
pub fn decode(block: &[u8]) -> Node {
    if block.len() < NODE_HEADER_SIZE {
        return Node::default();
    }

    let crc = read_u32(block, 0);
    let len = read_u32(block, 4) as usize;

    if len == 0 || len > MAX_PAYLOAD_SIZE || NODE_HEADER_SIZE + len > block.len() {
        return Node::default();
    }

    let payload = &block[NODE_HEADER_SIZE..NODE_HEADER_SIZE + len];
    if crc32fast::hash(payload) != crc {
        tracing::trace!(len, "slot checksum mismatch, treating as empty");
        return Node::default();
    }

    payload_options().deserialize(payload).unwrap_or_default()
}

fn read_u32(block: &[u8], at: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&block[at..at + 4]);
    u32::from_le_bytes(bytes)
}
