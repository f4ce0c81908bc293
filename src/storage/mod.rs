//! Storage Module
//!
//! Positional I/O over a single flat data file.
//!
//! ## File Format
//! ```text
//! offset 0          cap            2*cap          3*cap
//! ┌────────────────┬──────────────┬──────────────┬──────────────┐
//! │ root (empty    │ node         │ tombstone    │ node         │ ...
//! │ key, never     │              │ (all zeros)  │              │
//! │ deleted)       │              │              │              │
//! └────────────────┴──────────────┴──────────────┴──────────────┘
//! ```
//!
//! There is no header, magic or version: slot 0 is the root and every slot
//! starts at a multiple of the node capacity. Slots are never reused, so the
//! file only grows.

mod manager;
mod offset;

pub use manager::{OpenMode, ScanResult, StorageManager};
pub use offset::Offset;
