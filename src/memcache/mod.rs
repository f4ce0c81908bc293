//! MemCache Module
//!
//! In-memory index of where each live key sits in the data file.
//!
//! ## Responsibilities
//! - O(1) key → offset lookups for reads
//! - Concurrent readers, exclusive writer
//! - Rebuilt wholesale from a file scan at open, then kept current by
//!   create/delete
//!
//! Offset 0 is the root slot and never holds a key, so `get` returns it to
//! mean "not indexed".

mod cache;

pub use cache::MemCache;
