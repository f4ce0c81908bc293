//! # slotkv
//!
//! An embedded, file-backed key-value store with:
//! - A single data file of fixed-size slots, chained as a linked list
//! - An in-memory key → offset index for O(1) reads
//! - Crash recovery by scanning the data file on open
//! - Optional per-key time-to-live
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        KvStore                               │
//! │        create / get / exists / delete / close                │
//! │        (write lock + read gate, TTL timers)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  MemCache   │          │ LinkedList  │
//!   │ key→offset  │          │   Store     │
//!   │  (RwLock)   │          └──────┬──────┘
//!   └─────────────┘                 │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Storage   │
//!                           │  Manager    │
//!                           │ (one file)  │
//!                           └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use slotkv::KvStore;
//!
//! let store = KvStore::open_path("data/store.db".as_ref())?;
//! store.create("session:42", b"{\"user\":7}", Some(Duration::from_secs(60)))?;
//! assert_eq!(store.get("session:42")?, b"{\"user\":7}".to_vec());
//! store.delete("session:42")?;
//! store.close()?;
//! # Ok::<(), slotkv::SlotError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod storage;
pub mod list;
pub mod memcache;
pub mod expiry;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, SlotError};
pub use config::{Config, DEFAULT_MAX_FILE_SIZE};
pub use list::{MAX_KEY_LENGTH, MAX_VALUE_SIZE, NODE_CAPACITY};
pub use store::{KvStore, VerifyReport};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of slotkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
