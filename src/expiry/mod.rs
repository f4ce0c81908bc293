//! Expiry Module
//!
//! Time-to-live support: delete a key once its TTL has elapsed. Each store
//! runs one expiry thread, however many keys carry a TTL.
//!
//! Timers are not persisted. A key whose TTL has not fired when the store is
//! closed is recovered on the next open without an expiry.

mod scheduler;

pub use scheduler::{ExpiryScheduler, Generation, WORKER_THREAD_NAME};
