//! Error types for slotkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using SlotError
pub type Result<T> = std::result::Result<T, SlotError>;

/// Unified error type for slotkv operations
#[derive(Debug, Error)]
pub enum SlotError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Read past the written extent of the data file
    #[error("End of data at offset {pos}")]
    EndOfData { pos: u64 },

    /// The data file handle has already been released
    #[error("Store is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Key/Value Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    KeyNotFound,

    #[error("Key already exists")]
    KeyAlreadyExists,

    #[error("Value of {size} bytes exceeds max allowed size of {max} bytes")]
    ValueTooLarge { size: usize, max: usize },

    #[error("Key must not be empty")]
    EmptyKey,

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage is full")]
    StorageFull,

    #[error("Data file corruption: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SlotError {
    /// True for the errors a positional lookup treats as "no node here"
    pub fn is_not_found(&self) -> bool {
        matches!(self, SlotError::KeyNotFound | SlotError::EndOfData { .. })
    }
}
