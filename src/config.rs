//! Configuration for slotkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, SlotError};
use crate::list::NODE_CAPACITY;

/// Default cap on the data file size (1 GiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Main configuration for a slotkv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the single data file
    pub path: PathBuf,

    /// Once the data file reaches this many bytes, creates fail with
    /// `StorageFull`
    pub max_file_size: u64,

    /// fsync after every create/delete (safest, slowest)
    pub sync_on_write: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./slotkv_data/store.db"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            sync_on_write: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject configurations that cannot hold even the root slot
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(SlotError::Config("data file path is empty".to_string()));
        }
        if self.max_file_size < NODE_CAPACITY {
            return Err(SlotError::Config(format!(
                "max_file_size {} is smaller than one node slot ({} bytes)",
                self.max_file_size, NODE_CAPACITY
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the maximum data file size (in bytes)
    pub fn max_file_size(mut self, size: u64) -> Self {
        self.config.max_file_size = size;
        self
    }

    /// Sync the data file after every mutation
    pub fn sync_on_write(mut self, sync: bool) -> Self {
        self.config.sync_on_write = sync;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
