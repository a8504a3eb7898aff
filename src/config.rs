//! Centralized configuration for SlotDB.
//!
//! Goals:
//! - Single place for tunables instead of scattering env lookups.
//! - StoreConfig::from_env() keeps the env-driven behavior; fluent with_*
//!   setters allow explicit overrides (open_with_config / open_ro_with_config).

use std::fmt;

#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Fsync the store file after every successful set/delete.
    /// Env: SLOTDB_DATA_FSYNC (default false; "1|true|on|yes" => true)
    pub data_fsync: bool,

    /// Take an advisory flock on the store file (exclusive for rw, shared for ro).
    /// Env: SLOTDB_LOCK (default true; "0|false|off|no" => false)
    pub lock: bool,

    /// Build an in-memory key index on read-only open (accelerates has/get).
    /// Env: SLOTDB_MEM_INDEX (default false; "1|true|on|yes" => true)
    pub mem_index: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_fsync: false,
            lock: true,
            mem_index: false,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("SLOTDB_DATA_FSYNC") {
            let s = v.trim().to_ascii_lowercase();
            cfg.data_fsync = s == "1" || s == "true" || s == "on" || s == "yes";
        }

        if let Ok(v) = std::env::var("SLOTDB_LOCK") {
            let s = v.trim().to_ascii_lowercase();
            cfg.lock = !(s == "0" || s == "false" || s == "off" || s == "no");
        }

        if let Ok(v) = std::env::var("SLOTDB_MEM_INDEX") {
            let s = v.trim().to_ascii_lowercase();
            cfg.mem_index = s == "1" || s == "true" || s == "on" || s == "yes";
        }

        cfg
    }

    // Fluent setters (builder-style) to override specific fields.

    pub fn with_data_fsync(mut self, on: bool) -> Self {
        self.data_fsync = on;
        self
    }

    pub fn with_lock(mut self, on: bool) -> Self {
        self.lock = on;
        self
    }

    pub fn with_mem_index(mut self, on: bool) -> Self {
        self.mem_index = on;
        self
    }
}

impl fmt::Display for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StoreConfig {{ data_fsync: {}, lock: {}, mem_index: {} }}",
            self.data_fsync, self.lock, self.mem_index
        )
    }
}
