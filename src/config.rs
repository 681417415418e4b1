//! Configuration for NimbusKV
//!
//! Centralized configuration with sensible defaults.

use crate::error::{NimbusError, Result};

/// Number of databases used when a non-positive count is requested
pub const DEFAULT_DATABASES: usize = 16;

/// Main configuration for a NimbusKV server instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Keyspace Configuration
    // -------------------------------------------------------------------------
    /// Number of independent databases (keyspaces).
    /// Zero is replaced by `DEFAULT_DATABASES` at construction.
    pub databases: usize,

    /// Initial hash map capacity reserved per keyspace
    pub initial_capacity: usize,

    // -------------------------------------------------------------------------
    // Expiration Configuration
    // -------------------------------------------------------------------------
    /// Period of the background active-expiry sweep (milliseconds)
    pub sweep_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            databases: DEFAULT_DATABASES,
            initial_capacity: 0,
            sweep_interval_ms: 100,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Database count after substituting the default for zero
    pub fn effective_databases(&self) -> usize {
        if self.databases == 0 {
            DEFAULT_DATABASES
        } else {
            self.databases
        }
    }

    /// Check the values that cannot be silently corrected
    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval_ms == 0 {
            return Err(NimbusError::Config(
                "sweep_interval_ms must be greater than zero".to_string(),
            ));
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
    /// Set the number of databases
    pub fn databases(mut self, count: usize) -> Self {
        self.config.databases = count;
        self
    }

    /// Set the per-keyspace initial capacity
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    /// Set the sweep interval (in milliseconds)
    pub fn sweep_interval_ms(mut self, ms: u64) -> Self {
        self.config.sweep_interval_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
