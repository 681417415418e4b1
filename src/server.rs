//! Server: the multi-database container
//!
//! Owns a fixed array of keyspaces and the "currently selected" index used
//! by callers that work against an implicit session.
//!
//! ## Concurrency:
//! - `selected`: its own Mutex, held only while the field is read or written
//! - Each keyspace carries its own lock; no server operation holds two at once
//! - `flush_all` and `sweep_expired` visit databases one after another, so
//!   they are not atomic across the server

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, DEFAULT_DATABASES};
use crate::error::{NimbusError, Result};
use crate::keyspace::{Keyspace, KeyspaceStats};

/// Container of independent keyspaces
pub struct Server {
    databases: Vec<Keyspace>,
    selected: Mutex<usize>,
}

impl Server {
    /// Build `count` databases numbered `0..count`; zero means 16
    pub fn new(count: usize) -> Self {
        let config = Config::builder().databases(count).build();
        Self::with_config(&config)
    }

    pub fn with_config(config: &Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build from `config`, with every keyspace reading time from `clock`
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let count = config.effective_databases();

        let databases = (0..count)
            .map(|id| Keyspace::with_clock(id, Arc::clone(&clock), config.initial_capacity))
            .collect();

        info!(databases = count, "server initialized");

        Self {
            databases,
            selected: Mutex::new(0),
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Make `index` the current database. Leaves the selection unchanged on error.
    pub fn select(&self, index: usize) -> Result<()> {
        self.check_index(index)?;
        *self.selected.lock() = index;
        debug!(db = index, "selected database");
        Ok(())
    }

    pub fn selected(&self) -> usize {
        *self.selected.lock()
    }

    /// The currently selected keyspace
    pub fn current(&self) -> &Keyspace {
        let index = self.selected();
        &self.databases[index]
    }

    // =========================================================================
    // Database Access
    // =========================================================================

    /// Keyspace at `index`, without touching the selection
    pub fn database_at(&self, index: usize) -> Result<&Keyspace> {
        self.check_index(index)?;
        Ok(&self.databases[index])
    }

    pub fn database_count(&self) -> usize {
        self.databases.len()
    }

    pub fn databases(&self) -> impl Iterator<Item = &Keyspace> {
        self.databases.iter()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.databases.len() {
            return Err(NimbusError::InvalidIndex {
                index,
                count: self.databases.len(),
            });
        }
        Ok(())
    }

    // =========================================================================
    // Server-wide Operations
    // =========================================================================

    /// Flush every database, one at a time
    pub fn flush_all(&self) {
        for db in &self.databases {
            db.flush();
        }
        debug!("flushed all databases");
    }

    /// Run the active sweep over every database. Returns the total evicted.
    pub fn sweep_expired(&self) -> usize {
        self.databases.iter().map(Keyspace::sweep_expired).sum()
    }

    /// Stats for every database that holds at least one live key
    pub fn info(&self) -> Vec<KeyspaceStats> {
        self.databases
            .iter()
            .map(Keyspace::stats)
            .filter(|stats| stats.keys > 0)
            .collect()
    }

    /// Live keys across all databases
    pub fn total_keys(&self) -> usize {
        self.databases.iter().map(|db| db.stats().keys).sum()
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASES)
    }
}
