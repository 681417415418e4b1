//! # NimbusKV
//!
//! An in-memory, multi-database keyspace engine with:
//! - Typed, reference-counted value objects (string, list, set, zset, hash)
//! - Per-key expiration, enforced lazily on read and by an active sweep
//! - One reader/writer lock per database
//! - A server container that multiplexes independent databases
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Command / Protocol Layer                     │
//! │                    (not part of this crate)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Server                                │
//! │          (databases[0..n], selected: Mutex<usize>)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Keyspace 0 │   ...    │  Keyspace n │
//!   │  (RwLock)   │          │  (RwLock)   │
//!   └──────┬──────┘          └─────────────┘
//!          │  keys: key → Object
//!          │  expires: key → instant
//!          ▼
//!   ┌─────────────┐
//!   │   Object    │
//!   │ (refcount)  │
//!   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod clock;

pub mod object;
pub mod keyspace;
pub mod server;
pub mod sweeper;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{NimbusError, Result};
pub use config::Config;
pub use clock::{Clock, ManualClock, SystemClock};
pub use object::{Encoding, Kind, Object, Value};
pub use keyspace::{Keyspace, KeyspaceStats, TTL_MISSING, TTL_PERSISTENT};
pub use server::Server;
pub use sweeper::Sweeper;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of NimbusKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
