//! Error types for NimbusKV
//!
//! Provides a unified error type for all keyspace operations.

use thiserror::Error;

use crate::object::Kind;

/// Result type alias using NimbusError
pub type Result<T> = std::result::Result<T, NimbusError>;

/// Unified error type for NimbusKV operations
#[derive(Debug, Error)]
pub enum NimbusError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Keyspace Errors
    // -------------------------------------------------------------------------
    /// Key is absent, or was lazily evicted on this observation
    #[error("Key not found")]
    KeyNotFound,

    /// Returned by the set-if-absent path when the key is already bound
    #[error("Key already exists")]
    KeyExists,

    // -------------------------------------------------------------------------
    // Object Errors
    // -------------------------------------------------------------------------
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value (expected {expected}, found {actual})")]
    WrongType { expected: Kind, actual: Kind },

    // -------------------------------------------------------------------------
    // Server Errors
    // -------------------------------------------------------------------------
    #[error("DB index {index} is out of range (0..{count})")]
    InvalidIndex { index: usize, count: usize },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
