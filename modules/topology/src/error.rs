//! Error types for topology loading and lookup.

use thiserror::Error;

/// Errors surfaced by the topology registry. None are retried: loading is
/// a one-shot pass over static data and either fully succeeds or fails.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Row or header rejected during load.
    #[error("line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    /// A host id appeared more than once.
    #[error("duplicate host id: {host_id}")]
    DuplicateKey { host_id: String },

    /// Lookup miss.
    #[error("host not found: {host_id}")]
    NotFound { host_id: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// A token that names no known network role.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);
