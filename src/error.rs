//! Error types for the cache crate
//!
//! The cache core itself never fails; these cover its collaborators.

use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache collaborators.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Reading a file into the file cache failed
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unknown eviction policy name
    #[error("Invalid eviction policy: {0}")]
    InvalidPolicy(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache crate.
pub type Result<T> = std::result::Result<T, CacheError>;
