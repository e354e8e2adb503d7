//! Snapshot error types.

use thiserror::Error;

/// Errors that can occur while capturing, encoding or restoring a
/// snapshot.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON or binary format failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Snapshot version is not supported by this version
    #[error("Unsupported snapshot version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// The machine has no configuration to capture yet
    #[error("Machine is not initialized; nothing to snapshot")]
    Uninitialized,

    /// Snapshot data does not fit the machine's topology
    #[error("Snapshot validation failed: {0}")]
    ValidationFailed(String),
}
