//! Error types for the fusion-and-validation engine

use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Engine error types
///
/// A malformed record only ever aborts that single record; the fusion layer
/// logs it and keeps processing the remaining sources. Store failures carry
/// the underlying error through unchanged.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A reading that cannot be used: unparseable or outside physically
    /// plausible bounds
    #[error("Malformed record from {origin}: {reason}")]
    MalformedRecord { origin: String, reason: String },

    /// Validation store failure
    #[error("Store error: {0}")]
    Store(#[from] surfcast_common::Error),
}
