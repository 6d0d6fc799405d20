//! Common error types for Surfcast

use thiserror::Error;

/// Common result type for Surfcast operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Surfcast crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timestamp outside the canonical `YYYY-MM-DD HH:MM:SS` form
    #[error("Malformed timestamp: {0}")]
    Timestamp(String),

    /// Constraint violation; the enclosing transaction is rolled back
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Fold sqlx constraint failures into `Integrity` so callers can tell a
    /// rejected write apart from an unreachable database.
    pub fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            let msg = db_err.message();
            if msg.contains("FOREIGN KEY") || msg.contains("CHECK") || msg.contains("UNIQUE") {
                return Error::Integrity(msg.to_string());
            }
        }
        Error::Database(err)
    }
}
