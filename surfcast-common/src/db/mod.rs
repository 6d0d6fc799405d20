//! Validation store
//!
//! Durable SQLite storage for the four persisted tables (forecasts,
//! predictions, actuals, validations) plus schema versioning. WAL journal
//! mode keeps readers unblocked while a writer commits; foreign keys are
//! enforced; canonical timestamps are validated on the Rust side and
//! re-checked by the schema.
//!
//! Callers keep a single writer per forecast: one task owns the inserts and
//! validations of a given forecast while any number of readers query
//! concurrently.

pub mod init;
pub mod models;
pub mod queries;

pub use init::init_store;
pub use models::{ActualRow, ForecastRow, PredictionRow, SourceErrorStats, ValidationRow};
