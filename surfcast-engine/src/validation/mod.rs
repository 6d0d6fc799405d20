//! Forecast validation
//!
//! Matches past predictions against ground-truth buoy observations, records
//! append-only validation rows, aggregates per-forecast error metrics, and
//! builds the rolling accuracy snapshot that feeds reliability weighting.

pub mod snapshot;
pub mod validator;

use std::collections::HashMap;

pub use snapshot::build_accuracy_snapshot;
pub use validator::{
    ForecastErrorSummary, ForecastValidator, PredictionOutcome, ValidationRunSummary,
};

/// Which buoys supply ground truth for each shore
pub type ShoreBuoyMap = HashMap<String, Vec<String>>;
