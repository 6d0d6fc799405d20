//! # Surfcast Engine
//!
//! The fusion-and-validation core: merges heterogeneous, partially-missing
//! per-source wave readings into canonical swell events with attached
//! confidence, and reconciles past predictions against ground-truth
//! observations to maintain a durable accuracy ledger.
//!
//! Fusion and confidence scoring are pure transformations over immutable
//! inputs; the validation store (in `surfcast-common`) is the only shared
//! mutable resource.

pub mod confidence;
pub mod error;
pub mod fusion;
pub mod reliability;
pub mod types;
pub mod validation;

pub use crate::error::{EngineError, EngineResult};
pub use crate::fusion::SwellEventFusionEngine;
pub use crate::reliability::{AccuracySnapshot, SourceReliabilityScorer};
