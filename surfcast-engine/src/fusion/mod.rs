//! Swell event fusion
//!
//! Clusters per-source candidate components into canonical swell events
//! using joint angular and period-band tolerances, then derives dominant
//! statistics with reliability weighting and circular direction math.

pub mod circular;
pub mod engine;

pub use engine::SwellEventFusionEngine;
