//! Configuration loading
//!
//! All tuning knobs for fusion, confidence scoring, reliability weighting,
//! and validation live here, loaded from TOML with per-field defaults. An
//! empty TOML document resolves to the same values as `Config::default()`,
//! so callers never need a config file to get a working engine.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Top-level configuration for the fusion-and-validation engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fusion: FusionConfig,
    pub confidence: ConfidenceConfig,
    pub reliability: ReliabilityConfig,
    pub validation: ValidationConfig,
}

impl Config {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read config failed: {}", e)))?;
        Self::from_toml_str(&content)
    }
}

/// Clustering tolerances and plausibility bounds for the fusion engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Angular bucket: components join one event only within this many
    /// degrees of the event's direction
    pub direction_tolerance_deg: f64,
    /// Period band: components join one event only within this many seconds
    /// of the event's period
    pub period_tolerance_s: f64,
    /// Readings with height outside (0, max_height_m] are malformed
    pub max_height_m: f64,
    /// Readings with period outside (0, max_period_s] are malformed
    pub max_period_s: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            direction_tolerance_deg: 15.0,
            period_tolerance_s: 2.0,
            max_height_m: 30.0,
            max_period_s: 30.0,
        }
    }
}

/// Factor weights and thresholds for confidence scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Weight of the completeness factor in the combined score
    pub completeness_weight: f64,
    /// Weight of the agreement factor in the combined score
    pub agreement_weight: f64,
    /// Weight of the freshness factor in the combined score
    pub freshness_weight: f64,
    /// Freshness halves every this many hours of contributor age
    pub freshness_half_life_hours: f64,
    /// Cross-source direction spread beyond this many degrees emits a warning
    pub direction_warn_spread_deg: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            completeness_weight: 0.35,
            agreement_weight: 0.40,
            freshness_weight: 0.25,
            freshness_half_life_hours: 6.0,
            direction_warn_spread_deg: 20.0,
        }
    }
}

/// Source reliability weighting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliabilityConfig {
    /// Historical mean absolute height error (metres) at which accuracy
    /// drops to 0.5; smaller errors score higher
    pub error_scale_m: f64,
    /// Lower bound on any accuracy derived from history
    pub accuracy_floor: f64,
    /// Sources with fewer validated samples than this fall back to priors
    pub min_samples: u32,
    /// Observation age beyond which staleness decay starts, in hours
    pub staleness_threshold_hours: f64,
    /// Weight halves every this many hours past the staleness threshold
    pub decay_half_life_hours: f64,
    /// Static prior weight per source kind, used when no history exists;
    /// keys are the `SourceKind` names: buoy, weather_grid, wave_model,
    /// satellite
    pub priors: HashMap<String, f64>,
    /// Prior for a source kind missing from the table
    pub default_prior: f64,
    /// Rolling history window for accuracy aggregation, in days
    pub history_window_days: i64,
    /// Upper bound on the store lookup when building a snapshot, in ms
    pub snapshot_timeout_ms: u64,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        let mut priors = HashMap::new();
        priors.insert("buoy".to_string(), 0.9);
        priors.insert("wave_model".to_string(), 0.7);
        priors.insert("weather_grid".to_string(), 0.6);
        priors.insert("satellite".to_string(), 0.5);
        Self {
            error_scale_m: 0.5,
            accuracy_floor: 0.1,
            min_samples: 5,
            staleness_threshold_hours: 6.0,
            decay_half_life_hours: 6.0,
            priors,
            default_prior: 0.5,
            history_window_days: 90,
            snapshot_timeout_ms: 2000,
        }
    }
}

/// Prediction-to-actual matching parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Symmetric matching window around a prediction's valid time, in hours
    pub window_hours: f64,
    /// Size category boundaries in metres, ascending:
    /// flat < b[0] <= small < b[1] <= moderate < b[2] <= large < b[3] <= epic
    pub category_bounds_m: Vec<f64>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            window_hours: 3.0,
            category_bounds_m: vec![0.5, 1.5, 2.5, 4.0],
        }
    }
}
