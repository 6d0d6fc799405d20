//! Source reliability scoring
//!
//! Assigns each data source a trust weight in [0,1] from historical
//! accuracy and observation recency. History arrives as an explicit,
//! versioned snapshot; the scorer itself is a pure function over its
//! inputs, so identical snapshot + age always produce identical weights.

use crate::types::SourceKind;
use chrono::{Duration, NaiveDateTime};
use std::collections::HashMap;
use surfcast_common::config::ReliabilityConfig;
use surfcast_common::db::SourceErrorStats;

/// A read-only snapshot of rolling-window per-source accuracy
///
/// Built from the validation store (see `validation::build_accuracy_snapshot`)
/// or empty when no history is available yet.
#[derive(Debug, Clone)]
pub struct AccuracySnapshot {
    /// When the snapshot was taken
    pub as_of: NaiveDateTime,
    /// Length of the rolling window the aggregates cover, in days
    pub window_days: i64,
    pub per_source: HashMap<String, SourceErrorStats>,
}

impl AccuracySnapshot {
    /// Snapshot with no history; every source falls back to its static prior
    pub fn empty(as_of: NaiveDateTime, window_days: i64) -> Self {
        Self {
            as_of,
            window_days,
            per_source: HashMap::new(),
        }
    }
}

/// Computes per-source trust weights
pub struct SourceReliabilityScorer {
    cfg: ReliabilityConfig,
    snapshot: AccuracySnapshot,
}

impl SourceReliabilityScorer {
    pub fn new(cfg: ReliabilityConfig, snapshot: AccuracySnapshot) -> Self {
        Self { cfg, snapshot }
    }

    /// Trust weight for one source's observation of the given age, in [0,1]
    ///
    /// Historical accuracy (when enough validated samples exist) or the
    /// static prior for the source kind, multiplied by a staleness decay
    /// once the observation age exceeds the configured threshold.
    pub fn weight(&self, source: &str, kind: SourceKind, observation_age: Duration) -> f64 {
        let base = self.base_accuracy(source, kind);
        (base * self.staleness_decay(observation_age)).clamp(0.0, 1.0)
    }

    /// Accuracy before staleness: lower historical error scores higher
    fn base_accuracy(&self, source: &str, kind: SourceKind) -> f64 {
        if let Some(stats) = self.snapshot.per_source.get(source) {
            if stats.sample_count >= self.cfg.min_samples {
                let accuracy =
                    1.0 / (1.0 + stats.mean_abs_height_error_m / self.cfg.error_scale_m);
                return accuracy.clamp(self.cfg.accuracy_floor, 1.0);
            }
        }
        self.prior(kind)
    }

    /// Static prior for a source kind with no usable history
    fn prior(&self, kind: SourceKind) -> f64 {
        self.cfg
            .priors
            .get(kind.as_str())
            .copied()
            .unwrap_or(self.cfg.default_prior)
            .clamp(0.0, 1.0)
    }

    /// Exponential decay applied once age passes the staleness threshold;
    /// halves every `decay_half_life_hours` past it
    fn staleness_decay(&self, age: Duration) -> f64 {
        let age_hours = age.num_seconds() as f64 / 3600.0;
        if age_hours <= self.cfg.staleness_threshold_hours {
            return 1.0;
        }
        let excess = age_hours - self.cfg.staleness_threshold_hours;
        0.5_f64.powf(excess / self.cfg.decay_half_life_hours)
    }
}
