//! Confidence scoring
//!
//! Derives a scalar confidence in [0,1] for each event (and for a whole
//! forecast) from three independently computed factors:
//!
//! 1. **Completeness**: fraction of expected per-source field readings that
//!    actually arrived non-missing
//! 2. **Agreement**: inverse of normalized cross-source variance in height
//!    and period, and circular variance in direction
//! 3. **Freshness**: decay of the maximum observation age among contributors
//!
//! The factors combine via a weighted arithmetic mean with configurable
//! weights. The result is a structured report (score, factor breakdown,
//! warnings) attached to the forecast row rather than discarded; the
//! formatting layer downstream consumes it verbatim.

use crate::fusion::circular;
use crate::types::SwellEvent;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use surfcast_common::config::ConfidenceConfig;
use surfcast_common::db::ForecastRow;
use tracing::debug;

/// Factor sub-scores, each in [0,1]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceFactors {
    pub completeness: f64,
    pub agreement: f64,
    pub freshness: f64,
}

/// Structured confidence report for one event or one forecast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceReport {
    /// Combined score in [0,1]
    pub score: f64,
    pub factors: ConfidenceFactors,
    /// Human-readable notes on what lowered the score
    pub warnings: Vec<String>,
}

impl ConfidenceReport {
    /// Serialize for the forecast row's JSON column
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "score": self.score,
            "factors": {
                "completeness": self.factors.completeness,
                "agreement": self.factors.agreement,
                "freshness": self.factors.freshness,
            },
            "warnings": self.warnings,
        })
    }

    /// Attach this report to a forecast record prior to insertion
    pub fn attach_to(&self, forecast: &mut ForecastRow) {
        forecast.confidence = Some(self.score);
        forecast.confidence_report = Some(self.to_json());
    }
}

/// Computes confidence reports from fused events
pub struct ConfidenceScorer {
    cfg: ConfidenceConfig,
}

impl ConfidenceScorer {
    pub fn new(cfg: ConfidenceConfig) -> Self {
        Self { cfg }
    }

    /// Score one fused event against the number of sources expected to
    /// report for it
    pub fn score_event(
        &self,
        event: &SwellEvent,
        expected_sources: usize,
        now: NaiveDateTime,
    ) -> ConfidenceReport {
        let mut warnings = Vec::new();

        let completeness = self.completeness(event, expected_sources, &mut warnings);
        let agreement = self.agreement(event, &mut warnings);
        let freshness = self.freshness(event, now);

        let factors = ConfidenceFactors {
            completeness,
            agreement,
            freshness,
        };
        let score = self.combine(factors);

        debug!(
            score,
            completeness, agreement, freshness, "Event confidence scored"
        );

        ConfidenceReport {
            score,
            factors,
            warnings,
        }
    }

    /// Roll per-event reports up into one forecast-level report
    ///
    /// The forecast score is the mean of event scores; warnings are
    /// concatenated in event order, deduplicated.
    pub fn score_forecast(&self, reports: &[ConfidenceReport]) -> ConfidenceReport {
        if reports.is_empty() {
            return ConfidenceReport {
                score: 0.0,
                factors: ConfidenceFactors {
                    completeness: 0.0,
                    agreement: 0.0,
                    freshness: 0.0,
                },
                warnings: vec!["No swell events fused".to_string()],
            };
        }

        let n = reports.len() as f64;
        let factors = ConfidenceFactors {
            completeness: reports.iter().map(|r| r.factors.completeness).sum::<f64>() / n,
            agreement: reports.iter().map(|r| r.factors.agreement).sum::<f64>() / n,
            freshness: reports.iter().map(|r| r.factors.freshness).sum::<f64>() / n,
        };
        let score = reports.iter().map(|r| r.score).sum::<f64>() / n;

        let mut warnings = Vec::new();
        for r in reports {
            for w in &r.warnings {
                if !warnings.contains(w) {
                    warnings.push(w.clone());
                }
            }
        }

        ConfidenceReport {
            score: score.clamp(0.0, 1.0),
            factors,
            warnings,
        }
    }

    /// Fraction of expected field readings (height, period, direction per
    /// expected source) that arrived
    fn completeness(
        &self,
        event: &SwellEvent,
        expected_sources: usize,
        warnings: &mut Vec<String>,
    ) -> f64 {
        let contributing = event.components.len();
        let expected = expected_sources.max(contributing).max(1);

        if contributing < expected {
            warnings.push(format!(
                "{} of {} expected sources missing",
                expected - contributing,
                expected
            ));
        }

        let mut present = 0usize;
        for c in &event.components {
            for (value, field) in [
                (c.height_m, "height"),
                (c.period_s, "period"),
                (c.direction_deg, "direction"),
            ] {
                if value.is_some() {
                    present += 1;
                } else {
                    warnings.push(format!(
                        "Source {} missing {}",
                        c.attribution.source, field
                    ));
                }
            }
        }

        (present as f64 / (expected * 3) as f64).clamp(0.0, 1.0)
    }

    /// Inverse of normalized cross-source spread over present values
    ///
    /// With fewer than two present values for every field there is nothing
    /// to disagree about and the factor is 1.0.
    fn agreement(&self, event: &SwellEvent, warnings: &mut Vec<String>) -> f64 {
        let heights: Vec<f64> = event.components.iter().filter_map(|c| c.height_m).collect();
        let periods: Vec<f64> = event.components.iter().filter_map(|c| c.period_s).collect();
        let directions: Vec<f64> = event
            .components
            .iter()
            .filter_map(|c| c.direction_deg)
            .collect();

        let mut subscores = Vec::new();

        if let Some(s) = dispersion_agreement(&heights) {
            subscores.push(s);
        }
        if let Some(s) = dispersion_agreement(&periods) {
            subscores.push(s);
        }
        if directions.len() >= 2 {
            if let Some(variance) = circular::circular_variance(&directions) {
                subscores.push(1.0 - variance);
            }
            let spread = max_angular_spread(&directions);
            if spread > self.cfg.direction_warn_spread_deg {
                warnings.push(format!(
                    "Directions disagree by {:.0}\u{b0} (threshold {:.0}\u{b0})",
                    spread, self.cfg.direction_warn_spread_deg
                ));
            }
        }

        if subscores.is_empty() {
            return 1.0;
        }
        (subscores.iter().sum::<f64>() / subscores.len() as f64).clamp(0.0, 1.0)
    }

    /// Decay of the oldest contributor's age; halves per configured half-life
    fn freshness(&self, event: &SwellEvent, now: NaiveDateTime) -> f64 {
        let max_age_hours = event
            .components
            .iter()
            .map(|c| now.signed_duration_since(c.attribution.observed_at).num_seconds())
            .max()
            .unwrap_or(0)
            .max(0) as f64
            / 3600.0;

        0.5_f64
            .powf(max_age_hours / self.cfg.freshness_half_life_hours)
            .clamp(0.0, 1.0)
    }

    /// Weighted arithmetic mean of the three factors; weights renormalized
    /// so misconfigured sums still land in [0,1]
    fn combine(&self, factors: ConfidenceFactors) -> f64 {
        let weight_sum =
            self.cfg.completeness_weight + self.cfg.agreement_weight + self.cfg.freshness_weight;
        if weight_sum <= 0.0 {
            return 0.0;
        }
        let combined = factors.completeness * self.cfg.completeness_weight
            + factors.agreement * self.cfg.agreement_weight
            + factors.freshness * self.cfg.freshness_weight;
        (combined / weight_sum).clamp(0.0, 1.0)
    }
}

/// 1 / (1 + coefficient of variation) over two or more values; `None` when
/// there is nothing to compare
fn dispersion_agreement(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean.abs() < f64::EPSILON {
        return Some(1.0);
    }
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let cv = variance.sqrt() / mean.abs();
    Some((1.0 / (1.0 + cv)).clamp(0.0, 1.0))
}

/// Largest pairwise angular separation, in degrees
fn max_angular_spread(directions: &[f64]) -> f64 {
    let mut max_spread = 0.0_f64;
    for (i, a) in directions.iter().enumerate() {
        for b in directions.iter().skip(i + 1) {
            max_spread = max_spread.max(circular::angular_difference(*a, *b).abs());
        }
    }
    max_spread
}
