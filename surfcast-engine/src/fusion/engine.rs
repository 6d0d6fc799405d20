//! Swell event fusion engine
//!
//! Builds one candidate component per source from its latest usable
//! reading, clusters candidates into events under joint direction/period
//! tolerances, and derives reliability-weighted dominant statistics.
//!
//! Missing fields stay missing throughout: a source that reports height but
//! no period contributes to the height average and is simply absent from
//! the period average. Coercing absence to zero would drag every aggregate
//! toward spurious values, so no code path ever substitutes a default.

use crate::error::EngineError;
use crate::fusion::circular;
use crate::reliability::SourceReliabilityScorer;
use crate::types::{SourceAttribution, SourceObservation, SwellComponent, SwellEvent};
use chrono::NaiveDateTime;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use surfcast_common::config::FusionConfig;
use tracing::{debug, warn};

/// Clusters per-source readings into canonical swell events
///
/// Pure and deterministic: identical inputs produce an identical event
/// collection, including order.
pub struct SwellEventFusionEngine {
    cfg: FusionConfig,
}

impl SwellEventFusionEngine {
    pub fn new(cfg: FusionConfig) -> Self {
        Self { cfg }
    }

    /// Fuse the most recent readings of each source into swell events
    ///
    /// `readings` maps source name to that source's readings; the ordered
    /// map keeps clustering independent of caller insertion order. `now`
    /// anchors observation ages for reliability weighting.
    pub fn fuse(
        &self,
        readings: &BTreeMap<String, Vec<SourceObservation>>,
        scorer: &SourceReliabilityScorer,
        now: NaiveDateTime,
    ) -> Vec<SwellEvent> {
        let mut candidates = Vec::new();
        for (source, observations) in readings {
            match self.candidate_component(source, observations, scorer, now) {
                Some(component) => candidates.push(component),
                None => debug!(source = %source, "No usable reading; source skipped"),
            }
        }

        let clusters = self.cluster(candidates);

        let mut events: Vec<SwellEvent> = clusters.into_iter().map(build_event).collect();

        // Peak time ascending, ties by height descending, then by first
        // source name so equal inputs always produce equal output order
        events.sort_by(|a, b| {
            a.peak_time
                .cmp(&b.peak_time)
                .then_with(|| cmp_height_desc(a.dominant_height_m, b.dominant_height_m))
                .then_with(|| a.attributions[0].source.cmp(&b.attributions[0].source))
        });

        debug!(
            sources = readings.len(),
            events = events.len(),
            "Fusion complete"
        );

        events
    }

    /// Latest usable reading of one source, as a weighted component
    ///
    /// Scans newest-first. Malformed records are dropped and logged, and
    /// the scan continues with the next older reading; a record with no
    /// present numeric field carries no signal and is skipped the same way.
    fn candidate_component(
        &self,
        source: &str,
        observations: &[SourceObservation],
        scorer: &SourceReliabilityScorer,
        now: NaiveDateTime,
    ) -> Option<SwellComponent> {
        let mut ordered: Vec<&SourceObservation> = observations.iter().collect();
        ordered.sort_by(|a, b| b.observed_at.cmp(&a.observed_at));

        for obs in ordered {
            if let Err(err) = self.screen(source, obs) {
                warn!(source = %source, %err, "Dropping malformed record");
                continue;
            }
            if !obs.has_any_reading() {
                continue;
            }

            let age = now.signed_duration_since(obs.observed_at);
            let weight = scorer.weight(source, obs.kind, age);

            return Some(SwellComponent {
                height_m: obs.height_m,
                period_s: obs.period_s,
                direction_deg: obs.direction_deg.map(circular::normalize_deg),
                weight,
                attribution: SourceAttribution {
                    source: obs.source.clone(),
                    kind: obs.kind,
                    observed_at: obs.observed_at,
                    quality: obs.quality,
                },
            });
        }

        None
    }

    /// Reject readings outside physically plausible bounds
    fn screen(&self, source: &str, obs: &SourceObservation) -> Result<(), EngineError> {
        let malformed = |reason: String| EngineError::MalformedRecord {
            origin: source.to_string(),
            reason,
        };

        if let Some(h) = obs.height_m {
            if !h.is_finite() || h < 0.0 || h > self.cfg.max_height_m {
                return Err(malformed(format!("implausible height {} m", h)));
            }
        }
        if let Some(p) = obs.period_s {
            if !p.is_finite() || p <= 0.0 || p > self.cfg.max_period_s {
                return Err(malformed(format!("implausible period {} s", p)));
            }
        }
        if let Some(d) = obs.direction_deg {
            if !d.is_finite() {
                return Err(malformed(format!("non-finite direction {}", d)));
            }
        }

        Ok(())
    }

    /// Greedy clustering under joint tolerances
    ///
    /// A component joins an existing cluster only when BOTH its direction
    /// lies within the angular bucket of the cluster's running direction
    /// AND its period lies within the period band of the cluster's running
    /// period. A missing field cannot violate its tolerance. Components
    /// failing either tolerance against every cluster start their own event.
    fn cluster(&self, candidates: Vec<SwellComponent>) -> Vec<Vec<SwellComponent>> {
        let mut clusters: Vec<Vec<SwellComponent>> = Vec::new();

        for candidate in candidates {
            let slot = clusters
                .iter()
                .position(|members| self.accepts(members, &candidate));
            match slot {
                Some(i) => clusters[i].push(candidate),
                None => clusters.push(vec![candidate]),
            }
        }

        clusters
    }

    fn accepts(&self, members: &[SwellComponent], candidate: &SwellComponent) -> bool {
        let direction_ok = match (cluster_direction(members), candidate.direction_deg) {
            (Some(cluster_dir), Some(dir)) => {
                circular::angular_difference(dir, cluster_dir).abs()
                    <= self.cfg.direction_tolerance_deg
            }
            _ => true,
        };

        let period_ok = match (cluster_period(members), candidate.period_s) {
            (Some(cluster_period), Some(period)) => {
                (period - cluster_period).abs() <= self.cfg.period_tolerance_s
            }
            _ => true,
        };

        direction_ok && period_ok
    }
}

/// Running weighted circular mean over members' present directions
fn cluster_direction(members: &[SwellComponent]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = members
        .iter()
        .filter_map(|c| c.direction_deg.map(|d| (d, c.weight)))
        .collect();
    circular::weighted_circular_mean(&pairs)
}

/// Running weighted mean over members' present periods
fn cluster_period(members: &[SwellComponent]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = members
        .iter()
        .filter_map(|c| c.period_s.map(|p| (p, c.weight)))
        .collect();
    weighted_mean(&pairs)
}

/// Weighted arithmetic mean; zero total weight falls back to unweighted
fn weighted_mean(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.is_empty() {
        return None;
    }
    // a lone value passes through untouched
    if pairs.len() == 1 {
        return Some(pairs[0].0);
    }
    let total_weight: f64 = pairs.iter().map(|(_, w)| w).sum();
    if total_weight > 0.0 {
        Some(pairs.iter().map(|(v, w)| v * w).sum::<f64>() / total_weight)
    } else {
        Some(pairs.iter().map(|(v, _)| v).sum::<f64>() / pairs.len() as f64)
    }
}

/// Derive one event from a cluster of components
fn build_event(mut components: Vec<SwellComponent>) -> SwellEvent {
    components.sort_by(|a, b| a.attribution.source.cmp(&b.attribution.source));

    let heights: Vec<(f64, f64)> = components
        .iter()
        .filter_map(|c| c.height_m.map(|h| (h, c.weight)))
        .collect();
    let periods: Vec<(f64, f64)> = components
        .iter()
        .filter_map(|c| c.period_s.map(|p| (p, c.weight)))
        .collect();
    let directions: Vec<(f64, f64)> = components
        .iter()
        .filter_map(|c| c.direction_deg.map(|d| (d, c.weight)))
        .collect();

    let start_time = components
        .iter()
        .map(|c| c.attribution.observed_at)
        .min()
        .expect("cluster is never empty");
    let end_time = components
        .iter()
        .map(|c| c.attribution.observed_at)
        .max()
        .expect("cluster is never empty");

    // Peak at the observation time of the tallest component; components
    // without height fall back to the cluster start
    let peak_time = components
        .iter()
        .filter(|c| c.height_m.is_some())
        .max_by(|a, b| {
            a.height_m
                .partial_cmp(&b.height_m)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.attribution.source.cmp(&a.attribution.source))
        })
        .map(|c| c.attribution.observed_at)
        .unwrap_or(start_time);

    let attributions: Vec<SourceAttribution> =
        components.iter().map(|c| c.attribution.clone()).collect();

    SwellEvent {
        dominant_height_m: weighted_mean(&heights),
        dominant_period_s: weighted_mean(&periods),
        dominant_direction_deg: circular::weighted_circular_mean(&directions),
        start_time,
        peak_time,
        end_time,
        attributions,
        components,
    }
}

/// Descending order over optional heights; absent heights sort last
fn cmp_height_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
