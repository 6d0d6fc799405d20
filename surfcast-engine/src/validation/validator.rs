//! Prediction-to-actual matching and error metrics
//!
//! Each prediction moves through {Pending → Matched → Validated} or ends
//! {Pending → Unmatched} when no actual exists inside the window. Unmatched
//! predictions produce no row at all; recording them as zero-error matches
//! would poison every downstream accuracy aggregate. Validation rows are
//! append-only: re-running validation is a no-op for an already-validated
//! pair and only writes again when a previously-absent actual has appeared.

use crate::error::EngineResult;
use crate::fusion::circular;
use crate::types::SizeCategory;
use crate::validation::ShoreBuoyMap;
use chrono::{Duration, NaiveDateTime};
use sqlx::SqlitePool;
use surfcast_common::config::ValidationConfig;
use surfcast_common::db::models::{ActualRow, PredictionRow, ValidationRow};
use surfcast_common::db::queries;
use tracing::{debug, info};

/// Terminal state of one prediction for one validation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionOutcome {
    /// A new validation row was written
    Validated,
    /// The nearest actual was already validated against this prediction
    AlreadyValidated,
    /// No actual inside the window; no row written
    Unmatched,
}

/// Counts from one validation run over a forecast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationRunSummary {
    pub validated: usize,
    pub already_validated: usize,
    pub unmatched: usize,
}

/// Per-forecast aggregate error over matched validations only
///
/// A forecast with zero matches has no summary at all (`None` from
/// `forecast_error_summary`), never a zero-error one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastErrorSummary {
    pub sample_count: usize,
    pub height_mae_m: Option<f64>,
    pub height_rmse_m: Option<f64>,
    pub period_mae_s: Option<f64>,
    pub direction_mae_deg: Option<f64>,
}

/// Matches predictions to actuals and records error metrics
pub struct ForecastValidator {
    cfg: ValidationConfig,
}

impl ForecastValidator {
    pub fn new(cfg: ValidationConfig) -> Self {
        Self { cfg }
    }

    /// Validate every prediction of one forecast against stored actuals
    pub async fn validate_forecast(
        &self,
        pool: &SqlitePool,
        forecast_id: &str,
        buoys: &ShoreBuoyMap,
        now: NaiveDateTime,
    ) -> EngineResult<ValidationRunSummary> {
        let predictions = queries::predictions_for_forecast(pool, forecast_id).await?;

        let mut summary = ValidationRunSummary::default();
        for prediction in &predictions {
            match self.validate_prediction(pool, prediction, buoys, now).await? {
                PredictionOutcome::Validated => summary.validated += 1,
                PredictionOutcome::AlreadyValidated => summary.already_validated += 1,
                PredictionOutcome::Unmatched => summary.unmatched += 1,
            }
        }

        info!(
            forecast_id = %forecast_id,
            validated = summary.validated,
            already_validated = summary.already_validated,
            unmatched = summary.unmatched,
            "Validation run complete"
        );

        Ok(summary)
    }

    /// Validate one prediction: nearest actual within ±window of valid_time
    pub async fn validate_prediction(
        &self,
        pool: &SqlitePool,
        prediction: &PredictionRow,
        buoys: &ShoreBuoyMap,
        now: NaiveDateTime,
    ) -> EngineResult<PredictionOutcome> {
        let Some(buoy_ids) = buoys.get(&prediction.shore) else {
            debug!(shore = %prediction.shore, "No buoys mapped for shore");
            return Ok(PredictionOutcome::Unmatched);
        };

        let half_window = Duration::seconds((self.cfg.window_hours * 3600.0) as i64);
        let from = prediction.valid_time - half_window;
        let to = prediction.valid_time + half_window;

        let mut candidates = Vec::new();
        for buoy_id in buoy_ids {
            candidates.extend(queries::actuals_for_buoy_window(pool, buoy_id, from, to).await?);
        }

        let Some(actual) = nearest_actual(candidates, prediction.valid_time) else {
            debug!(
                prediction_id = %prediction.id,
                shore = %prediction.shore,
                "No actual within window; prediction stays unvalidated"
            );
            return Ok(PredictionOutcome::Unmatched);
        };

        let row = self.build_validation(prediction, &actual, now);
        let inserted = queries::insert_validation(pool, &row).await?;

        if inserted {
            debug!(
                prediction_id = %prediction.id,
                actual_id = %actual.id,
                "Validation recorded"
            );
            Ok(PredictionOutcome::Validated)
        } else {
            Ok(PredictionOutcome::AlreadyValidated)
        }
    }

    /// Derive the error fields for one matched pair
    ///
    /// Every error is computed only when both sides reported the field;
    /// a one-sided value yields no error, not an error against zero.
    fn build_validation(
        &self,
        prediction: &PredictionRow,
        actual: &ActualRow,
        now: NaiveDateTime,
    ) -> ValidationRow {
        let mut row = ValidationRow::new(&prediction.id, &actual.id, now);

        row.height_error_m = match (prediction.predicted_height_m, actual.height_m) {
            (Some(p), Some(a)) => Some(p - a),
            _ => None,
        };
        row.period_error_s = match (prediction.predicted_period_s, actual.period_s) {
            (Some(p), Some(a)) => Some(p - a),
            _ => None,
        };
        row.direction_error_deg = match (prediction.predicted_direction_deg, actual.direction_deg)
        {
            (Some(p), Some(a)) => Some(circular::angular_difference(p, a)),
            _ => None,
        };
        row.category_match = match (
            prediction
                .predicted_category
                .as_deref()
                .and_then(SizeCategory::from_label),
            actual
                .height_m
                .map(|h| SizeCategory::from_height(h, &self.cfg.category_bounds_m)),
        ) {
            (Some(predicted), Some(observed)) => Some(predicted == observed),
            _ => None,
        };

        row
    }

    /// MAE/RMSE over the matched validations of one forecast
    pub async fn forecast_error_summary(
        &self,
        pool: &SqlitePool,
        forecast_id: &str,
    ) -> EngineResult<Option<ForecastErrorSummary>> {
        let validations = queries::validations_for_forecast(pool, forecast_id).await?;
        if validations.is_empty() {
            return Ok(None);
        }

        let heights: Vec<f64> = validations.iter().filter_map(|v| v.height_error_m).collect();
        let periods: Vec<f64> = validations.iter().filter_map(|v| v.period_error_s).collect();
        let directions: Vec<f64> = validations
            .iter()
            .filter_map(|v| v.direction_error_deg)
            .collect();

        Ok(Some(ForecastErrorSummary {
            sample_count: validations.len(),
            height_mae_m: mae(&heights),
            height_rmse_m: rmse(&heights),
            period_mae_s: mae(&periods),
            direction_mae_deg: mae(&directions),
        }))
    }
}

/// Actual closest to the valid time; ties resolve to the earlier
/// observation, then the smaller id, so repeated runs pick the same row
fn nearest_actual(candidates: Vec<ActualRow>, valid_time: NaiveDateTime) -> Option<ActualRow> {
    candidates.into_iter().min_by(|a, b| {
        let da = (a.observed_at - valid_time).num_seconds().abs();
        let db = (b.observed_at - valid_time).num_seconds().abs();
        da.cmp(&db)
            .then_with(|| a.observed_at.cmp(&b.observed_at))
            .then_with(|| a.id.cmp(&b.id))
    })
}

fn mae(errors: &[f64]) -> Option<f64> {
    if errors.is_empty() {
        return None;
    }
    Some(errors.iter().map(|e| e.abs()).sum::<f64>() / errors.len() as f64)
}

fn rmse(errors: &[f64]) -> Option<f64> {
    if errors.is_empty() {
        return None;
    }
    Some((errors.iter().map(|e| e * e).sum::<f64>() / errors.len() as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use surfcast_common::time::parse_canonical;

    fn ts(s: &str) -> NaiveDateTime {
        parse_canonical(s).unwrap()
    }

    fn actual(id: &str, at: &str) -> ActualRow {
        let mut row = ActualRow::new("buoy-1", ts(at), "ndbc");
        row.id = id.to_string();
        row
    }

    #[test]
    fn test_nearest_actual_picks_closest() {
        let valid = ts("2025-06-01 12:00:00");
        let picked = nearest_actual(
            vec![
                actual("a", "2025-06-01 09:30:00"),
                actual("b", "2025-06-01 11:00:00"),
                actual("c", "2025-06-01 14:30:00"),
            ],
            valid,
        )
        .unwrap();
        assert_eq!(picked.id, "b");
    }

    #[test]
    fn test_nearest_actual_tie_prefers_earlier_then_id() {
        let valid = ts("2025-06-01 12:00:00");
        let picked = nearest_actual(
            vec![
                actual("later", "2025-06-01 13:00:00"),
                actual("earlier", "2025-06-01 11:00:00"),
            ],
            valid,
        )
        .unwrap();
        assert_eq!(picked.id, "earlier");

        let picked = nearest_actual(
            vec![
                actual("b", "2025-06-01 11:00:00"),
                actual("a", "2025-06-01 11:00:00"),
            ],
            valid,
        )
        .unwrap();
        assert_eq!(picked.id, "a");
    }

    #[test]
    fn test_nearest_actual_empty() {
        assert!(nearest_actual(vec![], ts("2025-06-01 12:00:00")).is_none());
    }

    #[test]
    fn test_build_validation_skips_one_sided_fields() {
        let validator = ForecastValidator::new(ValidationConfig::default());
        let now = ts("2025-06-02 12:00:00");

        let mut prediction = PredictionRow::new(
            "f1",
            "north-shore",
            ts("2025-06-01 06:00:00"),
            ts("2025-06-01 12:00:00"),
        );
        prediction.predicted_height_m = Some(2.0);
        prediction.predicted_direction_deg = Some(350.0);
        // no predicted period

        let mut observed = actual("a1", "2025-06-01 12:30:00");
        observed.height_m = Some(1.5);
        observed.period_s = Some(11.0);
        observed.direction_deg = Some(10.0);

        let row = validator.build_validation(&prediction, &observed, now);
        assert_eq!(row.height_error_m, Some(0.5));
        assert_eq!(row.period_error_s, None); // one-sided, never zero
        // 350 − 10 wraps to −20
        assert!((row.direction_error_deg.unwrap() + 20.0).abs() < 1e-9);
        assert_eq!(row.category_match, None); // no predicted category
    }

    #[test]
    fn test_build_validation_category_match() {
        let validator = ForecastValidator::new(ValidationConfig::default());
        let now = ts("2025-06-02 12:00:00");

        let mut prediction = PredictionRow::new(
            "f1",
            "north-shore",
            ts("2025-06-01 06:00:00"),
            ts("2025-06-01 12:00:00"),
        );
        prediction.predicted_height_m = Some(2.0);
        prediction.predicted_category = Some("moderate".to_string());

        let mut observed = actual("a1", "2025-06-01 12:30:00");
        observed.height_m = Some(1.8); // moderate bucket (1.5..2.5)

        let row = validator.build_validation(&prediction, &observed, now);
        assert_eq!(row.category_match, Some(true));

        observed.height_m = Some(3.0); // large bucket
        let row = validator.build_validation(&prediction, &observed, now);
        assert_eq!(row.category_match, Some(false));
    }

    #[test]
    fn test_mae_rmse_helpers() {
        assert_eq!(mae(&[]), None);
        assert_eq!(rmse(&[]), None);
        let errors = [0.5, -0.5, 1.0];
        let m = mae(&errors).unwrap();
        assert!((m - (0.5 + 0.5 + 1.0) / 3.0).abs() < 1e-9);
        let r = rmse(&errors).unwrap();
        assert!((r - ((0.25 + 0.25 + 1.0) / 3.0_f64).sqrt()).abs() < 1e-9);
    }
}
