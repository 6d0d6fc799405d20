//! Validation store row models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One forecast run: provenance, cost, and the attached confidence report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRow {
    pub id: String,
    pub created_at: NaiveDateTime,
    pub model: String,
    pub model_version: Option<String>,
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub cost_usd: Option<f64>,
    /// Combined confidence in [0,1]
    pub confidence: Option<f64>,
    /// Structured confidence report (score, factor breakdown, warnings)
    pub confidence_report: Option<serde_json::Value>,
}

impl ForecastRow {
    pub fn new(model: &str, model_version: Option<&str>, created_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at,
            model: model.to_string(),
            model_version: model_version.map(str::to_string),
            prompt_tokens: None,
            completion_tokens: None,
            cost_usd: None,
            confidence: None,
            confidence_report: None,
        }
    }
}

/// One per-shore prediction belonging to a forecast; never mutated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRow {
    pub id: String,
    pub forecast_id: String,
    pub shore: String,
    pub forecast_time: NaiveDateTime,
    pub valid_time: NaiveDateTime,
    pub predicted_height_m: Option<f64>,
    pub predicted_period_s: Option<f64>,
    pub predicted_direction_deg: Option<f64>,
    pub predicted_category: Option<String>,
    pub confidence: Option<f64>,
}

impl PredictionRow {
    pub fn new(
        forecast_id: &str,
        shore: &str,
        forecast_time: NaiveDateTime,
        valid_time: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            forecast_id: forecast_id.to_string(),
            shore: shore.to_string(),
            forecast_time,
            valid_time,
            predicted_height_m: None,
            predicted_period_s: None,
            predicted_direction_deg: None,
            predicted_category: None,
            confidence: None,
        }
    }
}

/// One ground-truth buoy observation; append-only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActualRow {
    pub id: String,
    pub buoy_id: String,
    pub observed_at: NaiveDateTime,
    pub height_m: Option<f64>,
    pub period_s: Option<f64>,
    pub direction_deg: Option<f64>,
    pub source: String,
}

impl ActualRow {
    pub fn new(buoy_id: &str, observed_at: NaiveDateTime, source: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            buoy_id: buoy_id.to_string(),
            observed_at,
            height_m: None,
            period_s: None,
            direction_deg: None,
            source: source.to_string(),
        }
    }
}

/// One matched prediction-to-actual pair with derived errors; append-only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRow {
    pub id: String,
    pub prediction_id: String,
    pub actual_id: String,
    /// predicted − actual, present only when both sides reported a height
    pub height_error_m: Option<f64>,
    pub period_error_s: Option<f64>,
    /// Circular difference wrapped to [−180°, 180°]
    pub direction_error_deg: Option<f64>,
    pub category_match: Option<bool>,
    pub validated_at: NaiveDateTime,
}

impl ValidationRow {
    pub fn new(prediction_id: &str, actual_id: &str, validated_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            prediction_id: prediction_id.to_string(),
            actual_id: actual_id.to_string(),
            height_error_m: None,
            period_error_s: None,
            direction_error_deg: None,
            category_match: None,
            validated_at,
        }
    }
}

/// Rolling-window accuracy aggregate for one source, feeding reliability
/// weighting
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SourceErrorStats {
    pub mean_abs_height_error_m: f64,
    pub sample_count: u32,
}
