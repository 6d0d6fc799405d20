//! Validation store operations
//!
//! All writes validate canonical timestamps on the Rust side before binding
//! and convert constraint failures into `Error::Integrity`. Reads parse the
//! stored canonical text back into `NaiveDateTime` at the boundary.

use crate::db::models::{ActualRow, ForecastRow, PredictionRow, SourceErrorStats, ValidationRow};
use crate::time::{format_canonical, parse_canonical};
use crate::{Error, Result};
use chrono::NaiveDateTime;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

/// Insert one forecast together with its predictions in a single transaction
///
/// Either the forecast and every prediction commit, or nothing does.
pub async fn insert_forecast(
    pool: &SqlitePool,
    forecast: &ForecastRow,
    predictions: &[PredictionRow],
) -> Result<()> {
    for p in predictions {
        if p.forecast_id != forecast.id {
            return Err(Error::InvalidInput(format!(
                "prediction {} references forecast {}, expected {}",
                p.id, p.forecast_id, forecast.id
            )));
        }
    }

    let report = forecast
        .confidence_report
        .as_ref()
        .map(|r| serde_json::to_string(r))
        .transpose()
        .map_err(|e| Error::Internal(format!("Failed to serialize confidence report: {}", e)))?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO forecasts (
            id, created_at, model, model_version,
            prompt_tokens, completion_tokens, cost_usd,
            confidence, confidence_report
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&forecast.id)
    .bind(format_canonical(forecast.created_at))
    .bind(&forecast.model)
    .bind(&forecast.model_version)
    .bind(forecast.prompt_tokens)
    .bind(forecast.completion_tokens)
    .bind(forecast.cost_usd)
    .bind(forecast.confidence)
    .bind(report)
    .execute(&mut *tx)
    .await
    .map_err(Error::from_write)?;

    for p in predictions {
        sqlx::query(
            r#"
            INSERT INTO predictions (
                id, forecast_id, shore, forecast_time, valid_time,
                predicted_height_m, predicted_period_s, predicted_direction_deg,
                predicted_category, confidence
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&p.id)
        .bind(&p.forecast_id)
        .bind(&p.shore)
        .bind(format_canonical(p.forecast_time))
        .bind(format_canonical(p.valid_time))
        .bind(p.predicted_height_m)
        .bind(p.predicted_period_s)
        .bind(p.predicted_direction_deg)
        .bind(&p.predicted_category)
        .bind(p.confidence)
        .execute(&mut *tx)
        .await
        .map_err(Error::from_write)?;
    }

    tx.commit().await?;

    debug!(
        forecast_id = %forecast.id,
        predictions = predictions.len(),
        "Forecast batch committed"
    );

    Ok(())
}

/// Append one ground-truth observation
pub async fn insert_actual(pool: &SqlitePool, actual: &ActualRow) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO actuals (id, buoy_id, observed_at, height_m, period_s, direction_deg, source)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&actual.id)
    .bind(&actual.buoy_id)
    .bind(format_canonical(actual.observed_at))
    .bind(actual.height_m)
    .bind(actual.period_s)
    .bind(actual.direction_deg)
    .bind(&actual.source)
    .execute(pool)
    .await
    .map_err(Error::from_write)?;

    Ok(())
}

/// Append one validation row
///
/// Returns `false` when the (prediction, actual) pair is already validated;
/// the existing row is left untouched.
pub async fn insert_validation(pool: &SqlitePool, validation: &ValidationRow) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO validations (
            id, prediction_id, actual_id,
            height_error_m, period_error_s, direction_error_deg,
            category_match, validated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (prediction_id, actual_id) DO NOTHING
        "#,
    )
    .bind(&validation.id)
    .bind(&validation.prediction_id)
    .bind(&validation.actual_id)
    .bind(validation.height_error_m)
    .bind(validation.period_error_s)
    .bind(validation.direction_error_deg)
    .bind(validation.category_match.map(i64::from))
    .bind(format_canonical(validation.validated_at))
    .execute(pool)
    .await
    .map_err(Error::from_write)?;

    Ok(result.rows_affected() > 0)
}

/// Fetch one forecast by id
pub async fn get_forecast(pool: &SqlitePool, id: &str) -> Result<Option<ForecastRow>> {
    let row = sqlx::query(
        r#"
        SELECT id, created_at, model, model_version,
               prompt_tokens, completion_tokens, cost_usd,
               confidence, confidence_report
        FROM forecasts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(forecast_from_row).transpose()
}

/// Fetch the predictions belonging to one forecast
pub async fn predictions_for_forecast(
    pool: &SqlitePool,
    forecast_id: &str,
) -> Result<Vec<PredictionRow>> {
    let rows = sqlx::query(
        r#"
        SELECT id, forecast_id, shore, forecast_time, valid_time,
               predicted_height_m, predicted_period_s, predicted_direction_deg,
               predicted_category, confidence
        FROM predictions
        WHERE forecast_id = ?
        ORDER BY valid_time, shore, id
        "#,
    )
    .bind(forecast_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(prediction_from_row).collect()
}

/// Fetch predictions for one shore within [from, to], using the composite
/// (shore, valid_time) index
pub async fn predictions_for_shore_window(
    pool: &SqlitePool,
    shore: &str,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<Vec<PredictionRow>> {
    let rows = sqlx::query(
        r#"
        SELECT id, forecast_id, shore, forecast_time, valid_time,
               predicted_height_m, predicted_period_s, predicted_direction_deg,
               predicted_category, confidence
        FROM predictions
        WHERE shore = ? AND valid_time >= ? AND valid_time <= ?
        ORDER BY valid_time, id
        "#,
    )
    .bind(shore)
    .bind(format_canonical(from))
    .bind(format_canonical(to))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(prediction_from_row).collect()
}

/// Fetch actuals for one buoy within [from, to], time-ordered
pub async fn actuals_for_buoy_window(
    pool: &SqlitePool,
    buoy_id: &str,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<Vec<ActualRow>> {
    let rows = sqlx::query(
        r#"
        SELECT id, buoy_id, observed_at, height_m, period_s, direction_deg, source
        FROM actuals
        WHERE buoy_id = ? AND observed_at >= ? AND observed_at <= ?
        ORDER BY observed_at, id
        "#,
    )
    .bind(buoy_id)
    .bind(format_canonical(from))
    .bind(format_canonical(to))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(actual_from_row).collect()
}

/// Fetch the validations already recorded for one prediction
pub async fn validations_for_prediction(
    pool: &SqlitePool,
    prediction_id: &str,
) -> Result<Vec<ValidationRow>> {
    let rows = sqlx::query(
        r#"
        SELECT id, prediction_id, actual_id,
               height_error_m, period_error_s, direction_error_deg,
               category_match, validated_at
        FROM validations
        WHERE prediction_id = ?
        ORDER BY validated_at, id
        "#,
    )
    .bind(prediction_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(validation_from_row).collect()
}

/// Fetch every validation belonging to one forecast's predictions
pub async fn validations_for_forecast(
    pool: &SqlitePool,
    forecast_id: &str,
) -> Result<Vec<ValidationRow>> {
    let rows = sqlx::query(
        r#"
        SELECT v.id, v.prediction_id, v.actual_id,
               v.height_error_m, v.period_error_s, v.direction_error_deg,
               v.category_match, v.validated_at
        FROM validations v
        JOIN predictions p ON p.id = v.prediction_id
        WHERE p.forecast_id = ?
        ORDER BY v.validated_at, v.id
        "#,
    )
    .bind(forecast_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(validation_from_row).collect()
}

/// Aggregate per-source mean absolute height error over validations
/// recorded since `since`, keyed by the source of the matched actual
///
/// Uses the validated_at index so the rolling window stays sub-linear as
/// history grows.
pub async fn source_accuracy_window(
    pool: &SqlitePool,
    since: NaiveDateTime,
) -> Result<HashMap<String, SourceErrorStats>> {
    let rows = sqlx::query(
        r#"
        SELECT a.source AS source,
               AVG(ABS(v.height_error_m)) AS mean_abs_error,
               COUNT(v.height_error_m) AS sample_count
        FROM validations v
        JOIN actuals a ON a.id = v.actual_id
        WHERE v.validated_at >= ? AND v.height_error_m IS NOT NULL
        GROUP BY a.source
        "#,
    )
    .bind(format_canonical(since))
    .fetch_all(pool)
    .await?;

    let mut stats = HashMap::new();
    for row in rows {
        let source: String = row.get("source");
        let mean_abs_error: f64 = row.get("mean_abs_error");
        let sample_count: i64 = row.get("sample_count");
        stats.insert(
            source,
            SourceErrorStats {
                mean_abs_height_error_m: mean_abs_error,
                sample_count: sample_count as u32,
            },
        );
    }

    Ok(stats)
}

fn forecast_from_row(row: sqlx::sqlite::SqliteRow) -> Result<ForecastRow> {
    let created_at: String = row.get("created_at");
    let report: Option<String> = row.get("confidence_report");
    let report = report
        .map(|r| serde_json::from_str(&r))
        .transpose()
        .map_err(|e| Error::Internal(format!("Failed to parse confidence report: {}", e)))?;

    Ok(ForecastRow {
        id: row.get("id"),
        created_at: parse_canonical(&created_at)?,
        model: row.get("model"),
        model_version: row.get("model_version"),
        prompt_tokens: row.get("prompt_tokens"),
        completion_tokens: row.get("completion_tokens"),
        cost_usd: row.get("cost_usd"),
        confidence: row.get("confidence"),
        confidence_report: report,
    })
}

fn prediction_from_row(row: sqlx::sqlite::SqliteRow) -> Result<PredictionRow> {
    let forecast_time: String = row.get("forecast_time");
    let valid_time: String = row.get("valid_time");

    Ok(PredictionRow {
        id: row.get("id"),
        forecast_id: row.get("forecast_id"),
        shore: row.get("shore"),
        forecast_time: parse_canonical(&forecast_time)?,
        valid_time: parse_canonical(&valid_time)?,
        predicted_height_m: row.get("predicted_height_m"),
        predicted_period_s: row.get("predicted_period_s"),
        predicted_direction_deg: row.get("predicted_direction_deg"),
        predicted_category: row.get("predicted_category"),
        confidence: row.get("confidence"),
    })
}

fn actual_from_row(row: sqlx::sqlite::SqliteRow) -> Result<ActualRow> {
    let observed_at: String = row.get("observed_at");

    Ok(ActualRow {
        id: row.get("id"),
        buoy_id: row.get("buoy_id"),
        observed_at: parse_canonical(&observed_at)?,
        height_m: row.get("height_m"),
        period_s: row.get("period_s"),
        direction_deg: row.get("direction_deg"),
        source: row.get("source"),
    })
}

fn validation_from_row(row: sqlx::sqlite::SqliteRow) -> Result<ValidationRow> {
    let validated_at: String = row.get("validated_at");
    let category_match: Option<i64> = row.get("category_match");

    Ok(ValidationRow {
        id: row.get("id"),
        prediction_id: row.get("prediction_id"),
        actual_id: row.get("actual_id"),
        height_error_m: row.get("height_error_m"),
        period_error_s: row.get("period_error_s"),
        direction_error_deg: row.get("direction_error_deg"),
        category_match: category_match.map(|v| v != 0),
        validated_at: parse_canonical(&validated_at)?,
    })
}
