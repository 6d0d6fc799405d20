//! Integration tests for the validation store
//!
//! Exercises schema creation, transactional forecast batches, foreign-key
//! and timestamp enforcement, windowed queries, and the rolling per-source
//! accuracy aggregation.

use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use surfcast_common::db::models::{ActualRow, ForecastRow, PredictionRow, ValidationRow};
use surfcast_common::db::{init_store, queries};
use surfcast_common::time::parse_canonical;
use surfcast_common::Error;
use tempfile::TempDir;

fn ts(s: &str) -> NaiveDateTime {
    parse_canonical(s).unwrap()
}

async fn open_store() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().expect("create temp dir");
    let pool = init_store(&dir.path().join("surfcast.db"))
        .await
        .expect("init store");
    (dir, pool)
}

fn sample_forecast() -> (ForecastRow, Vec<PredictionRow>) {
    let mut forecast = ForecastRow::new("swell-v2", Some("2025.06"), ts("2025-06-01 06:00:00"));
    forecast.confidence = Some(0.8);
    forecast.confidence_report = Some(serde_json::json!({
        "score": 0.8,
        "warnings": ["1 of 3 expected sources missing"],
    }));

    let mut north = PredictionRow::new(
        &forecast.id,
        "north-shore",
        ts("2025-06-01 06:00:00"),
        ts("2025-06-01 12:00:00"),
    );
    north.predicted_height_m = Some(2.0);
    north.predicted_period_s = Some(12.0);
    north.predicted_direction_deg = Some(315.0);
    north.predicted_category = Some("moderate".to_string());
    north.confidence = Some(0.8);

    let mut south = PredictionRow::new(
        &forecast.id,
        "south-shore",
        ts("2025-06-01 06:00:00"),
        ts("2025-06-01 18:00:00"),
    );
    south.predicted_height_m = Some(1.0);
    south.confidence = Some(0.6);

    (forecast, vec![north, south])
}

#[tokio::test]
async fn test_store_opens_in_wal_mode_with_foreign_keys() {
    let (_dir, pool) = open_store().await;

    let journal_mode: String = sqlx::query_scalar("PRAGMA journal_mode")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(journal_mode.to_lowercase(), "wal");

    let foreign_keys: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(foreign_keys, 1);
}

#[tokio::test]
async fn test_forecast_batch_round_trip() -> anyhow::Result<()> {
    let (_dir, pool) = open_store().await;
    let (forecast, predictions) = sample_forecast();

    queries::insert_forecast(&pool, &forecast, &predictions).await?;

    let loaded = queries::get_forecast(&pool, &forecast.id)
        .await?
        .expect("forecast present");
    assert_eq!(loaded.model, "swell-v2");
    assert_eq!(loaded.created_at, ts("2025-06-01 06:00:00"));
    assert_eq!(loaded.confidence, Some(0.8));
    let report = loaded.confidence_report.expect("report attached");
    assert_eq!(report["score"], 0.8);

    let loaded_predictions = queries::predictions_for_forecast(&pool, &forecast.id).await?;
    assert_eq!(loaded_predictions.len(), 2);
    assert_eq!(loaded_predictions[0].shore, "north-shore");
    assert_eq!(loaded_predictions[0].predicted_height_m, Some(2.0));
    // absent numerics come back as None, not zero
    assert_eq!(loaded_predictions[1].predicted_period_s, None);

    Ok(())
}

#[tokio::test]
async fn test_forecast_batch_rolls_back_as_a_unit() {
    let (_dir, pool) = open_store().await;
    let (forecast, mut predictions) = sample_forecast();

    // second prediction violates the confidence bound
    predictions[1].confidence = Some(1.5);

    let err = queries::insert_forecast(&pool, &forecast, &predictions)
        .await
        .expect_err("batch must fail");
    assert!(matches!(err, Error::Integrity(_)), "got {:?}", err);

    // nothing from the batch may persist
    assert!(queries::get_forecast(&pool, &forecast.id).await.unwrap().is_none());
    let rows = queries::predictions_for_forecast(&pool, &forecast.id)
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_prediction_for_wrong_forecast_rejected() {
    let (_dir, pool) = open_store().await;
    let (forecast, mut predictions) = sample_forecast();
    predictions[0].forecast_id = "someone-else".to_string();

    let err = queries::insert_forecast(&pool, &forecast, &predictions)
        .await
        .expect_err("mismatched forecast id must fail");
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_validation_requires_existing_prediction_and_actual() {
    let (_dir, pool) = open_store().await;

    let row = ValidationRow::new("no-such-prediction", "no-such-actual", ts("2025-06-02 12:00:00"));
    let err = queries::insert_validation(&pool, &row)
        .await
        .expect_err("dangling references must fail");
    assert!(matches!(err, Error::Integrity(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_malformed_timestamp_rejected_at_storage_boundary() {
    let (_dir, pool) = open_store().await;

    // bypass the typed API; the schema itself must reject the write
    let result = sqlx::query(
        "INSERT INTO actuals (id, buoy_id, observed_at, source) VALUES ('x', 'buoy-1', '2025-06-01T12:00:00', 'ndbc')",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err(), "ISO-T timestamp must not be accepted");

    let result = sqlx::query(
        "INSERT INTO actuals (id, buoy_id, observed_at, source) VALUES ('y', 'buoy-1', '2025-06-01 12:00', 'ndbc')",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err(), "truncated timestamp must not be accepted");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM actuals")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0, "nothing may persist from rejected writes");
}

#[tokio::test]
async fn test_duplicate_validation_is_a_noop() {
    let (_dir, pool) = open_store().await;
    let (forecast, predictions) = sample_forecast();
    queries::insert_forecast(&pool, &forecast, &predictions)
        .await
        .unwrap();

    let mut actual = ActualRow::new("buoy-1", ts("2025-06-01 13:00:00"), "ndbc");
    actual.height_m = Some(1.5);
    queries::insert_actual(&pool, &actual).await.unwrap();

    let mut row = ValidationRow::new(&predictions[0].id, &actual.id, ts("2025-06-02 12:00:00"));
    row.height_error_m = Some(0.5);

    assert!(queries::insert_validation(&pool, &row).await.unwrap());

    // second write for the same pair: ignored, history untouched
    let mut replay = ValidationRow::new(&predictions[0].id, &actual.id, ts("2025-06-03 12:00:00"));
    replay.height_error_m = Some(99.0);
    assert!(!queries::insert_validation(&pool, &replay).await.unwrap());

    let stored = queries::validations_for_prediction(&pool, &predictions[0].id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].height_error_m, Some(0.5));
    assert_eq!(stored[0].validated_at, ts("2025-06-02 12:00:00"));
}

#[tokio::test]
async fn test_actuals_window_is_bounded_and_time_ordered() {
    let (_dir, pool) = open_store().await;

    for (id_hint, at) in [
        ("late", "2025-06-01 18:00:00"),
        ("early", "2025-06-01 08:00:00"),
        ("mid", "2025-06-01 12:00:00"),
        ("outside", "2025-06-02 12:00:00"),
    ] {
        let mut actual = ActualRow::new("buoy-1", ts(at), "ndbc");
        actual.id = format!("{}-{}", id_hint, actual.id);
        queries::insert_actual(&pool, &actual).await.unwrap();
    }
    // different buoy, inside the window: must not appear
    let other = ActualRow::new("buoy-2", ts("2025-06-01 12:00:00"), "ndbc");
    queries::insert_actual(&pool, &other).await.unwrap();

    let rows = queries::actuals_for_buoy_window(
        &pool,
        "buoy-1",
        ts("2025-06-01 00:00:00"),
        ts("2025-06-01 23:59:59"),
    )
    .await
    .unwrap();

    let order: Vec<&str> = rows
        .iter()
        .map(|r| r.id.split('-').next().unwrap())
        .collect();
    assert_eq!(order, vec!["early", "mid", "late"]);
}

#[tokio::test]
async fn test_predictions_shore_window() {
    let (_dir, pool) = open_store().await;
    let (forecast, predictions) = sample_forecast();
    queries::insert_forecast(&pool, &forecast, &predictions)
        .await
        .unwrap();

    let rows = queries::predictions_for_shore_window(
        &pool,
        "north-shore",
        ts("2025-06-01 00:00:00"),
        ts("2025-06-01 23:59:59"),
    )
    .await
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].shore, "north-shore");

    let rows = queries::predictions_for_shore_window(
        &pool,
        "north-shore",
        ts("2025-06-02 00:00:00"),
        ts("2025-06-02 23:59:59"),
    )
    .await
    .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_source_accuracy_window_groups_by_actual_source() {
    let (_dir, pool) = open_store().await;
    let (forecast, predictions) = sample_forecast();
    queries::insert_forecast(&pool, &forecast, &predictions)
        .await
        .unwrap();

    let mut ndbc = ActualRow::new("buoy-1", ts("2025-06-01 12:30:00"), "ndbc");
    ndbc.height_m = Some(1.5);
    let mut cdip = ActualRow::new("buoy-2", ts("2025-06-01 17:30:00"), "cdip");
    cdip.height_m = Some(1.2);
    queries::insert_actual(&pool, &ndbc).await.unwrap();
    queries::insert_actual(&pool, &cdip).await.unwrap();

    let mut first = ValidationRow::new(&predictions[0].id, &ndbc.id, ts("2025-06-02 12:00:00"));
    first.height_error_m = Some(0.5);
    let mut second = ValidationRow::new(&predictions[1].id, &cdip.id, ts("2025-06-02 12:00:00"));
    second.height_error_m = Some(-0.2);
    queries::insert_validation(&pool, &first).await.unwrap();
    queries::insert_validation(&pool, &second).await.unwrap();

    let stats = queries::source_accuracy_window(&pool, ts("2025-06-01 00:00:00"))
        .await
        .unwrap();
    assert_eq!(stats.len(), 2);
    let ndbc_stats = stats.get("ndbc").expect("ndbc aggregated");
    assert!((ndbc_stats.mean_abs_height_error_m - 0.5).abs() < 1e-9);
    assert_eq!(ndbc_stats.sample_count, 1);
    let cdip_stats = stats.get("cdip").expect("cdip aggregated");
    assert!((cdip_stats.mean_abs_height_error_m - 0.2).abs() < 1e-9);

    // a window starting after the validations sees nothing
    let stats = queries::source_accuracy_window(&pool, ts("2025-06-03 00:00:00"))
        .await
        .unwrap();
    assert!(stats.is_empty());
}
