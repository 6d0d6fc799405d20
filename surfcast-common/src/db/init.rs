//! Validation store initialization
//!
//! Opens (or creates) the SQLite database, applies the pragmas the store
//! depends on, and creates the schema idempotently.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize the store connection pool and create tables if needed
pub async fn init_store(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Connection options apply to every pooled connection:
    // - WAL keeps readers unblocked while one writer commits
    // - foreign keys enforce the Forecast→Prediction→Validation chain
    // - the busy timeout bounds writer contention instead of failing fast
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new validation store: {}", db_path.display());
    } else {
        info!("Opened existing validation store: {}", db_path.display());
    }

    create_schema_version_table(&pool).await?;
    create_forecasts_table(&pool).await?;
    create_predictions_table(&pool).await?;
    create_actuals_table(&pool).await?;
    create_validations_table(&pool).await?;

    Ok(pool)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (1)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the forecasts table
pub async fn create_forecasts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS forecasts (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            model TEXT NOT NULL,
            model_version TEXT,
            prompt_tokens INTEGER,
            completion_tokens INTEGER,
            cost_usd REAL,
            confidence REAL,
            confidence_report TEXT,
            CHECK (created_at GLOB '[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9] [0-9][0-9]:[0-9][0-9]:[0-9][0-9]'),
            CHECK (prompt_tokens IS NULL OR prompt_tokens >= 0),
            CHECK (completion_tokens IS NULL OR completion_tokens >= 0),
            CHECK (cost_usd IS NULL OR cost_usd >= 0.0),
            CHECK (confidence IS NULL OR (confidence >= 0.0 AND confidence <= 1.0))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_forecasts_created_at ON forecasts(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the predictions table
///
/// The composite (shore, valid_time) index supports windowed accuracy
/// queries without full scans.
pub async fn create_predictions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS predictions (
            id TEXT PRIMARY KEY,
            forecast_id TEXT NOT NULL REFERENCES forecasts(id) ON DELETE CASCADE,
            shore TEXT NOT NULL,
            forecast_time TEXT NOT NULL,
            valid_time TEXT NOT NULL,
            predicted_height_m REAL,
            predicted_period_s REAL,
            predicted_direction_deg REAL,
            predicted_category TEXT,
            confidence REAL,
            CHECK (forecast_time GLOB '[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9] [0-9][0-9]:[0-9][0-9]:[0-9][0-9]'),
            CHECK (valid_time GLOB '[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9] [0-9][0-9]:[0-9][0-9]:[0-9][0-9]'),
            CHECK (predicted_height_m IS NULL OR predicted_height_m >= 0.0),
            CHECK (predicted_period_s IS NULL OR predicted_period_s > 0.0),
            CHECK (predicted_direction_deg IS NULL OR (predicted_direction_deg >= 0.0 AND predicted_direction_deg < 360.0)),
            CHECK (confidence IS NULL OR (confidence >= 0.0 AND confidence <= 1.0))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_predictions_shore_valid ON predictions(shore, valid_time)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_predictions_forecast ON predictions(forecast_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the actuals table
///
/// The (buoy_id, observed_at) index supports per-buoy time-ordered lookup
/// during prediction matching.
pub async fn create_actuals_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS actuals (
            id TEXT PRIMARY KEY,
            buoy_id TEXT NOT NULL,
            observed_at TEXT NOT NULL,
            height_m REAL,
            period_s REAL,
            direction_deg REAL,
            source TEXT NOT NULL,
            CHECK (observed_at GLOB '[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9] [0-9][0-9]:[0-9][0-9]:[0-9][0-9]'),
            CHECK (height_m IS NULL OR height_m >= 0.0),
            CHECK (period_s IS NULL OR period_s > 0.0),
            CHECK (direction_deg IS NULL OR (direction_deg >= 0.0 AND direction_deg < 360.0))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_actuals_buoy_time ON actuals(buoy_id, observed_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the validations table
///
/// The validated_at index keeps rolling-window aggregate queries sub-linear
/// as history grows. The (prediction_id, actual_id) uniqueness makes
/// re-validation a no-op instead of a duplicate row.
pub async fn create_validations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS validations (
            id TEXT PRIMARY KEY,
            prediction_id TEXT NOT NULL REFERENCES predictions(id) ON DELETE CASCADE,
            actual_id TEXT NOT NULL REFERENCES actuals(id) ON DELETE CASCADE,
            height_error_m REAL,
            period_error_s REAL,
            direction_error_deg REAL,
            category_match INTEGER,
            validated_at TEXT NOT NULL,
            UNIQUE (prediction_id, actual_id),
            CHECK (validated_at GLOB '[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9] [0-9][0-9]:[0-9][0-9]:[0-9][0-9]'),
            CHECK (direction_error_deg IS NULL OR (direction_error_deg >= -180.0 AND direction_error_deg <= 180.0)),
            CHECK (category_match IS NULL OR category_match IN (0, 1))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_validations_validated_at ON validations(validated_at)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_validations_prediction ON validations(prediction_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
