//! Accuracy snapshot construction
//!
//! Aggregates rolling-window per-source error from the validation store
//! into the read-only snapshot the reliability scorer consumes. The store
//! lookup is bounded by a timeout; on timeout or failure the snapshot comes
//! back empty and every source falls back to its static prior instead of
//! the caller blocking indefinitely.

use crate::reliability::AccuracySnapshot;
use chrono::{Duration, NaiveDateTime};
use sqlx::SqlitePool;
use std::time::Duration as StdDuration;
use surfcast_common::config::ReliabilityConfig;
use surfcast_common::db::queries;
use tracing::{debug, warn};

/// Build a snapshot of per-source accuracy over the configured rolling window
pub async fn build_accuracy_snapshot(
    pool: &SqlitePool,
    cfg: &ReliabilityConfig,
    now: NaiveDateTime,
) -> AccuracySnapshot {
    let since = now - Duration::days(cfg.history_window_days);
    let lookup = queries::source_accuracy_window(pool, since);

    match tokio::time::timeout(StdDuration::from_millis(cfg.snapshot_timeout_ms), lookup).await {
        Ok(Ok(per_source)) => {
            debug!(
                sources = per_source.len(),
                window_days = cfg.history_window_days,
                "Accuracy snapshot built"
            );
            AccuracySnapshot {
                as_of: now,
                window_days: cfg.history_window_days,
                per_source,
            }
        }
        Ok(Err(err)) => {
            warn!(%err, "Accuracy aggregation failed; falling back to static priors");
            AccuracySnapshot::empty(now, cfg.history_window_days)
        }
        Err(_) => {
            warn!(
                timeout_ms = cfg.snapshot_timeout_ms,
                "Accuracy aggregation timed out; falling back to static priors"
            );
            AccuracySnapshot::empty(now, cfg.history_window_days)
        }
    }
}
