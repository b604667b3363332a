use axum::{extract::State, Json};
use serde_json::{json, Value};
use slated_core::time::ACTION_PREFIX;
use std::sync::Arc;

use crate::app::AppState;

/// GET /health — liveness probe, returns server metadata.
///
/// The pending count is a key scan; diagnostics only, never the sweep path.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let pending = state
        .store
        .list(ACTION_PREFIX)
        .await
        .map(|keys| keys.len())
        .unwrap_or(0);

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sweepPeriodSecs": state.config.scheduler.sweep_period_secs,
        "pendingActions": pending,
    }))
}
