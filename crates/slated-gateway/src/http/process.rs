//! GET /process — trigger an immediate sweep.
//!
//! Manual/diagnostic entry point with the same semantics as the periodic
//! tick; shares the dispatcher (and its overlap guard) with the loop.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde_json::{json, Value};
use slated_scheduler::SweepReport;
use std::sync::Arc;

use crate::app::AppState;

pub async fn process_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SweepReport>, (StatusCode, Json<Value>)> {
    match state.dispatcher.try_sweep(Utc::now()).await {
        Some(report) => Ok(Json(report)),
        None => Err((
            StatusCode::CONFLICT,
            Json(json!({"error": "a sweep is already in progress"})),
        )),
    }
}
