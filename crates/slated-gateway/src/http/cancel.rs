//! POST /cancel — remove a scheduled action by key.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::app::AppState;

#[derive(Debug, Deserialize)]
pub struct CancelBody {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
}

/// Idempotent: canceling a key that already executed or expired still
/// reports success. The credential is required but never inspected.
pub async fn cancel_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CancelBody>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let (Some(key), Some(credential)) = (body.key, body.credential) else {
        return Err(bad_request());
    };
    if key.is_empty() || credential.is_empty() {
        return Err(bad_request());
    }

    match state.scheduler.cancel(&key).await {
        Ok(()) => Ok(Json(json!({"success": true}))),
        Err(e) => {
            warn!(key = %key, error = %e, "cancel failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            ))
        }
    }
}

fn bad_request() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "Missing required fields"})),
    )
}
