//! POST /schedule — create a deferred action.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::app::AppState;
use slated_scheduler::{ScheduleRequest, SchedulerError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleBody {
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub mark_complete: Option<bool>,
    /// ISO-8601 instant.
    #[serde(default)]
    pub scheduled_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub credential: Option<String>,
}

/// Returns 200 + the action key on success. The key is the caller's only
/// handle for a later cancel.
pub async fn schedule_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ScheduleBody>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let (Some(target_id), Some(scheduled_at), Some(credential)) =
        (body.target_id, body.scheduled_time, body.credential)
    else {
        return Err(bad_request("Missing required fields"));
    };

    let req = ScheduleRequest {
        target_id,
        comment: body.comment,
        mark_complete: body.mark_complete,
        scheduled_at,
        credential,
    };

    match state.scheduler.schedule(req).await {
        Ok(key) => Ok(Json(json!({"success": true, "key": key}))),
        Err(SchedulerError::InvalidRequest(reason)) => Err(bad_request(&reason)),
        Err(e) => {
            warn!(error = %e, "schedule failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            ))
        }
    }
}

fn bad_request(reason: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({"error": reason})))
}
