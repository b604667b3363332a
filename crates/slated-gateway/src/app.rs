use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use slated_core::config::SlatedConfig;
use slated_scheduler::{DispatchEngine, SchedulerHandle};
use slated_store::ActionStore;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: SlatedConfig,
    pub store: Arc<dyn ActionStore>,
    pub scheduler: SchedulerHandle,
    pub dispatcher: Arc<DispatchEngine>,
}

impl AppState {
    pub fn new(
        config: SlatedConfig,
        store: Arc<dyn ActionStore>,
        scheduler: SchedulerHandle,
        dispatcher: Arc<DispatchEngine>,
    ) -> Self {
        Self {
            config,
            store,
            scheduler,
            dispatcher,
        }
    }
}

/// Assemble the full Axum router.
///
/// CORS is wide open: the caller is a browser extension running on the
/// board's own pages, so requests arrive from an arbitrary origin.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/schedule", post(crate::http::schedule::schedule_handler))
        .route("/cancel", post(crate::http::cancel::cancel_handler))
        .route("/process", get(crate::http::process::process_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
}
