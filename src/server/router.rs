use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, mappings_handler, scenario_by_id, scenario_by_name};
use super::AppState;

pub(crate) fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/scenario/id/{scenario_id}", get(scenario_by_id))
        .route("/scenario/name/{scenario_name}", get(scenario_by_name))
        .route("/mappings", get(mappings_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
