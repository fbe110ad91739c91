use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::domain::model::{OutputFormat, ScenarioRequest, SerializedResult};
use crate::utils::error::EtlError;

#[derive(Debug, Deserialize)]
pub(crate) struct ScenarioQuery {
    pub source: String,
    pub mapping: String,
    #[serde(default)]
    pub output: OutputFormat,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

#[derive(Serialize)]
struct MappingSummary {
    name: String,
    description: Option<String>,
    tables: Vec<String>,
}

pub(crate) async fn scenario_by_id(
    State(state): State<AppState>,
    Path(scenario_id): Path<i64>,
    Query(query): Query<ScenarioQuery>,
) -> Response {
    let request = ScenarioRequest::by_id(query.source.clone(), scenario_id);
    prepare_response(&state, request, &query).await
}

pub(crate) async fn scenario_by_name(
    State(state): State<AppState>,
    Path(scenario_name): Path<String>,
    Query(query): Query<ScenarioQuery>,
) -> Response {
    let request = ScenarioRequest::by_name(query.source.clone(), scenario_name);
    prepare_response(&state, request, &query).await
}

async fn prepare_response(state: &AppState, request: ScenarioRequest, query: &ScenarioQuery) -> Response {
    match state.engine.run(&request, &query.mapping, query.output).await {
        Ok(result) => into_http_response(result),
        Err(e) => {
            tracing::warn!(
                "❌ {} with mapping '{}' failed: {} (Category: {:?})",
                request.identifier,
                query.mapping,
                e,
                e.category()
            );
            error_response(&e)
        }
    }
}

fn into_http_response(result: SerializedResult) -> Response {
    let content_type = result.content_type();
    match result {
        SerializedResult::Json { body } => Json(body).into_response(),
        SerializedResult::Zip { body, filename } => (
            [
                (header::CONTENT_TYPE, content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", filename),
                ),
            ],
            body,
        )
            .into_response(),
    }
}

/// 所有錯誤都轉成給使用者看的訊息，不外洩內部細節
pub(crate) fn error_response(error: &EtlError) -> Response {
    let status = match error {
        EtlError::ScenarioNotFound { .. } => StatusCode::NOT_FOUND,
        EtlError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
        EtlError::MappingApplication(_) | EtlError::UnknownSource { .. } => StatusCode::BAD_REQUEST,
        EtlError::UnsupportedMappingForFormat { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error.user_friendly_message()).into_response()
}

pub(crate) async fn mappings_handler(State(state): State<AppState>) -> impl IntoResponse {
    let summaries: Vec<MappingSummary> = state
        .engine
        .registry()
        .iter()
        .map(|m| MappingSummary {
            name: m.name.clone(),
            description: m.description.clone(),
            tables: m.tables.iter().map(|t| t.name.clone()).collect(),
        })
        .collect();
    Json(summaries)
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}
