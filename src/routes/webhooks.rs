//! Inbound webhooks. The provider endpoint is unauthenticated; the analysis
//! endpoint requires the shared automation key.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::gateways::automation::AUTOMATION_KEY_HEADER;
use crate::routes::documents::DocumentResponse;
use crate::services::AnalysisUpsert;
use crate::state::AppState;

pub async fn zapsign_webhook(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> AppResult<Response> {
    if !payload.is_object() {
        return Err(AppError::bad_request("payload must be a JSON object"));
    }

    match state.status_service().apply_provider_update(&payload)? {
        Some(document) => Ok(Json(DocumentResponse::from(document)).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

pub async fn analysis_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> AppResult<Response> {
    let expected = state.config.automation_api_key.as_deref();
    let provided = headers
        .get(AUTOMATION_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    match (expected, provided) {
        (Some(expected), Some(provided)) if expected == provided => {}
        _ => {
            warn!("analysis webhook rejected: bad automation key");
            return Err(AppError::unauthorized());
        }
    }

    if !payload.is_object() {
        return Err(AppError::bad_request("payload must be a JSON object"));
    }

    match state.analysis_service().handle_webhook(&payload)? {
        AnalysisUpsert::Detached(_) => Ok(StatusCode::NO_CONTENT.into_response()),
        outcome => Ok(Json(outcome.into_result()).into_response()),
    }
}
