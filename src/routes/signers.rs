use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedCompany;
use crate::error::{AppError, AppResult};
use crate::models::Signer;
use crate::routes::documents::owned_document;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SignerResponse {
    pub id: Uuid,
    pub document_id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

impl From<Signer> for SignerResponse {
    fn from(signer: Signer) -> Self {
        Self {
            id: signer.id,
            document_id: signer.document_id,
            name: signer.name,
            email: signer.email,
            created_at: signer.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct ListSignersQuery {
    pub document_id: Uuid,
}

#[derive(Deserialize)]
pub struct CreateSignerRequest {
    pub document_id: Uuid,
    pub name: String,
    pub email: String,
}

pub async fn list_signers(
    State(state): State<AppState>,
    auth: AuthenticatedCompany,
    Query(query): Query<ListSignersQuery>,
) -> AppResult<Json<Vec<SignerResponse>>> {
    owned_document(&state, &auth, query.document_id)?;
    let signers = state.stores.signers.list_by_document(query.document_id)?;
    Ok(Json(signers.into_iter().map(SignerResponse::from).collect()))
}

pub async fn create_signer(
    State(state): State<AppState>,
    auth: AuthenticatedCompany,
    Json(payload): Json<CreateSignerRequest>,
) -> AppResult<(StatusCode, Json<SignerResponse>)> {
    owned_document(&state, &auth, payload.document_id)?;
    let signer = state
        .signer_service()
        .add_signer(payload.document_id, &payload.name, &payload.email)?;
    Ok((StatusCode::CREATED, Json(SignerResponse::from(signer))))
}

pub async fn delete_signer(
    State(state): State<AppState>,
    auth: AuthenticatedCompany,
    Path(signer_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let signer = state
        .stores
        .signers
        .get_by_id(signer_id)?
        .ok_or_else(AppError::not_found)?;
    owned_document(&state, &auth, signer.document_id)?;

    if !state.stores.signers.delete(signer_id)? {
        return Err(AppError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
