use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthenticatedCompany;
use crate::domain::{normalize_api_token, normalize_company_name};
use crate::error::{AppError, AppResult};
use crate::models::Company;
use crate::state::AppState;
use crate::store::CompanyChanges;
use crate::utils::json::{classify_nullable, NullableValue};

/// The provider token itself is never echoed back.
#[derive(Serialize)]
pub struct CompanyResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub has_api_token: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Company> for CompanyResponse {
    fn from(company: Company) -> Self {
        Self {
            has_api_token: company.provider_token().is_some(),
            id: company.id,
            name: company.name,
            email: company.email,
            created_at: company.created_at,
            updated_at: company.updated_at,
        }
    }
}

fn own_company(state: &AppState, auth: &AuthenticatedCompany, id: Uuid) -> AppResult<Company> {
    if id != auth.company_id {
        return Err(AppError::not_found());
    }
    state
        .stores
        .companies
        .get_by_id(id)?
        .ok_or_else(AppError::not_found)
}

pub async fn list_companies(
    State(state): State<AppState>,
    auth: AuthenticatedCompany,
) -> AppResult<Json<Vec<CompanyResponse>>> {
    let companies = state
        .stores
        .companies
        .get_by_id(auth.company_id)?
        .into_iter()
        .map(CompanyResponse::from)
        .collect();
    Ok(Json(companies))
}

pub async fn get_company(
    State(state): State<AppState>,
    auth: AuthenticatedCompany,
    Path(company_id): Path<Uuid>,
) -> AppResult<Json<CompanyResponse>> {
    let company = own_company(&state, &auth, company_id)?;
    Ok(Json(CompanyResponse::from(company)))
}

/// `name` renames; `api_token` rotates the provider credential, `null` clears it.
pub async fn update_company(
    State(state): State<AppState>,
    auth: AuthenticatedCompany,
    Path(company_id): Path<Uuid>,
    Json(body): Json<Value>,
) -> AppResult<Json<CompanyResponse>> {
    let existing = own_company(&state, &auth, company_id)?;

    let mut changes = CompanyChanges::default();
    match classify_nullable(body.get("name")).map_err(AppError::bad_request)? {
        NullableValue::Omitted => {}
        NullableValue::Null => return Err(AppError::bad_request("name must not be null")),
        NullableValue::String(raw) => changes.name = Some(normalize_company_name(&raw)?),
    }
    match classify_nullable(body.get("api_token")).map_err(AppError::bad_request)? {
        NullableValue::Omitted => {}
        NullableValue::Null => changes.api_token = Some(None),
        NullableValue::String(raw) => changes.api_token = Some(Some(normalize_api_token(&raw)?)),
    }

    if changes.is_empty() {
        return Ok(Json(CompanyResponse::from(existing)));
    }

    let token_rotated = changes.api_token.is_some();
    let company = state
        .stores
        .companies
        .update_partial(company_id, changes)?
        .ok_or_else(AppError::not_found)?;
    info!(%company_id, token_rotated, "company updated");
    Ok(Json(CompanyResponse::from(company)))
}

pub async fn delete_company(
    State(state): State<AppState>,
    auth: AuthenticatedCompany,
    Path(company_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    own_company(&state, &auth, company_id)?;
    if !state.stores.companies.delete(company_id)? {
        return Err(AppError::not_found());
    }
    info!(%company_id, "company deleted");
    Ok(StatusCode::NO_CONTENT)
}
