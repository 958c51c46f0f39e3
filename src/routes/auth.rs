use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{password, AuthenticatedCompany},
    domain::{normalize_api_token, normalize_company_name, normalize_email, DomainError},
    error::{AppError, AppResult},
    models::NewCompany,
    routes::companies::CompanyResponse,
    state::AppState,
};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub api_token: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<CompanyResponse>)> {
    let name = normalize_company_name(&payload.name)?;
    let email = normalize_email(&payload.email)?;
    if payload.password.chars().count() < password::MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {} characters",
            password::MIN_PASSWORD_LEN
        ))
        .into());
    }
    let api_token = payload
        .api_token
        .as_deref()
        .filter(|token| !token.trim().is_empty())
        .map(normalize_api_token)
        .transpose()?;

    let password_hash = password::hash_password(&payload.password)?;
    let company = state.stores.companies.create(NewCompany {
        id: Uuid::new_v4(),
        name,
        api_token,
        email,
        password_hash,
    })?;

    info!(company_id = %company.id, "company registered");
    Ok((StatusCode::CREATED, Json(CompanyResponse::from(company))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let email = normalize_email(&payload.email).map_err(|_| AppError::unauthorized())?;
    let company = state
        .stores
        .companies
        .get_by_email(&email)?
        .ok_or_else(AppError::unauthorized)?;

    let valid = password::verify_password(&payload.password, &company.password_hash)
        .map_err(|_| AppError::unauthorized())?;
    if !valid {
        return Err(AppError::unauthorized());
    }

    let access_token = state.jwt.generate_token(company.id, &company.email)?;

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt.expires_in_seconds(),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthenticatedCompany,
) -> AppResult<Json<CompanyResponse>> {
    let company = state
        .stores
        .companies
        .get_by_id(auth.company_id)?
        .ok_or_else(AppError::unauthorized)?;
    Ok(Json(CompanyResponse::from(company)))
}
