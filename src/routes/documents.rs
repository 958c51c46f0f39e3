use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthenticatedCompany;
use crate::domain::{normalize_document_name, normalize_pdf_url, AnalysisResult};
use crate::error::{AppError, AppResult};
use crate::models::Document;
use crate::state::AppState;
use crate::store::{DocumentChanges, DocumentFilter, DocumentOrder};
use crate::utils::json::{classify_nullable, NullableValue};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub pdf_url: String,
    pub status: String,
    pub open_id: Option<String>,
    pub token: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Document> for DocumentResponse {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            company_id: document.company_id,
            name: document.name,
            pdf_url: document.pdf_url,
            status: document.status,
            open_id: document.open_id,
            token: document.token,
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct DocumentListResponse {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<DocumentResponse>,
}

#[derive(Deserialize, Default)]
pub struct ListDocumentsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub order_by: Option<String>,
    pub order_dir: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateDocumentRequest {
    pub name: String,
    pub pdf_url: String,
}

/// Other companies' documents are indistinguishable from missing ones.
pub(crate) fn owned_document(
    state: &AppState,
    auth: &AuthenticatedCompany,
    document_id: Uuid,
) -> AppResult<Document> {
    state
        .stores
        .documents
        .get_by_id(document_id)?
        .filter(|document| document.company_id == auth.company_id)
        .ok_or_else(AppError::not_found)
}

fn document_filter(auth: &AuthenticatedCompany, query: ListDocumentsQuery) -> AppResult<DocumentFilter> {
    let order_by = match query.order_by.as_deref() {
        None => DocumentOrder::CreatedAt,
        Some(raw) => DocumentOrder::parse(raw)
            .ok_or_else(|| AppError::bad_request("order_by must be created_at, name or status"))?,
    };
    let descending = match query.order_dir.as_deref().map(str::trim) {
        None | Some("desc") => true,
        Some("asc") => false,
        Some(_) => return Err(AppError::bad_request("order_dir must be asc or desc")),
    };

    Ok(DocumentFilter {
        company_id: Some(auth.company_id),
        page: query.page.unwrap_or(1).max(1),
        page_size: query
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE),
        order_by,
        descending,
    })
}

pub async fn list_documents(
    State(state): State<AppState>,
    auth: AuthenticatedCompany,
    Query(query): Query<ListDocumentsQuery>,
) -> AppResult<Json<DocumentListResponse>> {
    let filter = document_filter(&auth, query)?;
    let page = state.stores.documents.list_paginated(&filter)?;

    Ok(Json(DocumentListResponse {
        count: page.count,
        next: page.next,
        previous: page.previous,
        results: page.results.into_iter().map(DocumentResponse::from).collect(),
    }))
}

pub async fn create_document(
    State(state): State<AppState>,
    auth: AuthenticatedCompany,
    Json(payload): Json<CreateDocumentRequest>,
) -> AppResult<(StatusCode, Json<DocumentResponse>)> {
    let created = state
        .create_document_service()
        .create(auth.company_id, &payload.name, &payload.pdf_url)
        .await?;

    info!(
        document_id = %created.document.id,
        published = created.published.is_delivered(),
        notified = created.notified.is_delivered(),
        "document creation fan-out finished"
    );
    Ok((
        StatusCode::CREATED,
        Json(DocumentResponse::from(created.document)),
    ))
}

pub async fn get_document(
    State(state): State<AppState>,
    auth: AuthenticatedCompany,
    Path(document_id): Path<Uuid>,
) -> AppResult<Json<DocumentResponse>> {
    let document = owned_document(&state, &auth, document_id)?;
    Ok(Json(DocumentResponse::from(document)))
}

pub async fn update_document(
    State(state): State<AppState>,
    auth: AuthenticatedCompany,
    Path(document_id): Path<Uuid>,
    Json(body): Json<Value>,
) -> AppResult<Json<DocumentResponse>> {
    let existing = owned_document(&state, &auth, document_id)?;

    let mut changes = DocumentChanges::default();
    match classify_nullable(body.get("name")).map_err(AppError::bad_request)? {
        NullableValue::Omitted => {}
        NullableValue::Null => return Err(AppError::bad_request("name must not be null")),
        NullableValue::String(raw) => changes.name = Some(normalize_document_name(&raw)?),
    }
    match classify_nullable(body.get("pdf_url")).map_err(AppError::bad_request)? {
        NullableValue::Omitted => {}
        NullableValue::Null => return Err(AppError::bad_request("pdf_url must not be null")),
        NullableValue::String(raw) => changes.pdf_url = Some(normalize_pdf_url(&raw)?),
    }

    if changes.is_empty() {
        return Ok(Json(DocumentResponse::from(existing)));
    }

    let document = state
        .stores
        .documents
        .update_partial(document_id, changes)?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(DocumentResponse::from(document)))
}

pub async fn delete_document(
    State(state): State<AppState>,
    auth: AuthenticatedCompany,
    Path(document_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    owned_document(&state, &auth, document_id)?;
    if !state.stores.documents.delete(document_id)? {
        return Err(AppError::not_found());
    }
    info!(%document_id, "document deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_document_analysis(
    State(state): State<AppState>,
    auth: AuthenticatedCompany,
    Path(document_id): Path<Uuid>,
) -> AppResult<Json<AnalysisResult>> {
    owned_document(&state, &auth, document_id)?;
    let analysis = state
        .stores
        .analyses
        .get_by_document_id(document_id)?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(analysis))
}

pub async fn send_to_sign(
    State(state): State<AppState>,
    auth: AuthenticatedCompany,
    Path(document_id): Path<Uuid>,
) -> AppResult<Json<DocumentResponse>> {
    owned_document(&state, &auth, document_id)?;
    let document = state
        .send_to_sign_service()
        .send(document_id)
        .await?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(DocumentResponse::from(document)))
}
