#![allow(dead_code)]

use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use anyhow::{anyhow, ensure, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use diesel::connection::SimpleConnection;
use http_body_util::BodyExt;
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

use signflow::auth::jwt::JwtService;
use signflow::config::AppConfig;
use signflow::db::{self, PgPool};
use signflow::domain::AnalysisResult;
use signflow::gateways::{
    AutomationNotifier, DocumentCreatedEvent, EventPublisher, GatewayError, GatewayResult,
    ProviderDocument, SignerContact, SigningProvider,
};
use signflow::models::{Company, Document, NewCompany, Signer};
use signflow::routes;
use signflow::services::status::STATUS_CREATED;
use signflow::state::{AppState, Gateways, Stores};
use signflow::store::{
    AnalysisStore, CompanyChanges, CompanyStore, DocumentChanges, DocumentFilter, DocumentOrder,
    DocumentStore, Page, SignerStore, StoreError, StoreResult,
};

pub const AUTOMATION_KEY: &str = "automation-secret";

static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub async fn acquire_db_lock() -> tokio::sync::MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

/// In-memory implementation of every store trait. `writes()` counts mutating
/// calls that changed state; seeding helpers do not count.
#[derive(Default)]
pub struct MemoryStore {
    data: StdMutex<MemoryData>,
    writes: AtomicUsize,
    vanish_on_update: AtomicBool,
}

#[derive(Default)]
struct MemoryData {
    companies: Vec<Company>,
    documents: Vec<Document>,
    signers: Vec<Signer>,
    analyses: HashMap<Uuid, AnalysisResult>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every later document update find its row deleted, as if another
    /// request removed it between the read and the write.
    pub fn vanish_documents_on_update(&self) {
        self.vanish_on_update.store(true, Ordering::SeqCst);
    }

    fn vanishes(&self, data: &mut MemoryData, id: Uuid) -> bool {
        if !self.vanish_on_update.load(Ordering::SeqCst) {
            return false;
        }
        data.documents.retain(|d| d.id != id);
        true
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn data(&self) -> std::sync::MutexGuard<'_, MemoryData> {
        self.data.lock().expect("memory store poisoned")
    }

    pub fn seed_company(&self, name: &str, api_token: Option<&str>) -> Company {
        let now = Utc::now().naive_utc();
        let company = Company {
            id: Uuid::new_v4(),
            name: name.to_string(),
            api_token: api_token.map(str::to_string),
            email: format!("{}@example.com", Uuid::new_v4().simple()),
            password_hash: "unused".to_string(),
            created_at: now,
            updated_at: now,
        };
        self.data().companies.push(company.clone());
        company
    }

    pub fn seed_document_with_id(&self, id: Uuid, company_id: Uuid, name: &str) -> Document {
        let now = Utc::now().naive_utc();
        let document = Document {
            id,
            company_id,
            name: name.to_string(),
            pdf_url: format!("https://files.example.com/{id}.pdf"),
            status: STATUS_CREATED.to_string(),
            open_id: None,
            token: None,
            created_at: now,
            updated_at: now,
        };
        self.data().documents.push(document.clone());
        document
    }

    pub fn seed_document(&self, company_id: Uuid, open_id: Option<&str>, status: &str) -> Document {
        let mut document = self.seed_document_with_id(Uuid::new_v4(), company_id, "Contract");
        document.open_id = open_id.map(str::to_string);
        document.status = status.to_string();
        let mut data = self.data();
        if let Some(stored) = data.documents.iter_mut().find(|d| d.id == document.id) {
            *stored = document.clone();
        }
        document
    }

    pub fn seed_signer(&self, document_id: Uuid, name: &str, email: &str) -> Signer {
        let signer = Signer {
            id: Uuid::new_v4(),
            document_id,
            name: name.to_string(),
            email: email.to_string(),
            created_at: Utc::now().naive_utc(),
        };
        self.data().signers.push(signer.clone());
        signer
    }

    pub fn document(&self, id: Uuid) -> Option<Document> {
        self.data().documents.iter().find(|d| d.id == id).cloned()
    }

    pub fn document_count(&self) -> usize {
        self.data().documents.len()
    }

    pub fn analysis_count(&self) -> usize {
        self.data().analyses.len()
    }
}

impl CompanyStore for MemoryStore {
    fn create(&self, company: NewCompany) -> StoreResult<Company> {
        let mut data = self.data();
        if data
            .companies
            .iter()
            .any(|c| c.email.eq_ignore_ascii_case(&company.email))
        {
            return Err(StoreError::DuplicateEmail);
        }
        let now = Utc::now().naive_utc();
        let stored = Company {
            id: company.id,
            name: company.name,
            api_token: company.api_token,
            email: company.email,
            password_hash: company.password_hash,
            created_at: now,
            updated_at: now,
        };
        data.companies.push(stored.clone());
        drop(data);
        self.record_write();
        Ok(stored)
    }

    fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Company>> {
        Ok(self.data().companies.iter().find(|c| c.id == id).cloned())
    }

    fn get_by_email(&self, email: &str) -> StoreResult<Option<Company>> {
        Ok(self
            .data()
            .companies
            .iter()
            .find(|c| c.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn list(&self) -> StoreResult<Vec<Company>> {
        let mut companies = self.data().companies.clone();
        companies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(companies)
    }

    fn update_partial(&self, id: Uuid, changes: CompanyChanges) -> StoreResult<Option<Company>> {
        let mut data = self.data();
        let Some(company) = data.companies.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            company.name = name;
        }
        if let Some(api_token) = changes.api_token {
            company.api_token = api_token;
        }
        company.updated_at = Utc::now().naive_utc();
        let updated = company.clone();
        drop(data);
        self.record_write();
        Ok(Some(updated))
    }

    fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut data = self.data();
        if data.documents.iter().any(|d| d.company_id == id) {
            return Err(StoreError::CompanyInUse);
        }
        let before = data.companies.len();
        data.companies.retain(|c| c.id != id);
        let removed = data.companies.len() != before;
        drop(data);
        if removed {
            self.record_write();
        }
        Ok(removed)
    }
}

fn apply_document_changes(document: &mut Document, changes: DocumentChanges) {
    if let Some(name) = changes.name {
        document.name = name;
    }
    if let Some(pdf_url) = changes.pdf_url {
        document.pdf_url = pdf_url;
    }
    if let Some(status) = changes.status {
        document.status = status;
    }
    if let Some(open_id) = changes.open_id {
        document.open_id = Some(open_id);
    }
    if let Some(token) = changes.token {
        document.token = Some(token);
    }
    document.updated_at = Utc::now().naive_utc();
}

impl DocumentStore for MemoryStore {
    fn create(&self, company_id: Uuid, name: &str, pdf_url: &str) -> StoreResult<Document> {
        let mut data = self.data();
        if !data.companies.iter().any(|c| c.id == company_id) {
            return Err(StoreError::MissingCompany(company_id));
        }
        let now = Utc::now().naive_utc();
        let document = Document {
            id: Uuid::new_v4(),
            company_id,
            name: name.to_string(),
            pdf_url: pdf_url.to_string(),
            status: STATUS_CREATED.to_string(),
            open_id: None,
            token: None,
            created_at: now,
            updated_at: now,
        };
        data.documents.push(document.clone());
        drop(data);
        self.record_write();
        Ok(document)
    }

    fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Document>> {
        Ok(self.document(id))
    }

    fn get_by_open_id(&self, open_id: &str) -> StoreResult<Option<Document>> {
        Ok(self
            .data()
            .documents
            .iter()
            .find(|d| d.open_id.as_deref() == Some(open_id))
            .cloned())
    }

    fn update_partial(&self, id: Uuid, changes: DocumentChanges) -> StoreResult<Option<Document>> {
        let mut data = self.data();
        if self.vanishes(&mut data, id) {
            return Ok(None);
        }
        let Some(document) = data.documents.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };
        apply_document_changes(document, changes);
        let updated = document.clone();
        drop(data);
        self.record_write();
        Ok(Some(updated))
    }

    fn update_by_open_id(
        &self,
        open_id: &str,
        changes_for: &dyn Fn(&Document) -> DocumentChanges,
    ) -> StoreResult<Option<Document>> {
        let mut data = self.data();
        let Some(index) = data
            .documents
            .iter()
            .position(|d| d.open_id.as_deref() == Some(open_id))
        else {
            return Ok(None);
        };
        let changes = changes_for(&data.documents[index]);
        if changes.is_empty() {
            return Ok(Some(data.documents[index].clone()));
        }
        let id = data.documents[index].id;
        if self.vanishes(&mut data, id) {
            return Ok(None);
        }
        let document = &mut data.documents[index];
        apply_document_changes(document, changes);
        let updated = document.clone();
        drop(data);
        self.record_write();
        Ok(Some(updated))
    }

    fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut data = self.data();
        let before = data.documents.len();
        data.documents.retain(|d| d.id != id);
        let removed = data.documents.len() != before;
        if removed {
            data.signers.retain(|s| s.document_id != id);
            data.analyses.remove(&id);
        }
        drop(data);
        if removed {
            self.record_write();
        }
        Ok(removed)
    }

    fn list_paginated(&self, filter: &DocumentFilter) -> StoreResult<Page<Document>> {
        let mut documents: Vec<Document> = self
            .data()
            .documents
            .iter()
            .filter(|d| filter.company_id.map_or(true, |id| d.company_id == id))
            .cloned()
            .collect();
        documents.sort_by(|a, b| {
            let ordering = match filter.order_by {
                DocumentOrder::CreatedAt => a.created_at.cmp(&b.created_at),
                DocumentOrder::Name => a.name.cmp(&b.name),
                DocumentOrder::Status => a.status.cmp(&b.status),
            };
            if filter.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        let count = documents.len() as i64;
        let results = documents
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.page_size as usize)
            .collect();
        Ok(Page::new(filter, count, results))
    }
}

impl SignerStore for MemoryStore {
    fn create(&self, document_id: Uuid, name: &str, email: &str) -> StoreResult<Signer> {
        let mut data = self.data();
        if !data.documents.iter().any(|d| d.id == document_id) {
            return Err(StoreError::MissingDocument(document_id));
        }
        let existing: Vec<&Signer> = data
            .signers
            .iter()
            .filter(|s| s.document_id == document_id)
            .collect();
        if existing.len() >= 2 {
            return Err(StoreError::SignerLimit);
        }
        if existing.iter().any(|s| s.email == email) {
            return Err(StoreError::DuplicateSigner);
        }
        let signer = Signer {
            id: Uuid::new_v4(),
            document_id,
            name: name.to_string(),
            email: email.to_string(),
            created_at: Utc::now().naive_utc(),
        };
        data.signers.push(signer.clone());
        drop(data);
        self.record_write();
        Ok(signer)
    }

    fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Signer>> {
        Ok(self.data().signers.iter().find(|s| s.id == id).cloned())
    }

    fn count_by_document(&self, document_id: Uuid) -> StoreResult<i64> {
        Ok(self
            .data()
            .signers
            .iter()
            .filter(|s| s.document_id == document_id)
            .count() as i64)
    }

    fn get_by_document_and_email(
        &self,
        document_id: Uuid,
        email: &str,
    ) -> StoreResult<Option<Signer>> {
        Ok(self
            .data()
            .signers
            .iter()
            .find(|s| s.document_id == document_id && s.email == email)
            .cloned())
    }

    fn list_by_document(&self, document_id: Uuid) -> StoreResult<Vec<Signer>> {
        Ok(self
            .data()
            .signers
            .iter()
            .filter(|s| s.document_id == document_id)
            .cloned()
            .collect())
    }

    fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut data = self.data();
        let before = data.signers.len();
        data.signers.retain(|s| s.id != id);
        let removed = data.signers.len() != before;
        drop(data);
        if removed {
            self.record_write();
        }
        Ok(removed)
    }
}

impl AnalysisStore for MemoryStore {
    fn get_by_document_id(&self, document_id: Uuid) -> StoreResult<Option<AnalysisResult>> {
        Ok(self.data().analyses.get(&document_id).cloned())
    }

    fn upsert(&self, result: &AnalysisResult) -> StoreResult<Option<AnalysisResult>> {
        let mut data = self.data();
        if !data.documents.iter().any(|d| d.id == result.document_id) {
            return Ok(None);
        }
        data.analyses.insert(result.document_id, result.clone());
        drop(data);
        self.record_write();
        Ok(Some(result.clone()))
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    fail: bool,
    events: StdMutex<Vec<DocumentCreatedEvent>>,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn events(&self) -> Vec<DocumentCreatedEvent> {
        self.events.lock().expect("publisher poisoned").clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish_document_created(&self, event: &DocumentCreatedEvent) -> GatewayResult<()> {
        if self.fail {
            return Err(GatewayError::Queue("broker unreachable".to_string()));
        }
        self.events
            .lock()
            .expect("publisher poisoned")
            .push(event.clone());
        Ok(())
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub enum NotifierMode {
    #[default]
    Accept,
    Fail,
    Unconfigured,
}

#[derive(Default)]
pub struct RecordingNotifier {
    mode: NotifierMode,
    calls: StdMutex<Vec<DocumentCreatedEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_mode(mode: NotifierMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<DocumentCreatedEvent> {
        self.calls.lock().expect("notifier poisoned").clone()
    }
}

#[async_trait]
impl AutomationNotifier for RecordingNotifier {
    async fn notify_document_created(&self, event: &DocumentCreatedEvent) -> GatewayResult<()> {
        self.calls
            .lock()
            .expect("notifier poisoned")
            .push(event.clone());
        match self.mode {
            NotifierMode::Accept => Ok(()),
            NotifierMode::Fail => Err(GatewayError::Status(reqwest::StatusCode::BAD_GATEWAY)),
            NotifierMode::Unconfigured => Err(GatewayError::NotConfigured("automation webhook")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderCall {
    pub api_token: String,
    pub name: String,
    pub pdf_url: String,
    pub signers: Vec<SignerContact>,
}

/// Signing provider returning a fixed response, or an error when built with
/// `failing()`.
#[derive(Default)]
pub struct StubProvider {
    response: ProviderDocument,
    fail: bool,
    calls: StdMutex<Vec<ProviderCall>>,
}

impl StubProvider {
    pub fn returning(response: ProviderDocument) -> Arc<Self> {
        Arc::new(Self {
            response,
            ..Self::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().expect("provider poisoned").clone()
    }

    fn record(&self, api_token: &str, name: &str, pdf_url: &str, signers: &[SignerContact]) {
        self.calls.lock().expect("provider poisoned").push(ProviderCall {
            api_token: api_token.to_string(),
            name: name.to_string(),
            pdf_url: pdf_url.to_string(),
            signers: signers.to_vec(),
        });
    }
}

#[async_trait]
impl SigningProvider for StubProvider {
    async fn create_draft(
        &self,
        api_token: &str,
        name: &str,
        pdf_url: &str,
    ) -> GatewayResult<ProviderDocument> {
        self.record(api_token, name, pdf_url, &[]);
        if self.fail {
            return Err(GatewayError::Status(reqwest::StatusCode::BAD_GATEWAY));
        }
        Ok(self.response.clone())
    }

    async fn send_for_signing(
        &self,
        api_token: &str,
        name: &str,
        pdf_url: &str,
        signers: &[SignerContact],
    ) -> GatewayResult<ProviderDocument> {
        self.record(api_token, name, pdf_url, signers);
        if self.fail {
            return Err(GatewayError::Status(reqwest::StatusCode::BAD_GATEWAY));
        }
        Ok(self.response.clone())
    }
}

pub fn provider_response(open_id: &str, token: &str, status: &str) -> ProviderDocument {
    ProviderDocument {
        open_id: Some(open_id.to_string()),
        token: Some(token.to_string()),
        status: Some(status.to_string()),
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused@localhost/signflow".to_string(),
        database_max_pool_size: 1,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        jwt_secret: "test-secret".to_string(),
        jwt_issuer: "test-issuer".to_string(),
        jwt_audience: "test-audience".to_string(),
        jwt_expiry_minutes: 60,
        cors_allowed_origin: None,
        zapsign_api_base: None,
        zapsign_timeout: Duration::from_secs(10),
        automation_webhook_url: None,
        automation_api_key: Some(AUTOMATION_KEY.to_string()),
        automation_timeout: Duration::from_secs(10),
        worker_poll_interval: Duration::from_secs(1),
    }
}

/// Router wired to in-memory stores and recording gateways.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub provider: Arc<StubProvider>,
    pub publisher: Arc<RecordingPublisher>,
    pub notifier: Arc<RecordingNotifier>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Result<Self> {
        Self::with_provider(StubProvider::returning(provider_response(
            "oid-1", "doc-token", "pending",
        )))
    }

    pub fn with_provider(provider: Arc<StubProvider>) -> Result<Self> {
        let config = test_config();
        let store = MemoryStore::new();
        let publisher = RecordingPublisher::new();
        let notifier = RecordingNotifier::new();
        let gateways = Gateways {
            provider: provider.clone(),
            notifier: notifier.clone(),
            publisher: publisher.clone(),
        };
        let jwt = JwtService::from_config(&config)?;
        let state = AppState::new(config, jwt, Stores::shared(store.clone()), gateways);
        let router = routes::create_router(state.clone());

        Ok(Self {
            state,
            store,
            provider,
            publisher,
            notifier,
            router,
        })
    }

    pub async fn register_company(
        &self,
        name: &str,
        email: &str,
        password: &str,
        api_token: Option<&str>,
    ) -> Result<Uuid> {
        let response = self
            .post_json(
                "/api/auth/register",
                &json!({
                    "name": name,
                    "email": email,
                    "password": password,
                    "api_token": api_token,
                }),
                None,
            )
            .await?;
        ensure!(
            response.status() == StatusCode::CREATED,
            "register failed with status {}",
            response.status()
        );
        let body = body_json(response.into_body()).await?;
        let id = body["id"]
            .as_str()
            .ok_or_else(|| anyhow!("register response missing id"))?;
        Ok(Uuid::parse_str(id)?)
    }

    pub async fn login_token(&self, email: &str, password: &str) -> Result<String> {
        let response = self
            .post_json(
                "/api/auth/login",
                &json!({"email": email, "password": password}),
                None,
            )
            .await?;
        ensure!(
            response.status() == StatusCode::OK,
            "login failed with status {}",
            response.status()
        );
        let body = body_json(response.into_body()).await?;
        body["access_token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("login response missing access_token"))
    }

    /// Registers a company with a provider token and returns `(company_id, jwt)`.
    pub async fn signed_in_company(&self, email: &str) -> Result<(Uuid, String)> {
        let company_id = self
            .register_company("Acme Signing", email, "password123", Some("provider-token"))
            .await?;
        let token = self.login_token(email, "password123").await?;
        Ok((company_id, token))
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::POST, path, payload, token, &[]).await
    }

    pub async fn post_json_with_headers<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        headers: &[(&str, &str)],
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::POST, path, payload, None, headers)
            .await
    }

    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::PATCH, path, payload, token, &[])
            .await
    }

    async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
        token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        self.send_empty(Method::GET, path, token).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        self.send_empty(Method::DELETE, path, token).await
    }

    async fn send_empty(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

pub async fn body_json(body: Body) -> Result<Value> {
    let bytes = body_to_vec(body).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Pool against `TEST_DATABASE_URL` with migrations applied and tables
/// emptied, or `None` when the variable is unset.
pub async fn test_pool() -> Result<Option<PgPool>> {
    let Ok(database_url) = env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping database test");
        return Ok(None);
    };
    let pool = db::init_pool_with_size(&database_url, 4)?;
    let prepared = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        db::run_migrations(&prepared)?;
        let mut conn = prepared
            .get()
            .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
        conn.batch_execute(
            "TRUNCATE TABLE document_analyses, signers, documents, companies, jobs CASCADE;",
        )
        .map_err(|err| anyhow!("failed to truncate tables: {err}"))?;
        Ok(())
    })
    .await
    .map_err(|err| anyhow!("database setup task panicked: {err}"))??;
    Ok(Some(pool))
}
