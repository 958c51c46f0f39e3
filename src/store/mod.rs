//! Persistence seams consumed by the services. `pg` provides the diesel-backed
//! implementation; tests plug in in-memory stores.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::AnalysisResult;
use crate::models::{Company, Document, NewCompany, Signer};

pub mod pg;

pub use pg::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("database pool error: {0}")]
    Pool(String),
    #[error("company {0} does not exist")]
    MissingCompany(Uuid),
    #[error("document {0} does not exist")]
    MissingDocument(Uuid),
    #[error("signer limit reached")]
    SignerLimit,
    #[error("signer email already registered for document")]
    DuplicateSigner,
    #[error("company email already registered")]
    DuplicateEmail,
    #[error("company still owns documents")]
    CompanyInUse,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Field-wise partial update. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentChanges {
    pub name: Option<String>,
    pub pdf_url: Option<String>,
    pub status: Option<String>,
    pub open_id: Option<String>,
    pub token: Option<String>,
}

impl DocumentChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.pdf_url.is_none()
            && self.status.is_none()
            && self.open_id.is_none()
            && self.token.is_none()
    }
}

/// `api_token: Some(None)` clears the credential.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyChanges {
    pub name: Option<String>,
    pub api_token: Option<Option<String>>,
}

impl CompanyChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.api_token.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOrder {
    CreatedAt,
    Name,
    Status,
}

impl DocumentOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "created_at" => Some(Self::CreatedAt),
            "name" => Some(Self::Name),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentFilter {
    pub company_id: Option<Uuid>,
    pub page: i64,
    pub page_size: i64,
    pub order_by: DocumentOrder,
    pub descending: bool,
}

impl Default for DocumentFilter {
    fn default() -> Self {
        Self {
            company_id: None,
            page: 1,
            page_size: 10,
            order_by: DocumentOrder::CreatedAt,
            descending: true,
        }
    }
}

impl DocumentFilter {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.page_size
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub count: i64,
    pub results: Vec<T>,
    pub next: Option<i64>,
    pub previous: Option<i64>,
}

impl<T> Page<T> {
    pub fn new(filter: &DocumentFilter, count: i64, results: Vec<T>) -> Self {
        let page = filter.page.max(1);
        let end = filter.offset() + filter.page_size;
        Self {
            count,
            results,
            next: (end < count).then_some(page + 1),
            previous: (page > 1).then_some(page - 1),
        }
    }
}

pub trait CompanyStore: Send + Sync {
    fn create(&self, company: NewCompany) -> StoreResult<Company>;
    fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Company>>;
    fn get_by_email(&self, email: &str) -> StoreResult<Option<Company>>;
    fn list(&self) -> StoreResult<Vec<Company>>;
    fn update_partial(&self, id: Uuid, changes: CompanyChanges) -> StoreResult<Option<Company>>;
    fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

pub trait DocumentStore: Send + Sync {
    fn create(&self, company_id: Uuid, name: &str, pdf_url: &str) -> StoreResult<Document>;
    fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Document>>;
    fn get_by_open_id(&self, open_id: &str) -> StoreResult<Option<Document>>;
    fn update_partial(&self, id: Uuid, changes: DocumentChanges) -> StoreResult<Option<Document>>;
    /// Locks the document carrying `open_id`, asks `changes_for` what to write
    /// given the locked row, and writes it before releasing the lock. Empty
    /// changes return the row unwritten; an unknown open id returns `None`.
    fn update_by_open_id(
        &self,
        open_id: &str,
        changes_for: &dyn Fn(&Document) -> DocumentChanges,
    ) -> StoreResult<Option<Document>>;
    fn delete(&self, id: Uuid) -> StoreResult<bool>;
    fn list_paginated(&self, filter: &DocumentFilter) -> StoreResult<Page<Document>>;
}

/// `create` must refuse a third signer and a repeated email even when two
/// requests race past the service-level checks.
pub trait SignerStore: Send + Sync {
    fn create(&self, document_id: Uuid, name: &str, email: &str) -> StoreResult<Signer>;
    fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Signer>>;
    fn count_by_document(&self, document_id: Uuid) -> StoreResult<i64>;
    fn get_by_document_and_email(&self, document_id: Uuid, email: &str)
        -> StoreResult<Option<Signer>>;
    fn list_by_document(&self, document_id: Uuid) -> StoreResult<Vec<Signer>>;
    fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

pub trait AnalysisStore: Send + Sync {
    fn get_by_document_id(&self, document_id: Uuid) -> StoreResult<Option<AnalysisResult>>;
    /// Returns `None` without writing when the referenced document does not exist.
    fn upsert(&self, result: &AnalysisResult) -> StoreResult<Option<AnalysisResult>>;
}
