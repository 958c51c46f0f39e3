use chrono::{NaiveDateTime, Utc};
use diesel::dsl::exists;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::{prelude::*, select, PgConnection};
use serde_json::Value;
use uuid::Uuid;

use super::{
    AnalysisStore, CompanyChanges, CompanyStore, DocumentChanges, DocumentFilter, DocumentOrder,
    DocumentStore, Page, SignerStore, StoreError, StoreResult,
};
use crate::db::PgPool;
use crate::domain::{AnalysisResult, MAX_SIGNERS_PER_DOCUMENT};
use crate::models::{
    Company, Document, DocumentAnalysis, NewCompany, NewDocument, NewDocumentAnalysis, NewSigner,
    Signer,
};
use crate::schema::{companies, document_analyses, documents, signers};
use crate::services::status::STATUS_CREATED;

type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Postgres implementation of every store trait, sharing one pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> StoreResult<PgPooledConnection> {
        self.pool
            .get()
            .map_err(|err| StoreError::Pool(err.to_string()))
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn is_unique_violation(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

fn is_foreign_key_violation(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)
    )
}

#[derive(AsChangeset)]
#[diesel(table_name = companies)]
struct CompanyChangeset<'a> {
    name: Option<&'a str>,
    api_token: Option<Option<&'a str>>,
    updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = documents)]
struct DocumentChangeset<'a> {
    name: Option<&'a str>,
    pdf_url: Option<&'a str>,
    status: Option<&'a str>,
    open_id: Option<&'a str>,
    token: Option<&'a str>,
    updated_at: NaiveDateTime,
}

impl<'a> DocumentChangeset<'a> {
    fn from_changes(changes: &'a DocumentChanges) -> Self {
        Self {
            name: changes.name.as_deref(),
            pdf_url: changes.pdf_url.as_deref(),
            status: changes.status.as_deref(),
            open_id: changes.open_id.as_deref(),
            token: changes.token.as_deref(),
            updated_at: now(),
        }
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = document_analyses, treat_none_as_null = true)]
struct AnalysisChangeset {
    summary: String,
    labels: Value,
    entities: Value,
    risk_score: f64,
    status: Option<String>,
    missing_topics: Option<Value>,
    insights: Option<Value>,
    model_info: Option<Value>,
    updated_at: NaiveDateTime,
}

impl CompanyStore for PgStore {
    fn create(&self, company: NewCompany) -> StoreResult<Company> {
        let mut conn = self.conn()?;
        diesel::insert_into(companies::table)
            .values(&company)
            .get_result(&mut conn)
            .map_err(|err| {
                if is_unique_violation(&err) {
                    StoreError::DuplicateEmail
                } else {
                    StoreError::from(err)
                }
            })
    }

    fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Company>> {
        let mut conn = self.conn()?;
        Ok(companies::table.find(id).first(&mut conn).optional()?)
    }

    fn get_by_email(&self, email: &str) -> StoreResult<Option<Company>> {
        let mut conn = self.conn()?;
        let normalized = email.trim().to_lowercase();
        Ok(companies::table
            .filter(companies::email.eq(normalized))
            .first(&mut conn)
            .optional()?)
    }

    fn list(&self) -> StoreResult<Vec<Company>> {
        let mut conn = self.conn()?;
        Ok(companies::table
            .order(companies::created_at.asc())
            .load(&mut conn)?)
    }

    fn update_partial(&self, id: Uuid, changes: CompanyChanges) -> StoreResult<Option<Company>> {
        let mut conn = self.conn()?;
        let changeset = CompanyChangeset {
            name: changes.name.as_deref(),
            api_token: changes
                .api_token
                .as_ref()
                .map(|token| token.as_deref()),
            updated_at: now(),
        };
        Ok(diesel::update(companies::table.find(id))
            .set(&changeset)
            .get_result(&mut conn)
            .optional()?)
    }

    fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        match diesel::delete(companies::table.find(id)).execute(&mut conn) {
            Ok(deleted) => Ok(deleted > 0),
            Err(err) if is_foreign_key_violation(&err) => {
                Err(StoreError::CompanyInUse)
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl DocumentStore for PgStore {
    fn create(&self, company_id: Uuid, name: &str, pdf_url: &str) -> StoreResult<Document> {
        let mut conn = self.conn()?;
        let new_document = NewDocument {
            id: Uuid::new_v4(),
            company_id,
            name: name.to_string(),
            pdf_url: pdf_url.to_string(),
            status: STATUS_CREATED.to_string(),
        };
        diesel::insert_into(documents::table)
            .values(&new_document)
            .get_result(&mut conn)
            .map_err(|err| {
                if is_foreign_key_violation(&err) {
                    StoreError::MissingCompany(company_id)
                } else {
                    StoreError::from(err)
                }
            })
    }

    fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Document>> {
        let mut conn = self.conn()?;
        Ok(documents::table.find(id).first(&mut conn).optional()?)
    }

    fn get_by_open_id(&self, open_id: &str) -> StoreResult<Option<Document>> {
        let mut conn = self.conn()?;
        Ok(documents::table
            .filter(documents::open_id.eq(open_id))
            .order(documents::created_at.asc())
            .first(&mut conn)
            .optional()?)
    }

    fn update_partial(&self, id: Uuid, changes: DocumentChanges) -> StoreResult<Option<Document>> {
        let mut conn = self.conn()?;
        Ok(diesel::update(documents::table.find(id))
            .set(&DocumentChangeset::from_changes(&changes))
            .get_result(&mut conn)
            .optional()?)
    }

    fn update_by_open_id(
        &self,
        open_id: &str,
        changes_for: &dyn Fn(&Document) -> DocumentChanges,
    ) -> StoreResult<Option<Document>> {
        let mut conn = self.conn()?;
        conn.transaction::<Option<Document>, StoreError, _>(|conn| {
            // Held until commit so concurrent webhooks decide against the latest row.
            let Some(document) = documents::table
                .filter(documents::open_id.eq(open_id))
                .order(documents::created_at.asc())
                .for_update()
                .first::<Document>(conn)
                .optional()?
            else {
                return Ok(None);
            };

            let changes = changes_for(&document);
            if changes.is_empty() {
                return Ok(Some(document));
            }
            let updated = diesel::update(documents::table.find(document.id))
                .set(&DocumentChangeset::from_changes(&changes))
                .get_result(conn)?;
            Ok(Some(updated))
        })
    }

    fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(documents::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn list_paginated(&self, filter: &DocumentFilter) -> StoreResult<Page<Document>> {
        let mut conn = self.conn()?;

        let count: i64 = match filter.company_id {
            Some(company_id) => documents::table
                .filter(documents::company_id.eq(company_id))
                .count()
                .get_result(&mut conn)?,
            None => documents::table.count().get_result(&mut conn)?,
        };

        let mut query = documents::table.into_boxed();
        if let Some(company_id) = filter.company_id {
            query = query.filter(documents::company_id.eq(company_id));
        }
        query = match (filter.order_by, filter.descending) {
            (DocumentOrder::CreatedAt, true) => {
                query.order((documents::created_at.desc(), documents::id.desc()))
            }
            (DocumentOrder::CreatedAt, false) => {
                query.order((documents::created_at.asc(), documents::id.asc()))
            }
            (DocumentOrder::Name, true) => query.order((documents::name.desc(), documents::id.desc())),
            (DocumentOrder::Name, false) => query.order((documents::name.asc(), documents::id.asc())),
            (DocumentOrder::Status, true) => {
                query.order((documents::status.desc(), documents::id.desc()))
            }
            (DocumentOrder::Status, false) => {
                query.order((documents::status.asc(), documents::id.asc()))
            }
        };

        let results: Vec<Document> = query
            .offset(filter.offset())
            .limit(filter.page_size)
            .load(&mut conn)?;

        Ok(Page::new(filter, count, results))
    }
}

impl SignerStore for PgStore {
    fn create(&self, document_id: Uuid, name: &str, email: &str) -> StoreResult<Signer> {
        let mut conn = self.conn()?;
        conn.transaction::<Signer, StoreError, _>(|conn| {
            // Row lock serializes concurrent additions for the same document.
            let locked: Option<Uuid> = documents::table
                .find(document_id)
                .select(documents::id)
                .for_update()
                .first(conn)
                .optional()?;
            if locked.is_none() {
                return Err(StoreError::MissingDocument(document_id));
            }

            let existing: i64 = signers::table
                .filter(signers::document_id.eq(document_id))
                .count()
                .get_result(conn)?;
            if existing >= MAX_SIGNERS_PER_DOCUMENT {
                return Err(StoreError::SignerLimit);
            }

            let new_signer = NewSigner {
                id: Uuid::new_v4(),
                document_id,
                name: name.trim().to_string(),
                email: email.trim().to_lowercase(),
            };
            diesel::insert_into(signers::table)
                .values(&new_signer)
                .get_result(conn)
                .map_err(|err| {
                    if is_unique_violation(&err) {
                        StoreError::DuplicateSigner
                    } else {
                        StoreError::from(err)
                    }
                })
        })
    }

    fn get_by_id(&self, id: Uuid) -> StoreResult<Option<Signer>> {
        let mut conn = self.conn()?;
        Ok(signers::table.find(id).first(&mut conn).optional()?)
    }

    fn count_by_document(&self, document_id: Uuid) -> StoreResult<i64> {
        let mut conn = self.conn()?;
        Ok(signers::table
            .filter(signers::document_id.eq(document_id))
            .count()
            .get_result(&mut conn)?)
    }

    fn get_by_document_and_email(
        &self,
        document_id: Uuid,
        email: &str,
    ) -> StoreResult<Option<Signer>> {
        let mut conn = self.conn()?;
        Ok(signers::table
            .filter(signers::document_id.eq(document_id))
            .filter(signers::email.eq(email.trim().to_lowercase()))
            .first(&mut conn)
            .optional()?)
    }

    fn list_by_document(&self, document_id: Uuid) -> StoreResult<Vec<Signer>> {
        let mut conn = self.conn()?;
        Ok(signers::table
            .filter(signers::document_id.eq(document_id))
            .order((signers::created_at.asc(), signers::id.asc()))
            .load(&mut conn)?)
    }

    fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(signers::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }
}

impl AnalysisStore for PgStore {
    fn get_by_document_id(&self, document_id: Uuid) -> StoreResult<Option<AnalysisResult>> {
        let mut conn = self.conn()?;
        let row: Option<DocumentAnalysis> = document_analyses::table
            .filter(document_analyses::document_id.eq(document_id))
            .first(&mut conn)
            .optional()?;
        Ok(row.map(analysis_from_row))
    }

    fn upsert(&self, result: &AnalysisResult) -> StoreResult<Option<AnalysisResult>> {
        let mut conn = self.conn()?;
        conn.transaction::<Option<AnalysisResult>, StoreError, _>(|conn| {
            let document_exists: bool =
                select(exists(documents::table.find(result.document_id))).get_result(conn)?;
            if !document_exists {
                return Ok(None);
            }

            let labels = labels_value(result);
            let entities = entities_value(result);
            let new_row = NewDocumentAnalysis {
                id: Uuid::new_v4(),
                document_id: result.document_id,
                summary: result.summary.clone(),
                labels: labels.clone(),
                entities: entities.clone(),
                risk_score: result.risk_score,
                status: result.status.clone(),
                missing_topics: result.missing_topics.clone(),
                insights: result.insights.clone(),
                model_info: result.model_info.clone(),
            };
            let changeset = AnalysisChangeset {
                summary: result.summary.clone(),
                labels,
                entities,
                risk_score: result.risk_score,
                status: result.status.clone(),
                missing_topics: result.missing_topics.clone(),
                insights: result.insights.clone(),
                model_info: result.model_info.clone(),
                updated_at: now(),
            };

            let row: DocumentAnalysis = diesel::insert_into(document_analyses::table)
                .values(&new_row)
                .on_conflict(document_analyses::document_id)
                .do_update()
                .set(&changeset)
                .get_result(conn)?;
            Ok(Some(analysis_from_row(row)))
        })
    }
}

fn labels_value(result: &AnalysisResult) -> Value {
    Value::Array(result.labels.iter().cloned().map(Value::String).collect())
}

fn entities_value(result: &AnalysisResult) -> Value {
    Value::Array(result.entities.iter().cloned().map(Value::Object).collect())
}

fn analysis_from_row(row: DocumentAnalysis) -> AnalysisResult {
    AnalysisResult {
        document_id: row.document_id,
        summary: row.summary,
        labels: serde_json::from_value(row.labels).unwrap_or_default(),
        entities: serde_json::from_value(row.entities).unwrap_or_default(),
        risk_score: row.risk_score,
        status: row.status,
        missing_topics: row.missing_topics,
        insights: row.insights,
        model_info: row.model_info,
    }
}
