use chrono::NaiveDateTime;
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable)]
#[diesel(table_name = companies)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub api_token: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Company {
    /// Provider credential, if one is configured and usable.
    pub fn provider_token(&self) -> Option<&str> {
        self.api_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty() && *token != "-")
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = companies)]
pub struct NewCompany {
    pub id: Uuid,
    pub name: String,
    pub api_token: Option<String>,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations)]
#[diesel(table_name = documents)]
#[diesel(belongs_to(Company))]
pub struct Document {
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

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = documents)]
pub struct NewDocument {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub pdf_url: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations)]
#[diesel(table_name = signers)]
#[diesel(belongs_to(Document))]
pub struct Signer {
    pub id: Uuid,
    pub document_id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = signers)]
pub struct NewSigner {
    pub id: Uuid,
    pub document_id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = document_analyses)]
#[diesel(belongs_to(Document))]
pub struct DocumentAnalysis {
    pub id: Uuid,
    pub document_id: Uuid,
    pub summary: String,
    pub labels: serde_json::Value,
    pub entities: serde_json::Value,
    pub risk_score: f64,
    pub status: Option<String>,
    pub missing_topics: Option<serde_json::Value>,
    pub insights: Option<serde_json::Value>,
    pub model_info: Option<serde_json::Value>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = document_analyses)]
pub struct NewDocumentAnalysis {
    pub id: Uuid,
    pub document_id: Uuid,
    pub summary: String,
    pub labels: serde_json::Value,
    pub entities: serde_json::Value,
    pub risk_score: f64,
    pub status: Option<String>,
    pub missing_topics: Option<serde_json::Value>,
    pub insights: Option<serde_json::Value>,
    pub model_info: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = jobs)]
pub struct Job {
    pub id: Uuid,
    pub job_type: String,
    pub payload: serde_json::Value,
    pub status: String,
    pub attempts: i32,
    pub run_after: NaiveDateTime,
    pub last_error: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = jobs)]
pub struct NewJob {
    pub id: Uuid,
    pub job_type: String,
    pub payload: serde_json::Value,
    pub status: String,
    pub run_after: NaiveDateTime,
}
