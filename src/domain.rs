use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::gateways::GatewayError;
use crate::store::StoreError;

pub const MAX_SIGNERS_PER_DOCUMENT: i64 = 2;

pub const COMPANY_NAME_MAX_LEN: usize = 255;
pub const COMPANY_TOKEN_MAX_LEN: usize = 255;
pub const DOCUMENT_NAME_MAX_LEN: usize = 200;
pub const DOCUMENT_URL_MAX_LEN: usize = 4096;
pub const SIGNER_NAME_MAX_LEN: usize = 200;
pub const EMAIL_MAX_LEN: usize = 254;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Capacity(String),
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    Precondition(String),
    #[error("signing provider error: {0}")]
    Provider(#[from] GatewayError),
    #[error("storage error: {0}")]
    Storage(StoreError),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::MissingCompany(id) => {
                DomainError::Validation(format!("company {id} does not exist"))
            }
            StoreError::MissingDocument(id) => {
                DomainError::Validation(format!("document {id} does not exist"))
            }
            StoreError::SignerLimit => DomainError::Capacity(signer_limit_message()),
            StoreError::DuplicateSigner => DomainError::Duplicate(duplicate_signer_message()),
            StoreError::DuplicateEmail => {
                DomainError::Validation("email already registered".to_string())
            }
            StoreError::CompanyInUse => {
                DomainError::Precondition("company still owns documents".to_string())
            }
            other => DomainError::Storage(other),
        }
    }
}

pub(crate) fn signer_limit_message() -> String {
    format!("Max {MAX_SIGNERS_PER_DOCUMENT} signers per document")
}

pub(crate) fn duplicate_signer_message() -> String {
    "Email already exists for this document".to_string()
}

pub fn normalize_company_name(raw: &str) -> DomainResult<String> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        return Err(DomainError::validation("company name is required"));
    }
    if name.chars().count() > COMPANY_NAME_MAX_LEN {
        return Err(DomainError::validation(format!(
            "company name max length is {COMPANY_NAME_MAX_LEN}"
        )));
    }
    Ok(name)
}

pub fn normalize_api_token(raw: &str) -> DomainResult<String> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(DomainError::validation("api token is required"));
    }
    if token.chars().count() > COMPANY_TOKEN_MAX_LEN {
        return Err(DomainError::validation(format!(
            "api token max length is {COMPANY_TOKEN_MAX_LEN}"
        )));
    }
    Ok(token.to_string())
}

pub fn normalize_email(raw: &str) -> DomainResult<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || !EMAIL_RE.is_match(&email) {
        return Err(DomainError::validation("email is invalid"));
    }
    if email.chars().count() > EMAIL_MAX_LEN {
        return Err(DomainError::validation(format!(
            "email max length is {EMAIL_MAX_LEN}"
        )));
    }
    Ok(email)
}

pub fn normalize_document_name(raw: &str) -> DomainResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::validation("document name is required"));
    }
    if name.chars().count() > DOCUMENT_NAME_MAX_LEN {
        return Err(DomainError::validation(format!(
            "document name max length is {DOCUMENT_NAME_MAX_LEN}"
        )));
    }
    Ok(name.to_string())
}

pub fn normalize_pdf_url(raw: &str) -> DomainResult<String> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(DomainError::validation("pdf_url is required"));
    }
    if url.chars().count() > DOCUMENT_URL_MAX_LEN {
        return Err(DomainError::validation(format!(
            "pdf_url max length is {DOCUMENT_URL_MAX_LEN}"
        )));
    }
    Ok(url.to_string())
}

/// Signer identity after trimming and lowercasing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerCandidate {
    pub document_id: Uuid,
    pub name: String,
    pub email: String,
}

impl SignerCandidate {
    pub fn new(document_id: Uuid, raw_name: &str, raw_email: &str) -> DomainResult<Self> {
        let name = raw_name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("signer name is required"));
        }
        if name.chars().count() > SIGNER_NAME_MAX_LEN {
            return Err(DomainError::validation(format!(
                "signer name max length is {SIGNER_NAME_MAX_LEN}"
            )));
        }
        let email = normalize_email(raw_email)
            .map_err(|_| DomainError::validation("signer email is invalid"))?;
        Ok(Self {
            document_id,
            name: name.to_string(),
            email,
        })
    }
}

/// Analysis output attached to a document. Timestamps are deliberately absent so
/// two results built from the same payload compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub document_id: Uuid,
    pub summary: String,
    pub labels: Vec<String>,
    pub entities: Vec<Map<String, Value>>,
    pub risk_score: f64,
    pub status: Option<String>,
    pub missing_topics: Option<Value>,
    pub insights: Option<Value>,
    pub model_info: Option<Value>,
}
