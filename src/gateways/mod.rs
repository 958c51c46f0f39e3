use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::Document;

pub mod automation;
pub mod queue;
pub mod zapsign;

pub use automation::HttpAutomationNotifier;
pub use queue::JobQueuePublisher;
pub use zapsign::HttpZapSignClient;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response status {0}")]
    Status(reqwest::StatusCode),
    #[error("queue unavailable: {0}")]
    Queue(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Identifiers returned by the signing provider. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderDocument {
    pub open_id: Option<String>,
    pub token: Option<String>,
    pub status: Option<String>,
}

impl ProviderDocument {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.open_id.is_none() && self.token.is_none() && self.status.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerContact {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCreatedEvent {
    pub document_id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub pdf_url: String,
}

impl From<&Document> for DocumentCreatedEvent {
    fn from(document: &Document) -> Self {
        Self {
            document_id: document.id,
            company_id: document.company_id,
            name: document.name.clone(),
            pdf_url: document.pdf_url.clone(),
        }
    }
}

/// Outbound client for the e-signature provider. HTTP failures are reported as
/// an empty [`ProviderDocument`]; an `Err` is reserved for conditions the
/// caller must see.
#[async_trait]
pub trait SigningProvider: Send + Sync {
    async fn create_draft(
        &self,
        api_token: &str,
        name: &str,
        pdf_url: &str,
    ) -> GatewayResult<ProviderDocument>;

    async fn send_for_signing(
        &self,
        api_token: &str,
        name: &str,
        pdf_url: &str,
        signers: &[SignerContact],
    ) -> GatewayResult<ProviderDocument>;
}

#[async_trait]
pub trait AutomationNotifier: Send + Sync {
    async fn notify_document_created(&self, event: &DocumentCreatedEvent) -> GatewayResult<()>;
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_document_created(&self, event: &DocumentCreatedEvent) -> GatewayResult<()>;
}
