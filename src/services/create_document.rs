use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::effects::{attempt, SideEffect};
use crate::domain::{normalize_document_name, normalize_pdf_url, DomainResult};
use crate::gateways::{AutomationNotifier, DocumentCreatedEvent, EventPublisher};
use crate::models::Document;
use crate::store::DocumentStore;

#[derive(Debug, Clone)]
pub struct CreatedDocument {
    pub document: Document,
    pub published: SideEffect,
    pub notified: SideEffect,
}

/// Persists a document, then publishes and notifies. Only the insert can fail
/// the call.
pub struct CreateDocumentService {
    documents: Arc<dyn DocumentStore>,
    publisher: Arc<dyn EventPublisher>,
    notifier: Arc<dyn AutomationNotifier>,
}

impl CreateDocumentService {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        publisher: Arc<dyn EventPublisher>,
        notifier: Arc<dyn AutomationNotifier>,
    ) -> Self {
        Self {
            documents,
            publisher,
            notifier,
        }
    }

    pub async fn create(
        &self,
        company_id: Uuid,
        name: &str,
        pdf_url: &str,
    ) -> DomainResult<CreatedDocument> {
        let name = normalize_document_name(name)?;
        let pdf_url = normalize_pdf_url(pdf_url)?;

        let document = self.documents.create(company_id, &name, &pdf_url)?;
        info!(document_id = %document.id, %company_id, "document created");

        let event = DocumentCreatedEvent::from(&document);
        let published = attempt(
            "publish_document_created",
            document.id,
            self.publisher.publish_document_created(&event),
        )
        .await;
        let notified = attempt(
            "notify_document_created",
            document.id,
            self.notifier.notify_document_created(&event),
        )
        .await;

        Ok(CreatedDocument {
            document,
            published,
            notified,
        })
    }
}
