use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::status::canonical_status;
use crate::domain::{DomainError, DomainResult, MAX_SIGNERS_PER_DOCUMENT};
use crate::gateways::{SignerContact, SigningProvider};
use crate::models::Document;
use crate::store::{CompanyStore, DocumentChanges, DocumentStore, SignerStore};

pub const SIGNER_COUNT_MESSAGE: &str = "Document must have 1 or 2 signers before sending";

pub struct SendToSignService {
    companies: Arc<dyn CompanyStore>,
    documents: Arc<dyn DocumentStore>,
    signers: Arc<dyn SignerStore>,
    provider: Arc<dyn SigningProvider>,
}

impl SendToSignService {
    pub fn new(
        companies: Arc<dyn CompanyStore>,
        documents: Arc<dyn DocumentStore>,
        signers: Arc<dyn SignerStore>,
        provider: Arc<dyn SigningProvider>,
    ) -> Self {
        Self {
            companies,
            documents,
            signers,
            provider,
        }
    }

    /// `None` when the document does not exist. A company without a usable
    /// provider token gets its document back untouched.
    pub async fn send(&self, document_id: Uuid) -> DomainResult<Option<Document>> {
        let Some(document) = self.documents.get_by_id(document_id)? else {
            return Ok(None);
        };

        let company = self.companies.get_by_id(document.company_id)?;
        let Some(api_token) = company
            .as_ref()
            .and_then(|company| company.provider_token())
            .map(str::to_owned)
        else {
            warn!(%document_id, company_id = %document.company_id, "no provider token; not sending");
            return Ok(Some(document));
        };

        let signers = self.signers.list_by_document(document_id)?;
        if signers.is_empty() || signers.len() as i64 > MAX_SIGNERS_PER_DOCUMENT {
            return Err(DomainError::Precondition(SIGNER_COUNT_MESSAGE.to_string()));
        }
        let contacts: Vec<SignerContact> = signers
            .into_iter()
            .map(|signer| SignerContact {
                name: signer.name,
                email: signer.email,
            })
            .collect();

        let provided = self
            .provider
            .send_for_signing(&api_token, &document.name, &document.pdf_url, &contacts)
            .await?;

        let changes = DocumentChanges {
            open_id: provided.open_id,
            token: provided.token,
            status: provided
                .status
                .map(|status| canonical_status(&status))
                .filter(|status| !status.is_empty()),
            ..DocumentChanges::default()
        };
        if changes.is_empty() {
            info!(%document_id, "provider returned no identifiers");
            return Ok(Some(document));
        }

        info!(%document_id, open_id = ?changes.open_id, status = ?changes.status, "document sent to provider");
        let updated = self.documents.update_partial(document_id, changes)?;
        Ok(Some(updated.unwrap_or(document)))
    }
}
