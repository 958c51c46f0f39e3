use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::{
    duplicate_signer_message, signer_limit_message, DomainError, DomainResult, SignerCandidate,
    MAX_SIGNERS_PER_DOCUMENT,
};
use crate::models::Signer;
use crate::store::SignerStore;

pub struct SignerService {
    signers: Arc<dyn SignerStore>,
}

impl SignerService {
    pub fn new(signers: Arc<dyn SignerStore>) -> Self {
        Self { signers }
    }

    /// Normalizes, then checks capacity before uniqueness. The store repeats
    /// both checks under a row lock.
    pub fn add_signer(
        &self,
        document_id: Uuid,
        raw_name: &str,
        raw_email: &str,
    ) -> DomainResult<Signer> {
        let candidate = SignerCandidate::new(document_id, raw_name, raw_email)?;

        if self.signers.count_by_document(document_id)? >= MAX_SIGNERS_PER_DOCUMENT {
            return Err(DomainError::Capacity(signer_limit_message()));
        }
        if self
            .signers
            .get_by_document_and_email(document_id, &candidate.email)?
            .is_some()
        {
            return Err(DomainError::Duplicate(duplicate_signer_message()));
        }

        let signer = self
            .signers
            .create(candidate.document_id, &candidate.name, &candidate.email)?;
        info!(%document_id, signer_id = %signer.id, "signer added");
        Ok(signer)
    }
}
