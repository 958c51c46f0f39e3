//! Provider status webhooks.
//!
//! Statuses only move forward along the rank table, so replays and
//! out-of-order deliveries converge on the same stored state. `error` and
//! `failed` sit outside the ordering: they replace any status except a
//! finished one (`signed`, `completed`).

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::domain::{DomainError, DomainResult};
use crate::models::Document;
use crate::store::{DocumentChanges, DocumentStore};
use crate::utils::json::first_string;

pub const STATUS_CREATED: &str = "created";
pub const STATUS_READY: &str = "ready";
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_SENT: &str = "sent";
pub const STATUS_SIGNED: &str = "signed";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_ERROR: &str = "error";
pub const STATUS_FAILED: &str = "failed";

const STATUS_RANKS: &[(&str, i32)] = &[
    (STATUS_CREATED, 0),
    (STATUS_READY, 1),
    (STATUS_PENDING, 2),
    (STATUS_SENT, 3),
    (STATUS_SIGNED, 4),
    (STATUS_COMPLETED, 5),
    (STATUS_ERROR, 99),
    (STATUS_FAILED, 99),
];

pub const UNKNOWN_RANK: i32 = -1;

const OPEN_ID_KEYS: &[&str] = &["open_id", "id", "openId"];
const STATUS_KEYS: &[&str] = &["status", "document_status"];
const TOKEN_KEYS: &[&str] = &["token", "document_token"];

pub fn canonical_status(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn status_rank(status: &str) -> i32 {
    let status = canonical_status(status);
    STATUS_RANKS
        .iter()
        .find(|(name, _)| *name == status)
        .map(|(_, rank)| *rank)
        .unwrap_or(UNKNOWN_RANK)
}

fn is_failure(status: &str) -> bool {
    status == STATUS_ERROR || status == STATUS_FAILED
}

fn is_finished(status: &str) -> bool {
    status == STATUS_SIGNED || status == STATUS_COMPLETED
}

/// Status to store when `incoming` arrives for a document currently in
/// `current`, or `None` to keep the current one.
pub fn next_status(current: &str, incoming: &str) -> Option<String> {
    let current = canonical_status(current);
    let incoming = canonical_status(incoming);
    if incoming.is_empty() {
        return None;
    }

    let advances = if is_failure(&incoming) {
        !is_finished(&current) && current != incoming
    } else {
        status_rank(&incoming) > status_rank(&current)
    };
    advances.then_some(incoming)
}

/// Fields pulled out of a provider webhook body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUpdate {
    pub open_id: String,
    pub status: Option<String>,
    pub token: Option<String>,
}

impl ProviderUpdate {
    pub fn from_payload(payload: &Value) -> DomainResult<Self> {
        let open_id = first_string(payload, OPEN_ID_KEYS)
            .ok_or_else(|| DomainError::validation("open_id is required"))?;
        let status = first_string(payload, STATUS_KEYS)
            .map(|status| canonical_status(&status))
            .filter(|status| !status.is_empty());
        let token = first_string(payload, TOKEN_KEYS);
        Ok(Self {
            open_id,
            status,
            token,
        })
    }

    /// Changes this update makes to `document`; empty when it is a replay or
    /// would move the status backwards.
    pub fn changes_for(&self, document: &Document) -> DocumentChanges {
        let status = self
            .status
            .as_deref()
            .and_then(|incoming| next_status(&document.status, incoming));
        let token = self
            .token
            .as_ref()
            .filter(|token| document.token.as_ref() != Some(*token))
            .cloned();
        DocumentChanges {
            status,
            token,
            ..DocumentChanges::default()
        }
    }
}

pub struct StatusService {
    documents: Arc<dyn DocumentStore>,
}

impl StatusService {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    /// Returns `None` when no document carries the payload's open id. The
    /// decision is made against the row as locked by the store, so concurrent
    /// deliveries for one document cannot move its status backwards.
    pub fn apply_provider_update(&self, payload: &Value) -> DomainResult<Option<Document>> {
        let update = ProviderUpdate::from_payload(payload)?;

        let applied = self.documents.update_by_open_id(&update.open_id, &|document: &Document| {
            let changes = update.changes_for(document);
            if changes.is_empty() {
                debug!(document_id = %document.id, status = %document.status, "provider webhook changed nothing");
            } else {
                info!(
                    document_id = %document.id,
                    from = %document.status,
                    to = changes.status.as_deref().unwrap_or(&document.status),
                    token_changed = changes.token.is_some(),
                    "applying provider update"
                );
            }
            changes
        })?;

        if applied.is_none() {
            info!(open_id = %update.open_id, "provider webhook for unknown document");
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rank_table_orders_the_lifecycle() {
        let lifecycle = ["created", "ready", "pending", "sent", "signed", "completed"];
        for pair in lifecycle.windows(2) {
            assert!(status_rank(pair[0]) < status_rank(pair[1]));
        }
        assert_eq!(status_rank("ERROR"), 99);
        assert_eq!(status_rank("archived"), UNKNOWN_RANK);
    }

    #[test]
    fn forward_moves_apply_and_backward_moves_do_not() {
        assert_eq!(next_status("created", "Pending").as_deref(), Some("pending"));
        assert_eq!(next_status("signed", "pending"), None);
        assert_eq!(next_status("signed", "signed"), None);
        assert_eq!(next_status("created", "whatever"), None);
        assert_eq!(next_status("whatever", "created").as_deref(), Some("created"));
    }

    #[test]
    fn failures_never_replace_finished_documents() {
        assert_eq!(next_status("sent", "error").as_deref(), Some("error"));
        assert_eq!(next_status("error", "failed").as_deref(), Some("failed"));
        assert_eq!(next_status("error", "error"), None);
        assert_eq!(next_status("signed", "failed"), None);
        assert_eq!(next_status("completed", "error"), None);
        assert_eq!(next_status("error", "completed"), None);
    }

    #[test]
    fn payload_keys_fall_back_in_order() {
        let update = ProviderUpdate::from_payload(&json!({
            "openId": "oid-3",
            "document_status": " SIGNED ",
            "document_token": "tok"
        }))
        .unwrap();
        assert_eq!(update.open_id, "oid-3");
        assert_eq!(update.status.as_deref(), Some("signed"));
        assert_eq!(update.token.as_deref(), Some("tok"));

        let numeric = ProviderUpdate::from_payload(&json!({"id": 789})).unwrap();
        assert_eq!(numeric.open_id, "789");
        assert_eq!(numeric.status, None);
    }

    #[test]
    fn missing_open_id_is_a_validation_error() {
        for payload in [json!({}), json!({"open_id": ""}), json!({"status": "signed"})] {
            assert!(matches!(
                ProviderUpdate::from_payload(&payload),
                Err(DomainError::Validation(_))
            ));
        }
    }
}
