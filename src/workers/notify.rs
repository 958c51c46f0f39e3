use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{JobExecution, JobHandler};
use crate::gateways::{AutomationNotifier, DocumentCreatedEvent};
use crate::jobs::JOB_NOTIFY_DOCUMENT_CREATED;
use crate::models::Job;
use crate::services::effects::{attempt, SideEffect};

/// Forwards queued `DocumentCreated` events to the automation webhook. The job
/// is acknowledged once the call has been attempted, whatever its outcome.
pub struct NotifyDocumentCreatedJob {
    notifier: Arc<dyn AutomationNotifier>,
}

impl NotifyDocumentCreatedJob {
    pub fn new(notifier: Arc<dyn AutomationNotifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl JobHandler for NotifyDocumentCreatedJob {
    fn job_type(&self) -> &'static str {
        JOB_NOTIFY_DOCUMENT_CREATED
    }

    async fn handle(&self, job: Job) -> JobExecution {
        let event: DocumentCreatedEvent = match serde_json::from_value(job.payload) {
            Ok(event) => event,
            Err(err) => {
                return JobExecution::Failed {
                    error: format!("invalid payload: {err}"),
                }
            }
        };

        let outcome = attempt(
            "worker_notify_document_created",
            event.document_id,
            self.notifier.notify_document_created(&event),
        )
        .await;
        if outcome == SideEffect::Delivered {
            info!(document_id = %event.document_id, "document event forwarded");
        }
        JobExecution::Success
    }
}
