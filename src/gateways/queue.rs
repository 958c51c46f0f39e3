use async_trait::async_trait;
use tokio::task;

use super::{DocumentCreatedEvent, EventPublisher, GatewayError, GatewayResult};
use crate::db::PgPool;
use crate::jobs::{enqueue_job, JOB_NOTIFY_DOCUMENT_CREATED};

/// Publishes events as rows in the `jobs` table for the worker to drain.
#[derive(Clone)]
pub struct JobQueuePublisher {
    pool: PgPool,
}

impl JobQueuePublisher {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventPublisher for JobQueuePublisher {
    async fn publish_document_created(&self, event: &DocumentCreatedEvent) -> GatewayResult<()> {
        let payload =
            serde_json::to_value(event).map_err(|err| GatewayError::Queue(err.to_string()))?;
        let pool = self.pool.clone();

        task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| GatewayError::Queue(format!("database pool error: {err}")))?;
            enqueue_job(&mut conn, JOB_NOTIFY_DOCUMENT_CREATED, payload, None)
                .map_err(|err| GatewayError::Queue(err.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|err| GatewayError::Queue(format!("enqueue task failed: {err}")))?
    }
}
