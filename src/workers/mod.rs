use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use diesel::{
    pg::PgConnection,
    r2d2::{ConnectionManager, PooledConnection},
};
use tokio::time::sleep;
use tracing::{error, info};

use crate::{
    db::PgPool,
    jobs::{mark_job_failed, mark_job_succeeded, reserve_job, JobQueueError},
    models::Job,
};

pub mod notify;

pub use notify::NotifyDocumentCreatedJob;

#[derive(Debug, PartialEq, Eq)]
pub enum JobExecution {
    Success,
    /// Dropped without requeue.
    Failed { error: String },
}

#[async_trait]
pub trait JobHandler: Send + Sync {
    fn job_type(&self) -> &'static str;
    async fn handle(&self, job: Job) -> JobExecution;
}

type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Drains the `jobs` table one job at a time.
pub struct Worker {
    pool: PgPool,
    handlers: HashMap<&'static str, Arc<dyn JobHandler>>,
    poll_interval: Duration,
}

impl Worker {
    pub fn new(pool: PgPool, handlers: Vec<Arc<dyn JobHandler>>, poll_interval: Duration) -> Self {
        let map = handlers
            .into_iter()
            .map(|handler| (handler.job_type(), handler))
            .collect();
        Self {
            pool,
            handlers: map,
            poll_interval,
        }
    }

    pub async fn run(&self) {
        info!(job_types = ?self.handlers.keys().collect::<Vec<_>>(), "worker started");
        loop {
            match self.tick().await {
                Ok(true) => {}
                Ok(false) => sleep(self.poll_interval).await,
                Err(err) => {
                    error!(error = %err, "worker tick failed");
                    sleep(self.poll_interval).await;
                }
            }
        }
    }

    fn conn(&self) -> Option<PgPooledConnection> {
        match self.pool.get() {
            Ok(conn) => Some(conn),
            Err(err) => {
                error!(error = %err, "failed to obtain database connection in worker");
                None
            }
        }
    }

    /// Returns whether a job was processed.
    async fn tick(&self) -> Result<bool, JobQueueError> {
        let job_types: Vec<&str> = self.handlers.keys().copied().collect();
        if job_types.is_empty() {
            return Ok(false);
        }

        let Some(mut conn) = self.conn() else {
            return Ok(false);
        };
        let job_opt = reserve_job(&mut conn, &job_types)?;
        drop(conn);

        let Some(job) = job_opt else {
            return Ok(false);
        };

        let outcome = match self.handlers.get(job.job_type.as_str()) {
            Some(handler) => handler.handle(job.clone()).await,
            None => JobExecution::Failed {
                error: "no handler registered".to_string(),
            },
        };

        let Some(mut conn) = self.conn() else {
            return Ok(true);
        };
        match outcome {
            JobExecution::Success => {
                mark_job_succeeded(&mut conn, job.id)?;
                info!(job_id = %job.id, job_type = %job.job_type, "job completed");
            }
            JobExecution::Failed { error } => {
                error!(job_id = %job.id, job_type = %job.job_type, %error, "job failed");
                mark_job_failed(&mut conn, job.id, &error)?;
            }
        }
        Ok(true)
    }
}
