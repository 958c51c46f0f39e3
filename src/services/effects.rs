use std::future::Future;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::gateways::{GatewayError, GatewayResult};

/// Outcome of a side effect whose failure must not reach the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    Delivered,
    Skipped(&'static str),
    Failed(String),
}

impl SideEffect {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SideEffect::Delivered)
    }
}

/// Awaits `effect` and folds its result into a [`SideEffect`]. Errors are
/// logged here and go no further.
pub async fn attempt<F>(effect_name: &'static str, document_id: Uuid, effect: F) -> SideEffect
where
    F: Future<Output = GatewayResult<()>>,
{
    match effect.await {
        Ok(()) => SideEffect::Delivered,
        Err(GatewayError::NotConfigured(what)) => {
            debug!(effect = effect_name, %document_id, "{what} not configured; skipping");
            SideEffect::Skipped(what)
        }
        Err(err) => {
            warn!(effect = effect_name, %document_id, error = %err, "side effect failed");
            SideEffect::Failed(err.to_string())
        }
    }
}
