use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{AnalysisResult, DomainError, DomainResult};
use crate::store::AnalysisStore;
use crate::utils::json::truthy_string;

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisUpsert {
    /// Written (inserted or replaced).
    Stored(AnalysisResult),
    /// Identical to what was stored; nothing written.
    Unchanged(AnalysisResult),
    /// The document does not exist; built but not persisted.
    Detached(AnalysisResult),
}

impl AnalysisUpsert {
    pub fn result(&self) -> &AnalysisResult {
        match self {
            Self::Stored(result) | Self::Unchanged(result) | Self::Detached(result) => result,
        }
    }

    pub fn into_result(self) -> AnalysisResult {
        match self {
            Self::Stored(result) | Self::Unchanged(result) | Self::Detached(result) => result,
        }
    }

    pub fn is_persisted(&self) -> bool {
        !matches!(self, Self::Detached(_))
    }
}

pub struct AnalysisService {
    analyses: Arc<dyn AnalysisStore>,
}

impl AnalysisService {
    pub fn new(analyses: Arc<dyn AnalysisStore>) -> Self {
        Self { analyses }
    }

    /// Entry point for the analysis webhook: `document_id` travels inside the body.
    pub fn handle_webhook(&self, payload: &Value) -> DomainResult<AnalysisUpsert> {
        let document_id = parse_document_id(payload.get("document_id"))?;
        self.upsert(document_id, payload)
    }

    pub fn upsert(&self, document_id: Uuid, payload: &Value) -> DomainResult<AnalysisUpsert> {
        let result = build_result(document_id, payload)?;

        if let Some(existing) = self.analyses.get_by_document_id(document_id)? {
            if existing == result {
                debug!(%document_id, "analysis unchanged");
                return Ok(AnalysisUpsert::Unchanged(existing));
            }
        }

        match self.analyses.upsert(&result)? {
            Some(stored) => {
                info!(%document_id, risk_score = stored.risk_score, "analysis stored");
                Ok(AnalysisUpsert::Stored(stored))
            }
            None => {
                info!(%document_id, "analysis received for unknown document; not stored");
                Ok(AnalysisUpsert::Detached(result))
            }
        }
    }
}

pub fn parse_document_id(raw: Option<&Value>) -> DomainResult<Uuid> {
    let raw = raw
        .and_then(truthy_string)
        .ok_or_else(|| DomainError::validation("document_id is required"))?;
    Uuid::parse_str(raw.trim()).map_err(|_| DomainError::validation("document_id is invalid"))
}

pub fn build_result(document_id: Uuid, payload: &Value) -> DomainResult<AnalysisResult> {
    Ok(AnalysisResult {
        document_id,
        summary: coerce_summary(payload.get("summary")),
        labels: coerce_labels(payload.get("labels")),
        entities: coerce_entities(payload.get("entities")),
        risk_score: coerce_risk_score(payload.get("risk_score"))?,
        status: payload.get("status").and_then(truthy_string),
        missing_topics: optional_blob(payload.get("missing_topics")),
        insights: optional_blob(payload.get("insights")),
        model_info: optional_blob(payload.get("model_info")),
    })
}

fn coerce_summary(raw: Option<&Value>) -> String {
    match raw {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

fn coerce_labels(raw: Option<&Value>) -> Vec<String> {
    match raw {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn coerce_entities(raw: Option<&Value>) -> Vec<Map<String, Value>> {
    match raw {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect(),
        _ => Vec::new(),
    }
}

fn coerce_risk_score(raw: Option<&Value>) -> DomainResult<f64> {
    let score = match raw {
        None | Some(Value::Null) => 0.0,
        Some(Value::Bool(flag)) => f64::from(u8::from(*flag)),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| DomainError::validation("risk_score must be numeric"))?,
        Some(_) => return Err(DomainError::validation("risk_score must be numeric")),
    };
    if !score.is_finite() {
        return Err(DomainError::validation("risk_score must be finite"));
    }
    Ok(score)
}

fn optional_blob(raw: Option<&Value>) -> Option<Value> {
    raw.filter(|value| !value.is_null()).cloned()
}
