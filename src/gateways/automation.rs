use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use super::{AutomationNotifier, DocumentCreatedEvent, GatewayError, GatewayResult};

pub const AUTOMATION_KEY_HEADER: &str = "X-Automation-Key";

/// Posts document events to the automation webhook (an n8n flow in production).
pub struct HttpAutomationNotifier {
    client: Client,
    url: Option<String>,
    api_key: Option<String>,
}

impl HttpAutomationNotifier {
    pub fn new(
        url: Option<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.filter(|u| !u.trim().is_empty()),
            api_key,
        })
    }
}

#[async_trait]
impl AutomationNotifier for HttpAutomationNotifier {
    async fn notify_document_created(&self, event: &DocumentCreatedEvent) -> GatewayResult<()> {
        let url = self
            .url
            .as_deref()
            .ok_or(GatewayError::NotConfigured("automation webhook"))?;

        let body = json!({
            "event": "document_created",
            "document": {
                "id": event.document_id,
                "company_id": event.company_id,
                "name": event.name,
                "pdf_url": event.pdf_url,
            }
        });

        let response = self
            .client
            .post(url)
            .header(AUTOMATION_KEY_HEADER, self.api_key.as_deref().unwrap_or_default())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status));
        }
        debug!(document_id = %event.document_id, "automation webhook notified");
        Ok(())
    }
}
