use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{GatewayResult, ProviderDocument, SignerContact, SigningProvider};
use crate::utils::json::first_string;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct CreateDocRequest<'a> {
    name: &'a str,
    url_pdf: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    signers: Option<&'a [SignerContact]>,
}

/// ZapSign REST client. Without a base URL every call yields an empty result.
pub struct HttpZapSignClient {
    client: Client,
    base_url: Option<String>,
}

impl HttpZapSignClient {
    pub fn new(base_url: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        Ok(Self { client, base_url })
    }

    async fn post_document(&self, api_token: &str, request: &CreateDocRequest<'_>) -> ProviderDocument {
        let Some(base_url) = self.base_url.as_deref() else {
            debug!("zapsign base url missing; skipping provider call");
            return ProviderDocument::empty();
        };
        let url = format!("{base_url}/docs/");

        let response = match self
            .client
            .post(&url)
            .bearer_auth(api_token)
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, timeout = err.is_timeout(), "zapsign request failed");
                return ProviderDocument::empty();
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, %body, "zapsign returned non-success status");
            return ProviderDocument::empty();
        }

        match response.json::<Value>().await {
            Ok(body) => parse_provider_document(&body),
            Err(err) => {
                warn!(error = %err, "zapsign response was not valid json");
                ProviderDocument::empty()
            }
        }
    }
}

#[async_trait]
impl SigningProvider for HttpZapSignClient {
    async fn create_draft(
        &self,
        api_token: &str,
        name: &str,
        pdf_url: &str,
    ) -> GatewayResult<ProviderDocument> {
        let request = CreateDocRequest {
            name,
            url_pdf: pdf_url,
            signers: None,
        };
        Ok(self.post_document(api_token, &request).await)
    }

    async fn send_for_signing(
        &self,
        api_token: &str,
        name: &str,
        pdf_url: &str,
        signers: &[SignerContact],
    ) -> GatewayResult<ProviderDocument> {
        let request = CreateDocRequest {
            name,
            url_pdf: pdf_url,
            signers: Some(signers),
        };
        Ok(self.post_document(api_token, &request).await)
    }
}

fn parse_provider_document(body: &Value) -> ProviderDocument {
    ProviderDocument {
        open_id: first_string(body, &["open_id"]),
        token: first_string(body, &["token"]),
        status: first_string(body, &["status"]),
    }
}
