use std::sync::Arc;

use crate::{
    auth::jwt::JwtService,
    config::AppConfig,
    db::PgPool,
    gateways::{
        AutomationNotifier, EventPublisher, HttpAutomationNotifier, HttpZapSignClient,
        JobQueuePublisher, SigningProvider,
    },
    services::{
        AnalysisService, CreateDocumentService, SendToSignService, SignerService, StatusService,
    },
    store::{AnalysisStore, CompanyStore, DocumentStore, SignerStore},
};

#[derive(Clone)]
pub struct Stores {
    pub companies: Arc<dyn CompanyStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub signers: Arc<dyn SignerStore>,
    pub analyses: Arc<dyn AnalysisStore>,
}

impl Stores {
    /// All four stores backed by one value, e.g. a `PgStore`.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: CompanyStore + DocumentStore + SignerStore + AnalysisStore + 'static,
    {
        Self {
            companies: store.clone(),
            documents: store.clone(),
            signers: store.clone(),
            analyses: store,
        }
    }
}

#[derive(Clone)]
pub struct Gateways {
    pub provider: Arc<dyn SigningProvider>,
    pub notifier: Arc<dyn AutomationNotifier>,
    pub publisher: Arc<dyn EventPublisher>,
}

impl Gateways {
    /// HTTP clients for the provider and automation webhook, plus the
    /// `jobs`-table publisher.
    pub fn from_config(config: &AppConfig, pool: PgPool) -> anyhow::Result<Self> {
        let provider =
            HttpZapSignClient::new(config.zapsign_api_base.clone(), config.zapsign_timeout)?;
        let notifier = HttpAutomationNotifier::new(
            config.automation_webhook_url.clone(),
            config.automation_api_key.clone(),
            config.automation_timeout,
        )?;
        Ok(Self {
            provider: Arc::new(provider),
            notifier: Arc::new(notifier),
            publisher: Arc::new(JobQueuePublisher::new(pool)),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtService,
    pub stores: Stores,
    pub gateways: Gateways,
}

impl AppState {
    pub fn new(config: AppConfig, jwt: JwtService, stores: Stores, gateways: Gateways) -> Self {
        Self {
            config: Arc::new(config),
            jwt,
            stores,
            gateways,
        }
    }

    pub fn signer_service(&self) -> SignerService {
        SignerService::new(self.stores.signers.clone())
    }

    pub fn status_service(&self) -> StatusService {
        StatusService::new(self.stores.documents.clone())
    }

    pub fn analysis_service(&self) -> AnalysisService {
        AnalysisService::new(self.stores.analyses.clone())
    }

    pub fn create_document_service(&self) -> CreateDocumentService {
        CreateDocumentService::new(
            self.stores.documents.clone(),
            self.gateways.publisher.clone(),
            self.gateways.notifier.clone(),
        )
    }

    pub fn send_to_sign_service(&self) -> SendToSignService {
        SendToSignService::new(
            self.stores.companies.clone(),
            self.stores.documents.clone(),
            self.stores.signers.clone(),
            self.gateways.provider.clone(),
        )
    }
}
