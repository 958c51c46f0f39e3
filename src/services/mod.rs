//! Use cases. Each service receives its stores and gateways through its
//! constructor; `AppState` is the only place they are assembled for HTTP.

pub mod analysis;
pub mod create_document;
pub mod effects;
pub mod send_to_sign;
pub mod signers;
pub mod status;

pub use analysis::{AnalysisService, AnalysisUpsert};
pub use create_document::{CreateDocumentService, CreatedDocument};
pub use effects::{attempt, SideEffect};
pub use send_to_sign::SendToSignService;
pub use signers::SignerService;
pub use status::{ProviderUpdate, StatusService};
