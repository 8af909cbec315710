pub mod wire;

pub mod api;
pub mod derive;
pub mod error;
pub mod intake;
pub mod lawyer;
pub mod normalize;
pub mod placeholders;
pub mod validate;
pub mod wizard;

pub use api::{
    COMBINED_EXPORT_FILE_NAME, CombinedMasks, DEFAULT_API_BASE, DEFAULT_TEMPLATE_PATH,
    GenerateContractRequest, GenerateContractResponse, SaveIntakeRequest,
};
pub use error::CoreError;
pub use intake::ClientIntake;
pub use lawyer::LawyerDecisions;
pub use normalize::{normalize_client_intake, normalize_lawyer_decisions};
pub use placeholders::{PlaceholderMapping, build_placeholder_mapping};
pub use validate::FieldErrors;
pub use wizard::{ClientWizard, GenerationOutcome, ImportStatus, LawyerWizard};
