//! Request and response bodies exchanged with the contract backend, plus the
//! names of locally written export files.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::intake::ClientIntake;
use crate::lawyer::LawyerDecisions;
use crate::placeholders::PlaceholderMapping;

pub const DEFAULT_API_BASE: &str = "http://localhost:7071/api";
pub const DEFAULT_TEMPLATE_PATH: &str = "source_of_truth/contract-template-annotated.html";
pub const COMBINED_EXPORT_FILE_NAME: &str = "masken-a-und-b.json";

/// `mandantendaten_<date>.json`
pub fn intake_export_file_name(date: NaiveDate) -> String {
    format!("mandantendaten_{}.json", date.format("%Y-%m-%d"))
}

/// Body of `POST {api_base}/save_mask_a`: the intake with a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveIntakeRequest {
    #[serde(flatten)]
    pub intake: ClientIntake,
    pub timestamp: String,
}

impl SaveIntakeRequest {
    pub fn new(intake: ClientIntake, at: DateTime<Utc>) -> Self {
        Self {
            intake,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Body of `POST {api_base}/generate_contract`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContractRequest {
    pub mask_a: ClientIntake,
    pub mask_b: LawyerDecisions,
    pub template_path: String,
    pub placeholder_mapping: PlaceholderMapping,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContractResponse {
    #[serde(default)]
    pub download_url: Option<String>,
}

/// The combined `{maskA, maskB}` file. Also accepted as lawyer import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedMasks {
    pub mask_a: ClientIntake,
    pub mask_b: LawyerDecisions,
}
