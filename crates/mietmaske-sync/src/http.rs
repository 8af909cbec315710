//! HTTP client for the intake and contract-generation backend.

use mietmaske_core::{GenerateContractRequest, GenerateContractResponse, SaveIntakeRequest};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("server response has no download URL")]
    MissingDownloadUrl,
}

/// Client for the backend's `save_mask_a` and `generate_contract` endpoints.
///
/// Requests are sent once; there is no retry and no timeout beyond
/// reqwest's defaults.
pub struct BackendClient {
    client: reqwest::Client,
    api_base: String,
}

impl BackendClient {
    /// `api_base` is the API root, e.g. `http://localhost:7071/api`.
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Store a client intake on the server. Only success matters; the
    /// response body is ignored.
    pub async fn save_client_intake(&self, request: &SaveIntakeRequest) -> Result<(), BackendError> {
        let url = format!("{}/save_mask_a", self.api_base);

        info!(url = %url, timestamp = %request.timestamp, "saving client intake");
        let resp = self.client.post(&url).json(request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Server {
                status: status.as_u16(),
                body,
            });
        }

        info!(status = status.as_u16(), "client intake saved");
        Ok(())
    }

    /// Ask the server to render the contract. Returns the download URL.
    pub async fn generate_contract(
        &self,
        request: &GenerateContractRequest,
    ) -> Result<String, BackendError> {
        let url = format!("{}/generate_contract", self.api_base);

        info!(
            url = %url,
            template = %request.template_path,
            placeholders = request.placeholder_mapping.len(),
            "requesting contract generation"
        );
        let resp = self.client.post(&url).json(request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let parsed: GenerateContractResponse = serde_json::from_str(&body)?;
        let url = parsed
            .download_url
            .filter(|u| !u.trim().is_empty())
            .ok_or(BackendError::MissingDownloadUrl)?;
        info!(download_url = %url, "contract generated");
        Ok(url)
    }
}
