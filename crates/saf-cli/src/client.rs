//! API client for communicating with a running saf-server

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use saf_engine::{PassengerInput, PredictionOutcome};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// API client for the predictor service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Score an offer
    ///
    /// Scoring errors come back as an outcome carrying the echoed inputs,
    /// whether the server reports them in-band or with 422/500.
    pub async fn predict(&self, input: &PassengerInput) -> Result<PredictionOutcome> {
        let url = self.base_url.join("predict").context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(input)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let body = response.text().await.context("Failed to read response")?;

        let carries_outcome = status.is_success()
            || status == StatusCode::UNPROCESSABLE_ENTITY
            || status == StatusCode::INTERNAL_SERVER_ERROR;
        if carries_outcome {
            if let Ok(outcome) = serde_json::from_str::<PredictionOutcome>(&body) {
                return Ok(outcome);
            }
        }

        if !status.is_success() {
            anyhow::bail!("API error ({}): {}", status, body);
        }
        anyhow::bail!("Failed to parse response: {}", body)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.get("health").await
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
