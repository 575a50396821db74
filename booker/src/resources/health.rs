use super::{HEALTH_EXPECTED_STATUS, HEALTH_OK, HEALTH_PATH};
use crate::{client::ApiClient, data::ApiResponse, error::Error};
use reqwest::Method;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct HealthCheckClient {
    api: ApiClient,
}

impl HealthCheckClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /health`, expecting 200 and `{"status": "OK"}`.
    pub fn check_health(&self) -> Result<ApiResponse, Error> {
        tracing::info!("Checking API health status");

        let response =
            self.api
                .send::<Value>(self.api.request_spec(), Method::GET, HEALTH_PATH, None)?;
        self.api.validate_response(&response, HEALTH_EXPECTED_STATUS)?;
        self.api.validate_field(&response, "status", HEALTH_OK)?;

        tracing::info!("API health check passed");
        Ok(response)
    }
}
