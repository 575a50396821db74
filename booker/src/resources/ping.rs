use super::{PING_EXPECTED_STATUS, PING_PATH};
use crate::{client::ApiClient, data::ApiResponse, error::Error};
use reqwest::Method;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct PingClient {
    api: ApiClient,
}

impl PingClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn ping(&self) -> Result<ApiResponse, Error> {
        tracing::info!("Checking API availability");

        let response =
            self.api
                .send::<Value>(self.api.request_spec(), Method::GET, PING_PATH, None)?;
        self.api.validate_response(&response, PING_EXPECTED_STATUS)?;

        tracing::info!("API is available and responding");
        Ok(response)
    }
}
