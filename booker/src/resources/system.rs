use super::{HealthCheckClient, PingClient};
use crate::{client::ApiClient, data::ApiResponse, error::Error};

/// Ping and health behind one client, with the same expectations as the
/// dedicated clients.
#[derive(Debug, Clone)]
pub struct SystemClient {
    ping: PingClient,
    health: HealthCheckClient,
}

impl SystemClient {
    pub fn new(api: ApiClient) -> Self {
        Self {
            ping: PingClient::new(api.clone()),
            health: HealthCheckClient::new(api),
        }
    }

    pub fn ping(&self) -> Result<ApiResponse, Error> {
        self.ping.ping()
    }

    pub fn health(&self) -> Result<ApiResponse, Error> {
        self.health.check_health()
    }
}
