use crate::{
    auth::{AuthToken, Credentials, TokenCache, TokenResponse},
    configuration::Configuration,
    data::ApiResponse,
    error::{AuthError, Error},
    http_client::{HttpClient, ReqwestHttpClient},
    request_spec::RequestSpecification,
    validation::{self, Validator},
};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::{sync::Arc, time::Duration};

/// Builder used to assemble an [`ApiClient`] from a configuration.
#[derive(Debug, Default)]
pub struct ApiClientBuilder {
    configuration: Configuration,
    http_client: Option<Arc<dyn HttpClient + Send + Sync>>,
    token_cache: Option<Arc<TokenCache>>,
}

impl ApiClientBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            http_client: None,
            token_cache: None,
        }
    }

    /// Use the given transport instead of the default blocking reqwest client.
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient + Send + Sync>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Share a token cache with other clients.
    pub fn with_token_cache(mut self, token_cache: Arc<TokenCache>) -> Self {
        self.token_cache = Some(token_cache);
        self
    }

    /// Fails when the configuration has no base URL or carries invalid timing values.
    pub fn build(self) -> Result<ApiClient, Error> {
        let spec = RequestSpecification::new(self.configuration.base_url()?);
        let response_time_threshold = self.configuration.response_time_threshold()?;

        let http: Arc<dyn HttpClient + Send + Sync> = match self.http_client {
            Some(http) => http,
            None => match self.configuration.http_timeout()? {
                Some(timeout) => Arc::new(ReqwestHttpClient::with_timeout(timeout)?),
                None => Arc::new(ReqwestHttpClient::new()),
            },
        };

        tracing::info!(base_url = spec.base_url(), "API client initialised");

        Ok(ApiClient {
            configuration: Arc::new(self.configuration),
            spec,
            tokens: self.token_cache.unwrap_or_default(),
            http,
            response_time_threshold,
        })
    }
}

/// Base client shared by every resource client. Cloning is cheap and the
/// clones share the configuration, transport and token cache.
#[derive(Debug, Clone)]
pub struct ApiClient {
    configuration: Arc<Configuration>,
    spec: RequestSpecification,
    tokens: Arc<TokenCache>,
    http: Arc<dyn HttpClient + Send + Sync>,
    response_time_threshold: Duration,
}

impl ApiClient {
    pub fn new(configuration: Configuration) -> Result<Self, Error> {
        ApiClientBuilder::new(configuration).build()
    }

    pub fn builder(configuration: Configuration) -> ApiClientBuilder {
        ApiClientBuilder::new(configuration)
    }

    pub fn from_config_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Error> {
        Self::new(Configuration::load(path)?)
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn token_cache(&self) -> &TokenCache {
        &self.tokens
    }

    pub fn response_time_threshold(&self) -> Duration {
        self.response_time_threshold
    }

    pub fn request_spec(&self) -> &RequestSpecification {
        &self.spec
    }

    pub fn authenticated_request_spec(&self) -> Result<RequestSpecification, Error> {
        Ok(self.spec.authenticated(&self.auth_token()?))
    }

    /// Returns the cached token, asking `/auth` for one on first use.
    pub fn auth_token(&self) -> Result<AuthToken, Error> {
        self.tokens.get_or_fetch(|| self.request_token())
    }

    pub fn clear_auth_token(&self) -> Result<(), Error> {
        tracing::debug!("Clearing cached auth token");
        self.tokens.clear()
    }

    fn request_token(&self) -> Result<AuthToken, Error> {
        let credentials = Credentials {
            username: self.configuration.username()?,
            password: self.configuration.password()?,
        };

        tracing::info!(username = credentials.username, "Requesting auth token");

        // keeps the password out of the traffic log
        let spec = self.spec.with_traffic_logging(false);
        let response = self
            .send(&spec, Method::POST, "/auth", Some(&credentials))
            .map_err(|e| match e {
                Error::Transport(e) => Error::Auth(AuthError::Unreachable(e.to_string())),
                other => other,
            })?;

        if response.status_code() != 200 {
            tracing::error!(status_code = response.status_code(), "Failed to get auth token");
            return Err(AuthError::Rejected {
                status_code: response.status_code(),
                body: response.body().into(),
            }
            .into());
        }

        match response.json_as::<TokenResponse>() {
            Ok(TokenResponse { token: Some(token) }) if !token.is_empty() => {
                Ok(AuthToken::new(token))
            }
            _ => Err(AuthError::MissingToken {
                status_code: response.status_code(),
                body: response.body().into(),
            }
            .into()),
        }
    }

    pub fn send<B: Serialize + ?Sized>(
        &self,
        spec: &RequestSpecification,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse, Error> {
        let body = body.map(serde_json::to_string).transpose()?;
        self.send_raw(spec, method, path, body)
    }

    pub fn send_raw(
        &self,
        spec: &RequestSpecification,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<ApiResponse, Error> {
        let request = spec.request(method, path, body);
        self.http.execute(&request)
    }

    /// Status check plus the advisory response-time check.
    pub fn validate_response(
        &self,
        response: &ApiResponse,
        expected_status: u16,
    ) -> Result<(), Error> {
        validation::check_response_time(response, self.response_time_threshold);
        Ok(validation::validate_response(response, expected_status)?)
    }

    /// Soft-assertion scope using this client's response-time threshold.
    pub fn validator<S: Into<String>>(&self, scope: S) -> Validator {
        Validator::new(scope).with_threshold(self.response_time_threshold)
    }

    pub fn validate_field<V: Into<Value>>(
        &self,
        response: &ApiResponse,
        path: &str,
        expected: V,
    ) -> Result<(), Error> {
        Ok(validation::validate_field(response, path, &expected.into())?)
    }
}
