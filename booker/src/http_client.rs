use crate::{
    data::{ApiResponse, RequestData},
    error::Error,
};
use reqwest::{
    blocking::Client,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use std::{fmt::Debug, time::Duration, time::Instant};

/// Transport seam of the clients. Implementations block until the response
/// has been read completely.
pub trait HttpClient: Debug {
    fn execute(&self, request: &RequestData) -> Result<ApiResponse, Error>;
}

#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    fn put_headers<'a, I: IntoIterator<Item = &'a (String, String)>>(
        headers: I,
    ) -> Result<HeaderMap, Error> {
        let mut header_map = HeaderMap::new();

        for (key, value) in headers {
            let header_name = HeaderName::from_bytes(key.to_lowercase().as_bytes())
                .map_err(|_| Error::InvalidHeaderName(key.clone()))?;
            let header_value =
                HeaderValue::from_str(value).map_err(|_| Error::InvalidHeaderValue(key.clone()))?;
            header_map.append(header_name, header_value);
        }

        Ok(header_map)
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute(&self, request: &RequestData) -> Result<ApiResponse, Error> {
        if request.log_traffic {
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                body = request.body.as_deref().unwrap_or(""),
                "Request"
            );
        }

        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(Self::put_headers(&request.headers)?);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let started = Instant::now();
        let response = builder.send()?;
        let status_code = response.status().as_u16();
        let headers = booker_stub::header_strings(response.headers());
        let body = response.text()?;
        let elapsed = started.elapsed();

        if request.log_traffic {
            tracing::debug!(
                status_code,
                elapsed_ms = elapsed.as_millis() as u64,
                body = body.as_str(),
                "Response"
            );
        }

        Ok(ApiResponse::new(status_code, headers, body, elapsed))
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}
