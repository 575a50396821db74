use crate::{error::Error, json_path::JsonPath};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{collections::HashMap, time::Duration};

/// A fully resolved outgoing call, produced by a [`crate::RequestSpecification`].
#[derive(Debug, Clone)]
pub struct RequestData {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub log_traffic: bool,
}

impl RequestData {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// The result of one HTTP call. Header names are stored lowercased.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status_code: u16,
    headers: HashMap<String, String>,
    body: String,
    json: Option<Value>,
    elapsed: Duration,
}

impl ApiResponse {
    pub fn new(
        status_code: u16,
        headers: HashMap<String, String>,
        body: String,
        elapsed: Duration,
    ) -> Self {
        let json = serde_json::from_str(&body).ok();
        let headers = headers
            .into_iter()
            .map(|(key, value)| (key.to_lowercase(), value))
            .collect();

        Self {
            status_code,
            headers,
            body,
            json,
            elapsed,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parsed view of the body, `None` when the body is not JSON.
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn value_at(&self, path: &JsonPath) -> Option<&Value> {
        self.json.as_ref().and_then(|json| path.resolve(json))
    }

    pub fn json_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_str(&self.body)?)
    }
}
