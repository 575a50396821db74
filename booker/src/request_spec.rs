use crate::{auth::AuthToken, data::RequestData};
use reqwest::Method;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Immutable request template shared by every client. Extending it always
/// produces a new value; the shared template itself never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpecification {
    base_url: String,
    content_type: String,
    headers: Vec<(String, String)>,
    log_traffic: bool,
}

impl RequestSpecification {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        let base_url: String = base_url.into();

        Self {
            base_url: base_url.trim_end_matches('/').into(),
            content_type: JSON_CONTENT_TYPE.into(),
            headers: vec![("Accept".into(), JSON_CONTENT_TYPE.into())],
            log_traffic: true,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn logs_traffic(&self) -> bool {
        self.log_traffic
    }

    pub fn with_header<S1: Into<String>, S2: Into<String>>(&self, name: S1, value: S2) -> Self {
        let name = name.into();
        let mut spec = self.clone();

        spec.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(&name));
        spec.headers.push((name, value.into()));
        spec
    }

    pub fn with_content_type<S: Into<String>>(&self, content_type: S) -> Self {
        let mut spec = self.clone();
        spec.content_type = content_type.into();
        spec
    }

    pub fn with_traffic_logging(&self, enabled: bool) -> Self {
        let mut spec = self.clone();
        spec.log_traffic = enabled;
        spec
    }

    /// The restful-booker service authorises writes through a `token` cookie.
    pub fn authenticated(&self, token: &AuthToken) -> Self {
        self.with_header("Cookie", format!("token={}", token.as_str()))
    }

    pub fn url_for(&self, path: &str) -> String {
        if path.is_empty() {
            return self.base_url.clone();
        }

        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn request(&self, method: Method, path: &str, body: Option<String>) -> RequestData {
        let mut headers = self.headers.clone();
        if body.is_some() {
            headers.push(("Content-Type".into(), self.content_type.clone()));
        }

        RequestData {
            method,
            url: self.url_for(path),
            headers,
            body,
            log_traffic: self.log_traffic,
        }
    }
}
