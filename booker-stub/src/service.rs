use crate::util;
use hyper::Method;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    time::Duration,
};

pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "password123";

pub const SECURITY_HEADERS: [(&str, &str); 3] = [
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "SAMEORIGIN"),
    ("X-XSS-Protection", "1; mode=block"),
];

const JSON: &str = "application/json; charset=utf-8";
const TEXT: &str = "text/plain; charset=utf-8";

lazy_static! {
    static ref BOOKING_ID_REGEX: Regex = Regex::new(r"^/booking/(?P<id>[^/]+)/?$").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StubResponse {
    pub status_code: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl StubResponse {
    /// JSON when the body parses as JSON, plain text otherwise.
    pub(crate) fn canned(status_code: u16, body: String) -> Self {
        let content_type = match serde_json::from_str::<Value>(&body) {
            Ok(_) => JSON,
            Err(_) => TEXT,
        };

        Self {
            status_code,
            content_type,
            body,
        }
    }

    fn json(status_code: u16, body: &Value) -> Self {
        Self {
            status_code,
            content_type: JSON,
            body: body.to_string(),
        }
    }

    fn text(status_code: u16, body: &str) -> Self {
        Self {
            status_code,
            content_type: TEXT,
            body: body.into(),
        }
    }

    fn not_found() -> Self {
        Self::text(404, "Not Found")
    }

    fn forbidden() -> Self {
        Self::text(403, "Forbidden")
    }

    fn bad_request() -> Self {
        Self::text(400, "Bad Request")
    }
}

#[derive(Deserialize)]
struct Credentials {
    username: Option<String>,
    password: Option<String>,
}

/// In-memory booking service state.
#[derive(Debug)]
pub(crate) struct StubState {
    bookings: BTreeMap<u64, Value>,
    next_id: u64,
    credentials: (String, String),
    tokens: HashSet<String>,
    issued_tokens: u64,
    request_counts: HashMap<String, usize>,
    overrides: HashMap<(Method, String), StubResponse>,
    latency: Duration,
}

impl StubState {
    pub(crate) fn new() -> Self {
        Self {
            bookings: BTreeMap::new(),
            next_id: 1,
            credentials: (DEFAULT_USERNAME.into(), DEFAULT_PASSWORD.into()),
            tokens: HashSet::new(),
            issued_tokens: 0,
            request_counts: HashMap::new(),
            overrides: HashMap::new(),
            latency: Duration::from_millis(0),
        }
    }

    pub(crate) fn request_count(&self, path: &str) -> usize {
        self.request_counts.get(path).copied().unwrap_or(0)
    }

    pub(crate) fn booking_count(&self) -> usize {
        self.bookings.len()
    }

    pub(crate) fn latency(&self) -> Duration {
        self.latency
    }

    pub(crate) fn set_latency(&mut self, latency: Duration) {
        self.latency = latency;
    }

    pub(crate) fn set_credentials(&mut self, username: String, password: String) {
        self.credentials = (username, password);
        self.tokens.clear();
    }

    pub(crate) fn override_response(&mut self, method: Method, path: String, response: StubResponse) {
        self.overrides.insert((method, path), response);
    }

    pub(crate) fn clear_overrides(&mut self) {
        self.overrides.clear();
    }

    /// Counts the request and answers it, overrides first.
    pub(crate) fn handle(
        &mut self,
        method: &Method,
        path: &str,
        headers: &HashMap<String, String>,
        body: &str,
    ) -> StubResponse {
        *self.request_counts.entry(path.into()).or_insert(0) += 1;

        if let Some(response) = self.overrides.get(&(method.clone(), path.to_string())) {
            return response.clone();
        }

        match (method, path) {
            (&Method::POST, "/auth") => self.authenticate(body),
            (&Method::GET, "/ping") => StubResponse::text(201, "Created"),
            (&Method::GET, "/health") => StubResponse::json(200, &json!({"status": "OK"})),
            (&Method::GET, "/booking") | (&Method::GET, "/booking/") => self.list_ids(),
            (&Method::POST, "/booking") | (&Method::POST, "/booking/") => self.create(body),
            _ => match Self::booking_id(path) {
                Some(id) => match *method {
                    Method::GET => self.get(id),
                    Method::PUT => self.update(id, headers, body),
                    Method::DELETE => self.delete(id, headers),
                    _ => StubResponse::not_found(),
                },
                None => StubResponse::not_found(),
            },
        }
    }

    fn authenticate(&mut self, body: &str) -> StubResponse {
        let credentials = serde_json::from_str::<Credentials>(body).ok();
        let accepted = credentials.map_or(false, |c| {
            c.username.as_deref() == Some(self.credentials.0.as_str())
                && c.password.as_deref() == Some(self.credentials.1.as_str())
        });

        if !accepted {
            tracing::debug!("Stub rejected credentials");
            return StubResponse::json(200, &json!({"reason": "Bad credentials"}));
        }

        self.issued_tokens += 1;
        let token = format!("{:015x}", self.issued_tokens * 0x9e37_79b9);
        self.tokens.insert(token.clone());

        StubResponse::json(200, &json!({ "token": token }))
    }

    fn list_ids(&self) -> StubResponse {
        let ids = self
            .bookings
            .keys()
            .map(|id| json!({ "bookingid": id }))
            .collect::<Vec<_>>();

        StubResponse::json(200, &Value::Array(ids))
    }

    fn create(&mut self, body: &str) -> StubResponse {
        let booking = match Self::parse_booking(body) {
            Some(booking) => booking,
            None => return StubResponse::bad_request(),
        };

        let id = self.next_id;
        self.next_id += 1;
        self.bookings.insert(id, booking.clone());
        tracing::debug!(booking_id = id, "Stub stored booking");

        StubResponse::json(200, &json!({ "bookingid": id, "booking": booking }))
    }

    fn get(&self, id: u64) -> StubResponse {
        match self.bookings.get(&id) {
            Some(booking) => StubResponse::json(200, booking),
            None => StubResponse::not_found(),
        }
    }

    fn update(&mut self, id: u64, headers: &HashMap<String, String>, body: &str) -> StubResponse {
        if !self.is_authorised(headers) {
            return StubResponse::forbidden();
        }
        if !self.bookings.contains_key(&id) {
            return StubResponse::not_found();
        }

        match Self::parse_booking(body) {
            Some(booking) => {
                self.bookings.insert(id, booking.clone());
                StubResponse::json(200, &booking)
            }
            None => StubResponse::bad_request(),
        }
    }

    fn delete(&mut self, id: u64, headers: &HashMap<String, String>) -> StubResponse {
        if !self.is_authorised(headers) {
            return StubResponse::forbidden();
        }

        match self.bookings.remove(&id) {
            Some(_) => StubResponse::text(201, "Created"),
            None => StubResponse::not_found(),
        }
    }

    fn is_authorised(&self, headers: &HashMap<String, String>) -> bool {
        util::token_cookie(headers).map_or(false, |token| self.tokens.contains(token))
    }

    fn booking_id(path: &str) -> Option<u64> {
        BOOKING_ID_REGEX
            .captures(path)
            .and_then(|captures| captures["id"].parse().ok())
    }

    /// Accepts the wire shape only; names are stored HTML-escaped.
    fn parse_booking(body: &str) -> Option<Value> {
        let payload: Value = serde_json::from_str(body).ok()?;
        let name = |key: &str| {
            payload
                .get(key)
                .and_then(Value::as_str)
                .filter(|name| !name.trim().is_empty())
                .map(util::escape_html)
        };

        let first_name = name("firstname")?;
        let last_name = name("lastname")?;
        let total_price = payload
            .get("totalprice")
            .and_then(Value::as_i64)
            .filter(|price| *price >= 0)?;
        let deposit_paid = payload.get("depositpaid").and_then(Value::as_bool)?;
        let dates = payload.get("bookingdates")?;
        let check_in = dates.get("checkin").and_then(Value::as_str)?;
        let check_out = dates.get("checkout").and_then(Value::as_str)?;

        let mut booking = json!({
            "firstname": first_name,
            "lastname": last_name,
            "totalprice": total_price,
            "depositpaid": deposit_paid,
            "bookingdates": {"checkin": check_in, "checkout": check_out},
        });
        if let Some(needs) = payload.get("additionalneeds").and_then(Value::as_str) {
            booking["additionalneeds"] = Value::from(needs);
        }

        Some(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking_body(first_name: &str) -> String {
        json!({
            "firstname": first_name,
            "lastname": "Doe",
            "totalprice": 100,
            "depositpaid": true,
            "bookingdates": {"checkin": "2024-01-01", "checkout": "2024-01-05"},
            "additionalneeds": "Breakfast"
        })
        .to_string()
    }

    fn token(state: &mut StubState) -> HashMap<String, String> {
        let response = state.handle(
            &Method::POST,
            "/auth",
            &HashMap::new(),
            r#"{"username": "admin", "password": "password123"}"#,
        );
        let token = serde_json::from_str::<Value>(&response.body).unwrap()["token"]
            .as_str()
            .unwrap()
            .to_string();

        let mut headers = HashMap::new();
        headers.insert("cookie".to_string(), format!("token={}", token));
        headers
    }

    #[test]
    fn booking_lifecycle() {
        let mut state = StubState::new();
        let none = HashMap::new();

        let created = state.handle(&Method::POST, "/booking", &none, &booking_body("John"));
        assert_eq!(created.status_code, 200);
        let created: Value = serde_json::from_str(&created.body).unwrap();
        assert_eq!(created["bookingid"], 1);
        assert_eq!(created["booking"]["firstname"], "John");

        assert_eq!(state.handle(&Method::GET, "/booking/1", &none, "").status_code, 200);
        assert_eq!(state.handle(&Method::DELETE, "/booking/1", &none, "").status_code, 403);

        let auth = token(&mut state);
        let deleted = state.handle(&Method::DELETE, "/booking/1", &auth, "");
        assert_eq!(deleted, StubResponse::text(201, "Created"));
        assert_eq!(state.handle(&Method::GET, "/booking/1", &none, "").status_code, 404);
        assert_eq!(state.handle(&Method::DELETE, "/booking/1", &auth, "").status_code, 404);
        assert_eq!(state.request_count("/booking/1"), 5);
    }

    #[test]
    fn rejects_invalid_payloads_and_escapes_names() {
        let mut state = StubState::new();
        let none = HashMap::new();

        assert_eq!(
            state.handle(&Method::POST, "/booking", &none, r#"{"lastname": "Doe"}"#).status_code,
            400
        );
        assert_eq!(
            state.handle(&Method::POST, "/booking", &none, "not json").status_code,
            400
        );

        let created = state.handle(
            &Method::POST,
            "/booking",
            &none,
            &booking_body("<script>alert(1)</script>"),
        );
        assert_eq!(created.status_code, 200);
        assert!(!created.body.contains("<script>"));
        assert_eq!(state.booking_count(), 1);
    }

    #[test]
    fn bad_credentials_get_a_reason() {
        let mut state = StubState::new();
        let response = state.handle(
            &Method::POST,
            "/auth",
            &HashMap::new(),
            r#"{"username": "admin", "password": "wrong"}"#,
        );

        assert_eq!(response.status_code, 200);
        assert!(response.body.contains("Bad credentials"));
    }

    #[test]
    fn overrides_take_precedence() {
        let mut state = StubState::new();
        state.override_response(
            Method::GET,
            "/ping".into(),
            StubResponse::text(503, "Service Unavailable"),
        );

        assert_eq!(
            state.handle(&Method::GET, "/ping", &HashMap::new(), "").status_code,
            503
        );
        state.clear_overrides();
        assert_eq!(
            state.handle(&Method::GET, "/ping", &HashMap::new(), "").status_code,
            201
        );
    }
}
