mod auth;
mod client;
mod configuration;
mod data;
mod error;
mod fixtures;
mod http_client;
mod json_path;
mod logging;
mod model;
mod request_spec;
pub mod resources;
mod test_context;
mod validation;

pub use auth::{AuthToken, TokenCache};
pub use client::{ApiClient, ApiClientBuilder};
pub use configuration::{
    Configuration, AUTH_PASSWORD_KEY, AUTH_USERNAME_KEY, BASE_URL_KEY,
    DEFAULT_RESPONSE_TIME_THRESHOLD, HTTP_TIMEOUT_KEY, LEGACY_BASE_URL_KEY,
    RESPONSE_TIME_THRESHOLD_KEY,
};
pub use data::{ApiResponse, RequestData};
pub use error::{
    AuthError, ConfigError, DataLoadError, Error, FieldValidationError, ResponseValidationError,
    ValidationFailure,
};
pub use fixtures::{CaseCategory, FixtureStore, TestCase, DEFAULT_FIXTURE_DIR};
pub use http_client::{HttpClient, ReqwestHttpClient};
pub use json_path::{JsonPath, PathSegment};
pub use logging::{init_logging, init_test_logging, DEFAULT_LOG_FILTER};
pub use model::{Booking, BookingDates, BookingRef, CreatedBooking};
pub use request_spec::{RequestSpecification, JSON_CONTENT_TYPE};
pub use resources::{BookingClient, HealthCheckClient, PingClient, SystemClient};
pub use test_context::{TestContext, AUTH_TOKEN_KEY, BOOKING_ID_KEY};
pub use validation::{
    check_response_time, validate_array, validate_booking_input, validate_field,
    validate_not_echoed, validate_response, validate_security_headers, Validator,
    INJECTION_FRAGMENTS, SECURITY_HEADERS,
};

pub use booker_codegen::booking_test;
pub use booker_stub as stub;
pub use reqwest::Method;
