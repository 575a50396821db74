use crate::{
    configuration::DEFAULT_RESPONSE_TIME_THRESHOLD,
    data::ApiResponse,
    error::{Error, FieldValidationError, ResponseValidationError, ValidationFailure},
    json_path::JsonPath,
    model::Booking,
};
use chrono::NaiveDate;
use serde_json::{Number, Value};
use std::time::Duration;

pub const SECURITY_HEADERS: [&str; 3] =
    ["X-Content-Type-Options", "X-Frame-Options", "X-XSS-Protection"];

/// Raw markup, or a leaked database error.
pub const INJECTION_FRAGMENTS: [&str; 2] = ["<script>", "SQL"];

pub fn validate_response(
    response: &ApiResponse,
    expected_status: u16,
) -> Result<(), ResponseValidationError> {
    if response.status_code() != expected_status {
        tracing::error!(
            expected = expected_status,
            actual = response.status_code(),
            body = response.body(),
            "Unexpected status code"
        );
        return Err(ResponseValidationError::StatusMismatch {
            expected: expected_status,
            actual: response.status_code(),
            body: response.body().into(),
        });
    }

    if (expected_status == 200 || expected_status == 201) && response.body().trim().is_empty() {
        tracing::error!(status_code = expected_status, "Empty response body received");
        return Err(ResponseValidationError::EmptyBody {
            status_code: expected_status,
        });
    }

    Ok(())
}

/// Advisory SLA check: logs and returns `false` when the call was slower than
/// `threshold`, never fails.
pub fn check_response_time(response: &ApiResponse, threshold: Duration) -> bool {
    if response.elapsed() > threshold {
        tracing::warn!(
            elapsed_ms = response.elapsed().as_millis() as u64,
            threshold_ms = threshold.as_millis() as u64,
            "Response time exceeded threshold"
        );
        return false;
    }

    true
}

pub fn validate_field(
    response: &ApiResponse,
    path: &str,
    expected: &Value,
) -> Result<(), FieldValidationError> {
    let path = JsonPath::parse(path)?;
    if response.json().is_none() {
        return Err(FieldValidationError::UnparsableBody {
            path: path.to_string(),
            body: response.body().into(),
        });
    }

    let actual = response.value_at(&path);
    if values_match(expected, actual) {
        return Ok(());
    }

    let error = FieldValidationError::Mismatch {
        path: path.to_string(),
        expected: expected.clone(),
        actual: actual.cloned(),
    };
    tracing::error!("{}", error);

    Err(error)
}

/// `null` only matches an absent or null value; numbers compare by value so
/// that `100` and `100.0` are equal.
fn values_match(expected: &Value, actual: Option<&Value>) -> bool {
    match (expected, actual) {
        (Value::Null, None) | (Value::Null, Some(Value::Null)) => true,
        (_, None) => false,
        (Value::Number(lhs), Some(Value::Number(rhs))) => numbers_match(lhs, rhs),
        (expected, Some(actual)) => expected == actual,
    }
}

fn numbers_match(lhs: &Number, rhs: &Number) -> bool {
    match (integer_value(lhs), integer_value(rhs)) {
        (Some(lhs), Some(rhs)) => lhs == rhs,
        (Some(integer), None) => float_equals_integer(rhs.as_f64(), integer),
        (None, Some(integer)) => float_equals_integer(lhs.as_f64(), integer),
        (None, None) => lhs.as_f64() == rhs.as_f64(),
    }
}

fn integer_value(number: &Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

// whole floats convert to i128 exactly; anything out of range saturates past every u64
fn float_equals_integer(float: Option<f64>, integer: i128) -> bool {
    match float {
        Some(float) if float.fract() == 0.0 => float as i128 == integer,
        _ => false,
    }
}

pub fn validate_array(response: &ApiResponse) -> Result<usize, ResponseValidationError> {
    match response.json() {
        Some(Value::Array(items)) => Ok(items.len()),
        _ => Err(ResponseValidationError::NotAnArray {
            body: response.body().into(),
        }),
    }
}

pub fn validate_security_headers(response: &ApiResponse) -> Vec<ResponseValidationError> {
    SECURITY_HEADERS
        .iter()
        .filter(|name| response.header(name).is_none())
        .map(|name| ResponseValidationError::MissingHeader(String::from(*name)))
        .collect()
}

pub fn validate_not_echoed<S: AsRef<str>>(
    response: &ApiResponse,
    fragments: &[S],
) -> Vec<ResponseValidationError> {
    fragments
        .iter()
        .map(|fragment| AsRef::<str>::as_ref(fragment))
        .filter(|fragment| response.body().contains(*fragment))
        .map(|fragment| ResponseValidationError::EchoedPayload {
            fragment: fragment.into(),
            body: response.body().into(),
        })
        .collect()
}

/// Required-field checks on a booking before it is sent.
pub fn validate_booking_input(booking: &Booking) -> Vec<ValidationFailure> {
    let mut problems = Vec::new();

    if booking.first_name.trim().is_empty() {
        problems.push("Firstname is required".to_string());
    }
    if booking.last_name.trim().is_empty() {
        problems.push("Lastname is required".to_string());
    }
    if booking.total_price < 0 {
        problems.push("Totalprice must be non-negative".to_string());
    }

    let check_in = NaiveDate::parse_from_str(&booking.booking_dates.check_in, "%Y-%m-%d");
    let check_out = NaiveDate::parse_from_str(&booking.booking_dates.check_out, "%Y-%m-%d");
    match (check_in, check_out) {
        (Ok(check_in), Ok(check_out)) if check_out < check_in => {
            problems.push("Checkout date is before checkin date".to_string())
        }
        (Ok(_), Ok(_)) => {}
        (Err(_), _) => problems.push(format!(
            "Checkin date \"{}\" is not an ISO date",
            booking.booking_dates.check_in
        )),
        (_, Err(_)) => problems.push(format!(
            "Checkout date \"{}\" is not an ISO date",
            booking.booking_dates.check_out
        )),
    }

    problems.into_iter().map(ValidationFailure::Input).collect()
}

/// Soft-assertion scope: records every failed check and reports them together
/// from [`Validator::finish`]. Slow responses are logged and counted, not failed.
#[derive(Debug)]
pub struct Validator {
    scope: String,
    failures: Vec<ValidationFailure>,
    response_time_threshold: Duration,
    slow_responses: usize,
}

impl Validator {
    pub fn new<S: Into<String>>(scope: S) -> Self {
        Self {
            scope: scope.into(),
            failures: Vec::new(),
            response_time_threshold: DEFAULT_RESPONSE_TIME_THRESHOLD,
            slow_responses: 0,
        }
    }

    pub fn with_threshold(mut self, response_time_threshold: Duration) -> Self {
        self.response_time_threshold = response_time_threshold;
        self
    }

    pub fn check_response(&mut self, response: &ApiResponse, expected_status: u16) -> &mut Self {
        if !check_response_time(response, self.response_time_threshold) {
            self.slow_responses += 1;
        }
        self.record(validate_response(response, expected_status))
    }

    pub fn check_field<V: Into<Value>>(
        &mut self,
        response: &ApiResponse,
        path: &str,
        expected: V,
    ) -> &mut Self {
        self.record(validate_field(response, path, &expected.into()))
    }

    pub fn check_security_headers(&mut self, response: &ApiResponse) -> &mut Self {
        self.extend(validate_security_headers(response))
    }

    pub fn check_not_echoed<S: AsRef<str>>(
        &mut self,
        response: &ApiResponse,
        fragments: &[S],
    ) -> &mut Self {
        self.extend(validate_not_echoed(response, fragments))
    }

    pub fn check_input(&mut self, booking: &Booking) -> &mut Self {
        self.extend(validate_booking_input(booking))
    }

    pub fn record<E: Into<ValidationFailure>>(&mut self, result: Result<(), E>) -> &mut Self {
        if let Err(e) = result {
            self.failures.push(e.into());
        }
        self
    }

    pub fn extend<E: Into<ValidationFailure>, I: IntoIterator<Item = E>>(
        &mut self,
        failures: I,
    ) -> &mut Self {
        self.failures.extend(failures.into_iter().map(Into::into));
        self
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }

    pub fn slow_responses(&self) -> usize {
        self.slow_responses
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn finish(self) -> Result<(), Error> {
        if self.failures.is_empty() {
            return Ok(());
        }

        tracing::error!(
            scope = self.scope.as_str(),
            failures = self.failures.len(),
            "Soft assertions failed"
        );

        Err(Error::SoftAssertions {
            scope: self.scope,
            failures: self.failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn response(status_code: u16, body: &str) -> ApiResponse {
        ApiResponse::new(status_code, HashMap::new(), body.into(), Duration::from_millis(5))
    }

    #[test]
    fn every_differing_status_pair_fails() {
        let statuses = [200, 201, 404];

        for actual in statuses.iter() {
            for expected in statuses.iter() {
                let result = validate_response(&response(*actual, "{\"ok\":true}"), *expected);
                if actual == expected {
                    assert_eq!(result, Ok(()));
                } else {
                    assert_eq!(
                        result,
                        Err(ResponseValidationError::StatusMismatch {
                            expected: *expected,
                            actual: *actual,
                            body: "{\"ok\":true}".into(),
                        })
                    );
                }
            }
        }
    }

    #[test]
    fn empty_body_fails_only_for_success_statuses() {
        assert_eq!(
            validate_response(&response(201, "  "), 201),
            Err(ResponseValidationError::EmptyBody { status_code: 201 })
        );
        assert_eq!(validate_response(&response(404, ""), 404), Ok(()));
    }

    #[test]
    fn slow_response_is_only_reported() {
        let slow = ApiResponse::new(200, HashMap::new(), "{}".into(), Duration::from_secs(6));

        assert!(!check_response_time(&slow, Duration::from_millis(5000)));
        assert_eq!(validate_response(&slow, 200), Ok(()));
    }

    #[test]
    fn null_expectation_matches_only_absent_or_null() {
        let document = response(200, r#"{"a": {"b": {"c": null, "d": 1}}}"#);

        assert_eq!(validate_field(&document, "a.b.c", &Value::Null), Ok(()));
        assert_eq!(validate_field(&document, "a.b.missing", &Value::Null), Ok(()));
        assert_eq!(
            validate_field(&document, "a.b.d", &Value::Null),
            Err(FieldValidationError::Mismatch {
                path: "a.b.d".into(),
                expected: Value::Null,
                actual: Some(json!(1)),
            })
        );
    }

    #[test]
    fn numbers_compare_by_value() {
        let document = response(200, r#"{"totalprice": 100.0}"#);

        assert_eq!(validate_field(&document, "totalprice", &json!(100)), Ok(()));
        assert!(validate_field(&document, "totalprice", &json!(101)).is_err());
    }

    #[test]
    fn large_integers_are_not_rounded_into_equality() {
        let near_max = response(200, r#"{"id": 18446744073709551614}"#);
        assert!(validate_field(&near_max, "id", &json!(18446744073709551615u64)).is_err());
        assert_eq!(validate_field(&near_max, "id", &json!(18446744073709551614u64)), Ok(()));

        let past_f64 = response(200, r#"{"id": 9007199254740993}"#);
        assert!(validate_field(&past_f64, "id", &json!(9007199254740992.0)).is_err());

        let negative = response(200, r#"{"delta": -1}"#);
        assert!(validate_field(&negative, "delta", &json!(u64::MAX)).is_err());
        assert_eq!(validate_field(&negative, "delta", &json!(-1.0)), Ok(()));
        assert!(validate_field(&negative, "delta", &json!(-1.5)).is_err());
    }

    #[test]
    fn non_json_body_is_reported() {
        let document = response(201, "Created");

        assert_eq!(
            validate_field(&document, "status", &json!("OK")),
            Err(FieldValidationError::UnparsableBody {
                path: "status".into(),
                body: "Created".into(),
            })
        );
    }

    #[test]
    fn validator_collects_all_failures() {
        let document = response(200, r#"{"firstname": "John", "lastname": "Doe"}"#);
        let mut validator = Validator::new("create booking");

        validator
            .check_response(&document, 201)
            .check_field(&document, "firstname", "John")
            .check_field(&document, "lastname", "Smith")
            .check_field(&document, "totalprice", 100);

        assert_eq!(validator.failures().len(), 3);
        match validator.finish() {
            Err(Error::SoftAssertions { scope, failures }) => {
                assert_eq!(scope, "create booking");
                assert_eq!(failures.len(), 3);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn clean_validator_finishes_ok() {
        let document = response(200, r#"{"status": "OK"}"#);
        let mut validator = Validator::new("health");

        validator
            .check_response(&document, 200)
            .check_field(&document, "status", "OK");

        assert!(validator.is_clean());
        assert!(validator.finish().is_ok());
    }

    #[test]
    fn validator_reports_slow_responses_without_failing() {
        let slow = ApiResponse::new(200, HashMap::new(), "{}".into(), Duration::from_millis(40));
        let mut strict = Validator::new("slow list").with_threshold(Duration::from_millis(10));
        let mut relaxed = Validator::new("slow list");

        strict.check_response(&slow, 200).check_response(&slow, 200);
        relaxed.check_response(&slow, 200);

        assert_eq!(strict.slow_responses(), 2);
        assert!(strict.is_clean());
        assert_eq!(relaxed.slow_responses(), 0);
    }

    #[test]
    fn booking_input_checks() {
        assert!(validate_booking_input(&Booking::sample("John", "Doe")).is_empty());

        let broken = Booking::sample("", "Doe")
            .with_total_price(-1)
            .with_dates("2024-01-05", "2024-01-01");
        let problems = validate_booking_input(&broken);

        assert_eq!(
            problems,
            vec![
                ValidationFailure::Input("Firstname is required".into()),
                ValidationFailure::Input("Totalprice must be non-negative".into()),
                ValidationFailure::Input("Checkout date is before checkin date".into()),
            ]
        );

        let bad_date = Booking::sample("John", "Doe").with_dates("01/01/2024", "2024-01-05");
        assert_eq!(validate_booking_input(&bad_date).len(), 1);
    }

    #[test]
    fn security_checks() {
        let mut headers = HashMap::new();
        headers.insert("X-Frame-Options".to_string(), "DENY".to_string());
        let echoed = ApiResponse::new(
            200,
            headers,
            r#"{"firstname": "<script>alert(1)</script>"}"#.into(),
            Duration::from_millis(1),
        );

        let missing = validate_security_headers(&echoed);
        assert_eq!(
            missing,
            vec![
                ResponseValidationError::MissingHeader("X-Content-Type-Options".into()),
                ResponseValidationError::MissingHeader("X-XSS-Protection".into()),
            ]
        );
        assert_eq!(validate_not_echoed(&echoed, &INJECTION_FRAGMENTS).len(), 1);
    }
}
