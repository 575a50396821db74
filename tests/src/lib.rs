#[cfg(test)]
mod tests {
    use booker::{
        booking_test,
        stub::{StubServer, DEFAULT_USERNAME},
        ApiClient, AuthError, Booking, BookingClient, CaseCategory, Configuration, Error,
        FieldValidationError, FixtureStore, HealthCheckClient, Method, PingClient,
        ResponseValidationError, SystemClient, TestContext, Validator, AUTH_PASSWORD_KEY,
        AUTH_USERNAME_KEY, BOOKING_ID_KEY, INJECTION_FRAGMENTS, RESPONSE_TIME_THRESHOLD_KEY,
    };
    use serde_json::{json, Value};
    use std::{thread, time::Duration};

    const NEGATIVE_DATA: &str = "negative-test-data.json";

    fn fixtures() -> FixtureStore {
        FixtureStore::new(concat!(env!("CARGO_MANIFEST_DIR"), "/test-data"))
    }

    fn wrong_password(config: &mut Configuration) {
        config.set(AUTH_PASSWORD_KEY, "not-the-password");
    }

    fn manager_credentials(config: &mut Configuration) {
        config.set(AUTH_USERNAME_KEY, "manager");
        config.set(AUTH_PASSWORD_KEY, "s3cret");
    }

    fn strict_response_time(config: &mut Configuration) {
        config.set(RESPONSE_TIME_THRESHOLD_KEY, "10");
    }

    #[booking_test]
    fn booking_lifecycle(client: ApiClient, stub: &StubServer) {
        let bookings = BookingClient::new(client);
        let original = fixtures().booking("create_booking.json").unwrap();
        let changed = fixtures()
            .booking_in_scenario("update", "update_booking.json")
            .unwrap();
        let mut context = TestContext::new();

        let created = bookings.create(&original).unwrap();
        context
            .store(BOOKING_ID_KEY, BookingClient::created_id(&created).unwrap())
            .unwrap();
        let booking_id: u64 = context.get_as(BOOKING_ID_KEY).unwrap().unwrap();

        let fetched = bookings.get(booking_id).unwrap();
        assert_eq!(fetched.json_as::<Booking>().unwrap(), original);

        let updated = bookings.update(booking_id, &changed).unwrap();
        assert_eq!(updated.json_as::<Booking>().unwrap().last_name, "Smith");
        let fetched = bookings.get(booking_id).unwrap();
        assert_eq!(fetched.json_as::<Booking>().unwrap(), changed);

        bookings.delete(booking_id).unwrap();
        assert_eq!(bookings.fetch(booking_id).unwrap().status_code(), 404);
        assert!(matches!(
            bookings.get(booking_id),
            Err(Error::ResponseValidation(ResponseValidationError::StatusMismatch {
                expected: 200,
                actual: 404,
                ..
            }))
        ));

        // update and delete share one token
        assert_eq!(stub.request_count("/auth"), 1);
    }

    #[booking_test]
    fn john_doe_becomes_smith(client: ApiClient) {
        let bookings = BookingClient::new(client);

        let created = bookings.create(&Booking::sample("John", "Doe")).unwrap();
        let booking_id = BookingClient::created_id(&created).unwrap();
        bookings
            .api()
            .validate_field(&created, "booking.lastname", "Doe")
            .unwrap();

        let response = bookings
            .update(booking_id, &Booking::sample("John", "Smith"))
            .unwrap();
        bookings
            .api()
            .validate_field(&response, "lastname", "Smith")
            .unwrap();
        bookings
            .api()
            .validate_field(&response, "bookingdates.checkin", "2024-01-01")
            .unwrap();

        assert!(matches!(
            bookings.api().validate_field(&response, "lastname", "Doe"),
            Err(Error::FieldValidation(FieldValidationError::Mismatch { .. }))
        ));
    }

    #[booking_test]
    fn get_is_idempotent(client: ApiClient) {
        let bookings = BookingClient::new(client);
        let created = bookings.create(&Booking::sample("Jane", "Roe")).unwrap();
        let booking_id = BookingClient::created_id(&created).unwrap();

        let first = bookings.get(booking_id).unwrap();
        let second = bookings.get(booking_id).unwrap();

        assert_eq!(first.json(), second.json());
    }

    #[booking_test]
    fn list_contains_created_bookings(client: ApiClient) {
        let bookings = BookingClient::new(client);
        let first = BookingClient::created_id(&bookings.create(&Booking::sample("A", "One")).unwrap())
            .unwrap();
        let second =
            BookingClient::created_id(&bookings.create(&Booking::sample("B", "Two")).unwrap())
                .unwrap();

        let ids = BookingClient::ids(&bookings.list_ids().unwrap()).unwrap();

        assert!(ids.contains(&first));
        assert!(ids.contains(&second));
    }

    #[booking_test]
    fn system_endpoints(client: ApiClient) {
        let system = SystemClient::new(client.clone());

        assert_eq!(system.ping().unwrap().status_code(), 201);
        assert_eq!(system.health().unwrap().status_code(), 200);
        assert_eq!(PingClient::new(client.clone()).ping().unwrap().body(), "Created");
        HealthCheckClient::new(client).check_health().unwrap();
    }

    #[booking_test]
    fn unhealthy_service_is_reported(client: ApiClient, stub: &StubServer) {
        stub.override_response(Method::GET, "/health", 200, r#"{"status": "DOWN"}"#);
        stub.override_response(Method::GET, "/ping", 503, "Service Unavailable");

        assert!(matches!(
            HealthCheckClient::new(client.clone()).check_health(),
            Err(Error::FieldValidation(FieldValidationError::Mismatch { .. }))
        ));
        match PingClient::new(client).ping() {
            Err(Error::ResponseValidation(ResponseValidationError::StatusMismatch {
                expected,
                actual,
                body,
            })) => {
                assert_eq!((expected, actual), (201, 503));
                assert_eq!(body, "Service Unavailable");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[booking_test(wrong_password)]
    fn bad_credentials_fail_authenticated_calls(client: ApiClient, stub: &StubServer) {
        let bookings = BookingClient::new(client);
        let created = bookings.create(&Booking::sample("John", "Doe")).unwrap();
        let booking_id = BookingClient::created_id(&created).unwrap();

        assert!(matches!(
            bookings.delete(booking_id),
            Err(Error::Auth(AuthError::MissingToken { status_code: 200, .. }))
        ));
        assert_eq!(stub.booking_count(), 1);
    }

    #[booking_test(manager_credentials)]
    fn rotated_credentials_are_honoured(client: ApiClient, stub: &StubServer) {
        assert!(matches!(
            client.auth_token(),
            Err(Error::Auth(AuthError::MissingToken { .. }))
        ));

        stub.set_credentials("manager", "s3cret");

        assert!(client.auth_token().is_ok());
        assert_eq!(stub.request_count("/auth"), 2);
    }

    #[booking_test]
    fn changed_credentials_invalidate_issued_tokens(client: ApiClient, stub: &StubServer) {
        let bookings = BookingClient::new(client.clone());
        let created = bookings.create(&Booking::sample("John", "Doe")).unwrap();
        let booking_id = BookingClient::created_id(&created).unwrap();
        client.auth_token().unwrap();

        stub.set_credentials(DEFAULT_USERNAME, "rotated");

        assert!(matches!(
            bookings.delete(booking_id),
            Err(Error::ResponseValidation(ResponseValidationError::StatusMismatch {
                expected: 201,
                actual: 403,
                ..
            }))
        ));
        assert_eq!(stub.booking_count(), 1);
    }

    #[booking_test]
    fn listing_must_be_an_array(client: ApiClient, stub: &StubServer) {
        stub.override_response(Method::GET, "/booking", 200, "{}");

        assert!(matches!(
            BookingClient::new(client).list_ids(),
            Err(Error::ResponseValidation(ResponseValidationError::NotAnArray { body })) if body == "{}"
        ));
    }

    #[booking_test]
    fn anonymous_update_is_forbidden(client: ApiClient) {
        let bookings = BookingClient::new(client.clone());
        let created = bookings.create(&Booking::sample("John", "Doe")).unwrap();
        let booking_id = BookingClient::created_id(&created).unwrap();

        let response = client
            .send(
                client.request_spec(),
                Method::PUT,
                &format!("/booking/{}", booking_id),
                Some(&Booking::sample("John", "Smith")),
            )
            .unwrap();

        assert_eq!(response.status_code(), 403);
    }

    #[booking_test]
    fn concurrent_callers_share_one_token(client: ApiClient, stub: &StubServer) {
        thread::scope(|scope| {
            for _ in 0..4 {
                let client = client.clone();
                scope.spawn(move || client.auth_token().unwrap());
            }
        });

        assert_eq!(stub.request_count("/auth"), 1);
        assert_eq!(client.token_cache().fetch_count(), 1);
    }

    #[booking_test(strict_response_time)]
    fn slow_responses_are_advisory(client: ApiClient, stub: &StubServer) {
        stub.set_latency(Duration::from_millis(50));

        let response = PingClient::new(client.clone()).ping().unwrap();

        assert!(!booker::check_response_time(
            &response,
            client.response_time_threshold()
        ));
    }

    #[booking_test]
    fn invalid_bookings_are_rejected(client: ApiClient) {
        run_cases(&BookingClient::new(client), CaseCategory::InvalidBooking);
    }

    #[booking_test]
    fn edge_cases_are_accepted(client: ApiClient) {
        run_cases(&BookingClient::new(client), CaseCategory::EdgeCase);
    }

    #[booking_test]
    fn injection_payloads_are_not_echoed(client: ApiClient) {
        let bookings = BookingClient::new(client);
        let responses = run_cases(&bookings, CaseCategory::Security);

        for (description, response) in responses {
            let mut validator = Validator::new(description);
            validator
                .check_security_headers(&response)
                .check_not_echoed(&response, &INJECTION_FRAGMENTS);
            validator.finish().unwrap();
        }
    }

    #[booking_test]
    fn security_payload_passes_local_checks(client: ApiClient) {
        let payload = Booking::security_probe("<script>alert(1)</script>", "Doe");
        let mut validator = Validator::new("security payload");
        validator.check_input(&payload);
        assert!(validator.is_clean());

        let response = BookingClient::new(client)
            .create_raw(&serde_json::to_value(&payload).unwrap())
            .unwrap();
        let stored: Value = response.json().cloned().unwrap();
        assert_eq!(stored["booking"]["additionalneeds"], json!("Security Test"));
        assert_eq!(
            stored["booking"]["firstname"],
            json!("&lt;script&gt;alert(1)&lt;/script&gt;")
        );
    }

    fn run_cases(
        bookings: &BookingClient,
        category: CaseCategory,
    ) -> Vec<(String, booker::ApiResponse)> {
        let cases = fixtures().cases(NEGATIVE_DATA, category).unwrap();
        assert!(!cases.is_empty());

        cases
            .into_iter()
            .map(|case| {
                let response = bookings.create_raw(&case.data).unwrap();
                assert_eq!(
                    response.status_code(),
                    case.expected_status_code,
                    "{}",
                    case.description
                );
                (case.description, response)
            })
            .collect()
    }
}
