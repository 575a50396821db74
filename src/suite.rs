use booker::{
    ApiClient, ApiResponse, Booking, BookingClient, CaseCategory, Error, FixtureStore, SystemClient,
    TestCase, INJECTION_FRAGMENTS,
};
use serde::Serialize;
use std::{path::Path, thread};

pub const SYSTEM_GROUP: &str = "system";
pub const LIFECYCLE_GROUP: &str = "lifecycle";

/// Result of one suite step, as written to the report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseOutcome {
    pub group: String,
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    /// Slower than the response-time threshold; advisory only.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub slow: bool,
    #[serde(skip)]
    pub request_body: Option<String>,
    #[serde(skip)]
    pub response_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl CaseOutcome {
    pub fn new<S1: Into<String>, S2: Into<String>>(group: S1, name: S2) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            passed: true,
            expected_status_code: None,
            status_code: None,
            elapsed_ms: None,
            slow: false,
            request_body: None,
            response_body: None,
            failure: None,
        }
    }

    pub fn with_request<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.request_body = serde_json::to_string_pretty(body).ok();
        self
    }

    pub fn expecting(mut self, status_code: u16) -> Self {
        self.expected_status_code = Some(status_code);
        self
    }

    pub fn with_response(mut self, response: &ApiResponse) -> Self {
        self.status_code = Some(response.status_code());
        self.elapsed_ms = Some(response.elapsed().as_millis() as u64);
        self.response_body = Some(response.body().into());
        self
    }

    pub fn failed<E: ToString>(mut self, failure: E) -> Self {
        self.passed = false;
        self.failure = Some(failure.to_string());
        self
    }

    pub fn record(self, result: &Result<ApiResponse, Error>) -> Self {
        let outcome = match result {
            Ok(response) => self.with_response(response),
            Err(e) => self.failed(e),
        };

        if outcome.passed {
            tracing::info!(group = outcome.group.as_str(), name = outcome.name.as_str(), "Passed");
        } else {
            tracing::error!(
                group = outcome.group.as_str(),
                name = outcome.name.as_str(),
                failure = outcome.failure.as_deref().unwrap_or_default(),
                "Failed"
            );
        }
        outcome
    }
}

/// Ping, health, then one booking through its whole lifecycle. Stops the chain
/// at the first step the next one depends on.
pub fn smoke(client: &ApiClient) -> Vec<CaseOutcome> {
    let system = SystemClient::new(client.clone());
    let bookings = BookingClient::new(client.clone());
    let mut outcomes = vec![
        CaseOutcome::new(SYSTEM_GROUP, "Ping").expecting(201).record(&system.ping()),
        CaseOutcome::new(SYSTEM_GROUP, "Health check")
            .expecting(200)
            .record(&system.health()),
    ];

    let original = Booking::sample("John", "Doe");
    let changed = original.clone().with_last_name("Smith");

    let created = bookings.create(&original);
    let booking_id = created
        .as_ref()
        .ok()
        .and_then(|response| BookingClient::created_id(response).ok());
    outcomes.push(
        CaseOutcome::new(LIFECYCLE_GROUP, "Create booking")
            .with_request(&original)
            .expecting(200)
            .record(&created),
    );

    let booking_id = match booking_id {
        Some(booking_id) => booking_id,
        None => return outcomes,
    };

    let listed = bookings.list_ids().and_then(|response| {
        if BookingClient::ids(&response)?.contains(&booking_id) {
            Ok(response)
        } else {
            Err(Error::SoftAssertions {
                scope: "list booking ids".into(),
                failures: vec![booker::ValidationFailure::Input(format!(
                    "Booking {} is missing from the listing",
                    booking_id
                ))],
            })
        }
    });
    outcomes.push(
        CaseOutcome::new(LIFECYCLE_GROUP, "List booking IDs")
            .expecting(200)
            .record(&listed),
    );
    outcomes.push(
        CaseOutcome::new(LIFECYCLE_GROUP, format!("Get booking {}", booking_id))
            .expecting(200)
            .record(&bookings.get(booking_id)),
    );
    outcomes.push(
        CaseOutcome::new(LIFECYCLE_GROUP, format!("Update booking {}", booking_id))
            .with_request(&changed)
            .expecting(200)
            .record(&bookings.update(booking_id, &changed)),
    );

    let deleted = bookings.delete(booking_id);
    let delete_passed = deleted.is_ok();
    outcomes.push(
        CaseOutcome::new(LIFECYCLE_GROUP, format!("Delete booking {}", booking_id))
            .expecting(201)
            .record(&deleted),
    );

    if delete_passed {
        let gone = bookings.fetch(booking_id).and_then(|response| {
            client.validate_response(&response, 404)?;
            Ok(response)
        });
        outcomes.push(
            CaseOutcome::new(LIFECYCLE_GROUP, format!("Get deleted booking {}", booking_id))
                .expecting(404)
                .record(&gone),
        );
    }

    outcomes
}

/// Runs every case of `suite` over `threads` workers, keeping file order.
pub fn run_cases(
    client: &ApiClient,
    suite: &Path,
    threads: usize,
) -> Result<Vec<CaseOutcome>, Error> {
    let root = suite.parent().unwrap_or_else(|| Path::new("."));
    let name = suite.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
    let cases = FixtureStore::new(root).all_cases(&name)?;

    tracing::info!(cases = cases.len(), threads, suite = %suite.display(), "Running suite cases");
    if cases.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_size = (cases.len() + threads.max(1) - 1) / threads.max(1);
    let bookings = BookingClient::new(client.clone());

    let outcomes = thread::scope(|scope| {
        let workers = cases
            .chunks(chunk_size)
            .map(|chunk| {
                let bookings = &bookings;
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|(category, case)| run_case(bookings, *category, case))
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();

        workers
            .into_iter()
            .flat_map(|worker| match worker.join() {
                Ok(outcomes) => outcomes,
                Err(_) => vec![CaseOutcome::new("runner", "worker").failed("Worker thread panicked")],
            })
            .collect::<Vec<_>>()
    });

    Ok(outcomes)
}

fn run_case(bookings: &BookingClient, category: CaseCategory, case: &TestCase) -> CaseOutcome {
    let outcome = CaseOutcome::new(category.key(), case.description.as_str())
        .with_request(&case.data)
        .expecting(case.expected_status_code);

    let response = match bookings.create_raw(&case.data) {
        Ok(response) => response,
        Err(e) => return outcome.record(&Err(e)),
    };

    let mut validator = bookings.api().validator(case.description.as_str());
    validator.check_response(&response, case.expected_status_code);
    if category == CaseCategory::Security {
        validator
            .check_security_headers(&response)
            .check_not_echoed(&response, &INJECTION_FRAGMENTS);
    }

    let mut outcome = outcome.with_response(&response);
    outcome.slow = validator.slow_responses() > 0;
    match validator.finish() {
        Ok(()) => outcome.record(&Ok(response)),
        Err(e) => outcome.record(&Err(e)),
    }
}
