use super::BOOKING_PATH;
use crate::{
    client::ApiClient,
    data::ApiResponse,
    error::{Error, FieldValidationError},
    model::{Booking, BookingRef, CreatedBooking},
    validation::{self, Validator},
};
use reqwest::Method;
use serde_json::Value;

/// Client for the `/booking` resource.
#[derive(Debug, Clone)]
pub struct BookingClient {
    api: ApiClient,
}

impl BookingClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// `POST /booking`. Expects 200, a numeric `bookingid` and the request
    /// echoed back under `booking`.
    pub fn create(&self, booking: &Booking) -> Result<ApiResponse, Error> {
        tracing::info!(
            first_name = booking.first_name.as_str(),
            last_name = booking.last_name.as_str(),
            "Creating new booking"
        );

        let response = self.api.send(
            self.api.request_spec(),
            Method::POST,
            BOOKING_PATH,
            Some(booking),
        )?;
        self.api.validate_response(&response, 200)?;

        let mut validator = self.api.validator("create booking");
        let booking_id = response.json().and_then(|json| json.get("bookingid"));
        if !booking_id.map_or(false, Value::is_u64) {
            validator.record(Err(FieldValidationError::Mismatch {
                path: "bookingid".into(),
                expected: Value::String("<numeric id>".into()),
                actual: booking_id.cloned(),
            }));
        }
        check_booking_fields(&mut validator, &response, "booking.", booking);
        validator.finish()?;

        tracing::info!(
            booking_id = Self::created_id(&response)?,
            "Booking created successfully"
        );
        Ok(response)
    }

    /// `POST /booking` with an arbitrary payload and no status expectation,
    /// for negative and edge-case tables.
    pub fn create_raw(&self, payload: &Value) -> Result<ApiResponse, Error> {
        tracing::info!("Submitting raw booking payload");
        self.api
            .send(self.api.request_spec(), Method::POST, BOOKING_PATH, Some(payload))
    }

    /// `GET /booking/{id}`, expecting 200.
    pub fn get(&self, booking_id: u64) -> Result<ApiResponse, Error> {
        tracing::info!(booking_id, "Retrieving booking");
        let response = self.fetch(booking_id)?;
        self.api.validate_response(&response, 200)?;

        Ok(response)
    }

    /// `GET /booking/{id}` without a status expectation.
    pub fn fetch(&self, booking_id: u64) -> Result<ApiResponse, Error> {
        self.api.send::<Value>(
            self.api.request_spec(),
            Method::GET,
            &Self::booking_path(booking_id),
            None,
        )
    }

    /// `PUT /booking/{id}` with the cached token. Expects 200 and the stored
    /// booking at the document root.
    pub fn update(&self, booking_id: u64, booking: &Booking) -> Result<ApiResponse, Error> {
        tracing::info!(
            booking_id,
            first_name = booking.first_name.as_str(),
            last_name = booking.last_name.as_str(),
            "Updating booking"
        );

        let spec = self.api.authenticated_request_spec()?;
        let response = self.api.send(
            &spec,
            Method::PUT,
            &Self::booking_path(booking_id),
            Some(booking),
        )?;
        self.api.validate_response(&response, 200)?;

        let mut validator = self.api.validator("update booking");
        check_booking_fields(&mut validator, &response, "", booking);
        validator.finish()?;

        tracing::info!(booking_id, "Booking updated successfully");
        Ok(response)
    }

    /// `DELETE /booking/{id}` with the cached token, expecting 201.
    pub fn delete(&self, booking_id: u64) -> Result<ApiResponse, Error> {
        tracing::info!(booking_id, "Deleting booking");

        let spec = self.api.authenticated_request_spec()?;
        let response = self.api.send::<Value>(
            &spec,
            Method::DELETE,
            &Self::booking_path(booking_id),
            None,
        )?;
        self.api.validate_response(&response, 201)?;

        tracing::info!(booking_id, "Booking deleted successfully");
        Ok(response)
    }

    /// `GET /booking`, expecting 200 and a JSON array.
    pub fn list_ids(&self) -> Result<ApiResponse, Error> {
        tracing::info!("Retrieving all booking IDs");

        let response = self.api.send::<Value>(
            self.api.request_spec(),
            Method::GET,
            BOOKING_PATH,
            None,
        )?;
        self.api.validate_response(&response, 200)?;
        let count = validation::validate_array(&response)?;

        tracing::info!(count, "Retrieved booking IDs");
        Ok(response)
    }

    pub fn created_id(response: &ApiResponse) -> Result<u64, Error> {
        Ok(response.json_as::<CreatedBooking>()?.booking_id)
    }

    pub fn ids(response: &ApiResponse) -> Result<Vec<u64>, Error> {
        Ok(response
            .json_as::<Vec<BookingRef>>()?
            .into_iter()
            .map(|entry| entry.booking_id)
            .collect())
    }

    fn booking_path(booking_id: u64) -> String {
        format!("{}/{}", BOOKING_PATH, booking_id)
    }
}

fn check_booking_fields(
    validator: &mut Validator,
    response: &ApiResponse,
    prefix: &str,
    booking: &Booking,
) {
    let path = |field: &str| format!("{}{}", prefix, field);

    validator
        .check_field(response, &path("firstname"), booking.first_name.as_str())
        .check_field(response, &path("lastname"), booking.last_name.as_str())
        .check_field(response, &path("totalprice"), booking.total_price)
        .check_field(response, &path("depositpaid"), booking.deposit_paid)
        .check_field(
            response,
            &path("bookingdates.checkin"),
            booking.booking_dates.check_in.as_str(),
        )
        .check_field(
            response,
            &path("bookingdates.checkout"),
            booking.booking_dates.check_out.as_str(),
        )
        .check_field(
            response,
            &path("additionalneeds"),
            booking.additional_needs.clone(),
        );
}
