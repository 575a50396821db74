use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BookingDates {
    #[serde(rename = "checkin", alias = "checkIn")]
    pub check_in: String,
    #[serde(rename = "checkout", alias = "checkOut")]
    pub check_out: String,
}

/// A booking as sent to and echoed by the service. Fixture files may use the
/// camelCase field names as well.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    #[serde(rename = "firstname", alias = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastname", alias = "lastName")]
    pub last_name: String,
    #[serde(rename = "totalprice", alias = "totalPrice")]
    pub total_price: i64,
    #[serde(rename = "depositpaid", alias = "depositPaid")]
    pub deposit_paid: bool,
    #[serde(rename = "bookingdates", alias = "bookingDates")]
    pub booking_dates: BookingDates,
    #[serde(
        rename = "additionalneeds",
        alias = "additionalNeeds",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_needs: Option<String>,
}

impl Booking {
    /// A valid booking for 2024-01-01..2024-01-05 at 100 with breakfast.
    pub fn sample<S1: Into<String>, S2: Into<String>>(first_name: S1, last_name: S2) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            total_price: 100,
            deposit_paid: true,
            booking_dates: BookingDates {
                check_in: "2024-01-01".into(),
                check_out: "2024-01-05".into(),
            },
            additional_needs: Some("Breakfast".into()),
        }
    }

    pub fn security_probe<S1: Into<String>, S2: Into<String>>(
        first_name: S1,
        last_name: S2,
    ) -> Self {
        Self {
            additional_needs: Some("Security Test".into()),
            ..Self::sample(first_name, last_name)
        }
    }

    pub fn with_last_name<S: Into<String>>(mut self, last_name: S) -> Self {
        self.last_name = last_name.into();
        self
    }

    pub fn with_total_price(mut self, total_price: i64) -> Self {
        self.total_price = total_price;
        self
    }

    pub fn with_dates<S1: Into<String>, S2: Into<String>>(mut self, check_in: S1, check_out: S2) -> Self {
        self.booking_dates = BookingDates {
            check_in: check_in.into(),
            check_out: check_out.into(),
        };
        self
    }
}

/// Body of a successful `POST /booking`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CreatedBooking {
    #[serde(rename = "bookingid")]
    pub booking_id: u64,
    pub booking: Booking,
}

/// One element of the `GET /booking` array.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingRef {
    #[serde(rename = "bookingid")]
    pub booking_id: u64,
}
