mod booking;
mod health;
mod ping;
mod system;

pub use booking::BookingClient;
pub use health::HealthCheckClient;
pub use ping::PingClient;
pub use system::SystemClient;

pub const PING_PATH: &str = "/ping";
pub const HEALTH_PATH: &str = "/health";
pub const BOOKING_PATH: &str = "/booking";

/// `GET /ping` answers `201 Created` on restful-booker.
pub const PING_EXPECTED_STATUS: u16 = 201;
pub const HEALTH_EXPECTED_STATUS: u16 = 200;
pub const HEALTH_OK: &str = "OK";
