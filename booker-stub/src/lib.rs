mod error;
mod service;
mod stub_server;
mod util;

pub use error::Error;
pub use hyper::Method;
pub use service::{DEFAULT_PASSWORD, DEFAULT_USERNAME, SECURITY_HEADERS};
pub use stub_server::StubServer;
pub use util::header_strings;
