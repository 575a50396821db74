use serde_json::Value;
use std::{fmt::Display, io, path::PathBuf, sync};

/// Failure to read or interpret the properties source.
#[derive(Debug)]
pub enum ConfigError {
    Unreadable(PathBuf, io::Error),
    MalformedLine(usize, String),
    MissingKey(String),
    InvalidValue(String, String),
}

/// Failure to obtain a token from the `/auth` endpoint.
#[derive(Debug)]
pub enum AuthError {
    Unreachable(String),
    Rejected { status_code: u16, body: String },
    MissingToken { status_code: u16, body: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseValidationError {
    StatusMismatch {
        expected: u16,
        actual: u16,
        body: String,
    },
    EmptyBody {
        status_code: u16,
    },
    NotAnArray {
        body: String,
    },
    MissingHeader(String),
    EchoedPayload {
        fragment: String,
        body: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValidationError {
    InvalidPath(String),
    UnparsableBody {
        path: String,
        body: String,
    },
    Mismatch {
        path: String,
        expected: Value,
        actual: Option<Value>,
    },
}

#[derive(Debug)]
pub enum DataLoadError {
    Unreadable(PathBuf, io::Error),
    Malformed(PathBuf, serde_json::Error),
    MissingCategory(PathBuf, String),
    MalformedCase(PathBuf, String, usize),
}

/// A single recorded failure inside a [`crate::Validator`] scope.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    Response(ResponseValidationError),
    Field(FieldValidationError),
    Input(String),
}

#[derive(Debug)]
pub enum Error {
    Config(ConfigError),
    Auth(AuthError),
    ResponseValidation(ResponseValidationError),
    FieldValidation(FieldValidationError),
    SoftAssertions {
        scope: String,
        failures: Vec<ValidationFailure>,
    },
    DataLoad(DataLoadError),
    Transport(reqwest::Error),
    Serialization(serde_json::Error),
    InvalidHeaderName(String),
    InvalidHeaderValue(String),
    PoisonedLock,
}

impl std::error::Error for ConfigError {}
impl std::error::Error for AuthError {}
impl std::error::Error for ResponseValidationError {}
impl std::error::Error for FieldValidationError {}
impl std::error::Error for DataLoadError {}
impl std::error::Error for Error {}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Unreadable(path, e) => {
                write!(f, "Couldn't read configuration {}: {}", path.display(), e)
            }
            ConfigError::MalformedLine(line, content) => {
                write!(f, "Malformed configuration line {}: \"{}\"", line, content)
            }
            ConfigError::MissingKey(key) => write!(f, "Missing configuration key \"{}\"", key),
            ConfigError::InvalidValue(key, value) => {
                write!(f, "Invalid value \"{}\" for configuration key \"{}\"", value, key)
            }
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Unreachable(reason) => write!(f, "Auth endpoint unreachable: {}", reason),
            AuthError::Rejected { status_code, body } => write!(
                f,
                "Auth request rejected with status {}. Response: {}",
                status_code, body
            ),
            AuthError::MissingToken { status_code, body } => write!(
                f,
                "Auth response (status {}) has no token field. Response: {}",
                status_code, body
            ),
        }
    }
}

impl Display for ResponseValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseValidationError::StatusMismatch {
                expected,
                actual,
                body,
            } => write!(
                f,
                "Expected status code {} but got {}. Response: {}",
                expected, actual, body
            ),
            ResponseValidationError::EmptyBody { status_code } => {
                write!(f, "Empty response body received with status {}", status_code)
            }
            ResponseValidationError::NotAnArray { body } => {
                write!(f, "Expected a JSON array. Response: {}", body)
            }
            ResponseValidationError::MissingHeader(name) => {
                write!(f, "Missing {} header", name)
            }
            ResponseValidationError::EchoedPayload { fragment, body } => write!(
                f,
                "Response echoes \"{}\" unescaped. Response: {}",
                fragment.escape_default(),
                body
            ),
        }
    }
}

impl Display for FieldValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValidationError::InvalidPath(path) => write!(f, "Invalid JSON path \"{}\"", path),
            FieldValidationError::UnparsableBody { path, body } => write!(
                f,
                "Couldn't read {} because the body is not JSON. Response: {}",
                path, body
            ),
            FieldValidationError::Mismatch {
                path,
                expected,
                actual,
            } => {
                let actual = match actual {
                    Some(value) => value.to_string(),
                    None => "<absent>".into(),
                };

                write!(f, "Expected {} to be {} but got {}", path, expected, actual)
            }
        }
    }
}

impl Display for DataLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataLoadError::Unreadable(path, e) => {
                write!(f, "Couldn't read test data {}: {}", path.display(), e)
            }
            DataLoadError::Malformed(path, e) => {
                write!(f, "Malformed test data {}: {}", path.display(), e)
            }
            DataLoadError::MissingCategory(path, category) => write!(
                f,
                "Test data {} has no \"{}\" array",
                path.display(),
                category
            ),
            DataLoadError::MalformedCase(path, category, index) => write!(
                f,
                "Case {} of \"{}\" in {} needs description, data and expectedStatusCode",
                index,
                category,
                path.display()
            ),
        }
    }
}

impl Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationFailure::Response(e) => write!(f, "{}", e),
            ValidationFailure::Field(e) => write!(f, "{}", e),
            ValidationFailure::Input(message) => write!(f, "{}", message),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Config error: {}", e),
            Error::Auth(e) => write!(f, "Auth error: {}", e),
            Error::ResponseValidation(e) => write!(f, "Response validation failed: {}", e),
            Error::FieldValidation(e) => write!(f, "Field validation failed: {}", e),
            Error::SoftAssertions { scope, failures } => {
                write!(f, "{} check(s) failed in {}", failures.len(), scope)?;
                for failure in failures {
                    write!(f, "\n  - {}", failure)?;
                }
                Ok(())
            }
            Error::DataLoad(e) => write!(f, "Data load error: {}", e),
            Error::Transport(e) => write!(f, "reqwest error: {}", e),
            Error::Serialization(e) => write!(f, "Serialization error: {}", e),
            Error::InvalidHeaderName(name) => write!(f, "Invalid header name \"{}\"", name),
            Error::InvalidHeaderValue(name) => write!(f, "Invalid value for header \"{}\"", name),
            Error::PoisonedLock => write!(f, "The lock was poisoned"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<AuthError> for Error {
    fn from(e: AuthError) -> Self {
        Error::Auth(e)
    }
}

impl From<ResponseValidationError> for Error {
    fn from(e: ResponseValidationError) -> Self {
        Error::ResponseValidation(e)
    }
}

impl From<FieldValidationError> for Error {
    fn from(e: FieldValidationError) -> Self {
        Error::FieldValidation(e)
    }
}

impl From<DataLoadError> for Error {
    fn from(e: DataLoadError) -> Self {
        Error::DataLoad(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e)
    }
}

impl<T> From<sync::PoisonError<T>> for Error {
    fn from(_: sync::PoisonError<T>) -> Self {
        Error::PoisonedLock
    }
}

impl From<ResponseValidationError> for ValidationFailure {
    fn from(e: ResponseValidationError) -> Self {
        ValidationFailure::Response(e)
    }
}

impl From<FieldValidationError> for ValidationFailure {
    fn from(e: FieldValidationError) -> Self {
        ValidationFailure::Field(e)
    }
}
