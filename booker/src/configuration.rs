use crate::error::ConfigError;
use lazy_static::lazy_static;
use regex::Regex;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const BASE_URL_KEY: &str = "base.url";
pub const LEGACY_BASE_URL_KEY: &str = "api.base.url";
pub const AUTH_USERNAME_KEY: &str = "auth.username";
pub const AUTH_PASSWORD_KEY: &str = "auth.password";
pub const RESPONSE_TIME_THRESHOLD_KEY: &str = "response.time.threshold.ms";
pub const HTTP_TIMEOUT_KEY: &str = "http.timeout.ms";

pub const DEFAULT_RESPONSE_TIME_THRESHOLD: Duration = Duration::from_millis(5000);

lazy_static! {
    static ref PROPERTY_REGEX: Regex =
        Regex::new(r"^(?P<key>[^=:\s]+)(?:\s*[=:]\s*(?P<value>.*?))?\s*$").unwrap();
}

/// Key/value settings read from a `.properties` source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    values: HashMap<String, String>,
    source: Option<PathBuf>,
}

impl Configuration {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Unreadable(path.to_path_buf(), e))?;

        let mut configuration = Self::parse(&contents)?;
        configuration.source = Some(path.to_path_buf());

        tracing::debug!(
            path = %path.display(),
            keys = configuration.values.len(),
            "Loaded configuration"
        );

        Ok(configuration)
    }

    /// Parses `key=value` / `key: value` lines; a bare `key` has an empty value.
    /// Blank lines and lines starting with `#` or `!` are skipped.
    pub fn parse<S: AsRef<str>>(contents: S) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();

        for (number, line) in contents.as_ref().lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let captures = PROPERTY_REGEX
                .captures(line)
                .ok_or_else(|| ConfigError::MalformedLine(number + 1, line.into()))?;

            values.insert(
                String::from(&captures["key"]),
                captures
                    .name("value")
                    .map_or_else(String::new, |value| String::from(value.as_str())),
            );
        }

        Ok(Self {
            values,
            source: None,
        })
    }

    pub fn from_pairs<K: Into<String>, V: Into<String>, I: IntoIterator<Item = (K, V)>>(
        pairs: I,
    ) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            source: None,
        }
    }

    pub fn with_value<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.set(key, value);
        self
    }

    /// Only meant for assembling a configuration before it is handed to a client.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.values.insert(key.into(), value.into());
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_or_default<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingKey(key.into()))
    }

    pub fn base_url(&self) -> Result<&str, ConfigError> {
        self.get(BASE_URL_KEY)
            .or_else(|| self.get(LEGACY_BASE_URL_KEY))
            .ok_or_else(|| ConfigError::MissingKey(BASE_URL_KEY.into()))
    }

    pub fn username(&self) -> Result<&str, ConfigError> {
        self.require(AUTH_USERNAME_KEY)
    }

    pub fn password(&self) -> Result<&str, ConfigError> {
        self.require(AUTH_PASSWORD_KEY)
    }

    pub fn response_time_threshold(&self) -> Result<Duration, ConfigError> {
        Ok(self
            .millis(RESPONSE_TIME_THRESHOLD_KEY)?
            .unwrap_or(DEFAULT_RESPONSE_TIME_THRESHOLD))
    }

    pub fn http_timeout(&self) -> Result<Option<Duration>, ConfigError> {
        self.millis(HTTP_TIMEOUT_KEY)
    }

    fn millis(&self, key: &str) -> Result<Option<Duration>, ConfigError> {
        self.get(key)
            .map(|value| {
                value
                    .parse()
                    .map(Duration::from_millis)
                    .map_err(|_| ConfigError::InvalidValue(key.into(), value.into()))
            })
            .transpose()
    }
}
