use crate::error::Error;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const BOOKING_ID_KEY: &str = "bookingId";
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Values handed from one step of a scenario to the next. Owned by a single
/// scenario, never shared between threads.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TestContext {
    values: HashMap<String, Value>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store<K: Into<String>, V: Serialize>(&mut self, key: K, value: V) -> Result<(), Error> {
        let key = key.into();
        let value = serde_json::to_value(value)?;
        tracing::debug!(key = key.as_str(), "Storing scenario value");
        self.values.insert(key, value);

        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// `Ok(None)` when the key is absent, an error when the stored value has
    /// another shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        self.values
            .get(key)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(Error::from)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
