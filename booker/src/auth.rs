use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::{
    fmt::Display,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Debug)]
pub(crate) struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize, Debug)]
pub(crate) struct TokenResponse {
    pub token: Option<String>,
}

/// Caches one token for every client sharing the cache. The fill runs while
/// the lock is held, so concurrent callers never fetch twice.
#[derive(Debug, Default)]
pub struct TokenCache {
    token: Mutex<Option<AuthToken>>,
    fetches: AtomicUsize,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_fetch<F>(&self, fetch: F) -> Result<AuthToken, Error>
    where
        F: FnOnce() -> Result<AuthToken, Error>,
    {
        let mut cached = self.token.lock()?;

        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        self.fetches.fetch_add(1, Ordering::SeqCst);
        let token = fetch()?;
        *cached = Some(token.clone());

        Ok(token)
    }

    pub fn cached(&self) -> Result<Option<AuthToken>, Error> {
        Ok(self.token.lock()?.clone())
    }

    pub fn clear(&self) -> Result<(), Error> {
        *self.token.lock()? = None;
        Ok(())
    }

    /// Number of times the cache had to go to the network.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}
