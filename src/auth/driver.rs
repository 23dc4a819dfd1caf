//! Driver contract
//!
//! A `Driver` verifies credentials. It is shared by every session, so it
//! must be `Send + Sync`; any locking it needs is its own business.

use std::sync::Arc;
use std::time::Duration;

use crate::error::AuthError;

/// Pluggable credential backend.
pub trait Driver: Send + Sync {
    /// Return true if `password` is correct for `username`.
    fn authenticate(&self, username: &str, password: &str) -> bool;
}

impl<F> Driver for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn authenticate(&self, username: &str, password: &str) -> bool {
        self(username, password)
    }
}

/// Adapter the session uses to call a `Driver`.
///
/// The driver runs on the blocking pool so a slow backend stalls only the
/// session waiting on it. An optional timeout bounds that wait.
#[derive(Clone)]
pub struct Authenticator {
    driver: Arc<dyn Driver>,
    timeout: Option<Duration>,
}

impl Authenticator {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Call the driver once.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        let driver = Arc::clone(&self.driver);
        let username = username.to_string();
        let password = password.to_string();

        let call = tokio::task::spawn_blocking(move || driver.authenticate(&username, &password));

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(joined) => joined,
                Err(_) => return Err(AuthError::TimedOut(limit)),
            },
            None => call.await,
        };

        joined.map_err(|e| AuthError::DriverFailed(e.to_string()))
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
