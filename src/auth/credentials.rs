//! Credential storage
//!
//! In-memory `Driver` backed by a username to password table, usually the
//! `[users]` section of the server configuration.

use std::collections::HashMap;

use super::driver::Driver;

const MAX_CREDENTIAL_LENGTH: usize = 256;

/// Read-only credential table. Safe to share between sessions as is.
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    users: HashMap<String, String>,
}

impl MemoryDriver {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }

    pub fn with_user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.users.insert(username.into(), password.into());
        self
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Basic sanity check against malformed usernames/passwords.
fn is_valid_input(input: &str) -> bool {
    !input.is_empty()
        && input.len() <= MAX_CREDENTIAL_LENGTH
        && !input.contains(['\r', '\n', '\0'])
}

impl Driver for MemoryDriver {
    fn authenticate(&self, username: &str, password: &str) -> bool {
        if !is_valid_input(username) || !is_valid_input(password) {
            return false;
        }
        matches!(self.users.get(username), Some(stored) if stored == password)
    }
}
