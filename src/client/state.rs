//! Module `state`
//!
//! Defines `SessionState`, the per-connection authentication state machine
//! and working directory.

use crate::error::StateError;

/// Externally visible authentication phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Unauthenticated,
    AwaitingPassword,
    Authenticated,
}

// Usernames live inside the phase they belong to, so a pending and a
// logged-in name can never coexist.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Login {
    Anonymous,
    Pending(String),
    LoggedIn(String),
}

/// State of a single client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    login: Login,
    working_directory: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            login: Login::Anonymous,
            working_directory: "/".to_string(),
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    // --------------------
    // Getter methods
    // --------------------

    pub fn auth_phase(&self) -> AuthPhase {
        match self.login {
            Login::Anonymous => AuthPhase::Unauthenticated,
            Login::Pending(_) => AuthPhase::AwaitingPassword,
            Login::LoggedIn(_) => AuthPhase::Authenticated,
        }
    }

    /// Username given by USER, only while waiting for PASS.
    pub fn pending_username(&self) -> Option<&str> {
        match &self.login {
            Login::Pending(name) => Some(name),
            _ => None,
        }
    }

    /// Username of the logged-in user, only once authenticated.
    pub fn current_user(&self) -> Option<&str> {
        match &self.login {
            Login::LoggedIn(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.login, Login::LoggedIn(_))
    }

    pub fn working_directory(&self) -> &str {
        &self.working_directory
    }

    // --------------------
    // Transitions
    // --------------------

    /// Record the username from USER and wait for PASS.
    ///
    /// Replaces any earlier pending name. Ignored once authenticated.
    pub fn begin_login(&mut self, username: impl Into<String>) {
        if !self.is_logged_in() {
            self.login = Login::Pending(username.into());
        }
    }

    /// Promote the pending username to the current user.
    ///
    /// Returns the user now logged in, or `None` if no USER was pending.
    pub fn complete_login(&mut self) -> Option<&str> {
        match std::mem::replace(&mut self.login, Login::Anonymous) {
            Login::Pending(name) => {
                self.login = Login::LoggedIn(name);
                self.current_user()
            }
            other => {
                self.login = other;
                None
            }
        }
    }

    /// Drop the pending username after a failed PASS.
    pub fn reject_login(&mut self) {
        if let Login::Pending(_) = self.login {
            self.login = Login::Anonymous;
        }
    }

    /// Change the working directory; it may never be empty.
    pub fn set_working_directory(&mut self, path: impl Into<String>) -> Result<(), StateError> {
        let path = path.into();
        if path.is_empty() {
            return Err(StateError::EmptyWorkingDirectory);
        }
        self.working_directory = path;
        Ok(())
    }
}
