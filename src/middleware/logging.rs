//! Logging middleware
//!
//! Log lines go through the `log` facade, but the target and connection
//! context live in values passed down explicitly rather than in globals.

use log::{debug, info, warn};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

/// Process-scoped logger handed to a `Listener`.
#[derive(Debug, Clone)]
pub struct ServerLogger {
    target: Arc<str>,
}

impl ServerLogger {
    pub fn new(target: &str) -> Self {
        Self {
            target: Arc::from(target),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Derive the logger for one accepted connection.
    pub fn for_connection(&self, session_id: u64, peer: SocketAddr) -> ConnectionLogger {
        ConnectionLogger {
            target: Arc::clone(&self.target),
            session_id,
            peer,
        }
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        info!(target: &*self.target, "{}", args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        warn!(target: &*self.target, "{}", args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        log::error!(target: &*self.target, "{}", args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        debug!(target: &*self.target, "{}", args);
    }
}

impl Default for ServerLogger {
    fn default() -> Self {
        Self::new("rax_ftp")
    }
}

/// Per-session logger; every line carries the session id and peer address.
#[derive(Debug, Clone)]
pub struct ConnectionLogger {
    target: Arc<str>,
    session_id: u64,
    peer: SocketAddr,
}

impl ConnectionLogger {
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Log a client connection
    pub fn connection(&self) {
        info!(target: &*self.target, "[#{} {}] Connection established", self.session_id, self.peer);
    }

    /// Log a client command. PASS arguments are masked.
    pub fn command(&self, line: &str) {
        let shown = mask_password(line);
        info!(target: &*self.target, "[#{} {}] <- {}", self.session_id, self.peer, shown);
    }

    /// Log a reply as it goes out
    pub fn reply(&self, encoded: &str) {
        debug!(target: &*self.target, "[#{} {}] -> {}", self.session_id, self.peer, encoded.trim_end());
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        info!(target: &*self.target, "[#{} {}] {}", self.session_id, self.peer, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        warn!(target: &*self.target, "[#{} {}] {}", self.session_id, self.peer, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        debug!(target: &*self.target, "[#{} {}] {}", self.session_id, self.peer, args);
    }
}

fn mask_password(line: &str) -> String {
    let trimmed = line.trim_start();
    let verb = trimmed.split_whitespace().next().unwrap_or("");
    if verb.eq_ignore_ascii_case("PASS") {
        format!("{verb} ****")
    } else {
        line.to_string()
    }
}
