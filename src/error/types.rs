//! Error types
//!
//! Protocol syntax problems are not errors here: they are answered with a
//! 500 reply and the session carries on. These types cover what is left.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Failures of the credential backend call.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("driver did not answer within {0:?}")]
    TimedOut(Duration),

    #[error("driver task failed: {0}")]
    DriverFailed(String),
}

/// Transport failures on a session's control channel.
///
/// Always fatal to the session that hit it and to no other.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("control channel I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Invalid mutation of session state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("working directory cannot be empty")]
    EmptyWorkingDirectory,
}

/// Top-level error for server startup and the accept loop.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
