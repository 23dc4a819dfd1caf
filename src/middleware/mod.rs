//! Server middleware
//!
//! Provides the logging instances handed to listeners and sessions.

pub mod logging;

pub use logging::{ConnectionLogger, ServerLogger};
