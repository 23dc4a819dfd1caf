//! Error handling
//!
//! Defines error types for the FTP session engine.

pub mod types;

pub use types::*;
