//! Server core functionality
//!
//! Accepts control connections and runs one session per connection.

pub mod listener;

pub use listener::Listener;
