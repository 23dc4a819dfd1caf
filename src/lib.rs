pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod middleware;
pub mod protocol;
pub mod server;

pub use auth::{Driver, MemoryDriver};
pub use client::{Session, SessionConfig, Termination, TerminationReason};
pub use crate::config::ServerConfig;
pub use server::Listener;
