//! Client session management
//!
//! Per-connection state machine and the session loop that drives it.

pub mod session;
pub mod state;

pub use session::{Session, SessionConfig, Termination, TerminationReason};
pub use state::{AuthPhase, SessionState};
