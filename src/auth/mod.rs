//! Authentication system
//!
//! The `Driver` contract, the adapter sessions call it through, and an
//! in-memory driver for configuration-defined users.

pub mod credentials;
pub mod driver;

pub use credentials::MemoryDriver;
pub use driver::{Authenticator, Driver};
