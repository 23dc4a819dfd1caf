//! RAX FTP - Entry Point
//!
//! Runs the control-connection listener with the in-memory credential driver.

use std::process;
use std::sync::Arc;

use log::{error, info, warn};

use rax_ftp_core::error::ServerError;
use rax_ftp_core::middleware::ServerLogger;
use rax_ftp_core::{Listener, MemoryDriver, ServerConfig, SessionConfig};

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching FTP server...");

    if let Err(e) = run().await {
        error!("{}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::load()?;

    if config.users.is_empty() {
        warn!("No users configured; every login will be rejected");
    }

    let logger = ServerLogger::new(&config.log_target);
    let driver = Arc::new(MemoryDriver::new(config.users.clone()));
    let sessions = SessionConfig::from_server_config(&config, driver);

    let listener = Listener::bind(&config, sessions, logger).await?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    listener.run_until(shutdown).await
}
