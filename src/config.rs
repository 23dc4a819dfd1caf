//! Configuration management for RAX FTP
//!
//! Values are layered: built-in defaults, then an optional `config.toml`,
//! then `RAX_FTP__*` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const ENV_PREFIX: &str = "RAX_FTP";
const DEFAULT_CONFIG_PATH: &str = "config";
const MIN_COMMAND_LENGTH: usize = 16;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address to bind the FTP control connection
    pub bind_address: String,

    /// Port for the FTP control connection
    pub control_port: u16,

    /// Text of the 220 greeting sent on connect
    pub welcome_message: String,

    /// Maximum concurrent sessions
    pub max_clients: usize,

    /// Maximum FTP command line length in bytes
    pub max_command_length: usize,

    /// Upper bound on a single credential check, 0 for none
    pub auth_timeout_secs: u64,

    /// Log target used by the listener and its sessions
    pub log_target: String,

    /// Username to password table for the in-memory driver
    #[serde(default)]
    pub users: HashMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            control_port: 2121,
            welcome_message: "Welcome to RAX FTP Server".to_string(),
            max_clients: 10,
            max_command_length: 512,
            auth_timeout_secs: 0,
            log_target: "rax_ftp".to_string(),
            users: HashMap::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `config.toml` (if present) with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from the given file path (extension optional).
    ///
    /// A missing file is not an error; defaults and the environment still apply.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();

        let settings = Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("control_port", defaults.control_port as i64)?
            .set_default("welcome_message", defaults.welcome_message)?
            .set_default("max_clients", defaults.max_clients as i64)?
            .set_default("max_command_length", defaults.max_command_length as i64)?
            .set_default("auth_timeout_secs", defaults.auth_timeout_secs as i64)?
            .set_default("log_target", defaults.log_target)?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control_port == 0 {
            return Err(ConfigError::Message("Control port cannot be 0".into()));
        }

        if self.max_clients == 0 {
            return Err(ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.max_command_length < MIN_COMMAND_LENGTH {
            return Err(ConfigError::Message(format!(
                "max_command_length must be at least {MIN_COMMAND_LENGTH}"
            )));
        }

        if self.welcome_message.contains(['\r', '\n']) {
            return Err(ConfigError::Message(
                "welcome_message must be a single line".into(),
            ));
        }

        if self.log_target.is_empty() {
            return Err(ConfigError::Message("log_target cannot be empty".into()));
        }

        Ok(())
    }

    /// Get bind address and control port as socket address
    pub fn control_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.control_port)
    }

    /// Get the credential check bound, if any
    pub fn auth_timeout(&self) -> Option<Duration> {
        (self.auth_timeout_secs > 0).then(|| Duration::from_secs(self.auth_timeout_secs))
    }
}
