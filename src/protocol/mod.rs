//! FTP Protocol implementation
//!
//! Handles FTP command parsing, dispatch, and response generation.

pub mod commands;
pub mod parser;
pub mod registry;
pub mod responses;

pub use commands::{CommandContext, CommandHandler, CommandResult, CommandStatus};
pub use parser::{Command, ParsedCommand, parse_command};
pub use registry::CommandRegistry;
pub use responses::{Reply, ReplyCode, format_response};
