//! Client session
//!
//! One `Session` per accepted connection. It owns the control channel,
//! reads one command line at a time, dispatches it and flushes exactly one
//! reply before reading the next line.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::auth::{Authenticator, Driver};
use crate::client::state::SessionState;
use crate::config::ServerConfig;
use crate::error::SessionError;
use crate::middleware::ConnectionLogger;
use crate::protocol::parser::strip_line_ending;
use crate::protocol::{
    CommandContext, CommandRegistry, CommandResult, CommandStatus, ParsedCommand, Reply, ReplyCode,
    parse_command,
};

/// Settings and collaborators shared by every session of a listener.
#[derive(Clone)]
pub struct SessionConfig {
    pub welcome_message: String,
    pub max_command_length: usize,
    pub auth: Authenticator,
    pub registry: Arc<CommandRegistry>,
}

impl SessionConfig {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self::from_server_config(&ServerConfig::default(), driver)
    }

    pub fn from_server_config(config: &ServerConfig, driver: Arc<dyn Driver>) -> Self {
        Self {
            welcome_message: config.welcome_message.clone(),
            max_command_length: config.max_command_length,
            auth: Authenticator::new(driver).with_timeout(config.auth_timeout()),
            registry: Arc::new(CommandRegistry::with_defaults()),
        }
    }

    pub fn with_registry(mut self, registry: CommandRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }
}

/// Why a session ended.
#[derive(Debug)]
pub enum TerminationReason {
    /// The client closed the control channel
    PeerClosed,
    /// A handler asked for the connection to be closed
    CloseRequested,
    /// Reading or writing the control channel failed
    Transport(SessionError),
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::PeerClosed => write!(f, "closed by peer"),
            TerminationReason::CloseRequested => write!(f, "closed on request"),
            TerminationReason::Transport(e) => write!(f, "{}", e),
        }
    }
}

/// Emitted exactly once when a session ends.
#[derive(Debug)]
pub struct Termination {
    pub session_id: u64,
    pub peer: SocketAddr,
    pub reason: TerminationReason,
    pub state: SessionState,
}

enum LineRead {
    Line(Vec<u8>),
    // First `max_command_length` bytes of an over-long line
    TooLong(Vec<u8>),
    Eof,
}

pub struct Session<S> {
    state: SessionState,
    control: BufReader<S>,
    data: Option<S>,
    config: Arc<SessionConfig>,
    log: ConnectionLogger,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, config: Arc<SessionConfig>, log: ConnectionLogger) -> Self {
        Self {
            state: SessionState::new(),
            control: BufReader::new(stream),
            data: None,
            config,
            log,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Install the data channel for a transfer, returning any previous one.
    pub fn attach_data_channel(&mut self, stream: S) -> Option<S> {
        self.data.replace(stream)
    }

    pub fn has_data_channel(&self) -> bool {
        self.data.is_some()
    }

    /// Run the session until the control channel closes.
    ///
    /// Sends the 220 greeting, then loops read/dispatch/reply. Channels are
    /// closed before returning.
    pub async fn serve(mut self) -> Termination {
        self.log.connection();

        let reason = match self.run().await {
            Ok(reason) => reason,
            Err(e) => TerminationReason::Transport(e),
        };

        self.close_channels().await;
        self.log.info(format_args!("Connection terminated: {}", reason));

        Termination {
            session_id: self.log.session_id(),
            peer: self.log.peer(),
            reason,
            state: self.state,
        }
    }

    /// Parse and dispatch one line without touching the control channel.
    pub async fn handle_line(&mut self, line: &str) -> CommandResult {
        self.log.command(strip_line_ending(line));

        let registry = Arc::clone(&self.config.registry);
        match parse_command(line, |verb| registry.min_args(verb)) {
            ParsedCommand::Empty => CommandResult::syntax_error("Syntax error, zero parameters"),
            ParsedCommand::MissingArguments {
                verb,
                required,
                given,
            } => {
                self.log.debug(format_args!(
                    "{} needs {} argument(s), got {}",
                    verb, required, given
                ));
                CommandResult::syntax_error("Syntax error, missing parameters")
            }
            ParsedCommand::Complete(command) => {
                let handler = registry.resolve(command.verb());
                let mut ctx = CommandContext {
                    state: &mut self.state,
                    auth: &self.config.auth,
                    log: &self.log,
                };
                handler.handle(&mut ctx, command.args()).await
            }
        }
    }

    async fn run(&mut self) -> Result<TerminationReason, SessionError> {
        let greeting = Reply::new(ReplyCode::ServiceReady, self.config.welcome_message.clone());
        self.send(&greeting).await?;

        loop {
            let result = match self.read_line().await? {
                LineRead::Eof => return Ok(TerminationReason::PeerClosed),
                LineRead::TooLong(prefix) => {
                    let prefix = String::from_utf8_lossy(&prefix).into_owned();
                    self.handle_over_long(&prefix).await
                }
                LineRead::Line(bytes) => {
                    let line = String::from_utf8_lossy(&bytes).into_owned();
                    self.handle_line(&line).await
                }
            };

            self.send(&result.reply).await?;

            if result.status == CommandStatus::CloseConnection {
                return Ok(TerminationReason::CloseRequested);
            }
        }
    }

    // Blank and unregistered lines get the reply they would get at any
    // length; only registered verbs are refused as too long.
    async fn handle_over_long(&mut self, prefix: &str) -> CommandResult {
        let verb = prefix.split_whitespace().next().map(str::to_ascii_uppercase);
        match verb {
            Some(verb) if self.config.registry.contains(&verb) => {
                self.log.warn(format_args!(
                    "{} longer than {} bytes rejected",
                    verb, self.config.max_command_length
                ));
                CommandResult::syntax_error("Command too long")
            }
            _ => self.handle_line(prefix).await,
        }
    }

    // Reads at most `max_command_length` bytes of a line; the remainder of an
    // over-long line is drained and dropped.
    async fn read_line(&mut self) -> Result<LineRead, SessionError> {
        let limit = self.config.max_command_length as u64;
        let mut buf = Vec::new();

        let n = (&mut self.control)
            .take(limit + 1)
            .read_until(b'\n', &mut buf)
            .await?;
        if n == 0 {
            return Ok(LineRead::Eof);
        }
        if buf.len() as u64 <= limit {
            return Ok(LineRead::Line(buf));
        }

        let mut ended = buf.ends_with(b"\n");
        buf.truncate(limit as usize);

        let mut rest = Vec::new();
        while !ended {
            rest.clear();
            let n = (&mut self.control)
                .take(limit)
                .read_until(b'\n', &mut rest)
                .await?;
            ended = n == 0 || rest.ends_with(b"\n");
        }
        Ok(LineRead::TooLong(buf))
    }

    async fn send(&mut self, reply: &Reply) -> Result<(), SessionError> {
        let encoded = reply.encode();
        let stream = self.control.get_mut();
        stream.write_all(encoded.as_bytes()).await?;
        stream.flush().await?;
        self.log.reply(&encoded);
        Ok(())
    }

    // Control channel first, then the data channel if one is open.
    async fn close_channels(&mut self) {
        if let Err(e) = self.control.get_mut().shutdown().await {
            self.log
                .debug(format_args!("Control channel shutdown failed: {}", e));
        }
        if let Some(mut data) = self.data.take() {
            if let Err(e) = data.shutdown().await {
                self.log
                    .debug(format_args!("Data channel shutdown failed: {}", e));
            }
        }
    }
}
