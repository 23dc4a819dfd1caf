//! Module `commands`
//!
//! Command handlers and the result type they hand back to the session.
//! USER and PASS drive the login state machine; anything unregistered lands
//! in `UnknownCommand`.

use async_trait::async_trait;

use crate::auth::Authenticator;
use crate::client::state::{AuthPhase, SessionState};
use crate::middleware::ConnectionLogger;
use crate::protocol::responses::{Reply, ReplyCode};

/// What the session should do after sending the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Continue,
    CloseConnection,
}

/// Full result of handling one command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub reply: Reply,
}

impl CommandResult {
    pub fn reply(code: ReplyCode, text: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Continue,
            reply: Reply::new(code, text),
        }
    }

    pub fn close(code: ReplyCode, text: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::CloseConnection,
            reply: Reply::new(code, text),
        }
    }

    pub fn syntax_error(text: impl Into<String>) -> Self {
        Self::reply(ReplyCode::SyntaxError, text)
    }
}

/// Everything a handler may touch while running.
pub struct CommandContext<'a> {
    pub state: &'a mut SessionState,
    pub auth: &'a Authenticator,
    pub log: &'a ConnectionLogger,
}

/// A handler for one verb.
///
/// `args` always holds at least `min_args()` entries.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn min_args(&self) -> usize {
        0
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult;
}

/// USER <name>
pub struct UserHandler;

#[async_trait]
impl CommandHandler for UserHandler {
    fn min_args(&self) -> usize {
        1
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
        if ctx.state.is_logged_in() {
            return CommandResult::syntax_error("Already logged in");
        }

        ctx.state.begin_login(args[0].as_str());
        CommandResult::reply(ReplyCode::NeedPassword, "User name ok, password required")
    }
}

/// PASS <password>
pub struct PassHandler;

#[async_trait]
impl CommandHandler for PassHandler {
    fn min_args(&self) -> usize {
        1
    }

    async fn handle(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
        let username = match (ctx.state.auth_phase(), ctx.state.pending_username()) {
            (AuthPhase::AwaitingPassword, Some(name)) => name.to_string(),
            (AuthPhase::Authenticated, _) => {
                return CommandResult::syntax_error("Already logged in");
            }
            _ => return CommandResult::syntax_error("Bad sequence of commands, send USER first"),
        };

        let accepted = match ctx.auth.authenticate(&username, &args[0]).await {
            Ok(accepted) => accepted,
            Err(e) => {
                ctx.log
                    .warn(format_args!("Authentication for {} failed: {}", username, e));
                false
            }
        };

        if accepted {
            ctx.state.complete_login();
            ctx.log.info(format_args!("User {} logged in", username));
            CommandResult::reply(ReplyCode::LoggedIn, "Password ok, continue")
        } else {
            ctx.state.reject_login();
            ctx.log.info(format_args!("Login rejected for {}", username));
            CommandResult::reply(ReplyCode::NotLoggedIn, "Incorrect password, not logged in")
        }
    }
}

/// Fallback for verbs with no registered handler.
pub struct UnknownCommand;

#[async_trait]
impl CommandHandler for UnknownCommand {
    async fn handle(&self, _ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
        CommandResult::syntax_error("Command not found")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::ServerLogger;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn logger() -> ConnectionLogger {
        ServerLogger::default().for_connection(1, "127.0.0.1:0".parse().unwrap())
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_pass_calls_driver_once_with_pending_user() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let auth = Authenticator::new(Arc::new(move |user: &str, pass: &str| {
            seen.fetch_add(1, Ordering::SeqCst);
            user == "alice" && pass == "correct"
        }));
        let log = logger();
        let mut state = SessionState::new();
        state.begin_login("alice");

        let mut ctx = CommandContext {
            state: &mut state,
            auth: &auth,
            log: &log,
        };
        let result = PassHandler.handle(&mut ctx, &args(&["correct"])).await;

        assert_eq!(result.reply.encode(), "230 Password ok, continue\r\n");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.current_user(), Some("alice"));
    }

    #[tokio::test]
    async fn test_pass_without_user_never_reaches_driver() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let auth = Authenticator::new(Arc::new(move |_: &str, _: &str| {
            seen.fetch_add(1, Ordering::SeqCst);
            true
        }));
        let log = logger();
        let mut state = SessionState::new();

        let mut ctx = CommandContext {
            state: &mut state,
            auth: &auth,
            log: &log,
        };
        let result = PassHandler.handle(&mut ctx, &args(&["anything"])).await;

        assert_eq!(result.reply.code(), ReplyCode::SyntaxError);
        assert_eq!(result.status, CommandStatus::Continue);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(state, SessionState::new());
    }

    #[tokio::test]
    async fn test_driver_timeout_counts_as_rejection() {
        let auth = Authenticator::new(Arc::new(|_: &str, _: &str| {
            std::thread::sleep(std::time::Duration::from_millis(200));
            true
        }))
        .with_timeout(Some(std::time::Duration::from_millis(10)));
        let log = logger();
        let mut state = SessionState::new();
        state.begin_login("alice");

        let mut ctx = CommandContext {
            state: &mut state,
            auth: &auth,
            log: &log,
        };
        let result = PassHandler.handle(&mut ctx, &args(&["pw"])).await;

        assert_eq!(result.reply.code(), ReplyCode::NotLoggedIn);
        assert_eq!(state.auth_phase(), AuthPhase::Unauthenticated);
    }

    #[tokio::test]
    async fn test_unknown_command_leaves_state() {
        let auth = Authenticator::new(Arc::new(|_: &str, _: &str| true));
        let log = logger();
        let mut state = SessionState::new();
        state.begin_login("alice");
        let before = state.clone();

        let mut ctx = CommandContext {
            state: &mut state,
            auth: &auth,
            log: &log,
        };
        let result = UnknownCommand.handle(&mut ctx, &args(&["x"])).await;

        assert_eq!(result.reply.encode(), "500 Command not found\r\n");
        assert_eq!(state, before);
    }
}
