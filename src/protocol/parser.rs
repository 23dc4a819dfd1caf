//! FTP Command parsing
//!
//! Splits a raw control line into an upper-cased verb and its arguments.
//! The parser is told how many arguments each verb needs, so a short line
//! comes back as `MissingArguments` instead of something a handler could
//! index past the end of.

/// A verb and its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    verb: String,
    args: Vec<String>,
}

impl Command {
    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Outcome of parsing one control line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    /// The line held no tokens at all
    Empty,
    /// Verb plus at least as many arguments as it requires
    Complete(Command),
    /// Verb with fewer arguments than it requires
    MissingArguments {
        verb: String,
        required: usize,
        given: usize,
    },
}

/// Strip a trailing `\n` or `\r\n` (and nothing else).
pub fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Parse a raw command line.
///
/// `required_args` reports the minimum argument count for an upper-cased verb.
pub fn parse_command(raw: &str, required_args: impl Fn(&str) -> usize) -> ParsedCommand {
    let mut tokens = strip_line_ending(raw).split_whitespace();

    let verb = match tokens.next() {
        Some(verb) => verb.to_ascii_uppercase(),
        None => return ParsedCommand::Empty,
    };
    let args: Vec<String> = tokens.map(str::to_string).collect();

    let required = required_args(&verb);
    if args.len() < required {
        return ParsedCommand::MissingArguments {
            verb,
            required,
            given: args.len(),
        };
    }

    ParsedCommand::Complete(Command { verb, args })
}
