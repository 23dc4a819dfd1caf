//! FTP Response handling
//!
//! Defines FTP reply codes and the `"<code> <text>\r\n"` wire encoding.

/// Reply codes the session engine knows how to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyCode {
    ServiceReady,
    ClosingControl,
    LoggedIn,
    NeedPassword,
    ServiceUnavailable,
    SyntaxError,
    NotLoggedIn,
}

impl ReplyCode {
    /// Look up a registered numeric code
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            220 => Some(ReplyCode::ServiceReady),
            221 => Some(ReplyCode::ClosingControl),
            230 => Some(ReplyCode::LoggedIn),
            331 => Some(ReplyCode::NeedPassword),
            421 => Some(ReplyCode::ServiceUnavailable),
            500 => Some(ReplyCode::SyntaxError),
            530 => Some(ReplyCode::NotLoggedIn),
            _ => None,
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            ReplyCode::ServiceReady => 220,
            ReplyCode::ClosingControl => 221,
            ReplyCode::LoggedIn => 230,
            ReplyCode::NeedPassword => 331,
            ReplyCode::ServiceUnavailable => 421,
            ReplyCode::SyntaxError => 500,
            ReplyCode::NotLoggedIn => 530,
        }
    }

    /// Text used when a reply is built without an explicit message
    pub fn default_text(self) -> &'static str {
        match self {
            ReplyCode::ServiceReady => "Service ready",
            ReplyCode::ClosingControl => "Service closing control connection",
            ReplyCode::LoggedIn => "Password ok, continue",
            ReplyCode::NeedPassword => "User name ok, password required",
            ReplyCode::ServiceUnavailable => "Service not available, closing control connection",
            ReplyCode::SyntaxError => "Syntax error, command unrecognized",
            ReplyCode::NotLoggedIn => "Incorrect password, not logged in",
        }
    }
}

/// One reply line, not yet encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: ReplyCode,
    text: String,
}

impl Reply {
    pub fn new(code: ReplyCode, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }

    /// Build a reply from a raw numeric code.
    ///
    /// Unregistered codes become a generic 500 rather than an error.
    pub fn from_code(code: u16, text: impl Into<String>) -> Self {
        match ReplyCode::from_u16(code) {
            Some(code) => Self::new(code, text),
            None => Self::new(
                ReplyCode::SyntaxError,
                ReplyCode::SyntaxError.default_text(),
            ),
        }
    }

    pub fn code(&self) -> ReplyCode {
        self.code
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Wire form of this reply
    pub fn encode(&self) -> String {
        format_response(self.code.as_u16(), &self.text)
    }
}

impl From<ReplyCode> for Reply {
    fn from(code: ReplyCode) -> Self {
        Reply::new(code, code.default_text())
    }
}

/// Format an FTP response message.
///
/// CR and LF inside `message` are flattened to spaces so the result is
/// always exactly one line.
pub fn format_response(code: u16, message: &str) -> String {
    if ReplyCode::from_u16(code).is_none() {
        return format!(
            "{} {}\r\n",
            ReplyCode::SyntaxError.as_u16(),
            ReplyCode::SyntaxError.default_text()
        );
    }
    let message = message.replace(['\r', '\n'], " ");
    format!("{} {}\r\n", code, message)
}
