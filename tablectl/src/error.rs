use std::fmt;

use tablectl_exec::command;

/// Errors returned by [`TableController`](crate::TableController) operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Every table slot is held by another interface.
    #[error("no table slots available")]
    CapacityExceeded,
    /// A removal named an interface that owns no table.
    #[error("interface not found: {0}")]
    InterfaceNotFound(String),
    /// A slot, name or UID range the operation cannot accept.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The routing or firewall tool could not be run or exited non-zero. `op` names what was
    /// being changed and is what the client gets to see.
    #[error("{op}: {source}")]
    ExternalCommandFailed { op: &'static str, source: command::Error },
}

/// Result of a controller operation.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn command(op: &'static str) -> impl FnOnce(command::Error) -> Self {
        move |source| Self::ExternalCommandFailed { op, source }
    }

    /// The code reported to the client for this error.
    pub fn response_code(&self) -> ResponseCode {
        match self {
            Self::InvalidArgument(_) => ResponseCode::CommandParameterError,
            _ => ResponseCode::OperationFailed,
        }
    }
}

/// Codes reported back to the client that issued a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    /// The command completed.
    CommandOkay = 200,
    /// The command was valid but could not be carried out.
    OperationFailed = 400,
    /// The command carried an invalid argument.
    CommandParameterError = 501,
}

impl ResponseCode {
    /// The numeric code put on the wire.
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// A client-facing result line: a [`ResponseCode`] followed by a human readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Outcome class.
    pub code: ResponseCode,
    /// Text following the code.
    pub message: String,
}

impl Response {
    /// A [`ResponseCode::CommandOkay`] response.
    pub fn ok(message: impl Into<String>) -> Self {
        Self { code: ResponseCode::CommandOkay, message: message.into() }
    }

    /// Builds the response for `result`, using `ok_message` on success.
    pub fn from_result<T>(result: &Result<T>, ok_message: &str) -> Self {
        match result {
            Ok(_) => Self::ok(ok_message),
            Err(e) => e.into(),
        }
    }

    /// Whether the command succeeded.
    pub fn is_ok(&self) -> bool {
        self.code == ResponseCode::CommandOkay
    }
}

impl From<&Error> for Response {
    fn from(e: &Error) -> Self {
        let message = match e {
            Error::CapacityExceeded => "Max number NATed".to_string(),
            Error::InterfaceNotFound(_) => "Interface not found".to_string(),
            Error::ExternalCommandFailed { op, .. } => op.to_string(),
            other => other.to_string(),
        };
        Self { code: e.response_code(), message }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code.as_u16(), self.message)
    }
}
