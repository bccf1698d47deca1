//! Error types shared by the hub clients.

use std::fmt;

/// Classified failure from the chat or push transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Non-success HTTP status from the hub.
    HttpStatus,
    /// Connection or read timed out.
    Timeout,
    /// The response body could not be parsed.
    Parse,
    /// The hub reported an error inside the stream.
    ApiError,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn http_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            format!("hub returned {status}")
        } else {
            format!("hub returned {status}: {body}")
        };
        Self::new(TransportErrorKind::HttpStatus, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Parse, message)
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::ApiError, message)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_decode() {
            TransportErrorKind::Parse
        } else {
            TransportErrorKind::HttpStatus
        };
        Self::new(kind, err.to_string())
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TransportError {}

pub type TransportResult<T> = Result<T, TransportError>;
