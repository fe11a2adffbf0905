//! Error types specific to APDU responses

use std::fmt;

use super::status::StatusWord;

/// Raw response that cannot be split into data and a status word
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    /// Fewer than the two status bytes
    #[error("Response of {0} bytes is too short to carry a status word")]
    Incomplete(usize),

    /// More than 65536 data bytes plus the status word
    #[error("Response of {0} bytes exceeds the maximum of 65538")]
    TooLong(usize),
}

/// Error for status words in APDU responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub struct StatusError {
    /// Status word that caused the error
    pub status: StatusWord,
    /// Catalog description, if the status word is a known one
    pub message: Option<&'static str>,
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Status error {}", self.status)?;
        match self.message {
            Some(msg) => write!(f, ": {msg}"),
            None => write!(f, ": unknown status word {:04X}", self.status.to_u16()),
        }
    }
}

impl StatusError {
    /// Create a new status error, looking up its description
    pub const fn new(sw1: u8, sw2: u8) -> Self {
        let status = StatusWord::new(sw1, sw2);
        Self {
            status,
            message: status.description(),
        }
    }

    /// Create a new status error with a message
    pub const fn with_message(sw1: u8, sw2: u8, message: &'static str) -> Self {
        Self {
            status: StatusWord::new(sw1, sw2),
            message: Some(message),
        }
    }

    /// Get the status word
    pub const fn status_word(&self) -> StatusWord {
        self.status
    }
}

impl From<StatusWord> for StatusError {
    fn from(status: StatusWord) -> Self {
        Self::new(status.sw1, status.sw2)
    }
}
