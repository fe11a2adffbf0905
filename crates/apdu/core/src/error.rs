//! Core error type for all APDU operations
//!
//! Every failure a caller can see from this crate is one of four kinds: a length
//! violation while encoding or decoding, a non-success status word from the card,
//! a transport failure, or malformed TLV structure. The area-specific error types
//! are aggregated here so results compose with `?`.

use crate::command::CommandError;
use crate::response::error::{ResponseError, StatusError};
use crate::response::status::StatusWord;
use crate::transport::TransportError;

/// Core error type that encompasses all possible errors in the crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Command could not be encoded
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Raw response could not be split into data and status
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// The card answered with a non-success status word
    #[error(transparent)]
    Status(#[from] StatusError),

    /// The transport failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// TLV data could not be encoded or decoded
    #[error(transparent)]
    Tlv(#[from] iso7816_encoding::Error),

    /// A field of fixed size had the wrong length
    #[error("Invalid {field} length: {len} bytes")]
    InvalidFieldLength {
        /// Name of the field
        field: &'static str,
        /// Length found
        len: usize,
    },

    /// The card kept asking for continuation beyond the configured limit
    #[error("Chain limit exceeded after {0} continuation commands")]
    ChainLimitExceeded(usize),
}

impl Error {
    /// Create a new status error
    pub const fn status(sw1: u8, sw2: u8) -> Self {
        Self::Status(StatusError::new(sw1, sw2))
    }

    /// Create a new field length error
    pub const fn invalid_field_length(field: &'static str, len: usize) -> Self {
        Self::InvalidFieldLength { field, len }
    }

    /// Whether a length constraint was violated while encoding or decoding
    pub const fn is_invalid_length(&self) -> bool {
        match self {
            Self::Command(_) | Self::Response(_) | Self::InvalidFieldLength { .. } => true,
            Self::Tlv(e) => e.is_invalid_length(),
            _ => false,
        }
    }

    /// Whether the TLV data was structurally malformed
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::Tlv(e) if !e.is_invalid_length())
    }

    /// Whether the error came from the transport
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Status word returned by the card, if this is a protocol error
    pub const fn status_word(&self) -> Option<StatusWord> {
        match self {
            Self::Status(e) => Some(e.status),
            _ => None,
        }
    }
}

/// Result type for APDU operations
pub type Result<T, E = Error> = std::result::Result<T, E>;
