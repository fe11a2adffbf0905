//! Error types specific to APDU commands

use super::ExpectedLength;

/// Errors raised while encoding or decoding a command APDU
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Command data longer than an extended Lc can describe
    #[error("Command data of {0} bytes exceeds the maximum of 65535")]
    DataTooLong(usize),

    /// Expected response length beyond the extended maximum
    #[error("Expected length {0} exceeds the maximum of 65536")]
    ExpectedLengthTooLarge(ExpectedLength),

    /// Raw command whose length fields do not add up
    #[error("Invalid command length: {0} bytes")]
    InvalidLength(usize),

    /// Raw command that cannot be read as any ISO 7816-3 case
    #[error("Command parse error: {0}")]
    Parse(&'static str),
}
