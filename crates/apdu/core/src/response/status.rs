//! Status word definitions for APDU responses
//!
//! The catalog follows ISO/IEC 7816-4:2020 §5.6. Where older revisions gave the
//! same pair two meanings, the current mapping wins: `64 00` reads as an execution
//! error and the security related codes live in the `69 8X` range.

use std::fmt;

use tracing::Level;

/// Coarse classification of a status word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    /// Normal processing (`90 00`)
    Success,
    /// Response bytes still available (`61 XX`)
    MoreData,
    /// Warning processing (`62 XX`, `63 XX`)
    Warning,
    /// Execution or checking error (`64 XX`, `65 XX`, `67 XX`..`6F XX`)
    Error,
    /// Anything outside the interindustry ranges, usually proprietary
    Unknown,
}

/// Status Word (SW1-SW2) from an APDU response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusWord {
    /// First status byte (SW1)
    pub sw1: u8,
    /// Second status byte (SW2)
    pub sw2: u8,
}

impl StatusWord {
    /// Create a new status word
    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self { sw1, sw2 }
    }

    /// Create from a u16 value (SW1 | SW2)
    pub const fn from_u16(status: u16) -> Self {
        Self {
            sw1: (status >> 8) as u8,
            sw2: status as u8,
        }
    }

    /// Convert to a u16 value (SW1 | SW2)
    pub const fn to_u16(&self) -> u16 {
        ((self.sw1 as u16) << 8) | (self.sw2 as u16)
    }

    /// Check if this status word indicates success (90 00)
    pub const fn is_success(&self) -> bool {
        self.sw1 == 0x90 && self.sw2 == 0x00
    }

    /// Success in the legacy sense: `90 00` or `61 XX` before chaining is resolved
    pub const fn is_ok(&self) -> bool {
        self.is_success() || self.has_more()
    }

    /// Check if this status word indicates more data is available (61 XX)
    pub const fn has_more(&self) -> bool {
        self.sw1 == 0x61
    }

    /// Number of bytes still available when SW1 = 61
    ///
    /// An SW2 of zero leaves the amount open and reads as 256, the largest a short
    /// GET RESPONSE can fetch.
    pub const fn remaining_bytes(&self) -> Option<u16> {
        if !self.has_more() {
            None
        } else if self.sw2 == 0 {
            Some(256)
        } else {
            Some(self.sw2 as u16)
        }
    }

    /// Check if this status word indicates a warning (62 XX or 63 XX)
    pub const fn is_warning(&self) -> bool {
        matches!(self.sw1, 0x62 | 0x63)
    }

    /// Check if this status word indicates an error (64, 65, 67..6F)
    pub const fn is_error(&self) -> bool {
        matches!(self.sw1, 0x64 | 0x65 | 0x67..=0x6F)
    }

    /// Processing completed, possibly with a warning
    pub const fn is_completed(&self) -> bool {
        self.is_success() || matches!(self.sw1, 0x61..=0x63)
    }

    /// Processing aborted
    pub const fn is_aborted(&self) -> bool {
        matches!(self.sw1, 0x64 | 0x66 | 0x67 | 0x6F)
    }

    /// Retry counter carried by `63 CX`
    pub const fn counter(&self) -> Option<u8> {
        if self.sw1 == 0x63 && self.sw2 & 0xF0 == 0xC0 {
            Some(self.sw2 & 0x0F)
        } else {
            None
        }
    }

    /// Exact `Ne` the card asks for with `6C XX`
    pub const fn wrong_length_hint(&self) -> Option<u16> {
        if self.sw1 != 0x6C {
            None
        } else if self.sw2 == 0 {
            Some(256)
        } else {
            Some(self.sw2 as u16)
        }
    }

    /// Classify the status word
    pub const fn category(&self) -> StatusCategory {
        if self.is_success() {
            StatusCategory::Success
        } else if self.has_more() {
            StatusCategory::MoreData
        } else if self.is_warning() {
            StatusCategory::Warning
        } else if self.is_error() {
            StatusCategory::Error
        } else {
            StatusCategory::Unknown
        }
    }

    /// Get the appropriate tracing level for this status word
    pub const fn tracing_level(&self) -> Level {
        if self.is_ok() {
            Level::DEBUG
        } else if self.is_warning() {
            Level::INFO
        } else {
            Level::WARN
        }
    }

    /// Get a description of this status word, if it is a known one
    pub const fn description(&self) -> Option<&'static str> {
        Some(match (self.sw1, self.sw2) {
            (0x90, 0x00) => "normal processing",
            (0x61, _) => "response bytes still available",

            (0x62, 0x00) => "no information given (non-volatile memory unchanged)",
            (0x62, 0x02..=0x80) => "triggering by the card",
            (0x62, 0x81) => "part of returned data may be corrupted",
            (0x62, 0x82) => "end of file or record reached before reading Ne bytes",
            (0x62, 0x83) => "selected file deactivated",
            (0x62, 0x84) => "file control information not formatted according to 5.3.3",
            (0x62, 0x85) => "selected file in termination state",
            (0x62, 0x86) => "no input data available from a sensor on the card",
            (0x62, 0x87) => "at least one of the referenced records is deactivated",

            (0x63, 0x00) => "no information given (non-volatile memory changed)",
            (0x63, 0x81) => "file filled up by the last write",
            (0x63, 0xC0..=0xCF) => "counter from 0 to 15 encoded by the low nibble",

            (0x64, 0x00) => "execution error",
            (0x64, 0x01) => "immediate response required by the card",
            (0x64, 0x02..=0x80) => "triggering by the card",

            (0x65, 0x00) => "no information given (non-volatile memory changed)",
            (0x65, 0x81) => "memory failure",

            (0x66, _) => "security-related issue",

            (0x67, 0x00) => "wrong length; no further indication",

            (0x68, 0x00) => "functions in CLA not supported",
            (0x68, 0x81) => "logical channel not supported",
            (0x68, 0x82) => "secure messaging not supported",
            (0x68, 0x83) => "last command of the chain expected",
            (0x68, 0x84) => "command chaining not supported",

            (0x69, 0x00) => "command not allowed",
            (0x69, 0x81) => "command incompatible with file structure",
            (0x69, 0x82) => "security status not satisfied",
            (0x69, 0x83) => "authentication method blocked",
            (0x69, 0x84) => "reference data not usable",
            (0x69, 0x85) => "conditions of use not satisfied",
            (0x69, 0x86) => "command not allowed (no current EF)",
            (0x69, 0x87) => "expected secure messaging data objects missing",
            (0x69, 0x88) => "incorrect secure messaging data objects",

            (0x6A, 0x00) => "no information given (wrong parameters P1-P2)",
            (0x6A, 0x80) => "incorrect parameters in the command data field",
            (0x6A, 0x81) => "function not supported",
            (0x6A, 0x82) => "file or application not found",
            (0x6A, 0x83) => "record not found",
            (0x6A, 0x84) => "not enough memory space in the file",
            (0x6A, 0x85) => "Nc inconsistent with TLV structure",
            (0x6A, 0x86) => "incorrect parameters P1-P2",
            (0x6A, 0x87) => "Nc inconsistent with parameters P1-P2",
            (0x6A, 0x88) => "referenced data or reference data not found",
            (0x6A, 0x89) => "file already exists",
            (0x6A, 0x8A) => "DF name already exists",

            (0x6B, 0x00) => "wrong parameters P1-P2",
            (0x6C, _) => "wrong Le field; SW2 encodes the exact number of available data bytes",
            (0x6D, 0x00) => "instruction code not supported or invalid",
            (0x6E, 0x00) => "class not supported",
            (0x6F, 0x00) => "no precise diagnosis",

            _ => return None,
        })
    }
}

impl From<(u8, u8)> for StatusWord {
    fn from(tuple: (u8, u8)) -> Self {
        Self::new(tuple.0, tuple.1)
    }
}

impl From<u16> for StatusWord {
    fn from(status: u16) -> Self {
        Self::from_u16(status)
    }
}

impl From<StatusWord> for u16 {
    fn from(status: StatusWord) -> Self {
        status.to_u16()
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X} {:02X}", self.sw1, self.sw2)
    }
}

/// Common status words
pub mod common {
    use super::StatusWord;

    /// Success (90 00)
    pub const SUCCESS: StatusWord = StatusWord::new(0x90, 0x00);

    /// More data available (61 XX) - XX is the number of remaining bytes
    pub const MORE_DATA: StatusWord = StatusWord::new(0x61, 0x00);

    /// Warning, non-volatile memory unchanged (62 00)
    pub const WARNING: StatusWord = StatusWord::new(0x62, 0x00);

    /// Part of returned data may be corrupted (62 81)
    pub const DATA_MAY_BE_CORRUPTED: StatusWord = StatusWord::new(0x62, 0x81);

    /// End of file or record reached before reading Ne bytes (62 82)
    pub const END_OF_FILE: StatusWord = StatusWord::new(0x62, 0x82);

    /// Selected file deactivated (62 83)
    pub const SELECTED_FILE_DEACTIVATED: StatusWord = StatusWord::new(0x62, 0x83);

    /// Execution error (64 00)
    pub const EXECUTION_ERROR: StatusWord = StatusWord::new(0x64, 0x00);

    /// Memory failure (65 81)
    pub const MEMORY_FAILURE: StatusWord = StatusWord::new(0x65, 0x81);

    /// Wrong length (67 00)
    pub const WRONG_LENGTH: StatusWord = StatusWord::new(0x67, 0x00);

    /// Logical channel not supported (68 81)
    pub const LOGICAL_CHANNEL_NOT_SUPPORTED: StatusWord = StatusWord::new(0x68, 0x81);

    /// Secure messaging not supported (68 82)
    pub const SECURE_MESSAGING_NOT_SUPPORTED: StatusWord = StatusWord::new(0x68, 0x82);

    /// Command chaining not supported (68 84)
    pub const CHAINING_NOT_SUPPORTED: StatusWord = StatusWord::new(0x68, 0x84);

    /// Command incompatible with file structure (69 81)
    pub const COMMAND_INCOMPATIBLE: StatusWord = StatusWord::new(0x69, 0x81);

    /// Security condition not satisfied (69 82)
    pub const SECURITY_CONDITION_NOT_SATISFIED: StatusWord = StatusWord::new(0x69, 0x82);

    /// Authentication method blocked (69 83)
    pub const AUTHENTICATION_METHOD_BLOCKED: StatusWord = StatusWord::new(0x69, 0x83);

    /// Conditions of use not satisfied (69 85)
    pub const CONDITIONS_NOT_SATISFIED: StatusWord = StatusWord::new(0x69, 0x85);

    /// Command not allowed (69 86)
    pub const COMMAND_NOT_ALLOWED: StatusWord = StatusWord::new(0x69, 0x86);

    /// Incorrect parameter (data field) (6A 80)
    pub const INCORRECT_DATA: StatusWord = StatusWord::new(0x6A, 0x80);

    /// Function not supported (6A 81)
    pub const FUNCTION_NOT_SUPPORTED: StatusWord = StatusWord::new(0x6A, 0x81);

    /// File or application not found (6A 82)
    pub const FILE_NOT_FOUND: StatusWord = StatusWord::new(0x6A, 0x82);

    /// Record not found (6A 83)
    pub const RECORD_NOT_FOUND: StatusWord = StatusWord::new(0x6A, 0x83);

    /// Not enough memory space in the file (6A 84)
    pub const NOT_ENOUGH_MEMORY: StatusWord = StatusWord::new(0x6A, 0x84);

    /// Incorrect parameters P1-P2 (6A 86)
    pub const INCORRECT_P1P2: StatusWord = StatusWord::new(0x6A, 0x86);

    /// Referenced data not found (6A 88)
    pub const REFERENCED_DATA_NOT_FOUND: StatusWord = StatusWord::new(0x6A, 0x88);

    /// Wrong parameters P1-P2 (6B 00)
    pub const WRONG_P1P2: StatusWord = StatusWord::new(0x6B, 0x00);

    /// Invalid instruction (6D 00)
    pub const INVALID_INSTRUCTION: StatusWord = StatusWord::new(0x6D, 0x00);

    /// Class not supported (6E 00)
    pub const CLASS_NOT_SUPPORTED: StatusWord = StatusWord::new(0x6E, 0x00);

    /// No precise diagnosis (6F 00)
    pub const NO_PRECISE_DIAGNOSIS: StatusWord = StatusWord::new(0x6F, 0x00);
}
