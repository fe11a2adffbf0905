//! Error type shared by the TLV codecs

/// Errors raised while encoding or decoding TLV data
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The buffer ended before the declared tag, length or value
    #[error("Truncated TLV: needed {needed} bytes, {available} available")]
    Truncated {
        /// Bytes required by the declared structure
        needed: usize,
        /// Bytes actually left in the buffer
        available: usize,
    },

    /// The tag is reserved or malformed for the encoding in use
    #[error("Invalid tag {0:#04X}")]
    InvalidTag(u32),

    /// The tag does not fit the encoding
    #[error("Tag {tag:#X} is too large for this encoding (max {max:#X})")]
    TagTooLarge {
        /// Offending tag
        tag: u32,
        /// Largest tag the encoding can carry
        max: u32,
    },

    /// The value does not fit the encoding's length field
    #[error("Value of {len} bytes is too large for this encoding (max {max})")]
    ValueTooLarge {
        /// Length of the offending value
        len: usize,
        /// Largest value the encoding can carry
        max: usize,
    },

    /// The buffer is malformed beyond a simple length mismatch
    #[error("Malformed TLV: {0}")]
    Structural(&'static str),
}

impl Error {
    /// Create a truncation error
    pub const fn truncated(needed: usize, available: usize) -> Self {
        Self::Truncated { needed, available }
    }

    /// Whether this error is a length or range violation rather than a structural one
    pub const fn is_invalid_length(&self) -> bool {
        !matches!(self, Self::Structural(_))
    }
}
