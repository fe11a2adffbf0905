//! BER-TLV tags
//!
//! A [`Tag`] holds the tag exactly as it appears on the wire, big-endian, in up to
//! four bytes. `0x6F` is a one byte tag, `0x9F38` a two byte tag and `0x1F8200` the
//! universal tag number 256. The leading byte carries the class (bits 8-7) and the
//! constructed flag (bit 6); a leading byte whose low five bits are all set is
//! followed by the tag number in base 128, most significant group first, with bit 8
//! of every byte but the last set.
//!
//! SIMPLE-TLV and COMPACT-TLV reuse the type for their plain numeric tags.

use std::fmt;

use crate::Error;

/// Maximum number of bytes a BER tag may occupy
pub const MAX_TAG_LEN: usize = 4;

/// Low five bits of a leading byte announcing a multi-byte tag number
const ESCAPE: u8 = 0x1F;

/// Constructed flag in the leading byte
const CONSTRUCTED: u8 = 0x20;

/// Largest tag number that fits in three base-128 groups
const MAX_TAG_NUMBER: u32 = (1 << 21) - 1;

/// Tag class, taken from the two high bits of the leading byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Class {
    /// Universal class (`00`)
    Universal = 0b00,
    /// Application class (`01`)
    Application = 0b01,
    /// Context-specific class (`10`)
    Context = 0b10,
    /// Private class (`11`)
    Private = 0b11,
}

impl Class {
    /// Decode the class from a leading tag byte
    pub const fn from_leading_byte(byte: u8) -> Self {
        match byte >> 6 {
            0b00 => Self::Universal,
            0b01 => Self::Application,
            0b10 => Self::Context,
            _ => Self::Private,
        }
    }
}

/// A tag as encoded on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Tag(pub u32);

impl Tag {
    /// Wrap raw tag bytes
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Build a BER tag from its number, class and constructed flag
    ///
    /// Numbers below 31 pack into the leading byte; larger numbers use the escape
    /// form and fail with [`Error::TagTooLarge`] beyond the four byte limit.
    pub const fn ber(number: u32, class: Class, constructed: bool) -> Result<Self, Error> {
        let mut leading = (class as u8) << 6;
        if constructed {
            leading |= CONSTRUCTED;
        }

        if number < ESCAPE as u32 {
            return Ok(Self((leading | number as u8) as u32));
        }
        if number > MAX_TAG_NUMBER {
            return Err(Error::TagTooLarge {
                tag: number,
                max: MAX_TAG_NUMBER,
            });
        }

        let groups = if number < 1 << 7 {
            1
        } else if number < 1 << 14 {
            2
        } else {
            3
        };

        let mut raw = (leading | ESCAPE) as u32;
        let mut i = groups;
        while i > 0 {
            i -= 1;
            let mut byte = ((number >> (7 * i)) & 0x7F) as u8;
            if i > 0 {
                byte |= 0x80;
            }
            raw = (raw << 8) | byte as u32;
        }

        Ok(Self(raw))
    }

    /// Raw tag bytes as an integer
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Number of bytes the tag occupies on the wire
    pub const fn encoded_len(self) -> usize {
        match self.0 {
            0..=0xFF => 1,
            0x100..=0xFFFF => 2,
            0x1_0000..=0xFF_FFFF => 3,
            _ => 4,
        }
    }

    /// The first byte on the wire
    pub const fn leading_byte(self) -> u8 {
        (self.0 >> (8 * (self.encoded_len() - 1))) as u8
    }

    /// Tag class
    pub const fn class(self) -> Class {
        Class::from_leading_byte(self.leading_byte())
    }

    /// Whether the constructed bit is set
    pub const fn is_constructed(self) -> bool {
        self.leading_byte() & CONSTRUCTED != 0
    }

    /// Tag number with the class and constructed bits stripped
    pub const fn number(self) -> u32 {
        let leading = self.leading_byte();
        if leading & ESCAPE != ESCAPE {
            return (leading & ESCAPE) as u32;
        }

        let mut number = 0;
        let mut i = self.encoded_len() - 1;
        while i > 0 {
            i -= 1;
            number = (number << 7) | ((self.0 >> (8 * i)) & 0x7F);
        }
        number
    }

    /// The same tag with the constructed bit set
    pub const fn with_constructed(self) -> Self {
        let shift = 8 * (self.encoded_len() - 1);
        Self(self.0 | ((CONSTRUCTED as u32) << shift))
    }

    /// The same tag with the constructed bit cleared
    pub const fn without_constructed(self) -> Self {
        let shift = 8 * (self.encoded_len() - 1);
        Self(self.0 & !((CONSTRUCTED as u32) << shift))
    }

    /// Compare two tags ignoring the constructed bit
    pub const fn matches(self, other: Self) -> bool {
        self.without_constructed().0 == other.without_constructed().0
    }

    /// Tag bytes in wire order
    pub fn to_bytes(self) -> Vec<u8> {
        self.0.to_be_bytes()[MAX_TAG_LEN - self.encoded_len()..].to_vec()
    }

    /// Check the tag follows the BER continuation rules
    pub fn validate_ber(self) -> Result<(), Error> {
        let bytes = self.to_bytes();
        let (first, rest) = match bytes.split_first() {
            Some(split) => split,
            None => return Err(Error::InvalidTag(self.0)),
        };

        let valid = match rest.split_last() {
            None => first & ESCAPE != ESCAPE,
            Some((last, middle)) => {
                first & ESCAPE == ESCAPE
                    && last & 0x80 == 0
                    && middle.iter().all(|byte| byte & 0x80 != 0)
            }
        };

        if valid {
            Ok(())
        } else {
            Err(Error::InvalidTag(self.0))
        }
    }
}

impl From<u32> for Tag {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<u8> for Tag {
    fn from(raw: u8) -> Self {
        Self(u32::from(raw))
    }
}

impl From<Tag> for u32 {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.to_bytes() {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}
