//! SIMPLE-TLV codec (ISO/IEC 7816-4 §5.2.1)
//!
//! Each object is a tag byte in `01`..`FE`, a length of one byte (`00`..`FE`) or
//! `FF` followed by two big-endian bytes, then the value. Objects flagged with
//! [`TagValue::skip_length`] are written without a length field.

use bytes::{BufMut, Bytes, BytesMut};

use super::{TagValue, TagValues, Value};
use crate::Error;

/// Largest value a SIMPLE-TLV object can carry
pub const MAX_VALUE_LEN: usize = 0xFFFF;

/// Length byte announcing a three byte length field
const LONG_LENGTH: u8 = 0xFF;

/// Encode a list of objects as SIMPLE-TLV
pub fn encode(values: &[TagValue]) -> Result<Bytes, Error> {
    let mut buf = BytesMut::new();

    for tv in values {
        let tag = tv.tag.raw();
        if tag > 0xFF {
            return Err(Error::TagTooLarge { tag, max: 0xFE });
        }
        if tag == 0x00 || tag == 0xFF {
            return Err(Error::InvalidTag(tag));
        }

        let value: &[u8] = match &tv.value {
            Value::Primitive(bytes) => bytes,
            Value::Constructed(children) if children.is_empty() => &[],
            Value::Constructed(_) => {
                return Err(Error::Structural("SIMPLE-TLV objects cannot nest"));
            }
        };
        if value.len() > MAX_VALUE_LEN {
            return Err(Error::ValueTooLarge {
                len: value.len(),
                max: MAX_VALUE_LEN,
            });
        }

        buf.put_u8(tag as u8);
        if !tv.skip_length {
            if value.len() < usize::from(LONG_LENGTH) {
                buf.put_u8(value.len() as u8);
            } else {
                buf.put_u8(LONG_LENGTH);
                buf.put_u16(value.len() as u16);
            }
        }
        buf.put_slice(value);
    }

    Ok(buf.freeze())
}

/// Decode a buffer holding zero or more SIMPLE-TLV objects
pub fn decode(data: &[u8]) -> Result<TagValues, Error> {
    let data = Bytes::copy_from_slice(data);
    let mut values = TagValues::new();
    let mut offset = 0;

    while offset < data.len() {
        let rest = &data[offset..];
        if rest.len() < 2 {
            return Err(Error::truncated(2, rest.len()));
        }

        let tag = rest[0];
        if tag == 0x00 || tag == 0xFF {
            return Err(Error::InvalidTag(u32::from(tag)));
        }

        let (header, len) = if rest[1] == LONG_LENGTH {
            if rest.len() < 4 {
                return Err(Error::truncated(4, rest.len()));
            }
            (4, usize::from(u16::from_be_bytes([rest[2], rest[3]])))
        } else {
            (2, usize::from(rest[1]))
        };

        let needed = header + len;
        if needed > rest.len() {
            return Err(Error::truncated(needed, rest.len()));
        }

        let value = data.slice(offset + header..offset + needed);
        values.put(TagValue::new(tag, value));
        offset += needed;
    }

    Ok(values)
}
