//! COMPACT-TLV codec (ISO/IEC 7816-4 §8.1.1.2)
//!
//! The tag sits in the high nibble and the length in the low nibble of a single
//! byte, so both are limited to 15.

use bytes::{BufMut, Bytes, BytesMut};

use super::{TagValue, TagValues, Value};
use crate::Error;

/// Largest tag and value length a COMPACT-TLV object can carry
pub const MAX_NIBBLE: usize = 0x0F;

/// Encode a list of objects as COMPACT-TLV
pub fn encode(values: &[TagValue]) -> Result<Bytes, Error> {
    let mut buf = BytesMut::new();

    for tv in values {
        let tag = tv.tag.raw();
        if tag > MAX_NIBBLE as u32 {
            return Err(Error::TagTooLarge {
                tag,
                max: MAX_NIBBLE as u32,
            });
        }

        let value: &[u8] = match &tv.value {
            Value::Primitive(bytes) => bytes,
            Value::Constructed(children) if children.is_empty() => &[],
            Value::Constructed(_) => {
                return Err(Error::Structural("COMPACT-TLV objects cannot nest"));
            }
        };
        if value.len() > MAX_NIBBLE {
            return Err(Error::ValueTooLarge {
                len: value.len(),
                max: MAX_NIBBLE,
            });
        }

        buf.put_u8(((tag as u8) << 4) | value.len() as u8);
        buf.put_slice(value);
    }

    Ok(buf.freeze())
}

/// Decode a buffer holding zero or more COMPACT-TLV objects
pub fn decode(data: &[u8]) -> Result<TagValues, Error> {
    let data = Bytes::copy_from_slice(data);
    let mut values = TagValues::new();
    let mut offset = 0;

    while offset < data.len() {
        let header = data[offset];
        let tag = header >> 4;
        let len = usize::from(header & 0x0F);

        let available = data.len() - offset;
        if 1 + len > available {
            return Err(Error::truncated(1 + len, available));
        }

        values.put(TagValue::new(tag, data.slice(offset + 1..offset + 1 + len)));
        offset += 1 + len;
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_encode_decode() {
        let values = vec![
            TagValue::new(0x1u8, vec![0x10, 0x11, 0x12, 0x13]),
            TagValue::new(0x8u8, vec![0x20, 0x21, 0x22]),
            TagValue::empty(0x3u8),
        ];
        let encoded = encode(&values).unwrap();
        assert_eq!(encoded.as_ref(), hex!("14 10 11 12 13 83 20 21 22 30"));
        assert_eq!(decode(&encoded).unwrap().into_inner(), values);
    }

    #[test]
    fn test_encode_rejects_out_of_range() {
        assert_eq!(
            encode(&[TagValue::new(0x10u8, vec![0x01])]),
            Err(Error::TagTooLarge { tag: 0x10, max: 0x0F })
        );
        assert_eq!(
            encode(&[TagValue::new(0x1u8, vec![0u8; 16])]),
            Err(Error::ValueTooLarge { len: 16, max: 0x0F })
        );
    }

    #[test]
    fn test_decode_truncated() {
        assert!(decode(&[]).unwrap().is_empty());
        assert_eq!(decode(&[0x11]), Err(Error::truncated(2, 1)));
        assert_eq!(decode(&hex!("14 10 11")), Err(Error::truncated(5, 3)));
    }
}
