//! BER-TLV codec (ISO/IEC 7816-4 §5.2.2)
//!
//! Lengths use the short form below `0x80` and the long form `81`..`84` followed by
//! up to four big-endian length bytes. The indefinite form (`80`) is not used by
//! ISO 7816-4 and is rejected.

use bytes::{BufMut, Bytes, BytesMut};

use super::tag::{MAX_TAG_LEN, Tag};
use super::{TagValue, TagValues, Value};
use crate::Error;

/// Deepest nesting of constructed objects the decoder follows
pub const MAX_DEPTH: usize = 32;

/// Encode a list of objects as BER-TLV
///
/// Objects with children are emitted with the constructed bit set and primitive
/// objects holding a value with it cleared, whatever the bit was in their tag.
pub fn encode(values: &[TagValue]) -> Result<Bytes, Error> {
    let mut buf = BytesMut::new();
    for value in values {
        encode_value(value, &mut buf)?;
    }
    Ok(buf.freeze())
}

/// Decode a buffer holding zero or more BER-TLV objects
pub fn decode(data: &[u8]) -> Result<TagValues, Error> {
    decode_bytes(&Bytes::copy_from_slice(data))
}

/// Decode BER-TLV objects, sharing value storage with `data`
pub fn decode_bytes(data: &Bytes) -> Result<TagValues, Error> {
    decode_level(data, 0)
}

fn encode_value(tv: &TagValue, buf: &mut BytesMut) -> Result<(), Error> {
    match &tv.value {
        Value::Constructed(children) if !children.is_empty() => {
            let mut inner = BytesMut::new();
            for child in children {
                encode_value(child, &mut inner)?;
            }
            write_header(tv.tag.with_constructed(), inner.len(), buf)?;
            buf.put_slice(&inner);
        }
        Value::Primitive(bytes) if !bytes.is_empty() => {
            write_header(tv.tag.without_constructed(), bytes.len(), buf)?;
            buf.put_slice(bytes);
        }
        Value::Constructed(_) | Value::Primitive(_) => write_header(tv.tag, 0, buf)?,
    }
    Ok(())
}

fn write_header(tag: Tag, len: usize, buf: &mut BytesMut) -> Result<(), Error> {
    tag.validate_ber()?;
    buf.put_slice(&tag.to_bytes());
    encode_length(len, buf)
}

/// Append a BER length field
pub fn encode_length(len: usize, buf: &mut BytesMut) -> Result<(), Error> {
    match len {
        0..=0x7F => buf.put_u8(len as u8),
        0x80..=0xFF => {
            buf.put_u8(0x81);
            buf.put_u8(len as u8);
        }
        0x100..=0xFFFF => {
            buf.put_u8(0x82);
            buf.put_u16(len as u16);
        }
        0x1_0000..=0xFF_FFFF => {
            buf.put_u8(0x83);
            buf.put_uint(len as u64, 3);
        }
        _ => {
            let len = u32::try_from(len).map_err(|_| Error::ValueTooLarge {
                len,
                max: u32::MAX as usize,
            })?;
            buf.put_u8(0x84);
            buf.put_u32(len);
        }
    }
    Ok(())
}

/// Read a BER tag from the start of `buf`, returning it and its size
pub fn decode_tag(buf: &[u8]) -> Result<(Tag, usize), Error> {
    let first = *buf.first().ok_or(Error::truncated(1, 0))?;
    let mut raw = u32::from(first);
    if first & 0x1F != 0x1F {
        return Ok((Tag(raw), 1));
    }

    let mut consumed = 1;
    loop {
        if consumed == MAX_TAG_LEN {
            return Err(Error::Structural("tag longer than four bytes"));
        }
        let byte = *buf
            .get(consumed)
            .ok_or(Error::truncated(consumed + 1, buf.len()))?;
        raw = (raw << 8) | u32::from(byte);
        consumed += 1;
        if byte & 0x80 == 0 {
            return Ok((Tag(raw), consumed));
        }
    }
}

/// Read a BER length field from the start of `buf`, returning it and its size
pub fn decode_length(buf: &[u8]) -> Result<(usize, usize), Error> {
    let first = *buf.first().ok_or(Error::truncated(1, 0))?;
    if first < 0x80 {
        return Ok((usize::from(first), 1));
    }

    let n = usize::from(first & 0x7F);
    if n == 0 {
        return Err(Error::Structural("indefinite length form"));
    }
    if n > 4 {
        return Err(Error::Structural("length field longer than four bytes"));
    }

    let bytes = buf
        .get(1..=n)
        .ok_or(Error::truncated(n + 1, buf.len()))?;
    let len = bytes
        .iter()
        .fold(0usize, |acc, &byte| (acc << 8) | usize::from(byte));
    Ok((len, n + 1))
}

fn decode_level(data: &Bytes, depth: usize) -> Result<TagValues, Error> {
    if depth > MAX_DEPTH {
        return Err(Error::Structural("constructed objects nested too deeply"));
    }

    let mut values = TagValues::new();
    let mut offset = 0;

    while offset < data.len() {
        let rest = &data[offset..];
        let (tag, tag_len) = decode_tag(rest)?;
        let (len, len_len) = decode_length(&rest[tag_len..])?;

        let header = tag_len + len_len;
        let needed = header.saturating_add(len);
        if needed > rest.len() {
            return Err(Error::truncated(needed, rest.len()));
        }

        let value = data.slice(offset + header..offset + needed);
        let tv = if tag.is_constructed() {
            TagValue::constructed(tag, decode_level(&value, depth + 1)?.into_inner())
        } else {
            TagValue::new(tag, value)
        };

        values.put(tv);
        offset += needed;
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlv::tag::Class;
    use hex_literal::hex;

    fn universal(number: u32) -> Tag {
        Tag::ber(number, Class::Universal, false).unwrap()
    }

    #[test]
    fn test_encode_primitive_lengths() {
        let long1 = vec![0u8; 0x80];
        let long2 = vec![0u8; 0x100];

        let values = vec![
            TagValue::new(0x01u8, vec![0x10, 0x11, 0x12, 0x13]),
            TagValue::new(0x02u8, long1.clone()),
            TagValue::new(0x03u8, long2.clone()),
            TagValue::new(0x08u8, vec![0x20, 0x21, 0x22]),
            TagValue::new(universal(0x100), vec![0x20]),
        ];

        let mut expected = hex!("01 04 10 11 12 13 02 81 80").to_vec();
        expected.extend_from_slice(&long1);
        expected.extend_from_slice(&hex!("03 82 01 00"));
        expected.extend_from_slice(&long2);
        expected.extend_from_slice(&hex!("08 03 20 21 22 1F 82 00 01 20"));

        let encoded = encode(&values).unwrap();
        assert_eq!(encoded.as_ref(), expected.as_slice());
        assert_eq!(decode(&encoded).unwrap().into_inner(), values);
    }

    #[test]
    fn test_encode_nested_forces_constructed_bit() {
        let children = || {
            vec![
                TagValue::new(0x02u8, vec![3, 4]),
                TagValue::new(0x03u8, vec![5, 6, 7]),
            ]
        };
        let values = vec![
            TagValue::constructed(0x01u8, children()),
            TagValue::constructed(0x21u8, children()),
            TagValue::constructed(universal(0x33), children()),
        ];

        let encoded = encode(&values).unwrap();
        assert_eq!(
            encoded.as_ref(),
            hex!(
                "21 09 02 02 03 04 03 03 05 06 07"
                "21 09 02 02 03 04 03 03 05 06 07"
                "3F 33 09 02 02 03 04 03 03 05 06 07"
            )
        );

        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded[0].tag, Tag(0x21));
        assert_eq!(decoded[2].tag, Tag(0x3F33));
        assert_eq!(decoded.into_inner(), values);
    }

    #[test]
    fn test_three_levels_deep() {
        let values = vec![TagValue::constructed(
            0x70u8,
            vec![
                TagValue::constructed(
                    0x61u8,
                    vec![TagValue::constructed(
                        0xA5u8,
                        vec![TagValue::new(0x9F38u32, vec![0x9F, 0x1A, 0x02])],
                    )],
                ),
                TagValue::new(0x5Au8, vec![0x12, 0x34]),
            ],
        )];

        let encoded = encode(&values).unwrap();
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.into_inner(), values);
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(decode(&[0x11]), Err(Error::truncated(1, 0)));
        assert_eq!(decode(&hex!("01 04 10 11")), Err(Error::truncated(6, 4)));
        assert_eq!(decode(&hex!("1F 82")), Err(Error::truncated(3, 2)));
        assert_eq!(decode(&hex!("02 82 01")), Err(Error::truncated(3, 2)));
        assert!(decode(&hex!("21 04 02 05 01 02")).unwrap_err().is_invalid_length());
    }

    #[test]
    fn test_decode_structural_errors() {
        assert_eq!(
            decode(&hex!("30 80 00 00")),
            Err(Error::Structural("indefinite length form"))
        );
        assert!(matches!(
            decode(&hex!("04 85 00 00 00 00 01 AA")),
            Err(Error::Structural(_))
        ));
        assert!(matches!(
            decode(&hex!("1F 81 81 81 01 00")),
            Err(Error::Structural(_))
        ));
    }

    #[test]
    fn test_decode_depth_limit() {
        // 40 constructed levels around a single primitive
        let mut encoded = hex!("04 01 AA").to_vec();
        for _ in 0..40 {
            let mut outer = vec![0x30, encoded.len() as u8];
            outer.extend_from_slice(&encoded);
            encoded = outer;
        }
        assert_eq!(
            decode(&encoded).unwrap_err(),
            Error::Structural("constructed objects nested too deeply")
        );
    }

    #[test]
    fn test_encode_primitive_clears_constructed_bit() {
        let values = vec![TagValue::new(0x21u8, vec![0x01, 0x02])];
        let encoded = encode(&values).unwrap();
        assert_eq!(encoded.as_ref(), hex!("01 02 01 02"));

        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded[0].tag, Tag(0x01));
        assert_eq!(decoded.into_inner(), values);

        // An empty value keeps its tag as given
        assert_eq!(encode(&[TagValue::empty(0x21u8)]).unwrap().as_ref(), hex!("21 00"));
    }

    #[test]
    fn test_encode_rejects_malformed_tag() {
        let err = encode(&[TagValue::new(0x1Fu8, vec![0x01])]).unwrap_err();
        assert_eq!(err, Error::InvalidTag(0x1F));
    }

    #[test]
    fn test_length_forms() {
        let mut buf = BytesMut::new();
        encode_length(0x7F, &mut buf).unwrap();
        encode_length(0x1_0000, &mut buf).unwrap();
        encode_length(0x100_0000, &mut buf).unwrap();
        assert_eq!(buf.as_ref(), hex!("7F 83 01 00 00 84 01 00 00 00"));

        assert_eq!(decode_length(&hex!("83 01 00 00")).unwrap(), (0x1_0000, 4));
        assert_eq!(decode_length(&hex!("84 01 00 00 00")).unwrap(), (0x100_0000, 5));
    }
}
