//! TLV (tag-length-value) codecs for ISO/IEC 7816-4
//!
//! Smart cards return structured data in one of three TLV flavours:
//!
//! - **BER-TLV** ([`tlv::ber`]): ASN.1 style tags with class and constructed bits,
//!   multi-byte tag numbers and short/long form lengths. Constructed values nest.
//! - **SIMPLE-TLV** ([`tlv::simple`]): a single tag byte (`01`..`FE`) followed by a one
//!   or three byte length.
//! - **COMPACT-TLV** ([`tlv::compact`]): tag and length packed into the nibbles of a
//!   single byte, used by the ATR historical bytes.
//!
//! All three decode into the same [`TagValue`] tree so callers can walk card data
//! without caring which encoding carried it.
//!
//! ```
//! use iso7816_encoding::{Tag, TagValue, decode_ber, encode_ber};
//!
//! let fci = TagValue::constructed(
//!     Tag::new(0x6F),
//!     vec![TagValue::new(Tag::new(0x84), vec![0xA0, 0x00, 0x00, 0x03, 0x08])],
//! );
//! let encoded = encode_ber(&[fci.clone()]).unwrap();
//! assert_eq!(decode_ber(&encoded).unwrap()[0], fci);
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod tlv;

pub use error::Error;
pub use tlv::ber::{decode as decode_ber, encode as encode_ber};
pub use tlv::compact::{decode as decode_compact, encode as encode_compact};
pub use tlv::simple::{decode as decode_simple, encode as encode_simple};
pub use tlv::tag::{Class, Tag};
pub use tlv::{TagValue, TagValues, Value};
