//! ISO/IEC 7816-4 commands, responses and card protocol engine
//!
//! This crate provides the building blocks for talking to smart cards:
//!
//! - [`command`]: APDU framing for all five command cases, short and extended
//! - [`response`]: response parsing and the status word taxonomy
//! - [`transport`]: the byte pipe a card sits behind, plus optional capabilities
//! - [`card`]: the engine that follows `61 XX` chaining and scopes transactions
//! - [`historical`] and [`atr`]: answer-to-reset decoding
//! - [`aid`] and [`instruction`]: well-known application identifiers and INS codes
//!
//! TLV codecs live in [`iso7816_encoding`] and are re-exported as [`encoding`].
//!
//! ```
//! use iso7816_core::{Command, parse_response};
//!
//! let rid = vec![0xA0, 0x00, 0x00, 0x03, 0x08];
//! let select = Command::new_with_data_and_le(0x00, 0xA4, 0x04, 0x00, rid, 256);
//! assert_eq!(
//!     select.to_bytes().unwrap().as_ref(),
//!     &[0x00, 0xA4, 0x04, 0x00, 0x05, 0xA0, 0x00, 0x00, 0x03, 0x08, 0x00]
//! );
//!
//! let response = parse_response(&[0x6A, 0x82]).unwrap();
//! assert_eq!(response.status().description(), Some("file or application not found"));
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};
pub use iso7816_encoding as encoding;

pub mod aid;
pub mod atr;
pub mod card;
pub mod command;
pub mod error;
pub mod historical;
pub mod instruction;
pub mod response;
pub mod transport;

pub use atr::Atr;
pub use card::{Card, CardConfig, Transaction};
pub use command::{ApduCase, Command, ExpectedLength, encode as encode_command};
pub use error::{Error, Result};
pub use historical::{HistoricalBytes, decode_historical_bytes};
pub use instruction::Instruction;
pub use iso7816_encoding::{
    decode_ber, decode_compact, decode_simple, encode_ber, encode_compact, encode_simple,
};
pub use response::status::{StatusCategory, StatusWord};
pub use response::{Response, parse_response};
pub use transport::CardTransport;

/// Prelude module containing commonly used traits and types
pub mod prelude {
    // Core types
    pub use crate::{Bytes, BytesMut, Error, Result};

    // Command related
    pub use crate::command::{Command, ExpectedLength};
    pub use crate::instruction::Instruction;

    // Response related
    pub use crate::response::Response;
    pub use crate::response::status::{StatusWord, common as status};

    // Transport layer
    pub use crate::transport::{CardTransport, Metadata, ReaderName, Reconnect, TransportError};

    // Engine
    pub use crate::card::{Card, CardConfig, Transaction};

    // TLV
    pub use crate::encoding::{Tag, TagValue, TagValues};
}
