//! APDU response definitions
//!
//! This module provides the response type and its parser according to
//! ISO/IEC 7816-4 §5.1: any data bytes followed by the two status bytes.

pub mod error;
pub mod status;
pub mod utils;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use error::{ResponseError, StatusError};
use status::StatusWord;

/// Basic APDU response structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response payload data
    data: Bytes,
    /// Status word
    status: StatusWord,
}

impl Response {
    /// Create a new response with payload and status
    pub fn new(data: impl Into<Bytes>, status: impl Into<StatusWord>) -> Self {
        Self {
            data: data.into(),
            status: status.into(),
        }
    }

    /// Create a success response
    pub const fn success(data: Bytes) -> Self {
        Self {
            data,
            status: StatusWord::new(0x90, 0x00),
        }
    }

    /// Parse response from raw bytes (including status word)
    ///
    /// The payload shares storage with `raw`.
    pub fn from_bytes(raw: &Bytes) -> Result<Self, ResponseError> {
        let (status, payload) = utils::extract_status_and_payload(raw)?;

        trace!(
            sw1 = format_args!("{:#04x}", status.sw1),
            sw2 = format_args!("{:#04x}", status.sw2),
            payload_len = payload.len(),
            "Parsed APDU response"
        );

        Ok(Self {
            data: raw.slice(..payload.len()),
            status,
        })
    }

    /// Response payload data
    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    /// Status word
    pub const fn status(&self) -> StatusWord {
        self.status
    }

    /// First status byte
    pub const fn sw1(&self) -> u8 {
        self.status.sw1
    }

    /// Second status byte
    pub const fn sw2(&self) -> u8 {
        self.status.sw2
    }

    /// Check if the response indicates success
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Split into payload and status word
    pub fn into_parts(self) -> (Bytes, StatusWord) {
        (self.data, self.status)
    }

    /// Convert to the payload, or the status as an error
    pub fn into_result(self) -> Result<Bytes, StatusError> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(self.status.into())
        }
    }
}

/// Split a raw response into data and status word
///
/// Accepts 2 to 65538 bytes; the last two are always SW1 and SW2.
pub fn parse_response(raw: &[u8]) -> Result<Response, ResponseError> {
    Response::from_bytes(&Bytes::copy_from_slice(raw))
}

impl TryFrom<&[u8]> for Response {
    type Error = ResponseError;

    fn try_from(data: &[u8]) -> Result<Self, ResponseError> {
        parse_response(data)
    }
}

impl TryFrom<Bytes> for Response {
    type Error = ResponseError;

    fn try_from(data: Bytes) -> Result<Self, ResponseError> {
        Self::from_bytes(&data)
    }
}

impl From<Response> for Bytes {
    fn from(response: Response) -> Self {
        let mut buf = BytesMut::with_capacity(response.data.len() + 2);
        buf.put_slice(&response.data);
        buf.put_u8(response.status.sw1);
        buf.put_u8(response.status.sw2);
        buf.freeze()
    }
}
