//! APDU command definitions
//!
//! This module provides the command descriptor and its byte encoding
//! according to ISO/IEC 7816-4 §5.1.
//!
//! The short form is always preferred. Extended Lc/Le fields are only emitted when
//! the command data exceeds 255 bytes or the expected length exceeds 256 bytes,
//! since many cards reject extended APDUs outright.

pub mod error;

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

pub use error::CommandError;

/// Expected response length (`Ne`), zero meaning no response data
pub type ExpectedLength = u32;

/// Largest data field a short Lc can describe
pub const MAX_SHORT_DATA: usize = 255;

/// Largest `Ne` a short Le can describe
pub const MAX_SHORT_NE: ExpectedLength = 256;

/// Largest data field an extended Lc can describe
pub const MAX_EXTENDED_DATA: usize = 65_535;

/// Largest `Ne` an extended Le can describe
pub const MAX_EXTENDED_NE: ExpectedLength = 65_536;

/// The seven ISO 7816-3 command layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApduCase {
    /// Header only
    Case1,
    /// Header and a one byte Le
    Case2Short,
    /// Header and a three byte Le
    Case2Extended,
    /// Header, one byte Lc and data
    Case3Short,
    /// Header, three byte Lc and data
    Case3Extended,
    /// Header, one byte Lc, data, one byte Le
    Case4Short,
    /// Header, three byte Lc, data, two byte Le
    Case4Extended,
}

impl ApduCase {
    /// Select the layout for a data length and `Ne`
    pub const fn select(data_len: usize, ne: ExpectedLength) -> Result<Self, CommandError> {
        if data_len > MAX_EXTENDED_DATA {
            return Err(CommandError::DataTooLong(data_len));
        }
        if ne > MAX_EXTENDED_NE {
            return Err(CommandError::ExpectedLengthTooLarge(ne));
        }

        let extended = data_len > MAX_SHORT_DATA || ne > MAX_SHORT_NE;
        Ok(match (data_len, ne, extended) {
            (0, 0, _) => Self::Case1,
            (0, _, false) => Self::Case2Short,
            (0, _, true) => Self::Case2Extended,
            (_, 0, false) => Self::Case3Short,
            (_, 0, true) => Self::Case3Extended,
            (_, _, false) => Self::Case4Short,
            (_, _, true) => Self::Case4Extended,
        })
    }

    /// Whether the layout uses extended length fields
    pub const fn is_extended(self) -> bool {
        matches!(
            self,
            Self::Case2Extended | Self::Case3Extended | Self::Case4Extended
        )
    }
}

/// Serialize a command into its wire format
///
/// Fails if the data is longer than 65535 bytes or `ne` is above 65536.
pub fn encode(
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    data: &[u8],
    ne: ExpectedLength,
) -> Result<Bytes, CommandError> {
    let case = ApduCase::select(data.len(), ne)?;

    let mut buffer = BytesMut::with_capacity(4 + 3 + data.len() + 3);
    buffer.put_slice(&[cla, ins, p1, p2]);

    match case {
        ApduCase::Case1 => {}
        ApduCase::Case2Short => buffer.put_u8(short_le(ne)),
        ApduCase::Case2Extended => {
            buffer.put_u8(0x00);
            buffer.put_u16(extended_le(ne));
        }
        ApduCase::Case3Short => {
            buffer.put_u8(data.len() as u8);
            buffer.put_slice(data);
        }
        ApduCase::Case3Extended => {
            buffer.put_u8(0x00);
            buffer.put_u16(data.len() as u16);
            buffer.put_slice(data);
        }
        ApduCase::Case4Short => {
            buffer.put_u8(data.len() as u8);
            buffer.put_slice(data);
            buffer.put_u8(short_le(ne));
        }
        ApduCase::Case4Extended => {
            buffer.put_u8(0x00);
            buffer.put_u16(data.len() as u16);
            buffer.put_slice(data);
            buffer.put_u16(extended_le(ne));
        }
    }

    Ok(buffer.freeze())
}

/// One byte Le, 256 encoded as `00`
const fn short_le(ne: ExpectedLength) -> u8 {
    if ne == MAX_SHORT_NE { 0x00 } else { ne as u8 }
}

/// Two byte Le, 65536 encoded as `00 00`
const fn extended_le(ne: ExpectedLength) -> u16 {
    if ne == MAX_EXTENDED_NE { 0x0000 } else { ne as u16 }
}

/// Generic APDU command structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command class byte
    pub cla: u8,
    /// Instruction byte
    pub ins: u8,
    /// Parameter 1
    pub p1: u8,
    /// Parameter 2
    pub p2: u8,
    /// Command data, empty when absent
    pub data: Bytes,
    /// Expected response length, zero when absent
    pub ne: ExpectedLength,
}

impl Command {
    /// Create a new command with just the header bytes
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Bytes::new(),
            ne: 0,
        }
    }

    /// Create a new command with expected response length
    pub const fn new_with_le(cla: u8, ins: u8, p1: u8, p2: u8, ne: ExpectedLength) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Bytes::new(),
            ne,
        }
    }

    /// Create a new command with data
    pub fn new_with_data(cla: u8, ins: u8, p1: u8, p2: u8, data: impl Into<Bytes>) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: data.into(),
            ne: 0,
        }
    }

    /// Create a new command with data and expected response length
    pub fn new_with_data_and_le(
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        data: impl Into<Bytes>,
        ne: ExpectedLength,
    ) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: data.into(),
            ne,
        }
    }

    /// Set command data
    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    /// Set expected response length
    pub const fn with_le(mut self, ne: ExpectedLength) -> Self {
        self.ne = ne;
        self
    }

    /// Command class (CLA)
    pub const fn class(&self) -> u8 {
        self.cla
    }

    /// Instruction code (INS)
    pub const fn instruction(&self) -> u8 {
        self.ins
    }

    /// Command payload data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Expected response length
    pub const fn expected_length(&self) -> ExpectedLength {
        self.ne
    }

    /// Layout [`Self::to_bytes`] will use
    pub fn case(&self) -> Result<ApduCase, CommandError> {
        ApduCase::select(self.data.len(), self.ne)
    }

    /// Convert to raw APDU bytes
    pub fn to_bytes(&self) -> Result<Bytes, CommandError> {
        encode(self.cla, self.ins, self.p1, self.p2, &self.data, self.ne)
    }

    /// Parse a command from raw bytes
    ///
    /// Accepts all seven ISO 7816-3 layouts. A short Le of `00` reads as 256 and an
    /// extended Le of `00 00` as 65536.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CommandError> {
        let (header, body) = match bytes.split_first_chunk::<4>() {
            Some(split) => split,
            None => return Err(CommandError::InvalidLength(bytes.len())),
        };
        let [cla, ins, p1, p2] = *header;
        let (data, ne) = parse_body(body)?;

        Ok(Self {
            cla,
            ins,
            p1,
            p2,
            data: Bytes::copy_from_slice(data),
            ne,
        })
    }
}

/// Split the part after the header into data and `Ne`
fn parse_body(body: &[u8]) -> Result<(&[u8], ExpectedLength), CommandError> {
    let len = body.len();
    let b1 = match body.first() {
        None => return Ok((&[], 0)),
        Some(&b1) => usize::from(b1),
    };

    // Case 2S
    if len == 1 {
        return Ok((&[], short_ne(body[0])));
    }
    // Case 3S
    if b1 != 0 && len == 1 + b1 {
        return Ok((&body[1..], 0));
    }
    // Case 4S
    if b1 != 0 && len == 2 + b1 {
        return Ok((&body[1..=b1], short_ne(body[len - 1])));
    }

    // Only extended layouts remain
    if b1 != 0 {
        return Err(CommandError::Parse("first body byte of an extended command must be 00"));
    }
    if len < 3 {
        return Err(CommandError::InvalidLength(4 + len));
    }

    let l = usize::from(u16::from_be_bytes([body[1], body[2]]));

    // Case 2E
    if len == 3 {
        return Ok((&[], extended_ne(l)));
    }
    if l == 0 {
        return Err(CommandError::Parse("extended Lc of zero"));
    }
    // Case 3E
    if len == 3 + l {
        return Ok((&body[3..], 0));
    }
    // Case 4E
    if len == 5 + l {
        let le = usize::from(u16::from_be_bytes([body[len - 2], body[len - 1]]));
        return Ok((&body[3..3 + l], extended_ne(le)));
    }

    Err(CommandError::InvalidLength(4 + len))
}

fn short_ne(le: u8) -> ExpectedLength {
    if le == 0 {
        MAX_SHORT_NE
    } else {
        ExpectedLength::from(le)
    }
}

fn extended_ne(le: usize) -> ExpectedLength {
    if le == 0 {
        MAX_EXTENDED_NE
    } else {
        le as ExpectedLength
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CLA={:02X} INS={:02X} P1={:02X} P2={:02X}",
            self.cla, self.ins, self.p1, self.p2
        )?;
        if !self.data.is_empty() {
            write!(f, " DATA={}", hex::encode_upper(&self.data))?;
        }
        if self.ne > 0 {
            write!(f, " Ne={}", self.ne)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_case_1_header_only() {
        let bytes = encode(0x00, 0xA4, 0x04, 0x00, &[], 0).unwrap();
        assert_eq!(bytes.as_ref(), hex!("00 A4 04 00"));
    }

    #[test]
    fn test_case_2_le_forms() {
        let cmd = Command::new_with_le(0x00, 0xA4, 0x04, 0x00, 256);
        assert_eq!(cmd.to_bytes().unwrap().as_ref(), hex!("00 A4 04 00 00"));
        assert_eq!(cmd.case().unwrap(), ApduCase::Case2Short);

        let cmd = Command::new_with_le(0x00, 0xB0, 0x00, 0x00, 0x10);
        assert_eq!(cmd.to_bytes().unwrap().as_ref(), hex!("00 B0 00 00 10"));

        let cmd = Command::new_with_le(0x00, 0xB0, 0x00, 0x00, 257);
        assert_eq!(cmd.to_bytes().unwrap().as_ref(), hex!("00 B0 00 00 00 01 01"));
        assert_eq!(cmd.case().unwrap(), ApduCase::Case2Extended);

        let cmd = Command::new_with_le(0x00, 0xB0, 0x00, 0x00, 65_536);
        assert_eq!(cmd.to_bytes().unwrap().as_ref(), hex!("00 B0 00 00 00 00 00"));
    }

    #[test]
    fn test_case_3_lc_forms() {
        let cmd = Command::new_with_data(0x00, 0xA4, 0x04, 0x00, vec![0xA0, 0x00]);
        assert_eq!(cmd.to_bytes().unwrap().as_ref(), hex!("00 A4 04 00 02 A0 00"));

        let data = vec![0x5Au8; 300];
        let bytes = encode(0x00, 0xD6, 0x00, 0x00, &data, 0).unwrap();
        assert_eq!(&bytes[..7], hex!("00 D6 00 00 00 01 2C"));
        assert_eq!(&bytes[7..], data.as_slice());
        assert_eq!(bytes.len(), 7 + 300);
    }

    #[test]
    fn test_case_4_forms() {
        let cmd = Command::new_with_data_and_le(0x00, 0xA4, 0x04, 0x00, vec![0xA0, 0x00], 256);
        assert_eq!(cmd.to_bytes().unwrap().as_ref(), hex!("00 A4 04 00 02 A0 00 00"));
        assert_eq!(cmd.case().unwrap(), ApduCase::Case4Short);

        // Only Ne exceeds the short range
        let cmd = Command::new_with_data_and_le(0x00, 0x2A, 0x9E, 0x9A, vec![0x01], 65_536);
        assert_eq!(cmd.to_bytes().unwrap().as_ref(), hex!("00 2A 9E 9A 00 00 01 01 00 00"));
        assert_eq!(cmd.case().unwrap(), ApduCase::Case4Extended);

        // Only data exceeds the short range
        let data = vec![0u8; 256];
        let bytes = encode(0x00, 0x2A, 0x80, 0x86, &data, 2).unwrap();
        assert_eq!(&bytes[..7], hex!("00 2A 80 86 00 01 00"));
        assert_eq!(&bytes[bytes.len() - 2..], hex!("00 02"));
        assert_eq!(bytes.len(), 4 + 3 + 256 + 2);
    }

    #[test]
    fn test_length_limits() {
        let data = vec![0u8; 65_536];
        assert_eq!(
            encode(0x00, 0xD6, 0x00, 0x00, &data, 0),
            Err(CommandError::DataTooLong(65_536))
        );
        assert_eq!(
            encode(0x00, 0xB0, 0x00, 0x00, &[], 65_537),
            Err(CommandError::ExpectedLengthTooLarge(65_537))
        );
        assert!(encode(0x00, 0xD6, 0x00, 0x00, &data[..65_535], 65_536).is_ok());
    }

    #[test]
    fn test_from_bytes_all_cases() {
        let commands = [
            Command::new(0x00, 0xA4, 0x04, 0x00),
            Command::new_with_le(0x00, 0xC0, 0x00, 0x00, 256),
            Command::new_with_le(0x00, 0xB0, 0x00, 0x00, 65_536),
            Command::new_with_data(0x00, 0x20, 0x00, 0x81, vec![0x31; 6]),
            Command::new_with_data(0x00, 0xD6, 0x00, 0x00, vec![0x00; 1024]),
            Command::new_with_data_and_le(0x00, 0xA4, 0x04, 0x00, vec![0xA0; 7], 256),
            Command::new_with_data_and_le(0x00, 0xCB, 0x3F, 0xFF, vec![0x5C; 300], 4096),
        ];

        for cmd in commands {
            let bytes = cmd.to_bytes().unwrap();
            assert_eq!(Command::from_bytes(&bytes).unwrap(), cmd, "{cmd}");
        }
    }

    #[test]
    fn test_from_bytes_rejects_malformed() {
        assert_eq!(
            Command::from_bytes(&hex!("00 A4 04")),
            Err(CommandError::InvalidLength(3))
        );
        // Lc announces three bytes, only two follow plus a stray byte pair
        assert!(Command::from_bytes(&hex!("00 A4 04 00 03 A0 00 00 00 00")).is_err());
        // Extended Lc that does not match the body
        assert!(Command::from_bytes(&hex!("00 D6 00 00 00 00 05 01 02")).is_err());
        assert!(Command::from_bytes(&hex!("00 D6 00 00 00 00")).is_err());
    }

    #[test]
    fn test_display() {
        let cmd = Command::new_with_data_and_le(0x00, 0xA4, 0x04, 0x00, vec![0xA0, 0x00], 256);
        assert_eq!(cmd.to_string(), "CLA=00 INS=A4 P1=04 P2=00 DATA=A000 Ne=256");
    }
}
