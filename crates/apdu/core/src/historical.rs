//! Historical bytes of the answer-to-reset (ISO/IEC 7816-4 §8.1.1)

use std::fmt;

use bytes::Bytes;
use iso7816_encoding::decode_compact;
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::response::status::StatusWord;

/// Compact-TLV tags used in historical bytes
pub mod tags {
    /// Country code (§8.1.1.2.1)
    pub const COUNTRY_CODE: u8 = 0x1;
    /// Issuer identification number (§8.1.1.2.1)
    pub const ISSUER_ID: u8 = 0x2;
    /// Card service data (§8.1.1.2.3)
    pub const CARD_SERVICE: u8 = 0x3;
    /// Initial access data (§8.1.1.2.4)
    pub const INITIAL_ACCESS: u8 = 0x4;
    /// Card issuer's data (§8.1.1.2.5)
    pub const CARD_ISSUER: u8 = 0x5;
    /// Pre-issuing data (§8.1.1.2.6)
    pub const PRE_ISSUING: u8 = 0x6;
    /// Card capabilities (§8.1.1.2.7)
    pub const CARD_CAPABILITIES: u8 = 0x7;
    /// Status indicator (§8.1.1.3)
    pub const STATUS_INDICATOR: u8 = 0x8;
    /// Application identifier (§8.1.1.2.2)
    pub const AID: u8 = 0xF;
}

/// Category indicator: compact-TLV followed by a mandatory status indicator
pub const CATEGORY_STATUS_LAST: u8 = 0x00;
/// Category indicator: DIR data reference, not decoded
pub const CATEGORY_DIR_REFERENCE: u8 = 0x10;
/// Category indicator: compact-TLV objects only
pub const CATEGORY_COMPACT_TLV: u8 = 0x80;

/// How EF.DIR and EF.ATR can be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMethod {
    /// READ RECORD(S), record structure
    ReadRecord,
    /// GET DATA, TLV structure
    GetData,
    /// READ BINARY, transparent structure
    ReadBinary,
}

/// Card service data byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CardService(pub u8);

impl CardService {
    /// Card with MF
    pub const MF: u8 = 1 << 0;
    /// BER-TLV data objects available in EF.ATR
    pub const BER_TLV_IN_ATR: u8 = 1 << 4;
    /// BER-TLV data objects available in EF.DIR
    pub const BER_TLV_IN_DIR: u8 = 1 << 5;
    /// Application selection by partial DF name
    pub const SELECT_PARTIAL_DF_NAME: u8 = 1 << 6;
    /// Application selection by full DF name
    pub const SELECT_FULL_DF_NAME: u8 = 1 << 7;

    fn decode(value: &[u8]) -> Result<Self> {
        match value {
            [byte] => Ok(Self(*byte)),
            _ => Err(Error::invalid_field_length("card service data", value.len())),
        }
    }

    /// Whether every bit of `flag` is set
    pub const fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    /// Whether the card has a master file
    pub const fn has_mf(self) -> bool {
        self.contains(Self::MF)
    }

    /// Access method for EF.DIR and EF.ATR, `None` for reserved values
    pub const fn access_method(self) -> Option<AccessMethod> {
        match self.0 & 0x0E {
            0x00 => Some(AccessMethod::ReadRecord),
            0x04 => Some(AccessMethod::GetData),
            0x08 => Some(AccessMethod::ReadBinary),
            _ => None,
        }
    }
}

impl fmt::Display for CardService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut services = Vec::new();
        if self.has_mf() {
            services.push("MF");
        }
        if self.contains(Self::BER_TLV_IN_ATR) {
            services.push("BER-TLV in EF.ATR");
        }
        if self.contains(Self::BER_TLV_IN_DIR) {
            services.push("BER-TLV in EF.DIR");
        }
        if self.contains(Self::SELECT_PARTIAL_DF_NAME) {
            services.push("Select by partial DF name");
        }
        if self.contains(Self::SELECT_FULL_DF_NAME) {
            services.push("Select by full DF name");
        }
        write!(f, "{}", services.join(", "))
    }
}

/// Behaviour of write functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteBehaviour {
    /// One-time write
    OneTime,
    /// Proprietary
    Proprietary,
    /// Write OR
    Or,
    /// Write AND
    And,
}

/// Selection method and capability bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Capability {
    /// DF selection by full DF name
    SelectByFullDfName = 1 << 7,
    /// DF selection by partial DF name
    SelectByPartialDfName = 1 << 6,
    /// DF selection by path
    SelectByPath = 1 << 5,
    /// DF selection by file identifier
    SelectByFileId = 1 << 4,
    /// Implicit DF selection
    ImplicitDfSelection = 1 << 3,
    /// Short EF identifier supported
    ShortEfId = 1 << 2,
    /// Record number supported
    RecordNumber = 1 << 1,
    /// Record identifier supported
    RecordId = 1 << 0,
    /// `FF` is valid as first byte of a BER-TLV tag
    FirstTagByteFF = 1 << 12,
    /// EFs of TLV structure supported
    TlvEfs = 1 << 15,
    /// Logical channel number assignment by the interface device
    ChannelAssignedByIfd = 1 << 19,
    /// Logical channel number assignment by the card
    ChannelAssignedByCard = 1 << 20,
    /// Extended length information in EF.ATR/INFO
    ExtendedLengthInfo = 1 << 21,
    /// Extended Lc and Le fields
    ExtendedLength = 1 << 22,
    /// Command chaining
    CommandChaining = 1 << 23,
}

/// Card capabilities, up to three bytes little-endian
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CardCapabilities(pub u32);

impl CardCapabilities {
    fn decode(value: &[u8]) -> Result<Self> {
        if !(1..=3).contains(&value.len()) {
            return Err(Error::invalid_field_length("card capabilities", value.len()));
        }
        let mut raw = [0u8; 4];
        raw[..value.len()].copy_from_slice(value);
        Ok(Self(u32::from_le_bytes(raw)))
    }

    /// Whether the capability bit is set
    pub const fn has(self, capability: Capability) -> bool {
        self.0 & capability as u32 != 0
    }

    /// Selection methods byte
    pub const fn selection_methods(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Data unit size in quartets; two quartets make a byte
    pub const fn data_unit_size(self) -> u32 {
        1 << ((self.0 >> 8) & 0x0F)
    }

    /// Behaviour of write functions
    pub const fn write_behaviour(self) -> WriteBehaviour {
        match (self.0 >> 13) & 0x03 {
            0 => WriteBehaviour::OneTime,
            1 => WriteBehaviour::Proprietary,
            2 => WriteBehaviour::Or,
            _ => WriteBehaviour::And,
        }
    }

    /// Maximum number of logical channels
    pub const fn logical_channels(self) -> u8 {
        (((self.0 >> 16) & 0x07) + 1) as u8
    }

    /// Whether extended Lc and Le fields are supported
    pub const fn extended_length(self) -> bool {
        self.has(Capability::ExtendedLength)
    }

    /// Whether command chaining is supported
    pub const fn command_chaining(self) -> bool {
        self.has(Capability::CommandChaining)
    }
}

impl fmt::Display for CardCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "channels={} unit={} quartets write={:?}",
            self.logical_channels(),
            self.data_unit_size(),
            self.write_behaviour()
        )?;
        if self.extended_length() {
            f.write_str(" extended-length")?;
        }
        if self.command_chaining() {
            f.write_str(" chaining")?;
        }
        Ok(())
    }
}

/// Decoded historical bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoricalBytes {
    /// Category indicator byte
    pub category: u8,
    /// Card life cycle status (§8.1.1.3)
    pub life_cycle: Option<u8>,
    /// Processing status (§8.1.1.3)
    pub status: Option<StatusWord>,
    /// Country code
    pub country_code: Option<Bytes>,
    /// Issuer identification number
    pub issuer_id: Option<Bytes>,
    /// Application identifier
    pub aid: Option<Bytes>,
    /// Card service data
    pub card_service: Option<CardService>,
    /// Initial access data
    pub initial_access: Option<Bytes>,
    /// Card issuer's data
    pub card_issuer: Option<Bytes>,
    /// Pre-issuing data
    pub pre_issuing: Option<Bytes>,
    /// Card capabilities
    pub card_capabilities: Option<CardCapabilities>,
}

impl HistoricalBytes {
    fn apply_status_indicator(&mut self, value: &[u8]) -> Result<()> {
        match *value {
            [lcs] => self.life_cycle = Some(lcs),
            [sw1, sw2] => self.status = Some(StatusWord::new(sw1, sw2)),
            [lcs, sw1, sw2] => {
                self.life_cycle = Some(lcs);
                self.status = Some(StatusWord::new(sw1, sw2));
            }
            _ => return Err(Error::invalid_field_length("status indicator", value.len())),
        }
        Ok(())
    }

    fn apply_compact(&mut self, data: &[u8]) -> Result<()> {
        for object in decode_compact(data)? {
            let Some(value) = object.as_bytes().cloned() else {
                continue;
            };
            match object.tag.raw() as u8 {
                tags::COUNTRY_CODE => self.country_code = Some(value),
                tags::ISSUER_ID => self.issuer_id = Some(value),
                tags::AID => self.aid = Some(value),
                tags::CARD_SERVICE => self.card_service = Some(CardService::decode(&value)?),
                tags::INITIAL_ACCESS => self.initial_access = Some(value),
                tags::CARD_ISSUER => self.card_issuer = Some(value),
                tags::PRE_ISSUING => self.pre_issuing = Some(value),
                tags::CARD_CAPABILITIES => {
                    self.card_capabilities = Some(CardCapabilities::decode(&value)?);
                }
                tags::STATUS_INDICATOR => self.apply_status_indicator(&value)?,
                other => trace!(tag = other, "Skipping historical bytes object"),
            }
        }
        Ok(())
    }
}

/// Decode the historical bytes segment of an ATR
///
/// An unknown category indicator is logged and yields only the category.
pub fn decode_historical_bytes(bytes: &[u8]) -> Result<HistoricalBytes> {
    let Some((&category, body)) = bytes.split_first() else {
        return Err(Error::invalid_field_length("historical bytes", 0));
    };

    let mut historical = HistoricalBytes {
        category,
        ..Default::default()
    };

    match category {
        CATEGORY_STATUS_LAST => {
            let Some(split) = body.len().checked_sub(3) else {
                return Err(Error::invalid_field_length("status indicator", body.len()));
            };
            let (objects, status) = body.split_at(split);
            historical.apply_status_indicator(status)?;
            historical.apply_compact(objects)?;
        }
        CATEGORY_COMPACT_TLV => historical.apply_compact(body)?,
        CATEGORY_DIR_REFERENCE => {}
        _ => {
            warn!(
                category = format_args!("{category:#04x}"),
                "Unknown historical bytes category indicator"
            );
        }
    }

    Ok(historical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_compact_category_with_aid_and_capabilities() {
        // Category 80, AID (6 bytes), capabilities 3 bytes
        let raw = hex!("80 F6 D2 76 00 01 24 01 73 C0 01 E0");
        let historical = decode_historical_bytes(&raw).unwrap();

        assert_eq!(historical.category, 0x80);
        assert_eq!(historical.aid.as_deref(), Some(&hex!("D2 76 00 01 24 01")[..]));

        let caps = historical.card_capabilities.unwrap();
        assert_eq!(caps, CardCapabilities(0x00E0_01C0));
        assert!(caps.has(Capability::SelectByFullDfName));
        assert!(caps.has(Capability::SelectByPartialDfName));
        assert_eq!(caps.data_unit_size(), 2);
        assert_eq!(caps.write_behaviour(), WriteBehaviour::OneTime);
        assert_eq!(caps.logical_channels(), 1);
        assert!(caps.extended_length());
        assert!(caps.command_chaining());
        assert!(caps.has(Capability::ExtendedLengthInfo));
    }

    #[test]
    fn test_yubikey_historical_bytes() {
        let raw = hex!("80 73 C0 21 C0 57 59 75 62 69 4B 65 79 40");
        let historical = decode_historical_bytes(&raw).unwrap();

        let caps = historical.card_capabilities.unwrap();
        assert_eq!(caps.selection_methods(), 0xC0);
        assert_eq!(caps.write_behaviour(), WriteBehaviour::Proprietary);
        assert_eq!(caps.logical_channels(), 1);
        assert!(caps.has(Capability::CommandChaining));
        assert!(caps.has(Capability::ExtendedLength));
        assert_eq!(historical.card_issuer.as_deref(), Some(&b"YubiKey"[..]));
        assert_eq!(historical.initial_access.as_deref(), Some(&[][..]));
    }

    #[test]
    fn test_status_last_category() {
        let raw = hex!("00 31 C0 73 00 00 80 05 90 00");
        let historical = decode_historical_bytes(&raw).unwrap();

        assert_eq!(historical.life_cycle, Some(0x05));
        assert_eq!(historical.status, Some(StatusWord::new(0x90, 0x00)));
        let service = historical.card_service.unwrap();
        assert!(service.contains(CardService::SELECT_FULL_DF_NAME));
        assert!(service.contains(CardService::SELECT_PARTIAL_DF_NAME));
        assert_eq!(service.access_method(), Some(AccessMethod::ReadRecord));
        assert!(historical.card_capabilities.unwrap().command_chaining());
    }

    #[test]
    fn test_status_indicator_object() {
        let historical = decode_historical_bytes(&hex!("80 81 05")).unwrap();
        assert_eq!(historical.life_cycle, Some(0x05));
        assert_eq!(historical.status, None);

        let historical = decode_historical_bytes(&hex!("80 82 90 00")).unwrap();
        assert_eq!(historical.life_cycle, None);
        assert_eq!(historical.status, Some(StatusWord::new(0x90, 0x00)));
    }

    #[test]
    fn test_unsupported_and_unknown_categories() {
        let historical = decode_historical_bytes(&hex!("10 01 02")).unwrap();
        assert_eq!(historical, HistoricalBytes { category: 0x10, ..Default::default() });

        let historical = decode_historical_bytes(&hex!("C3 FF FF")).unwrap();
        assert_eq!(historical, HistoricalBytes { category: 0xC3, ..Default::default() });
    }

    #[test]
    fn test_invalid_lengths() {
        assert!(decode_historical_bytes(&[]).unwrap_err().is_invalid_length());
        assert!(decode_historical_bytes(&hex!("00 90 00")).unwrap_err().is_invalid_length());
        // Capabilities longer than three bytes
        let err = decode_historical_bytes(&hex!("80 74 01 02 03 04")).unwrap_err();
        assert!(err.is_invalid_length());
        // Truncated compact object
        let err = decode_historical_bytes(&hex!("80 F6 D2 76")).unwrap_err();
        assert!(err.is_invalid_length());
    }

    #[test]
    fn test_card_service_access_methods() {
        assert_eq!(CardService(0x04).access_method(), Some(AccessMethod::GetData));
        assert_eq!(CardService(0x08).access_method(), Some(AccessMethod::ReadBinary));
        assert_eq!(CardService(0x02).access_method(), None);
        assert_eq!(CardService(0x81).to_string(), "MF, Select by full DF name");
    }
}
