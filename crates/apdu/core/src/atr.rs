//! Answer-to-reset structure (ISO/IEC 7816-3 §8.2)

use std::fmt;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::historical::{HistoricalBytes, decode_historical_bytes};

/// One group of interface bytes TAi, TBi, TCi and TDi
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterfaceBytes {
    /// TAi
    pub ta: Option<u8>,
    /// TBi
    pub tb: Option<u8>,
    /// TCi
    pub tc: Option<u8>,
    /// TDi
    pub td: Option<u8>,
}

impl InterfaceBytes {
    /// Protocol announced by TDi
    pub fn protocol(&self) -> Option<u8> {
        self.td.map(|td| td & 0x0F)
    }
}

/// Parsed answer-to-reset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atr {
    raw: Bytes,
    interface: Vec<InterfaceBytes>,
    historical: (usize, usize),
    tck: Option<u8>,
}

impl Atr {
    /// Split an ATR into its fields
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let truncated = || Error::invalid_field_length("ATR", raw.len());

        let [_ts, t0, ..] = *raw else {
            return Err(truncated());
        };
        let historical_len = usize::from(t0 & 0x0F);

        let mut interface = Vec::new();
        let mut indicator = t0;
        let mut offset = 2;
        let mut needs_tck = false;

        loop {
            let mut group = InterfaceBytes::default();
            for (bit, slot) in [
                (0x10, &mut group.ta),
                (0x20, &mut group.tb),
                (0x40, &mut group.tc),
                (0x80, &mut group.td),
            ] {
                if indicator & bit != 0 {
                    *slot = Some(*raw.get(offset).ok_or_else(truncated)?);
                    offset += 1;
                }
            }
            interface.push(group);

            match group.td {
                Some(td) => {
                    needs_tck |= td & 0x0F != 0;
                    indicator = td;
                }
                None => break,
            }
        }

        let start = offset;
        let end = start + historical_len;
        if raw.len() < end {
            return Err(truncated());
        }

        let tck = if needs_tck {
            Some(*raw.get(end).ok_or_else(truncated)?)
        } else {
            None
        };

        let expected = end + usize::from(tck.is_some());
        if raw.len() != expected {
            return Err(Error::invalid_field_length("ATR", raw.len()));
        }

        Ok(Self {
            raw: Bytes::copy_from_slice(raw),
            interface,
            historical: (start, end),
            tck,
        })
    }

    /// Raw ATR bytes
    pub const fn as_bytes(&self) -> &Bytes {
        &self.raw
    }

    /// Initial character TS
    pub fn ts(&self) -> u8 {
        self.raw[0]
    }

    /// Format character T0
    pub fn t0(&self) -> u8 {
        self.raw[1]
    }

    /// Interface byte groups in order
    pub fn interface_bytes(&self) -> &[InterfaceBytes] {
        &self.interface
    }

    /// Protocols announced by the TD bytes, in order
    ///
    /// Empty means T=0 only.
    pub fn protocols(&self) -> Vec<u8> {
        self.interface.iter().filter_map(InterfaceBytes::protocol).collect()
    }

    /// Historical bytes segment
    pub fn historical_bytes(&self) -> Bytes {
        self.raw.slice(self.historical.0..self.historical.1)
    }

    /// Decode the historical bytes, or `None` if there are none
    pub fn decode_historical_bytes(&self) -> Option<Result<HistoricalBytes>> {
        let historical = self.historical_bytes();
        (!historical.is_empty()).then(|| decode_historical_bytes(&historical))
    }

    /// Check character
    pub const fn tck(&self) -> Option<u8> {
        self.tck
    }

    /// Whether the check character is absent or XORs T0 through TCK to zero
    pub fn checksum_valid(&self) -> bool {
        self.tck.is_none() || self.raw[1..].iter().fold(0, |acc, b| acc ^ b) == 0
    }
}

impl fmt::Display for Atr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(&self.raw))
    }
}

impl TryFrom<&[u8]> for Atr {
    type Error = Error;

    fn try_from(raw: &[u8]) -> Result<Self> {
        Self::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_parse_yubikey_atr() {
        let raw = hex!("3B FD 13 00 00 81 31 FE 15 80 73 C0 21 C0 57 59 75 62 69 4B 65 79 40");
        let atr = Atr::parse(&raw).unwrap();

        assert_eq!(atr.ts(), 0x3B);
        assert_eq!(atr.protocols(), vec![0x01, 0x01]);
        assert_eq!(atr.interface_bytes()[0].ta, Some(0x13));
        assert_eq!(atr.interface_bytes()[1].td, Some(0x31));
        assert_eq!(atr.interface_bytes()[2].ta, Some(0xFE));
        assert_eq!(
            atr.historical_bytes().as_ref(),
            hex!("80 73 C0 21 C0 57 59 75 62 69 4B 65 79")
        );
        assert_eq!(atr.tck(), Some(0x40));
        assert!(atr.checksum_valid());

        let historical = atr.decode_historical_bytes().unwrap().unwrap();
        assert_eq!(historical.card_issuer.as_deref(), Some(&b"YubiKey"[..]));
    }

    #[test]
    fn test_parse_t0_only_atr() {
        let raw = hex!("3B 02 14 50");
        let atr = Atr::parse(&raw).unwrap();
        assert!(atr.protocols().is_empty());
        assert_eq!(atr.historical_bytes().as_ref(), hex!("14 50"));
        assert_eq!(atr.tck(), None);
        assert!(atr.checksum_valid());
    }

    #[test]
    fn test_parse_contactless_atr() {
        // PC/SC synthesised ATR for an ISO 14443-4 card
        let raw = hex!("3B 8C 80 01 80 73 C0 21 C0 56 59 75 62 69 4B 65 80");
        let atr = Atr::parse(&raw).unwrap();

        assert_eq!(atr.protocols(), vec![0x00, 0x01]);
        assert_eq!(atr.historical_bytes().len(), 12);
        assert_eq!(atr.tck(), Some(0x80));
        assert!(atr.checksum_valid());

        let historical = atr.decode_historical_bytes().unwrap().unwrap();
        assert_eq!(historical.card_issuer.as_deref(), Some(&b"YubiKe"[..]));
        assert_eq!(historical.aid, None);
    }

    #[test]
    fn test_parse_truncated() {
        assert!(Atr::parse(&hex!("3B")).unwrap_err().is_invalid_length());
        assert!(Atr::parse(&hex!("3B 12")).unwrap_err().is_invalid_length());
        assert!(Atr::parse(&hex!("3B 02 14")).unwrap_err().is_invalid_length());
        // TCK missing
        assert!(Atr::parse(&hex!("3B 81 01 AA")).unwrap_err().is_invalid_length());
        // Trailing garbage
        assert!(Atr::parse(&hex!("3B 01 AA BB")).unwrap_err().is_invalid_length());
    }
}
