//! Registered application provider identifiers and well-known applications
//!
//! An AID is the 5-byte RID of the registered provider followed by up to 11
//! bytes of proprietary extension.

use std::fmt;

/// Length of a registered application provider identifier
pub const RID_LEN: usize = 5;

/// Registered application provider identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rid(pub [u8; RID_LEN]);

impl Rid {
    /// U.S. National Institute of Standards and Technology
    pub const NIST: Self = Self([0xA0, 0x00, 0x00, 0x03, 0x08]);
    /// Free Software Foundation Europe
    pub const FSFE: Self = Self([0xD2, 0x76, 0x00, 0x01, 0x24]);
    /// Yubico
    pub const YUBICO: Self = Self([0xA0, 0x00, 0x00, 0x05, 0x27]);
    /// FIDO Alliance
    pub const FIDO: Self = Self([0xA0, 0x00, 0x00, 0x06, 0x47]);
    /// SoloKeys
    pub const SOLOKEYS: Self = Self([0xA0, 0x00, 0x00, 0x08, 0x47]);
    /// GlobalPlatform
    pub const GLOBAL_PLATFORM: Self = Self([0xA0, 0x00, 0x00, 0x01, 0x51]);
    /// NXP NFC
    pub const NXP_NFC: Self = Self([0xD2, 0x76, 0x00, 0x00, 0x85]);

    const NAMED: &'static [(Self, &'static str)] = &[
        (Self::NIST, "NIST"),
        (Self::FSFE, "FSFE"),
        (Self::YUBICO, "Yubico"),
        (Self::FIDO, "FIDO"),
        (Self::SOLOKEYS, "Solokeys"),
        (Self::GLOBAL_PLATFORM, "GlobalPlatform"),
        (Self::NXP_NFC, "NXP NFC"),
    ];

    /// RID of an AID, if it is long enough to carry one
    pub fn of(aid: &[u8]) -> Option<Self> {
        aid.get(..RID_LEN)
            .and_then(|rid| rid.try_into().ok())
            .map(Self)
    }

    /// Raw bytes
    pub const fn as_bytes(&self) -> &[u8; RID_LEN] {
        &self.0
    }

    /// Provider name, or `"<unknown>"`
    pub fn name(&self) -> &'static str {
        Self::NAMED
            .iter()
            .find(|(rid, _)| rid == self)
            .map_or("<unknown>", |(_, name)| *name)
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// PIV card application
pub const PIV: &[u8] = &[0xA0, 0x00, 0x00, 0x03, 0x08, 0x00, 0x00, 0x10, 0x00];
/// OpenPGP card application
pub const OPENPGP: &[u8] = &[0xD2, 0x76, 0x00, 0x01, 0x24, 0x01];
/// FIDO U2F / CTAP
pub const FIDO: &[u8] = &[0xA0, 0x00, 0x00, 0x06, 0x47, 0x2F, 0x00, 0x01];
/// Yubico OTP
pub const YUBICO_OTP: &[u8] = &[0xA0, 0x00, 0x00, 0x05, 0x27, 0x20, 0x01];
/// Yubico management
pub const YUBICO_MANAGEMENT: &[u8] = &[0xA0, 0x00, 0x00, 0x05, 0x27, 0x47, 0x11, 0x17];
/// Yubico OATH
pub const YUBICO_OATH: &[u8] = &[0xA0, 0x00, 0x00, 0x05, 0x27, 0x21, 0x01];
/// Yubico HSM authentication
pub const YUBICO_HSM_AUTH: &[u8] = &[0xA0, 0x00, 0x00, 0x05, 0x27, 0x21, 0x07, 0x01];
/// SoloKeys admin
pub const SOLOKEYS_ADMIN: &[u8] = &[0xA0, 0x00, 0x00, 0x08, 0x47, 0x00, 0x00, 0x00, 0x01];
/// SoloKeys provisioner
pub const SOLOKEYS_PROVISIONER: &[u8] = &[0xA0, 0x00, 0x00, 0x08, 0x47, 0x01, 0x00, 0x00, 0x01];
/// GlobalPlatform card manager (issuer security domain)
pub const CARD_MANAGER: &[u8] = &[0xA0, 0x00, 0x00, 0x01, 0x51, 0x00, 0x00, 0x00];
/// NFC Forum NDEF tag application
pub const NDEF: &[u8] = &[0xD2, 0x76, 0x00, 0x00, 0x85, 0x01, 0x01];

/// Well-known applications by name
pub const KNOWN: &[(&str, &[u8])] = &[
    ("piv", PIV),
    ("openpgp", OPENPGP),
    ("fido", FIDO),
    ("yubico-otp", YUBICO_OTP),
    ("yubico-management", YUBICO_MANAGEMENT),
    ("yubico-oath", YUBICO_OATH),
    ("yubico-hsmauth", YUBICO_HSM_AUTH),
    ("solokeys-admin", SOLOKEYS_ADMIN),
    ("solokeys-provisioner", SOLOKEYS_PROVISIONER),
    ("card-manager", CARD_MANAGER),
    ("ndef", NDEF),
];

/// Find a well-known AID by name, ignoring case
pub fn lookup(name: &str) -> Option<&'static [u8]> {
    KNOWN
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, aid)| *aid)
}

/// Name of a well-known AID
pub fn name_of(aid: &[u8]) -> Option<&'static str> {
    KNOWN
        .iter()
        .find(|(_, known)| *known == aid)
        .map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rid_names() {
        assert_eq!(Rid::of(PIV), Some(Rid::NIST));
        assert_eq!(Rid::of(OPENPGP).map(|r| r.name()), Some("FSFE"));
        assert_eq!(Rid::of(NDEF).map(|r| r.name()), Some("NXP NFC"));
        assert_eq!(Rid([0; 5]).name(), "<unknown>");
        assert_eq!(Rid::of(&[0xA0, 0x00]), None);
    }

    #[test]
    fn test_every_known_aid_has_a_known_rid() {
        for (name, aid) in KNOWN {
            let rid = Rid::of(aid).unwrap();
            assert_ne!(rid.name(), "<unknown>", "{name}");
            assert!(aid.len() <= 16, "{name}");
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("PIV"), Some(PIV));
        assert_eq!(lookup("Yubico-OATH"), Some(YUBICO_OATH));
        assert_eq!(lookup("unknown"), None);
        assert_eq!(name_of(CARD_MANAGER), Some("card-manager"));
        assert_eq!(name_of(&[0xA0]), None);
    }
}
