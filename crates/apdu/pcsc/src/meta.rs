//! Reader and card description gathered from PC/SC status and attributes

use std::collections::BTreeMap;

use pcsc::{Attribute, Card, Protocol, Status};

const STATES: &[(Status, &str)] = &[
    (Status::UNKNOWN, "unknown"),
    (Status::ABSENT, "absent"),
    (Status::PRESENT, "present"),
    (Status::SWALLOWED, "swallowed"),
    (Status::POWERED, "powered"),
    (Status::NEGOTIABLE, "negotiable"),
    (Status::SPECIFIC, "specific"),
];

const NAME_ATTRIBUTES: &[(Attribute, &str)] = &[
    (Attribute::VendorName, "attr.name.vendor"),
    (Attribute::DeviceSystemName, "attr.name.system"),
    (Attribute::DeviceFriendlyName, "attr.name.friendly"),
    (Attribute::VendorIfdSerialNo, "attr.ifd.serial"),
    (Attribute::VendorIfdType, "attr.ifd.type"),
];

pub(crate) fn collect(card: &Card) -> BTreeMap<String, String> {
    let mut meta = BTreeMap::new();

    if let Ok(status) = card.status2_owned() {
        if let Some(reader) = status.reader_names().first() {
            meta.insert("status.reader".into(), reader.to_string_lossy().into_owned());
        }
        meta.insert("status.atr".into(), hex::encode(status.atr()));
        if let Some(protocol) = status.protocol2() {
            meta.insert("status.active_protocol".into(), protocol_name(protocol).into());
        }
        let state = state_names(status.status());
        if !state.is_empty() {
            meta.insert("status.state".into(), state);
        }
    }

    for (attribute, key) in NAME_ATTRIBUTES {
        if let Ok(data) = card.get_attribute_owned(*attribute) {
            meta.insert((*key).into(), bytes_to_string(&data));
        }
    }

    if let Ok(data) = card.get_attribute_owned(Attribute::VendorIfdVersion) {
        if let Some(version) = ifd_version(&data) {
            meta.insert("attr.ifd.version".into(), version);
        }
    }

    meta
}

const fn protocol_name(protocol: Protocol) -> &'static str {
    match protocol {
        Protocol::T0 => "t0",
        Protocol::T1 => "t1",
        Protocol::RAW => "raw",
    }
}

fn state_names(status: Status) -> String {
    STATES
        .iter()
        .filter(|(flag, _)| status.contains(*flag))
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(",")
}

/// Attribute strings are NUL padded
fn bytes_to_string(data: &[u8]) -> String {
    String::from_utf8_lossy(data).trim_matches('\0').to_owned()
}

/// `0xMMmmbbbb` in native byte order
fn ifd_version(data: &[u8]) -> Option<String> {
    let raw = u32::from_ne_bytes(data.try_into().ok()?);
    Some(format!(
        "{}.{}.{}",
        (raw >> 24) & 0xFF,
        (raw >> 16) & 0xFF,
        raw & 0xFFFF
    ))
}
