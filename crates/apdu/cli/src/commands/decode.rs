//! Offline TLV decoding

use std::error::Error as StdError;
use std::fmt;

use clap::ValueEnum;
use iso7816_core::encoding::{TagValue, TagValues, Value};
use iso7816_core::{decode_ber, decode_compact, decode_simple};

use crate::utils;

/// TLV flavour accepted by `decode`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TlvFormat {
    /// BER-TLV
    Ber,
    /// SIMPLE-TLV
    Simple,
    /// COMPACT-TLV
    Compact,
}

/// Decode hex input and print the object tree
pub fn decode_command(format: TlvFormat, data: &str) -> Result<(), Box<dyn StdError>> {
    let data = utils::parse_hex(data)?;
    let values = match format {
        TlvFormat::Ber => decode_ber(&data)?,
        TlvFormat::Simple => decode_simple(&data)?,
        TlvFormat::Compact => decode_compact(&data)?,
    };
    print!("{}", render(&values, 0));
    Ok(())
}

/// Render objects one per line, children indented below their parent
pub fn render(values: &TagValues, depth: usize) -> String {
    Tree { values: values.as_slice(), depth }.to_string()
}

struct Tree<'a> {
    values: &'a [TagValue],
    depth: usize,
}

impl fmt::Display for Tree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = "  ".repeat(self.depth);
        for value in self.values {
            match &value.value {
                Value::Primitive(bytes) => {
                    write!(f, "{indent}{} [{}]", value.tag, bytes.len())?;
                    if !bytes.is_empty() {
                        write!(f, " {}", hex::encode_upper(bytes))?;
                    }
                    if bytes.len() > 1 && bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
                        write!(f, " \"{}\"", String::from_utf8_lossy(bytes))?;
                    }
                    writeln!(f)?;
                }
                Value::Constructed(children) => {
                    writeln!(f, "{indent}{} ({} objects)", value.tag, children.len())?;
                    write!(f, "{}", Self { values: children, depth: self.depth + 1 })?;
                }
            }
        }
        Ok(())
    }
}
