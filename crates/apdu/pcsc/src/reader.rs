//! Reader representation for PC/SC devices

use std::fmt;

use pcsc::{ReaderState, State};

/// Card reader as seen during enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcscReader {
    name: String,
    atr: Option<Vec<u8>>,
}

impl PcscReader {
    /// Create a new reader
    pub const fn new(name: String, atr: Option<Vec<u8>>) -> Self {
        Self { name, atr }
    }

    /// Reader name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a card is present in the reader
    pub const fn has_card(&self) -> bool {
        self.atr.is_some()
    }

    /// ATR of the card, if one is present
    pub fn atr(&self) -> Option<&[u8]> {
        self.atr.as_deref()
    }

    pub(crate) fn from_reader_state(reader_state: &ReaderState) -> Self {
        let state = reader_state.event_state();
        let has_card = state.contains(State::PRESENT) && !state.contains(State::EMPTY);

        Self {
            name: reader_state.name().to_string_lossy().into_owned(),
            atr: has_card.then(|| reader_state.atr().to_vec()),
        }
    }
}

impl fmt::Display for PcscReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.atr {
            Some(atr) => write!(f, "{} [{}]", self.name, hex::encode_upper(atr)),
            None => write!(f, "{} [no card]", self.name),
        }
    }
}
