//! Reader enumeration and connection

use pcsc::{Context, ReaderState, Scope, State};

use crate::config::PcscConfig;
use crate::error::PcscError;
use crate::reader::PcscReader;
use crate::transport::PcscTransport;

/// Entry point to the PC/SC service
///
/// Holds one user-scope context; every transport opened from it shares that
/// context.
#[allow(missing_debug_implementations)]
pub struct PcscDeviceManager {
    context: Context,
}

impl PcscDeviceManager {
    /// Establish a context with the PC/SC service
    pub fn new() -> Result<Self, PcscError> {
        Ok(Self {
            context: Context::establish(Scope::User)?,
        })
    }

    /// Snapshot of every reader and the ATR of the card in it, if any
    pub fn list_readers(&self) -> Result<Vec<PcscReader>, PcscError> {
        let names = self.context.list_readers_owned()?;
        if names.is_empty() {
            return Err(PcscError::NoReadersAvailable);
        }

        // UNAWARE makes the service report the current state without waiting
        let mut states: Vec<_> = names
            .iter()
            .map(|name| ReaderState::new(name.as_c_str(), State::UNAWARE))
            .collect();
        self.context.get_status_change(None, &mut states)?;

        Ok(states.iter().map(PcscReader::from_reader_state).collect())
    }

    /// Snapshot of one reader, looked up by its exact name
    pub fn reader(&self, reader_name: &str) -> Result<PcscReader, PcscError> {
        self.list_readers()?
            .into_iter()
            .find(|r| r.name() == reader_name)
            .ok_or_else(|| PcscError::ReaderNotFound(reader_name.to_string()))
    }

    /// Connect to the card in `reader_name` with default settings
    pub fn open_reader(&self, reader_name: &str) -> Result<PcscTransport, PcscError> {
        self.open_reader_with_config(reader_name, PcscConfig::DEFAULT)
    }

    /// Connect to the card in `reader_name`
    pub fn open_reader_with_config(
        &self,
        reader_name: &str,
        config: PcscConfig,
    ) -> Result<PcscTransport, PcscError> {
        PcscTransport::new(self.context.clone(), reader_name, config)
    }
}
