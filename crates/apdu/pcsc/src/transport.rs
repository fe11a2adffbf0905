//! PC/SC transport implementation

use std::collections::BTreeMap;
use std::ffi::CString;
use std::fmt;

use iso7816_core::Bytes;
use iso7816_core::transport::{CardTransport, Metadata, ReaderName, Reconnect, TransportError};
use pcsc::{Card, Context, Disposition, MAX_BUFFER_SIZE_EXTENDED, ShareMode};
use tracing::{debug, warn};

use crate::config::PcscConfig;
use crate::error::PcscError;
use crate::meta;

/// Transport implementation using PC/SC
///
/// A transaction holds the card in exclusive share mode; outside of one the
/// handle uses the configured share mode.
pub struct PcscTransport {
    /// PC/SC context
    context: Context,
    /// Card connection, if established
    card: Option<Card>,
    /// Reader name
    reader_name: String,
    /// Configuration
    config: PcscConfig,
    /// Whether a transaction is active
    transaction_active: bool,
}

impl fmt::Debug for PcscTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcscTransport")
            .field("reader_name", &self.reader_name)
            .field("has_card", &self.card.is_some())
            .field("config", &self.config)
            .field("transaction_active", &self.transaction_active)
            .finish()
    }
}

impl PcscTransport {
    /// Create a new PC/SC transport connected to the card in `reader_name`
    pub(crate) fn new(
        context: Context,
        reader_name: &str,
        config: PcscConfig,
    ) -> Result<Self, PcscError> {
        let mut transport = Self {
            context,
            card: None,
            reader_name: reader_name.to_owned(),
            config,
            transaction_active: false,
        };

        transport.connect_card()?;
        Ok(transport)
    }

    fn connect_card(&mut self) -> Result<(), PcscError> {
        if self.card.is_some() {
            return Ok(());
        }

        let reader = CString::new(self.reader_name.as_str())
            .map_err(|_| PcscError::ReaderNotFound(self.reader_name.clone()))?;

        match self
            .context
            .connect(&reader, self.config.share_mode, self.config.protocols)
        {
            Ok(card) => {
                debug!(reader = %self.reader_name, "Connected to card");
                self.card = Some(card);
                Ok(())
            }
            Err(pcsc::Error::NoSmartcard) => Err(PcscError::NoCard(self.reader_name.clone())),
            Err(pcsc::Error::UnknownReader) => {
                Err(PcscError::ReaderNotFound(self.reader_name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn card_mut(&mut self) -> Result<&mut Card, PcscError> {
        self.connect_card()?;
        self.card
            .as_mut()
            .ok_or_else(|| PcscError::NoCard(self.reader_name.clone()))
    }

    /// Re-establish the connection in `mode`, keeping the card powered
    fn switch_share_mode(&mut self, mode: ShareMode) -> Result<(), PcscError> {
        let protocols = self.config.protocols;
        self.card_mut()?
            .reconnect(mode, protocols, Disposition::LeaveCard)?;
        Ok(())
    }

    /// Answer-to-reset of the current card
    pub fn atr(&self) -> Result<Vec<u8>, PcscError> {
        self.card.as_ref().map_or_else(
            || Err(PcscError::NoCard(self.reader_name.clone())),
            |card| {
                card.get_attribute_owned(pcsc::Attribute::AtrString)
                    .map_err(Into::into)
            },
        )
    }

    /// Check if the transport is connected to a card
    pub const fn has_card(&self) -> bool {
        self.card.is_some()
    }

    /// Whether a transaction is open on this handle
    pub const fn in_transaction(&self) -> bool {
        self.transaction_active
    }

    fn transmit_command(&mut self, command: &[u8], retry: bool) -> Result<Bytes, PcscError> {
        let card = self.card_mut()?;
        let mut buffer = vec![0u8; MAX_BUFFER_SIZE_EXTENDED];

        match card.transmit(command, &mut buffer) {
            Ok(response) => Ok(Bytes::copy_from_slice(response)),
            Err(e @ (pcsc::Error::ResetCard | pcsc::Error::RemovedCard)) => {
                self.card = None;
                let was_transacting = std::mem::take(&mut self.transaction_active);

                // A reset inside a transaction loses the exclusive lock; surface it
                if retry
                    && !was_transacting
                    && self.config.reconnects_on_reset()
                    && e == pcsc::Error::ResetCard
                {
                    debug!(reader = %self.reader_name, "Card was reset, reconnecting");
                    self.connect_card()?;
                    return self.transmit_command(command, false);
                }

                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl CardTransport for PcscTransport {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        self.transmit_command(command, true).map_err(TransportError::from)
    }

    /// Hold the card exclusively by reconnecting the handle in exclusive mode
    ///
    /// Unlike `SCardBeginTransaction` this does not wait for other handles to
    /// release the card: while another application has it open, this fails at
    /// once with [`TransportError::TransactionInProgress`] (a PC/SC sharing
    /// violation). The card stays powered across the switch.
    fn begin_transaction(&mut self) -> Result<(), TransportError> {
        if self.transaction_active {
            return Err(TransportError::TransactionInProgress);
        }
        self.switch_share_mode(ShareMode::Exclusive)?;
        self.transaction_active = true;
        Ok(())
    }

    fn end_transaction(&mut self) -> Result<(), TransportError> {
        if !self.transaction_active {
            return Err(TransportError::NoTransaction);
        }
        self.transaction_active = false;
        self.switch_share_mode(self.config.share_mode)?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.transaction_active = false;
        match self.card.take() {
            Some(card) => card
                .disconnect(self.config.close_disposition)
                .map_err(|(_, e)| PcscError::from(e).into()),
            None => Ok(()),
        }
    }

    fn as_reconnect(&mut self) -> Option<&mut dyn Reconnect> {
        Some(self)
    }

    fn as_reader_name(&self) -> Option<&dyn ReaderName> {
        Some(self)
    }

    fn as_metadata(&self) -> Option<&dyn Metadata> {
        Some(self)
    }
}

impl Reconnect for PcscTransport {
    fn reconnect(&mut self, reset: bool) -> Result<(), TransportError> {
        let disposition = if reset {
            Disposition::ResetCard
        } else {
            Disposition::LeaveCard
        };
        let share_mode = self.config.share_mode;
        let protocols = self.config.protocols;

        self.transaction_active = false;
        self.card_mut()?
            .reconnect(share_mode, protocols, disposition)
            .map_err(PcscError::from)?;
        Ok(())
    }
}

impl ReaderName for PcscTransport {
    fn reader_name(&self) -> &str {
        &self.reader_name
    }
}

impl Metadata for PcscTransport {
    fn atr(&self) -> Result<Bytes, TransportError> {
        Ok(Bytes::from(Self::atr(self)?))
    }

    fn metadata(&self) -> BTreeMap<String, String> {
        self.card.as_ref().map(meta::collect).unwrap_or_default()
    }
}

impl Drop for PcscTransport {
    fn drop(&mut self) {
        self.transaction_active = false;

        if let Some(card) = self.card.take() {
            if let Err((_, e)) = card.disconnect(Disposition::LeaveCard) {
                warn!(reader = %self.reader_name, error = %e, "Failed to disconnect card");
            }
        }
    }
}
