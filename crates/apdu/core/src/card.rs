//! Card protocol engine
//!
//! [`Card`] owns a transport and turns one logical request into as many physical
//! exchanges as the card needs. Responses signalling more data (`61 XX`) are
//! followed by continuation commands until the card reports a final status, so
//! callers get either the complete payload or one terminal error.
//!
//! Exclusive access across several exchanges is scoped with [`Card::transaction`]
//! or [`Card::with_transaction`]; the transaction is released on every exit path.

use std::collections::BTreeMap;
use std::fmt;

use bytes::{Bytes, BytesMut};
use tracing::{Level, debug, info, instrument, trace, warn};

use crate::command::{self, Command, ExpectedLength, MAX_SHORT_NE};
use crate::error::{Error, Result};
use crate::instruction::Instruction;
use crate::response::Response;
use crate::response::error::StatusError;
use crate::response::status::StatusWord;
use crate::transport::CardTransport;

/// Engine settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardConfig {
    /// Instruction sent to fetch remaining data after `61 XX`
    pub get_remaining: u8,
    /// Maximum number of continuation commands per request
    pub max_chain: Option<usize>,
    /// Expected length sent with SELECT
    pub select_ne: ExpectedLength,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            get_remaining: Instruction::GetResponse.code(),
            max_chain: None,
            select_ne: MAX_SHORT_NE,
        }
    }
}

impl CardConfig {
    /// Set the continuation instruction
    pub const fn with_get_remaining(mut self, ins: u8) -> Self {
        self.get_remaining = ins;
        self
    }

    /// Cap the number of continuation commands
    pub const fn with_max_chain(mut self, limit: usize) -> Self {
        self.max_chain = Some(limit);
        self
    }

    /// Set the expected length used by SELECT
    pub const fn with_select_ne(mut self, ne: ExpectedLength) -> Self {
        self.select_ne = ne;
        self
    }
}

/// Generic card handle over any transport
pub struct Card<T: CardTransport> {
    transport: T,
    config: CardConfig,
}

impl<T: CardTransport> fmt::Debug for Card<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Card")
            .field("transport", &self.transport)
            .field("config", &self.config)
            .finish()
    }
}

impl<T: CardTransport> Card<T> {
    /// Create a card with the default configuration
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, CardConfig::default())
    }

    /// Create a card with a custom configuration
    pub const fn with_config(transport: T, config: CardConfig) -> Self {
        Self { transport, config }
    }

    /// Engine settings
    pub const fn config(&self) -> &CardConfig {
        &self.config
    }

    /// Mutable engine settings
    pub const fn config_mut(&mut self) -> &mut CardConfig {
        &mut self.config
    }

    /// Underlying transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable underlying transport
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give up the card and return its transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Send a command and return the complete response data
    ///
    /// Follows `61 XX` with continuation commands built from
    /// [`CardConfig::get_remaining`]. Any final status other than `90 00` is
    /// returned as [`Error::Status`].
    #[instrument(level = "trace", skip(self, command), fields(command = %command))]
    pub fn send(&mut self, command: &Command) -> Result<Bytes> {
        exchange(&mut self.transport, &self.config, command)
    }

    /// Select an application by DF name
    pub fn select(&mut self, aid: &[u8]) -> Result<Bytes> {
        let command = select_command(aid, self.config.select_ne);
        self.send(&command)
    }

    /// Open a transaction for exclusive access to the card
    ///
    /// The returned guard ends the transaction when dropped.
    pub fn transaction(&mut self) -> Result<Transaction<'_, T>> {
        self.transport.begin_transaction()?;
        trace!("Transaction started");
        Ok(Transaction {
            card: self,
            active: true,
        })
    }

    /// Run `f` inside a transaction
    ///
    /// The transaction is ended whether `f` succeeds or not. When both `f` and
    /// the release fail, the error from `f` is returned and the release error
    /// is logged.
    pub fn with_transaction<R, F>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Transaction<'_, T>) -> Result<R>,
    {
        let mut tx = self.transaction()?;
        let result = f(&mut tx);
        let released = tx.end();

        match (result, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(release)) => {
                warn!(error = %release, "Failed to end transaction after error");
                Err(e)
            }
        }
    }

    /// Reconnect the transport, resetting the card when `reset` is set
    ///
    /// Returns `Ok(false)` when the transport cannot reconnect.
    pub fn reconnect(&mut self, reset: bool) -> Result<bool> {
        match self.transport.as_reconnect() {
            Some(transport) => {
                transport.reconnect(reset)?;
                debug!(reset, "Reconnected to card");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Name of the reader, if the transport knows it
    pub fn reader_name(&self) -> Option<&str> {
        self.transport.as_reader_name().map(|r| r.reader_name())
    }

    /// Reader and card description, if the transport provides one
    pub fn metadata(&self) -> Option<BTreeMap<String, String>> {
        self.transport.as_metadata().map(|m| m.metadata())
    }

    /// Answer-to-reset, if the transport provides it
    pub fn atr(&self) -> Option<Result<Bytes>> {
        self.transport
            .as_metadata()
            .map(|m| m.atr().map_err(Error::from))
    }

    /// Close the underlying transport
    pub fn close(&mut self) -> Result<()> {
        self.transport.close().map_err(Error::from)
    }
}

/// Exclusive access to a card
///
/// Only [`send`](Self::send) and [`select`](Self::select) are reachable while
/// the transaction is open, so a second transaction cannot be started on the
/// same handle.
pub struct Transaction<'a, T: CardTransport> {
    card: &'a mut Card<T>,
    active: bool,
}

impl<T: CardTransport> fmt::Debug for Transaction<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("card", &self.card)
            .field("active", &self.active)
            .finish()
    }
}

impl<T: CardTransport> Transaction<'_, T> {
    /// Send a command within the transaction
    pub fn send(&mut self, command: &Command) -> Result<Bytes> {
        self.card.send(command)
    }

    /// Select an application within the transaction
    pub fn select(&mut self, aid: &[u8]) -> Result<Bytes> {
        self.card.select(aid)
    }

    /// Engine settings of the card
    pub const fn config(&self) -> &CardConfig {
        &self.card.config
    }

    /// End the transaction and report whether the release succeeded
    pub fn end(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.card.transport.end_transaction()?;
        trace!("Transaction ended");
        Ok(())
    }
}

impl<T: CardTransport> Drop for Transaction<'_, T> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, "Failed to end transaction");
        }
    }
}

/// Build a SELECT by DF name command
pub fn select_command(aid: &[u8], ne: ExpectedLength) -> Command {
    Command::new_with_data_and_le(
        0x00,
        Instruction::Select.code(),
        0x04,
        0x00,
        Bytes::copy_from_slice(aid),
        ne,
    )
}

fn exchange<T: CardTransport + ?Sized>(
    transport: &mut T,
    config: &CardConfig,
    command: &Command,
) -> Result<Bytes> {
    let mut frame = command.to_bytes()?;
    let mut data = BytesMut::new();
    let mut rounds = 0usize;

    loop {
        let raw = transport.transmit_raw(&frame)?;
        let response = Response::from_bytes(&raw)?;
        let (chunk, status) = response.into_parts();
        data.extend_from_slice(&chunk);

        if let Some(remaining) = status.remaining_bytes() {
            if config.max_chain.is_some_and(|limit| rounds >= limit) {
                debug!(rounds, "Continuation limit reached");
                return Err(Error::ChainLimitExceeded(rounds));
            }
            rounds += 1;
            debug!(
                round = rounds,
                remaining,
                ins = format_args!("{:#04x}", config.get_remaining),
                "Fetching remaining response data"
            );
            frame = command::encode(
                0x00,
                config.get_remaining,
                0x00,
                0x00,
                &[],
                ExpectedLength::from(remaining),
            )?;
            continue;
        }

        log_status(status, data.len());
        return if status.is_success() {
            Ok(data.freeze())
        } else {
            Err(StatusError::from(status).into())
        };
    }
}

fn log_status(status: StatusWord, len: usize) {
    let level = status.tracing_level();
    if level == Level::DEBUG {
        debug!(%status, len, "Command completed");
    } else if level == Level::INFO {
        info!(%status, description = status.description(), "Command completed with warning");
    } else {
        warn!(%status, description = status.description(), "Command failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, TransportError};
    use hex_literal::hex;

    fn card(responses: &[&[u8]]) -> Card<MockTransport> {
        let responses = responses.iter().map(|r| Bytes::copy_from_slice(r)).collect();
        Card::new(MockTransport::new(responses))
    }

    #[test]
    fn test_send_single_response() {
        let mut card = card(&[&hex!("01 02 90 00")]);
        let command = Command::new_with_le(0x00, 0xCA, 0x00, 0x6E, 256);
        let data = card.send(&command).unwrap();
        assert_eq!(data.as_ref(), hex!("01 02"));
        assert_eq!(card.transport().commands[0].as_ref(), hex!("00 CA 00 6E 00"));
    }

    #[test]
    fn test_send_follows_more_data() {
        let mut card = card(&[&hex!("01 02 03 61 05"), &hex!("04 05 06 07 08 90 00")]);
        let command = Command::new_with_le(0x00, 0xCA, 0x00, 0x6E, 256);
        let data = card.send(&command).unwrap();

        assert_eq!(data.as_ref(), hex!("01 02 03 04 05 06 07 08"));
        let sent = &card.transport().commands;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].as_ref(), hex!("00 C0 00 00 05"));
    }

    #[test]
    fn test_send_more_data_without_count() {
        let mut card = card(&[&hex!("AA 61 00"), &hex!("BB 90 00")]);
        let data = card.send(&Command::new(0x00, 0xCA, 0x00, 0x6E)).unwrap();
        assert_eq!(data.as_ref(), hex!("AA BB"));
        assert_eq!(card.transport().commands[1].as_ref(), hex!("00 C0 00 00 00"));
    }

    #[test]
    fn test_send_custom_get_remaining() {
        let mut card = card(&[&hex!("71 02 61 02"), &hex!("03 04 61 01"), &hex!("05 90 00")]);
        card.config_mut().get_remaining = 0xA5;

        let data = card.send(&Command::new(0x00, 0xA1, 0x00, 0x00)).unwrap();
        assert_eq!(data.as_ref(), hex!("71 02 03 04 05"));

        let sent = &card.transport().commands;
        assert_eq!(sent[1].as_ref(), hex!("00 A5 00 00 02"));
        assert_eq!(sent[2].as_ref(), hex!("00 A5 00 00 01"));
    }

    #[test]
    fn test_send_chain_limit() {
        let transport = MockTransport::new(vec![
            Bytes::from_static(&hex!("01 61 01")),
            Bytes::from_static(&hex!("02 61 01")),
            Bytes::from_static(&hex!("03 90 00")),
        ]);
        let mut card = Card::with_config(transport, CardConfig::default().with_max_chain(1));

        let err = card.send(&Command::new(0x00, 0xCA, 0x00, 0x6E)).unwrap_err();
        assert!(matches!(err, Error::ChainLimitExceeded(1)));
        assert_eq!(card.transport().commands.len(), 2);
    }

    #[test]
    fn test_send_status_error() {
        let mut card = card(&[&hex!("6A 82")]);
        let err = card.select(&hex!("A0 00 00 03 08")).unwrap_err();

        assert_eq!(err.status_word(), Some(StatusWord::new(0x6A, 0x82)));
        assert_eq!(err.to_string(), "Status error 6A 82: file or application not found");
    }

    #[test]
    fn test_send_warning_is_error() {
        let mut card = card(&[&hex!("01 62 81")]);
        let err = card.send(&Command::new(0x00, 0xB0, 0x00, 0x00)).unwrap_err();
        assert_eq!(err.status_word(), Some(StatusWord::new(0x62, 0x81)));
    }

    #[test]
    fn test_send_invalid_command() {
        let mut card = card(&[&hex!("90 00")]);
        let command = Command::new_with_data(0x00, 0xDA, 0x00, 0x00, vec![0u8; 65_536]);
        let err = card.send(&command).unwrap_err();
        assert!(err.is_invalid_length());
        assert!(card.transport().commands.is_empty());
    }

    #[test]
    fn test_send_transport_error() {
        let mut card = card(&[]);
        let err = card.send(&Command::new(0x00, 0xA4, 0x04, 0x00)).unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Transmission)));
    }

    #[test]
    fn test_send_malformed_response() {
        let mut card = card(&[&hex!("90")]);
        let err = card.send(&Command::new(0x00, 0xA4, 0x04, 0x00)).unwrap_err();
        assert!(err.is_invalid_length());
    }

    #[test]
    fn test_select_command_layout() {
        let mut card = card(&[&hex!("6F 00 90 00")]);
        let data = card.select(&hex!("A0 00 00 03 08 00 00 10 00")).unwrap();
        assert_eq!(data.as_ref(), hex!("6F 00"));
        assert_eq!(
            card.transport().commands[0].as_ref(),
            hex!("00 A4 04 00 09 A0 00 00 03 08 00 00 10 00 00")
        );
    }

    #[test]
    fn test_transaction_scoped() {
        let mut card = card(&[&hex!("90 00")]);
        {
            let mut tx = card.transaction().unwrap();
            tx.select(&hex!("D2 76 00 01 24 01")).unwrap();
            tx.send(&Command::new(0x00, 0xCA, 0x00, 0x6E)).unwrap();
        }
        assert_eq!(card.transport().events, vec!["begin", "end"]);
        assert_eq!(card.transport().commands.len(), 2);
    }

    #[test]
    fn test_transaction_end_once() {
        let mut card = card(&[&hex!("90 00")]);
        let tx = card.transaction().unwrap();
        tx.end().unwrap();
        assert_eq!(card.transport().events, vec!["begin", "end"]);
    }

    #[test]
    fn test_transaction_begin_failure() {
        let mut card = card(&[&hex!("90 00")]);
        card.transport_mut().fail_begin = true;
        let err = card.transaction().unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::TransactionInProgress)
        ));
        assert!(card.transport().events.is_empty());
    }

    #[test]
    fn test_with_transaction_releases_on_error() {
        let mut card = card(&[&hex!("69 82")]);
        let err = card
            .with_transaction(|tx| tx.send(&Command::new(0x00, 0x20, 0x00, 0x81)))
            .unwrap_err();

        assert_eq!(err.status_word(), Some(StatusWord::new(0x69, 0x82)));
        assert_eq!(card.transport().events, vec!["begin", "end"]);
    }

    #[test]
    fn test_with_transaction_release_failure() {
        let mut card = card(&[&hex!("01 90 00")]);
        card.transport_mut().fail_end = true;
        let err = card
            .with_transaction(|tx| tx.send(&Command::new(0x00, 0xCA, 0x00, 0x6E)))
            .unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::NoTransaction)));
        assert_eq!(card.transport().events, vec!["begin", "end"]);

        // Closure error wins over the release error
        let err = card
            .with_transaction(|_| -> Result<()> { Err(Error::status(0x6A, 0x88)) })
            .unwrap_err();
        assert_eq!(err.status_word(), Some(StatusWord::new(0x6A, 0x88)));
    }

    #[test]
    fn test_capabilities_unsupported() {
        let mut card = card(&[&hex!("90 00")]);
        assert!(!card.reconnect(true).unwrap());
        assert_eq!(card.reader_name(), None);
        assert!(card.metadata().is_none());
        assert!(card.atr().is_none());

        card.close().unwrap();
        assert_eq!(card.transport().events, vec!["close"]);
    }
}
