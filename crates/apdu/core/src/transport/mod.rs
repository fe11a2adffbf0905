//! Transport traits for APDU communication with cards
//!
//! A transport moves raw bytes to and from a card and offers exclusive access
//! through transactions. Anything beyond that (reconnecting, naming the reader,
//! reporting metadata) is an optional capability: a transport advertises it by
//! overriding the matching `as_*` probe, and callers treat `None` as "unsupported".

pub mod error;

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
pub use error::TransportError;
use tracing::{debug, trace};

/// Trait for basic card transports
///
/// A transport is responsible for sending and receiving raw APDU bytes.
/// It has no knowledge of command structure or protocol details such as
/// response chaining.
pub trait CardTransport: Send + fmt::Debug {
    /// Send raw APDU bytes to card and return response bytes
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        trace!(command = %hex::encode(command), "Transmitting raw command");
        let result = self.do_transmit_raw(command);
        match &result {
            Ok(response) => {
                trace!(response = %hex::encode(response), "Received raw response");
            }
            Err(e) => {
                debug!(error = %e, "Transport error during transmission");
            }
        }
        result
    }

    /// Internal implementation of transmit_raw
    /// This is the method that concrete implementations should override
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError>;

    /// Acquire exclusive access to the card
    fn begin_transaction(&mut self) -> Result<(), TransportError>;

    /// Release exclusive access to the card
    fn end_transaction(&mut self) -> Result<(), TransportError>;

    /// Release the card handle
    fn close(&mut self) -> Result<(), TransportError>;

    /// Probe for the reconnect capability
    fn as_reconnect(&mut self) -> Option<&mut dyn Reconnect> {
        None
    }

    /// Probe for the reader name capability
    fn as_reader_name(&self) -> Option<&dyn ReaderName> {
        None
    }

    /// Probe for the metadata capability
    fn as_metadata(&self) -> Option<&dyn Metadata> {
        None
    }
}

/// Transports that can re-establish their card connection
pub trait Reconnect {
    /// Reconnect to the card, resetting it first if `reset` is set
    fn reconnect(&mut self, reset: bool) -> Result<(), TransportError>;
}

/// Transports bound to a named reader
pub trait ReaderName {
    /// Name of the reader the card sits in
    fn reader_name(&self) -> &str;
}

/// Transports that can describe the card and reader
pub trait Metadata {
    /// Answer-to-reset of the connected card
    fn atr(&self) -> Result<Bytes, TransportError>;

    /// Free-form key/value description of the reader and card
    fn metadata(&self) -> BTreeMap<String, String>;
}

impl<T: CardTransport + ?Sized> CardTransport for Box<T> {
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        (**self).transmit_raw(command)
    }

    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        (**self).do_transmit_raw(command)
    }

    fn begin_transaction(&mut self) -> Result<(), TransportError> {
        (**self).begin_transaction()
    }

    fn end_transaction(&mut self) -> Result<(), TransportError> {
        (**self).end_transaction()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }

    fn as_reconnect(&mut self) -> Option<&mut dyn Reconnect> {
        (**self).as_reconnect()
    }

    fn as_reader_name(&self) -> Option<&dyn ReaderName> {
        (**self).as_reader_name()
    }

    fn as_metadata(&self) -> Option<&dyn Metadata> {
        (**self).as_metadata()
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
#[allow(missing_docs)]
pub struct MockTransport {
    /// Mock responses to return
    pub responses: Vec<Bytes>,
    /// Commands that were sent
    pub commands: Vec<Bytes>,
    /// Lifecycle calls in order: "begin", "end", "close"
    pub events: Vec<&'static str>,
    /// Fail the next begin_transaction call
    pub fail_begin: bool,
    /// Fail every end_transaction call
    pub fail_end: bool,
    /// Whether the transport is closed
    pub closed: bool,
}

#[cfg(test)]
impl MockTransport {
    /// Create a new mock transport with the given responses
    pub fn new(responses: Vec<Bytes>) -> Self {
        Self {
            responses,
            ..Default::default()
        }
    }

    /// Create a new mock transport that always returns the given response
    pub fn with_response(response: Bytes) -> Self {
        Self::new(vec![response])
    }

    /// Create a new mock transport that always returns success (90 00)
    pub fn with_success() -> Self {
        Self::with_response(Bytes::from_static(&[0x90, 0x00]))
    }
}

#[cfg(test)]
impl CardTransport for MockTransport {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }

        self.commands.push(Bytes::copy_from_slice(command));

        if self.responses.is_empty() {
            return Err(TransportError::Transmission);
        }

        // Either clone the single response or take the next one
        if self.responses.len() == 1 {
            Ok(self.responses[0].clone())
        } else {
            Ok(self.responses.remove(0))
        }
    }

    fn begin_transaction(&mut self) -> Result<(), TransportError> {
        if std::mem::take(&mut self.fail_begin) {
            return Err(TransportError::TransactionInProgress);
        }
        self.events.push("begin");
        Ok(())
    }

    fn end_transaction(&mut self) -> Result<(), TransportError> {
        self.events.push("end");
        if self.fail_end {
            return Err(TransportError::NoTransaction);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.events.push("close");
        self.closed = true;
        Ok(())
    }
}
