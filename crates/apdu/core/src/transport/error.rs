//! Error types specific to card transport

use std::error::Error as StdError;

/// Transport error type
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection error
    #[error("Failed to connect to device")]
    Connection,

    /// No card in the reader
    #[error("No card present")]
    NoCard,

    /// Transmission error
    #[error("Failed to transmit data")]
    Transmission,

    /// The card was reset by another party
    #[error("Card was reset")]
    CardReset,

    /// The card was removed
    #[error("Card was removed")]
    CardRemoved,

    /// A transaction is already open on this handle
    #[error("Transaction already in progress")]
    TransactionInProgress,

    /// Ending a transaction that was never begun
    #[error("No active transaction")]
    NoTransaction,

    /// Driver error (with code)
    #[error("Driver error code: {0}")]
    Driver(i32),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Cancelled operation
    #[error("Operation cancelled")]
    Cancelled,

    /// The transport has been closed
    #[error("Transport closed")]
    Closed,

    /// Error reported by the underlying driver binding
    #[error(transparent)]
    Backend(Box<dyn StdError + Send + Sync>),

    /// Other error with message
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Create a new driver error
    pub const fn driver(code: i32) -> Self {
        Self::Driver(code)
    }

    /// Wrap an error from the underlying driver binding
    pub fn backend<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Backend(Box::new(error))
    }

    /// Create a general other error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other(message.into())
    }

    /// Whether the card went away or was reset underneath the handle
    pub const fn is_card_lost(&self) -> bool {
        matches!(self, Self::CardReset | Self::CardRemoved | Self::NoCard)
    }
}
