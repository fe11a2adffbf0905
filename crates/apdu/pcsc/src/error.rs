//! Error types for PC/SC transport

use iso7816_core::transport::TransportError;

/// PC/SC-specific errors
#[derive(Debug, thiserror::Error)]
pub enum PcscError {
    /// PC/SC error
    #[error("PC/SC error: {0}")]
    Pcsc(#[from] pcsc::Error),

    /// No readers available
    #[error("No readers available")]
    NoReadersAvailable,

    /// Reader not found
    #[error("Reader not found: {0}")]
    ReaderNotFound(String),

    /// No card present in reader
    #[error("No card present in reader: {0}")]
    NoCard(String),
}

impl From<PcscError> for TransportError {
    fn from(error: PcscError) -> Self {
        match error {
            PcscError::NoCard(_) | PcscError::Pcsc(pcsc::Error::NoSmartcard) => Self::NoCard,
            PcscError::NoReadersAvailable
            | PcscError::ReaderNotFound(_)
            | PcscError::Pcsc(pcsc::Error::UnknownReader | pcsc::Error::NoReadersAvailable) => {
                Self::Connection
            }
            PcscError::Pcsc(pcsc::Error::ResetCard) => Self::CardReset,
            PcscError::Pcsc(pcsc::Error::RemovedCard) => Self::CardRemoved,
            PcscError::Pcsc(pcsc::Error::SharingViolation) => Self::TransactionInProgress,
            PcscError::Pcsc(pcsc::Error::NotTransacted) => Self::NoTransaction,
            PcscError::Pcsc(pcsc::Error::Timeout) => Self::Timeout,
            PcscError::Pcsc(pcsc::Error::Cancelled) => Self::Cancelled,
            PcscError::Pcsc(e) => Self::backend(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_mapping() {
        let mapped = TransportError::from(PcscError::from(pcsc::Error::ResetCard));
        assert!(matches!(mapped, TransportError::CardReset));
        assert!(mapped.is_card_lost());

        let mapped = TransportError::from(PcscError::NoCard("Reader 0".into()));
        assert!(matches!(mapped, TransportError::NoCard));

        let mapped = TransportError::from(PcscError::ReaderNotFound("Reader 9".into()));
        assert!(matches!(mapped, TransportError::Connection));

        let mapped = TransportError::from(PcscError::from(pcsc::Error::SharingViolation));
        assert!(matches!(mapped, TransportError::TransactionInProgress));

        let mapped = TransportError::from(PcscError::from(pcsc::Error::InsufficientBuffer));
        assert!(matches!(mapped, TransportError::Backend(_)));
    }
}
