//! Connection settings for a PC/SC card handle

use pcsc::{Disposition, Protocols, ShareMode};

/// What to do when a transmit reports that another party reset the card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetPolicy {
    /// Surface the reset as [`iso7816_core::transport::TransportError::CardReset`]
    Fail,
    /// Reconnect and retry the command once, unless a transaction was open
    #[default]
    Reconnect,
}

/// Connection settings for [`PcscTransport`](crate::PcscTransport)
///
/// `share_mode` applies outside of transactions; a transaction always holds
/// the card exclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcscConfig {
    /// Share mode between transactions
    pub share_mode: ShareMode,
    /// Protocols offered when connecting
    pub protocols: Protocols,
    /// Handling of a card reset seen during transmit
    pub on_reset: ResetPolicy,
    /// Card disposition applied by `close`
    pub close_disposition: Disposition,
}

impl PcscConfig {
    /// Shared access, T=0 or T=1, reconnect on reset and reset the card on close
    pub const DEFAULT: Self = Self {
        share_mode: ShareMode::Shared,
        protocols: Protocols::ANY,
        on_reset: ResetPolicy::Reconnect,
        close_disposition: Disposition::ResetCard,
    };

    /// Default settings
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Set the share mode used between transactions
    pub const fn with_share_mode(mut self, mode: ShareMode) -> Self {
        self.share_mode = mode;
        self
    }

    /// Set the protocols offered when connecting
    pub const fn with_protocols(mut self, protocols: Protocols) -> Self {
        self.protocols = protocols;
        self
    }

    /// Set the reset handling
    pub const fn with_reset_policy(mut self, policy: ResetPolicy) -> Self {
        self.on_reset = policy;
        self
    }

    /// Set the disposition used by `close`
    pub const fn with_close_disposition(mut self, disposition: Disposition) -> Self {
        self.close_disposition = disposition;
        self
    }

    pub(crate) const fn reconnects_on_reset(&self) -> bool {
        matches!(self.on_reset, ResetPolicy::Reconnect)
    }
}

impl Default for PcscConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PcscConfig::default();
        assert_eq!(config, PcscConfig::new());
        assert_eq!(config.share_mode, ShareMode::Shared);
        assert_eq!(config.protocols, Protocols::ANY);
        assert_eq!(config.close_disposition, Disposition::ResetCard);
        assert!(config.reconnects_on_reset());
    }

    #[test]
    fn test_builders() {
        let config = PcscConfig::new()
            .with_share_mode(ShareMode::Exclusive)
            .with_protocols(Protocols::T1)
            .with_reset_policy(ResetPolicy::Fail)
            .with_close_disposition(Disposition::LeaveCard);
        assert_eq!(config.share_mode, ShareMode::Exclusive);
        assert_eq!(config.protocols, Protocols::T1);
        assert_eq!(config.close_disposition, Disposition::LeaveCard);
        assert!(!config.reconnects_on_reset());
    }
}
