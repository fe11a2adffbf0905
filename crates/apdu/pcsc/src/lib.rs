//! PC/SC transport for ISO/IEC 7816-4 card sessions
//!
//! This crate implements the `CardTransport` trait from `iso7816-core` on top of
//! the system PC/SC service, along with the reconnect, reader name and metadata
//! capabilities.
//!
//! # Examples
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use iso7816_core::{Card, aid};
//! use iso7816_transport_pcsc::PcscDeviceManager;
//!
//! let manager = PcscDeviceManager::new()?;
//! let readers = manager.list_readers()?;
//! let Some(reader) = readers.iter().find(|r| r.has_card()) else {
//!     println!("No card found");
//!     return Ok(());
//! };
//!
//! let mut card = Card::new(manager.open_reader(reader.name())?);
//! let fci = card.with_transaction(|tx| tx.select(aid::PIV))?;
//! println!("FCI: {}", hex::encode(fci));
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![warn(missing_docs)]

mod config;
mod error;
mod manager;
mod meta;
mod reader;
mod transport;

pub use config::{PcscConfig, ResetPolicy};
pub use error::PcscError;
pub use manager::PcscDeviceManager;
pub use reader::PcscReader;
pub use transport::PcscTransport;

// Re-export some pcsc types for convenience
pub use pcsc::{Disposition, Protocol, Protocols, ShareMode, Status};
