//! Subcommand handlers

mod card_operations;
mod decode;

pub use card_operations::*;
pub use decode::*;
