use clap::{Parser, Subcommand};
use iso7816_core::Card;
use iso7816_transport_pcsc::{PcscConfig, PcscDeviceManager};
use tracing::info;

mod commands;
mod utils;

use commands::*;
use utils::reader;

#[derive(Parser)]
#[command(version, about = "Talk to ISO/IEC 7816-4 smart cards over PC/SC")]
struct Cli {
    /// Reader name to use (auto-detects a reader with a card if not specified)
    #[arg(short, long, global = true, env = "ISO7816_READER")]
    reader: Option<String>,

    /// Debug level output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available readers
    List,

    /// Select an application by AID
    Select {
        /// AID in hex, or a well-known name such as `piv` or `openpgp`
        #[arg(required = true)]
        aid: String,
    },

    /// Send a raw command and print the complete response
    Send(SendArgs),

    /// Print the ATR and decoded historical bytes
    Atr,

    /// Decode TLV data offline
    Decode {
        /// TLV flavour
        #[arg(value_enum)]
        format: TlvFormat,

        /// Data in hex
        #[arg(required = true)]
        data: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    // Offline commands need no reader
    if let Commands::Decode { format, data } = &cli.command {
        return decode_command(*format, data);
    }

    let manager = PcscDeviceManager::new()?;

    if let Commands::List = &cli.command {
        return reader::list_readers(&manager);
    }

    let reader = match &cli.reader {
        Some(reader_name) => reader::find_reader_by_name(&manager, reader_name)?,
        None => reader::find_reader_with_card(&manager)?,
    };

    info!("Using reader: {}", reader.name());

    let transport = manager.open_reader_with_config(reader.name(), PcscConfig::default())?;
    let mut card = Card::new(transport);

    match &cli.command {
        Commands::List | Commands::Decode { .. } => unreachable!(), // Already handled above
        Commands::Select { aid } => select_command(&mut card, aid)?,
        Commands::Send(args) => send_command(&mut card, args)?,
        Commands::Atr => atr_command(&card)?,
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(true)
        .init();
}
