//! Commands that talk to a card

use std::error::Error as StdError;

use clap::Args;
use colored::Colorize;
use iso7816_core::{
    Atr, Card, CardTransport, Command, Error, ExpectedLength, StatusCategory, StatusWord, aid,
    decode_ber,
};
use tracing::debug;

use crate::commands::decode::render;
use crate::utils;

/// Arguments of the `send` subcommand
#[derive(Args, Debug)]
pub struct SendArgs {
    /// Class byte
    #[arg(long, default_value = "00", value_parser = utils::parse_byte)]
    pub cla: u8,

    /// Instruction byte
    #[arg(long, value_parser = utils::parse_byte)]
    pub ins: u8,

    /// First parameter byte
    #[arg(long, default_value = "00", value_parser = utils::parse_byte)]
    pub p1: u8,

    /// Second parameter byte
    #[arg(long, default_value = "00", value_parser = utils::parse_byte)]
    pub p2: u8,

    /// Command data in hex
    #[arg(long, default_value = "")]
    pub data: String,

    /// Expected response length (0 for none, up to 65536)
    #[arg(long, default_value_t = 0)]
    pub ne: ExpectedLength,

    /// Instruction used to fetch remaining data after 61 XX
    #[arg(long, default_value = "C0", value_parser = utils::parse_byte)]
    pub get_remaining: u8,
}

/// Select an application and print its FCI
pub fn select_command<T: CardTransport>(
    card: &mut Card<T>,
    name: &str,
) -> Result<(), Box<dyn StdError>> {
    let id = utils::resolve_aid(name)?;
    debug!(aid = %hex::encode_upper(&id), "Selecting application");

    let fci = card.with_transaction(|tx| tx.select(&id))?;

    let label = aid::name_of(&id)
        .or_else(|| aid::Rid::of(&id).map(|rid| rid.name()))
        .unwrap_or("<unknown>");
    println!("{} {} ({})", "Selected".green().bold(), hex::encode_upper(&id), label);
    print_response_data(&fci);
    Ok(())
}

/// Send a raw command
///
/// A non-success status word is printed and then returned as the error.
pub fn send_command<T: CardTransport>(
    card: &mut Card<T>,
    args: &SendArgs,
) -> Result<(), Box<dyn StdError>> {
    let data = utils::parse_hex(&args.data)?;
    let command =
        Command::new_with_data_and_le(args.cla, args.ins, args.p1, args.p2, data, args.ne);

    card.config_mut().get_remaining = args.get_remaining;
    println!("{} {}", ">>".blue(), command);

    match card.send(&command) {
        Ok(data) => {
            println!("{} {}", "<<".blue(), StatusWord::new(0x90, 0x00).to_string().green());
            print_response_data(&data);
            Ok(())
        }
        Err(Error::Status(e)) => {
            let status = e.status_word();
            let rendered = match status.category() {
                StatusCategory::Warning => status.to_string().yellow(),
                _ => status.to_string().red(),
            };
            println!(
                "{} {} {}",
                "<<".blue(),
                rendered,
                status.description().unwrap_or("unknown status word")
            );
            Err(Error::Status(e).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Print the ATR of the card and its decoded historical bytes
pub fn atr_command<T: CardTransport>(card: &Card<T>) -> Result<(), Box<dyn StdError>> {
    let raw = card.atr().ok_or("Transport does not report an ATR")??;
    let atr = Atr::parse(&raw)?;

    println!("{} {}", "ATR:".bold(), atr);
    if let Some(reader) = card.reader_name() {
        println!("  Reader: {reader}");
    }
    println!("  TS: {:02X}  T0: {:02X}", atr.ts(), atr.t0());
    println!("  Protocols: {}", utils::protocol_list(&atr.protocols()));
    if let Some(tck) = atr.tck() {
        let check = if atr.checksum_valid() { "ok".green() } else { "invalid".red() };
        println!("  TCK: {tck:02X} ({check})");
    }

    let Some(historical) = atr.decode_historical_bytes() else {
        return Ok(());
    };
    let historical = historical?;

    println!("{} {}", "Historical bytes:".bold(), hex::encode_upper(atr.historical_bytes()));
    println!("  Category: {:02X}", historical.category);
    if let Some(aid) = &historical.aid {
        println!("  AID: {}", hex::encode_upper(aid));
    }
    if let Some(service) = historical.card_service {
        println!("  Card service: {service}");
    }
    if let Some(caps) = historical.card_capabilities {
        println!("  Card capabilities: {caps}");
    }
    for (label, value) in [
        ("Country code", &historical.country_code),
        ("Issuer ID", &historical.issuer_id),
        ("Initial access data", &historical.initial_access),
        ("Card issuer data", &historical.card_issuer),
        ("Pre-issuing data", &historical.pre_issuing),
    ] {
        if let Some(value) = value {
            println!("  {label}: {}", hex::encode_upper(value));
        }
    }
    if let Some(lcs) = historical.life_cycle {
        println!("  Life cycle status: {lcs:02X}");
    }
    if let Some(status) = historical.status {
        println!("  Processing status: {status}");
    }

    for (key, value) in card.metadata().unwrap_or_default() {
        debug!(%key, %value, "Reader metadata");
    }
    Ok(())
}

/// Print response data as hex, plus its BER-TLV structure if it parses
fn print_response_data(data: &[u8]) {
    if data.is_empty() {
        return;
    }
    println!("{}", hex::encode_upper(data));
    if let Ok(values) = decode_ber(data) {
        print!("{}", render(&values, 1));
    }
}
