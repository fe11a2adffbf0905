use iso7816_transport_pcsc::{PcscDeviceManager, PcscError, PcscReader};

/// Find a reader with a specific name
pub fn find_reader_by_name(
    manager: &PcscDeviceManager,
    reader_name: &str,
) -> Result<PcscReader, Box<dyn std::error::Error>> {
    Ok(manager.reader(reader_name)?)
}

/// List all available readers
pub fn list_readers(manager: &PcscDeviceManager) -> Result<(), Box<dyn std::error::Error>> {
    let readers = match manager.list_readers() {
        Ok(readers) => readers,
        Err(PcscError::NoReadersAvailable) => {
            println!("No readers found!");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("Available readers:");
    for (i, reader) in readers.iter().enumerate() {
        match reader.atr() {
            Some(atr) => println!("{}. {} (ATR {})", i + 1, reader.name(), hex::encode_upper(atr)),
            None => println!("{}. {} (no card)", i + 1, reader.name()),
        }
    }

    Ok(())
}

/// Find a reader with a card inserted
pub fn find_reader_with_card(
    manager: &PcscDeviceManager,
) -> Result<PcscReader, Box<dyn std::error::Error>> {
    let reader = manager
        .list_readers()?
        .into_iter()
        .find(PcscReader::has_card)
        .ok_or("No card found in any reader!")?;

    Ok(reader)
}
