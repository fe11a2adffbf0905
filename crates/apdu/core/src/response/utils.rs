//! Utility functions for APDU response handling

use tracing::debug;

use crate::response::error::ResponseError;
use crate::response::status::StatusWord;

/// Largest raw response: 65536 data bytes and the status word
pub const MAX_RESPONSE_LEN: usize = 65_538;

/// Extract status word (SW1, SW2) and payload from raw APDU response data
///
/// Returns a tuple containing:
/// - The status word as a tuple (SW1, SW2)
/// - The payload data (without the status word)
///
/// # Errors
/// Returns an error if the data is shorter than the status word or longer than
/// an extended response can be.
pub fn extract_response_parts(data: &[u8]) -> Result<((u8, u8), &[u8]), ResponseError> {
    if data.len() > MAX_RESPONSE_LEN {
        debug!("Response too long: {} bytes", data.len());
        return Err(ResponseError::TooLong(data.len()));
    }

    match data {
        [payload @ .., sw1, sw2] => Ok(((*sw1, *sw2), payload)),
        _ => {
            debug!("Response too short: {} bytes", data.len());
            Err(ResponseError::Incomplete(data.len()))
        }
    }
}

/// Extract status word as a StatusWord object and payload from raw APDU response data
pub fn extract_status_and_payload(data: &[u8]) -> Result<(StatusWord, &[u8]), ResponseError> {
    let ((sw1, sw2), payload) = extract_response_parts(data)?;
    Ok((StatusWord::new(sw1, sw2), payload))
}
