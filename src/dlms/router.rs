//! HDLC payload routing: LLC stripping and GBT detection.

use crate::constants::{
    GBT_TAG, GLO_CIPHERING_TAG, HDLC_HEADER_LEN, LLC_DEST_SAP, LLC_HEADER_LEN, LLC_SRC_SAP,
};
use crate::dlms::ciphering::ApduTransform;
use crate::util::hex::log_frame_hex;

/// Routes validated HDLC payloads toward the GBT reassembler.
///
/// Holds the optional ciphering transform applied to `0xDB` wrapped APDUs
/// before GBT detection. Without a transform, ciphered payloads are
/// dropped like any other non-GBT traffic.
pub struct Router {
    cipher: Option<Box<dyn ApduTransform + Send>>,
}

impl Router {
    pub fn new() -> Self {
        Self { cipher: None }
    }

    pub fn with_cipher(cipher: Box<dyn ApduTransform + Send>) -> Self {
        Self {
            cipher: Some(cipher),
        }
    }

    /// Extract the GBT bytes from a full deframed payload (HDLC header
    /// included), or `None` if the payload does not carry a GBT block.
    pub fn route(&self, payload: &[u8]) -> Option<Vec<u8>> {
        let mut data = payload.get(HDLC_HEADER_LEN..)?;

        if is_llc_header(data) {
            log::debug!("LLC header detected");
            data = &data[LLC_HEADER_LEN..];
        }

        match data.first() {
            Some(&GBT_TAG) => Some(data.to_vec()),
            Some(&GLO_CIPHERING_TAG) => self.route_ciphered(data),
            _ => {
                log_frame_hex("Not a GBT payload, dropped", data);
                None
            }
        }
    }

    fn route_ciphered(&self, data: &[u8]) -> Option<Vec<u8>> {
        let cipher = match &self.cipher {
            Some(cipher) => cipher,
            None => {
                log::info!("Ciphered APDU received but decryption is disabled, dropped");
                return None;
            }
        };

        match cipher.unwrap_apdu(data) {
            Ok(plain) if plain.first() == Some(&GBT_TAG) => Some(plain),
            Ok(_) => {
                log::info!("Deciphered APDU is not a GBT block, dropped");
                None
            }
            Err(e) => {
                log::warn!("Failed to unwrap ciphered APDU: {e}");
                None
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn is_llc_header(data: &[u8]) -> bool {
    data.len() >= LLC_HEADER_LEN && data[0] == LLC_DEST_SAP && data[1] == LLC_SRC_SAP
}
