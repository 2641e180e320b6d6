//! GCM-AES unwrapping of general-glo-ciphering APDUs.
//!
//! A ciphered push wraps the plaintext APDU in a `0xDB` envelope:
//!
//! ```text
//! 0xDB | title-len | system-title | len | security-byte | frame-counter (u32) | ciphertext | tag (12)
//! ```
//!
//! The 96-bit GCM nonce is the system title followed by the frame counter.
//! The additional authenticated data is the security byte prepended to the
//! 16-byte authentication key. The tag is truncated to 12 bytes.
//!
//! This transform sits between the DLMS router and the GBT reassembler and
//! is only active when decryption is enabled in the configuration.

use crate::constants::GLO_CIPHERING_TAG;
use aes::Aes128;
use aes_gcm::aead::generic_array::typenum::U12;
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{AesGcm, KeyInit, Nonce};
use thiserror::Error;

/// AES-128-GCM with a 96-bit nonce and a 96-bit (truncated) tag.
type Aes128Gcm12 = AesGcm<Aes128, U12, U12>;

/// Expected system title length in a meter push.
const SYSTEM_TITLE_LEN: usize = 8;

/// Truncated authentication tag length.
const TAG_LEN: usize = 12;

/// Errors produced while unwrapping a ciphered APDU
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CipherError {
    #[error("Not a ciphered APDU: first byte 0x{0:02X}")]
    NotCiphered(u8),

    #[error("Unsupported system title length {0}")]
    BadSystemTitle(u8),

    #[error("Ciphered APDU too short: {0} bytes")]
    TooShort(usize),

    #[error("Authentication tag check failed")]
    AuthFailed,
}

/// A transform applied to an APDU before GBT detection.
pub trait ApduTransform {
    /// Unwrap `apdu` into its plaintext form.
    fn unwrap_apdu(&self, apdu: &[u8]) -> Result<Vec<u8>, CipherError>;
}

/// GCM-AES unwrapping keyed from the persisted configuration.
pub struct GcmCiphering {
    aes_key: [u8; 16],
    auth_key: [u8; 17],
}

impl GcmCiphering {
    /// `auth_key[0]` is a placeholder for the security byte taken from
    /// each received APDU; bytes 1..17 hold the authentication key.
    pub fn new(aes_key: [u8; 16], auth_key: [u8; 17]) -> Self {
        Self { aes_key, auth_key }
    }
}

impl ApduTransform for GcmCiphering {
    fn unwrap_apdu(&self, apdu: &[u8]) -> Result<Vec<u8>, CipherError> {
        let first = *apdu.first().ok_or(CipherError::TooShort(0))?;
        if first != GLO_CIPHERING_TAG {
            return Err(CipherError::NotCiphered(first));
        }

        let title_len = *apdu.get(1).ok_or(CipherError::TooShort(apdu.len()))? as usize;
        if title_len != SYSTEM_TITLE_LEN {
            return Err(CipherError::BadSystemTitle(title_len as u8));
        }

        // tag | title-len | title | len | security | counter, then at
        // least the GCM tag.
        let cipher_start = 2 + title_len + 6;
        if apdu.len() < cipher_start + TAG_LEN {
            return Err(CipherError::TooShort(apdu.len()));
        }

        let security_byte = apdu[2 + title_len + 1];
        let frame_counter = &apdu[2 + title_len + 2..2 + title_len + 6];

        let mut nonce_bytes = [0u8; 12];
        nonce_bytes[..SYSTEM_TITLE_LEN].copy_from_slice(&apdu[2..2 + title_len]);
        nonce_bytes[SYSTEM_TITLE_LEN..].copy_from_slice(frame_counter);
        let nonce = Nonce::from(nonce_bytes);

        let mut aad = self.auth_key;
        aad[0] = security_byte;

        let cipher = Aes128Gcm12::new(&self.aes_key.into());
        let plaintext = cipher
            .decrypt(
                &nonce,
                Payload {
                    msg: &apdu[cipher_start..],
                    aad: &aad,
                },
            )
            .map_err(|_| CipherError::AuthFailed)?;

        log::debug!("Deciphered APDU: {} plaintext bytes", plaintext.len());

        Ok(plaintext)
    }
}
