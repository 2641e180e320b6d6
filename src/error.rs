//! # Gateway Error Handling
//!
//! This module defines the GatewayError enum, the error type surfaced by the
//! driver and configuration layers. Pipeline stages keep their own error
//! enums; nothing inside the receive pipeline propagates a hard failure,
//! every stage self-recovers at its next reset boundary.

use thiserror::Error;

/// Represents the error conditions the gateway driver can surface.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Indicates an error related to the serial port communication.
    #[error("Serial port error: {0}")]
    SerialPortError(String),

    /// Indicates that the settings store could not be read or written.
    #[error("Settings store error: {0}")]
    SettingsError(String),

    /// Indicates that the uplink sink rejected the payload.
    #[error("Uplink send error: {0}")]
    UplinkError(String),

    /// Indicates that the uplink retry budget is exhausted.
    #[error("Uplink send failed after {attempts} attempts")]
    UplinkExhausted { attempts: u32 },

    /// Indicates a failure in the ciphering pre-stage.
    #[error("Ciphering error: {0}")]
    Cipher(#[from] crate::dlms::ciphering::CipherError),

    /// A catch-all error for uncategorized cases.
    #[error("Other error: {0}")]
    Other(String),
}
