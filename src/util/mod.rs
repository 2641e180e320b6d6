//! # Utility Modules
//!
//! Common helpers used throughout the crate: hex encoding/decoding for
//! logging and test vectors.

pub mod hex;

pub use hex::{decode_hex, encode_hex, format_hex_compact, hex_to_bytes};
