//! # DLMS Segment Routing
//!
//! Decides what an HDLC payload carries. The router discards the HDLC
//! header, strips an optional LLC prefix, optionally unwraps a ciphered
//! APDU through a pluggable transform, and forwards General-Block-Transfer
//! payloads to the reassembler. Everything else is dropped.

pub mod ciphering;
pub mod router;

pub use ciphering::{ApduTransform, CipherError, GcmCiphering};
pub use router::Router;
