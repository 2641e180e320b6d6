//! # Generic Block Transfer Reassembly
//!
//! DLMS General-Block-Transfer splits an APDU into numbered blocks, each
//! carried in the information field of one HDLC frame. This module parses
//! single blocks and reassembles ordered sequences into complete APDUs.
//!
//! The meter's GBT sender pushes blocks reliably in order; there is no ack
//! path. Any ordering violation resets the sequence, and a fresh sequence
//! only starts on a block numbered 1.

pub mod block;
pub mod reassembler;

pub use block::{BlockError, GbtBlock};
pub use reassembler::Reassembler;
