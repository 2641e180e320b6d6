//! # HDLC Character-Oriented Deframing
//!
//! This module converts the raw byte stream read from the meter's M-Bus
//! serial link into validated HDLC frame payloads. It handles the `0x7E`
//! frame boundary flags, `0x7D` byte stuffing and the PPP FCS-16 frame
//! check sequence.
//!
//! The meter pushes unsolicited; there is no transmit or acknowledge path.
//! A frame that fails its FCS check is still delivered (flagged invalid) so
//! that downstream reassembly can reset instead of silently absorbing a
//! corrupted block.

pub mod deframer;
pub mod fcs;

pub use deframer::{Deframer, DeframerStats, Frame};
pub use fcs::{pppfcs16, wire_fcs, FCS_INIT};
