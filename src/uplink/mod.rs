//! # Uplink Payload Encoding and Downlink Settings Decoding
//!
//! The gateway packs parsed meter values and its own telemetry into a
//! compact Cayenne-LPP style buffer handed to the uplink sink. The same
//! `channel | type | value` shape is reused in the opposite direction for
//! operator settings pushed over the downlink.

pub mod downlink;
pub mod lpp;

pub use downlink::apply_settings;
pub use lpp::{Encoder, EncoderError};
