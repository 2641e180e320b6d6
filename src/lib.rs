//! # dlms-gateway - A DLMS/COSEM Push Gateway for Wired M-Bus Meters
//!
//! This crate implements the receive pipeline of a battery-powered gateway
//! that periodically wakes, reads a DLMS/COSEM-over-HDLC data push from a
//! wired M-Bus attached electricity meter, parses the payload into typed
//! data points and packs the result into a compact Cayenne-LPP style
//! uplink.
//!
//! ## Pipeline
//!
//! Four unidirectional stages, each a byte-to-event transformer with
//! bounded buffers:
//!
//! 1. [`hdlc`] - deframes the raw byte stream into validated frame
//!    payloads (byte unstuffing, PPP FCS-16).
//! 2. [`dlms`] - strips the LLC prefix, optionally unwraps ciphered
//!    APDUs, and routes General-Block-Transfer payloads onward.
//! 3. [`gbt`] - reassembles ordered blocks into a complete APDU.
//! 4. [`axdr`] - scans the APDU into a flat typed-value list with a
//!    timestamp and invocation id.
//!
//! A terminal stage, the [`meter`] extractor, pulls the logical device
//! name out of the capability descriptors and forwards measurement leaves
//! to the [`uplink`] encoder. The [`gateway`] module owns the cycle
//! driver tying the stages to a serial link and an uplink sink.
//!
//! ## Usage
//!
//! ```no_run
//! use dlms_gateway::config::AppConfig;
//! use dlms_gateway::gateway::{Gateway, LoggingSink};
//! use dlms_gateway::gateway::serial::SerialMeterLink;
//! use dlms_gateway::meter::Lg450;
//!
//! # async fn run() -> Result<(), dlms_gateway::error::GatewayError> {
//! let mut gateway = Gateway::new(
//!     AppConfig::default(),
//!     Lg450::new(),
//!     Box::new(SerialMeterLink::new("/dev/ttyUSB0")),
//!     Box::new(LoggingSink),
//! );
//! let report = gateway.run_cycle().await?;
//! println!("values: {}", report.value_count);
//! # Ok(())
//! # }
//! ```

pub mod axdr;
pub mod config;
pub mod constants;
pub mod dlms;
pub mod error;
pub mod gateway;
pub mod gbt;
pub mod hdlc;
pub mod logging;
pub mod meter;
pub mod uplink;
pub mod util;

pub use axdr::{DataNotification, DlmsDateTime, TypedValue, Value};
pub use config::{AppConfig, SettingsStore};
pub use error::GatewayError;
pub use gateway::{CycleReport, Gateway};
pub use gbt::{GbtBlock, Reassembler};
pub use hdlc::Deframer;
pub use logging::{init_logger, log_debug, log_error, log_info, log_warn};
pub use meter::{Lg450, MeterExtractor};
pub use uplink::Encoder;
