//! # Meter-Specific Extraction
//!
//! The typed-value list a DataNotification parses into is positional; what
//! the positions mean depends on the meter family pushing it. A meter
//! extractor walks the list, pulls the logical device identity out of the
//! capability descriptors and forwards measurement leaves to the uplink
//! encoder on the meter's fixed channel.

pub mod lg450;

use crate::axdr::DataNotification;
use crate::uplink::Encoder;

pub use lg450::Lg450;

/// Extraction seam between the parsed notification and the uplink buffer.
pub trait MeterExtractor: Send {
    /// Fixed uplink channel identifying this meter family.
    fn channel(&self) -> u8;

    /// Walk the notification for identity data. Returns false when the
    /// capability descriptors are malformed and extraction was aborted.
    fn parse(&mut self, data: &DataNotification) -> bool;

    /// Copy measurement values into the uplink encoder.
    fn copy_data(&self, data: &DataNotification, encoder: &mut Encoder);

    /// Logical device name found during the last parse, if any.
    fn logical_device_name(&self) -> &str;
}
