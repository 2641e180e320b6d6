//! Extractor for the LG450 family of electricity meters.
//!
//! The push layout interleaves capability descriptors with measurement
//! leaves. Descriptor structures carry four fields, so their leading value
//! is parsed with a structure counter of 4; the measurement region at the
//! tail has no enclosing structure left. The logical device name follows
//! the `0.8.25.9.0.255` descriptor key.

use crate::axdr::value::Value;
use crate::axdr::DataNotification;
use crate::meter::MeterExtractor;
use crate::uplink::Encoder;

/// Fixed uplink channel of the LG450 device.
const LG450_CHANNEL: u8 = 10;

/// Descriptor key announcing the logical device name.
const DEVICE_NAME_KEY: &str = "0.8.25.9.0.255";

/// Maximum stored length of the logical device name.
const MAX_DEVICE_NAME: usize = 64;

/// Structure counter marking the first field of a capability descriptor.
const DESCRIPTOR_IDENT: u8 = 4;

/// Fields to step over for a capability descriptor.
const DESCRIPTOR_STRIDE: usize = 4;

/// Positions to step past the remaining descriptor fields once the device
/// name has been taken.
const DEVICE_NAME_STRIDE: usize = 14;

/// LG450 meter extractor.
#[derive(Debug, Default)]
pub struct Lg450 {
    logical_device_name: String,
}

impl Lg450 {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MeterExtractor for Lg450 {
    fn channel(&self) -> u8 {
        LG450_CHANNEL
    }

    fn parse(&mut self, data: &DataNotification) -> bool {
        log::debug!("Parse notification for LG450");

        let mut index = 0;
        while index < data.value_count() {
            let value = match data.value(index) {
                Some(value) => value,
                None => break,
            };

            if value.structure_ident == DESCRIPTOR_IDENT {
                // Descriptor meta fields are not extracted.
                index += DESCRIPTOR_STRIDE;
                continue;
            }

            if value.as_octet_string() == Some(DEVICE_NAME_KEY) {
                let name = match data.value(index + 1).and_then(|v| v.as_octet_string()) {
                    Some(name) => name,
                    None => {
                        log::warn!(
                            "Expected device name octet string after descriptor key at {index}, \
                             aborting extraction"
                        );
                        return false;
                    }
                };

                self.logical_device_name = name.chars().take(MAX_DEVICE_NAME).collect();
                log::info!("Found logical device name {}", self.logical_device_name);

                index += DEVICE_NAME_STRIDE;
                continue;
            }

            index += 1;
        }

        true
    }

    fn copy_data(&self, data: &DataNotification, encoder: &mut Encoder) {
        encoder.reset();

        if let Some(timestamp) = data.date_time().as_unix_timestamp() {
            encoder.add_unix_time(LG450_CHANNEL, timestamp as u32);
        }

        let mut index = 0;
        while index < data.value_count() {
            let value = match data.value(index) {
                Some(value) => value,
                None => break,
            };

            if value.structure_ident == DESCRIPTOR_IDENT {
                index += DESCRIPTOR_STRIDE;
                continue;
            }

            encoder.add_meter_value(LG450_CHANNEL, &value.value);
            index += 1;
        }
    }

    fn logical_device_name(&self) -> &str {
        &self.logical_device_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axdr::value::TypedValue;

    /// Notification shaped like the tail of a real LG450 push: a couple of
    /// descriptors, then the device name pair and measurement leaves.
    fn sample_notification() -> DataNotification {
        let mut apdu: Vec<u8> = vec![0x0F, 0x00, 0x00, 0x00, 0x01];
        apdu.extend_from_slice(&[
            0x0C, 0x07, 0xE6, 0x0B, 0x0B, 0x05, 0x14, 0x25, 0x1E, 0xFF, 0x80, 0x00, 0x00,
        ]);
        // Two 4-field descriptors.
        for class in [0x28u8, 0x01] {
            apdu.extend_from_slice(&[0x02, 0x04, 0x12, 0x00, class]);
            apdu.extend_from_slice(&[0x09, 0x06, 0x00, 0x08, 0x19, 0x09, 0x00, 0xFF]);
            apdu.extend_from_slice(&[0x0F, 0x02, 0x12, 0x00, 0x00]);
        }
        // Device name pair and measurements, outside any structure.
        apdu.extend_from_slice(&[0x09, 0x06, 0x00, 0x08, 0x19, 0x09, 0x00, 0xFF]);
        apdu.extend_from_slice(&[0x09, 0x08]);
        apdu.extend_from_slice(b"60222999");
        apdu.extend_from_slice(&[0x06, 0x00, 0x00, 0x00, 0x2A]);
        apdu.extend_from_slice(&[0x12, 0x00, 0x07]);
        DataNotification::parse(&apdu)
    }

    #[test]
    fn test_finds_logical_device_name() {
        let data = sample_notification();
        let mut meter = Lg450::new();

        assert!(meter.parse(&data));
        assert_eq!(meter.logical_device_name(), "60222999");
    }

    #[test]
    fn test_missing_device_name_aborts() {
        // Descriptor key as the very last value: nothing can follow it.
        let mut apdu: Vec<u8> = vec![0x00];
        apdu.extend_from_slice(&[0x09, 0x06, 0x00, 0x08, 0x19, 0x09, 0x00, 0xFF]);
        let data = DataNotification::parse(&apdu);

        let mut meter = Lg450::new();
        assert!(!meter.parse(&data));
        assert_eq!(meter.logical_device_name(), "");
    }

    #[test]
    fn test_device_name_length_preserved() {
        let mut apdu: Vec<u8> = vec![0x00];
        apdu.extend_from_slice(&[0x09, 0x06, 0x00, 0x08, 0x19, 0x09, 0x00, 0xFF]);
        apdu.extend_from_slice(&[0x09, 0x20]);
        apdu.extend(std::iter::repeat(b'x').take(0x20));
        let data = DataNotification::parse(&apdu);

        let mut meter = Lg450::new();
        assert!(meter.parse(&data));
        assert_eq!(meter.logical_device_name().len(), 32);
    }

    #[test]
    fn test_copy_data_skips_descriptors() {
        let data = sample_notification();
        let meter = Lg450::new();
        let mut encoder = Encoder::new();

        meter.copy_data(&data, &mut encoder);

        // Unix time triplet first.
        assert_eq!(encoder.buffer()[0], 10);
        assert_eq!(encoder.buffer()[1], 0x85);
        let unix: [u8; 4] = encoder.buffer()[2..6].try_into().unwrap();
        assert_eq!(u32::from_be_bytes(unix), 1668199050);

        // Descriptor values (structure counter 4 strides) were skipped;
        // the device name pair and the two measurement leaves remain.
        let tail = &encoder.buffer()[6..];
        assert_eq!(tail[0], 10); // channel
        assert_eq!(tail[1], 0); // first running index
        assert_eq!(tail[2], crate::uplink::lpp::LPP_TYPE_OCTET_STRING);
    }

    #[test]
    fn test_descriptor_strides_match_counters() {
        let data = sample_notification();
        let descriptor_leads: Vec<&TypedValue> = data
            .values()
            .iter()
            .filter(|v| v.structure_ident == DESCRIPTOR_IDENT)
            .collect();
        assert_eq!(descriptor_leads.len(), 2);
        assert!(descriptor_leads
            .iter()
            .all(|v| matches!(v.value, Value::U16(_))));
    }
}
