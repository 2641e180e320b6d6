//! Cayenne-LPP style uplink encoder.
//!
//! Two record shapes share the buffer:
//!
//! * telemetry triplets `channel | type | value` with the length implied
//!   by the type code (battery voltage, read-loop counter, send-failure
//!   counter, Unix time);
//! * meter values `channel | index | type | value`, where `index` is a
//!   running sequence number and the type code identifies the width
//!   (strings are null-terminated).
//!
//! Overflow is a soft failure: the encoder sets a sticky error flag and
//! refuses further writes until reset.

use crate::axdr::value::Value;
use crate::constants::UPLINK_MAX_PAYLOAD;
use bytes::{BufMut, BytesMut};
use thiserror::Error;

/// LPP type code for a u8 meter value.
pub const LPP_TYPE_U8: u8 = 1;
/// LPP type code for a u16 meter value.
pub const LPP_TYPE_U16: u8 = 2;
/// LPP type code for a u32 meter value.
pub const LPP_TYPE_U32: u8 = 3;
/// LPP type code for an octet-string meter value.
pub const LPP_TYPE_OCTET_STRING: u8 = 4;

/// Standard Cayenne LPP Unix time type.
pub const LPP_TYPE_UNIX_TIME: u8 = 0x85;
/// Reserved type: battery voltage in millivolts (u16).
pub const LPP_TYPE_BATTERY_VOLTAGE: u8 = 200;
/// Reserved type: cumulative read-loop counter (u32).
pub const LPP_TYPE_READ_LOOPS: u8 = 201;
/// Reserved type: cumulative send-failure counter (u16).
pub const LPP_TYPE_SEND_FAILURES: u8 = 202;

/// Errors latched by the encoder
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderError {
    #[error("Uplink buffer overflow at {0} bytes")]
    Overflow(usize),
}

/// Fixed-capacity uplink payload builder owned by the cycle driver.
#[derive(Debug)]
pub struct Encoder {
    buffer: BytesMut,
    max_size: usize,
    next_index: u8,
    error: Option<EncoderError>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_capacity(UPLINK_MAX_PAYLOAD)
    }

    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(max_size),
            max_size,
            next_index: 0,
            error: None,
        }
    }

    /// Clear the buffer, the value index and the error flag.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.next_index = 0;
        self.error = None;
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn error(&self) -> Option<EncoderError> {
        self.error
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    fn fits(&mut self, additional: usize) -> bool {
        if self.error.is_some() {
            return false;
        }
        if self.buffer.len() + additional > self.max_size {
            self.error = Some(EncoderError::Overflow(self.buffer.len() + additional));
            log::warn!("Uplink encoder overflow, refusing further values");
            return false;
        }
        true
    }

    /// Append the battery voltage telemetry triplet (millivolts).
    pub fn add_battery_voltage(&mut self, channel: u8, millivolts: u16) {
        if !self.fits(4) {
            return;
        }
        self.buffer.put_u8(channel);
        self.buffer.put_u8(LPP_TYPE_BATTERY_VOLTAGE);
        self.buffer.put_u16(millivolts);
    }

    /// Append the cumulative read-loop counter triplet.
    pub fn add_read_loops(&mut self, channel: u8, count: u32) {
        if !self.fits(6) {
            return;
        }
        self.buffer.put_u8(channel);
        self.buffer.put_u8(LPP_TYPE_READ_LOOPS);
        self.buffer.put_u32(count);
    }

    /// Append the cumulative send-failure counter triplet.
    pub fn add_send_failures(&mut self, channel: u8, count: u16) {
        if !self.fits(4) {
            return;
        }
        self.buffer.put_u8(channel);
        self.buffer.put_u8(LPP_TYPE_SEND_FAILURES);
        self.buffer.put_u16(count);
    }

    /// Append a Unix timestamp triplet.
    pub fn add_unix_time(&mut self, channel: u8, seconds: u32) {
        if !self.fits(6) {
            return;
        }
        self.buffer.put_u8(channel);
        self.buffer.put_u8(LPP_TYPE_UNIX_TIME);
        self.buffer.put_u32(seconds);
    }

    /// Append a parsed meter value with its running sequence index.
    /// Returns the index used, or `None` when the value was refused.
    pub fn add_meter_value(&mut self, channel: u8, value: &Value) -> Option<u8> {
        let payload_len = match value {
            Value::U8(_) => 1,
            Value::U16(_) => 2,
            Value::U32(_) => 4,
            Value::OctetString(s) => s.len() + 1,
        };
        if !self.fits(3 + payload_len) {
            return None;
        }

        let index = self.next_index;
        self.next_index = self.next_index.wrapping_add(1);

        self.buffer.put_u8(channel);
        self.buffer.put_u8(index);
        match value {
            Value::U8(v) => {
                self.buffer.put_u8(LPP_TYPE_U8);
                self.buffer.put_u8(*v);
            }
            Value::U16(v) => {
                self.buffer.put_u8(LPP_TYPE_U16);
                self.buffer.put_u16(*v);
            }
            Value::U32(v) => {
                self.buffer.put_u8(LPP_TYPE_U32);
                self.buffer.put_u32(*v);
            }
            Value::OctetString(s) => {
                self.buffer.put_u8(LPP_TYPE_OCTET_STRING);
                self.buffer.put_slice(s.as_bytes());
                self.buffer.put_u8(0);
            }
        }

        Some(index)
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
