//! Byte-at-a-time HDLC deframer with byte unstuffing and FCS validation.

use crate::constants::{
    HDLC_ESCAPE, HDLC_ESCAPE_XOR, HDLC_FLAG, HDLC_HEADER_LEN, HDLC_MAX_FRAME_SIZE,
};
use crate::hdlc::fcs::wire_fcs;
use crate::util::hex::log_frame_hex;

/// A deframed HDLC payload: everything between the flags except the two
/// FCS trailer bytes. The first [`HDLC_HEADER_LEN`] bytes are the HDLC
/// header; the DLMS router discards them.
#[derive(Debug, PartialEq, Eq)]
pub struct Frame<'a> {
    pub payload: &'a [u8],
    pub valid: bool,
}

/// Statistics for deframing operations
#[derive(Debug, Default, Clone, Copy)]
pub struct DeframerStats {
    pub frames_received: u64,
    pub fcs_errors: u64,
    pub overflows: u64,
}

/// Incremental deframer fed one byte at a time from the serial link.
///
/// The frame buffer holds the opening flag at position 0 so that stored
/// positions match flag-relative wire offsets. Escape processing only
/// applies inside the information field (position 9 onward); a stray flag
/// inside the header region is stored rather than interpreted, which keeps
/// the deframer from splitting on flag-valued address bytes.
#[derive(Debug)]
pub struct Deframer {
    buffer: [u8; HDLC_MAX_FRAME_SIZE],
    position: usize,
    escape_pending: bool,
    stats: DeframerStats,
}

impl Deframer {
    pub fn new() -> Self {
        Self {
            buffer: [0; HDLC_MAX_FRAME_SIZE],
            position: 0,
            escape_pending: false,
            stats: DeframerStats::default(),
        }
    }

    /// Discard any in-progress frame.
    pub fn reset(&mut self) {
        self.position = 0;
        self.escape_pending = false;
    }

    /// Current fill position of the frame buffer.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn stats(&self) -> DeframerStats {
        self.stats
    }

    /// Feed one received byte. Returns a frame event when `byte` closes a
    /// frame; the payload borrows the internal buffer and must be consumed
    /// before the next byte is pushed.
    pub fn push_byte(&mut self, byte: u8) -> Option<Frame<'_>> {
        if byte == HDLC_FLAG && !self.escape_pending {
            // A repeated opening flag is dropped.
            if self.position == 1 {
                return None;
            }

            // An opening flag, or a stray flag inside the header region,
            // cannot close a frame yet; store it like any other byte.
            if self.position <= HDLC_HEADER_LEN {
                self.store(byte);
                return None;
            }

            // Closing flag: buffer holds flag | header | info | fcs_hi | fcs_lo.
            let end = self.position;
            self.position = 0;
            self.stats.frames_received += 1;

            let stored_fcs = u16::from_be_bytes([self.buffer[end - 2], self.buffer[end - 1]]);
            let payload = &self.buffer[1..end - 2];
            let valid = stored_fcs == wire_fcs(payload);

            if !valid {
                self.stats.fcs_errors += 1;
                log_frame_hex("HDLC frame with bad FCS", payload);
            }
            log::debug!(
                "HDLC frame closed: {} payload bytes, fcs stored {stored_fcs:04X}, valid={valid}",
                payload.len()
            );

            return Some(Frame { payload, valid });
        }

        if self.escape_pending {
            self.escape_pending = false;
            self.store(byte ^ HDLC_ESCAPE_XOR);
        } else if byte == HDLC_ESCAPE && self.position > HDLC_HEADER_LEN {
            // Escapes are only honored inside the information field.
            self.escape_pending = true;
        } else {
            self.store(byte);
        }

        None
    }

    fn store(&mut self, byte: u8) {
        self.buffer[self.position] = byte;
        self.position += 1;

        if self.position >= HDLC_MAX_FRAME_SIZE {
            log::warn!("HDLC frame buffer overflow, discarding in-progress frame");
            self.stats.overflows += 1;
            self.reset();
        }
    }
}

impl Default for Deframer {
    fn default() -> Self {
        Self::new()
    }
}
