//! Protocol constants shared across the receive pipeline.
//!
//! Values follow the Green Book framing for DLMS-over-HDLC and the buffer
//! budgets of small-memory gateway targets.

/// HDLC frame boundary octet (opening and closing flag).
pub const HDLC_FLAG: u8 = 0x7E;

/// HDLC control-escape octet; the following byte is XORed with
/// [`HDLC_ESCAPE_XOR`] on the wire.
pub const HDLC_ESCAPE: u8 = 0x7D;

/// XOR mask applied to an escaped octet.
pub const HDLC_ESCAPE_XOR: u8 = 0x20;

/// Length of the HDLC header after the opening flag: format/length,
/// destination address, source address, control and HCS.
pub const HDLC_HEADER_LEN: usize = 8;

/// Maximum bytes buffered for a single HDLC frame. An in-progress frame
/// exceeding this is discarded.
pub const HDLC_MAX_FRAME_SIZE: usize = 1024;

/// First byte of the optional LLC prefix (destination LSAP).
pub const LLC_DEST_SAP: u8 = 0xE6;

/// Second byte of the optional LLC prefix (source LSAP, response).
pub const LLC_SRC_SAP: u8 = 0xE7;

/// Length of the LLC prefix including its control byte.
pub const LLC_HEADER_LEN: usize = 3;

/// APDU tag for a General-Block-Transfer block.
pub const GBT_TAG: u8 = 0xE0;

/// APDU tag for a general-glo-ciphering wrapped APDU.
pub const GLO_CIPHERING_TAG: u8 = 0xDB;

/// Maximum number of GBT blocks held by the reassembler.
pub const GBT_MAX_BLOCKS: usize = 50;

/// Maximum size of a reassembled APDU. Larger transfers are discarded.
pub const APDU_MAX_SIZE: usize = 1024;

/// Maximum number of typed values produced per APDU.
pub const AXDR_MAX_VALUES: usize = 100;

/// Maximum structure/array nesting depth tracked by the parser.
pub const AXDR_MAX_NESTING: usize = 20;

/// Maximum raw length of an octet string; longer values are skipped.
pub const AXDR_MAX_STRING: usize = 32;

/// Capacity of the uplink encoder buffer in bytes.
pub const UPLINK_MAX_PAYLOAD: usize = 250;

/// Default interval between read-send cycles in milliseconds (15 minutes).
pub const DEFAULT_MEASURE_INTERVAL_MS: u64 = 900_000;

/// Default read-cycle timeout in milliseconds.
pub const DEFAULT_CYCLE_TIMEOUT_MS: u64 = 90_000;

/// Serial poll granularity: how long a single byte read waits before the
/// driver loop goes back to sleep.
pub const SERIAL_POLL_MS: u64 = 100;
