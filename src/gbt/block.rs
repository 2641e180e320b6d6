//! Single GBT block parsing.
//!
//! Wire layout, starting at the GBT APDU tag:
//!
//! ```text
//! 0xE0 | block-control | block-number (BE u16) | ack-number (BE u16) | len | content
//! ```
//!
//! Block-control bit 7 marks the last block of a transfer, bit 6 streaming
//! mode; bits 5..0 carry the window size.

use crate::constants::GBT_TAG;
use nom::{
    bytes::complete::{tag, take},
    number::complete::{be_u16, u8 as be_u8},
    IResult,
};
use thiserror::Error;

const LAST_BLOCK_MASK: u8 = 0x80;
const STREAMING_MASK: u8 = 0x40;
const WINDOW_MASK: u8 = 0x3F;

/// Errors produced while parsing a GBT block
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlockError {
    #[error("Not a GBT block: first byte 0x{0:02X}")]
    NotGbt(u8),

    #[error("Truncated GBT block: {actual} bytes, need {needed}")]
    Truncated { needed: usize, actual: usize },

    #[error("Empty payload")]
    Empty,
}

/// One parsed GBT block with its content copied out of the frame buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GbtBlock {
    control: u8,
    number: u16,
    ack_number: u16,
    content: Vec<u8>,
}

fn parse_block(input: &[u8]) -> IResult<&[u8], GbtBlock> {
    let (input, _) = tag([GBT_TAG].as_slice())(input)?;
    let (input, control) = be_u8(input)?;
    let (input, number) = be_u16(input)?;
    let (input, ack_number) = be_u16(input)?;
    let (input, content_len) = be_u8(input)?;
    let (input, content) = take(content_len as usize)(input)?;

    Ok((
        input,
        GbtBlock {
            control,
            number,
            ack_number,
            content: content.to_vec(),
        },
    ))
}

impl GbtBlock {
    /// Parse a block from a routed HDLC payload (first byte must be the
    /// GBT tag).
    pub fn from_payload(data: &[u8]) -> Result<Self, BlockError> {
        let first = *data.first().ok_or(BlockError::Empty)?;
        if first != GBT_TAG {
            return Err(BlockError::NotGbt(first));
        }

        match parse_block(data) {
            Ok((_, block)) => Ok(block),
            Err(_) => {
                let needed = data.get(6).map(|&l| 7 + l as usize).unwrap_or(7);
                Err(BlockError::Truncated {
                    needed,
                    actual: data.len(),
                })
            }
        }
    }

    pub fn block_control(&self) -> u8 {
        self.control
    }

    /// Sequence number of this block within a transfer, 1-based.
    pub fn block_number(&self) -> u16 {
        self.number
    }

    pub fn ack_number(&self) -> u16 {
        self.ack_number
    }

    pub fn is_last(&self) -> bool {
        self.control & LAST_BLOCK_MASK != 0
    }

    pub fn is_streaming(&self) -> bool {
        self.control & STREAMING_MASK != 0
    }

    pub fn window_size(&self) -> u8 {
        self.control & WINDOW_MASK
    }

    /// Partial-APDU bytes carried by this block.
    pub fn content(&self) -> &[u8] {
        &self.content
    }
}
