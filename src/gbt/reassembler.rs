//! Ordered accumulation of GBT blocks into a complete APDU.

use crate::constants::{APDU_MAX_SIZE, GBT_MAX_BLOCKS};
use crate::gbt::block::GbtBlock;
use crate::util::hex::log_frame_hex;

/// Statistics for reassembly operations
#[derive(Debug, Default, Clone, Copy)]
pub struct ReassemblerStats {
    pub blocks_accepted: u64,
    pub sequence_resets: u64,
    pub apdus_completed: u64,
    pub apdus_oversize: u64,
}

/// Accumulates blocks numbered 1..k and emits the concatenated APDU when
/// the last-block bit arrives.
///
/// A block number that does not match the next expected position resets
/// the sequence; the mismatched block is kept only if it is numbered 1,
/// in which case it starts a fresh sequence.
#[derive(Debug)]
pub struct Reassembler {
    blocks: Vec<GbtBlock>,
    complete: bool,
    stats: ReassemblerStats,
}

impl Reassembler {
    pub fn new() -> Self {
        Self {
            blocks: Vec::with_capacity(GBT_MAX_BLOCKS),
            complete: false,
            stats: ReassemblerStats::default(),
        }
    }

    /// Discard the current sequence and clear the completion flag.
    pub fn reset(&mut self) {
        self.blocks.clear();
        self.complete = false;
    }

    /// True once an APDU has been emitted; cleared by [`reset`].
    ///
    /// [`reset`]: Reassembler::reset
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn stats(&self) -> ReassemblerStats {
        self.stats
    }

    /// Accept the next block. Returns the reassembled APDU when `block`
    /// completes a transfer.
    pub fn add_block(&mut self, block: GbtBlock) -> Option<Vec<u8>> {
        if self.blocks.len() >= GBT_MAX_BLOCKS {
            log::warn!(
                "GBT block slots exhausted ({GBT_MAX_BLOCKS}), dropping sequence"
            );
            self.reset();
        }

        let number = block.block_number();
        self.blocks.push(block);

        let expected = self.blocks.len() as u16;
        if number != expected {
            self.stats.sequence_resets += 1;
            let candidate = self.blocks.pop();
            self.blocks.clear();

            if number != 1 {
                log::info!(
                    "GBT block number mismatch (got {number}, expected {expected}), \
                     waiting for a new first block"
                );
                return None;
            }

            log::info!("GBT block number mismatch, restarting sequence with new first block");
            self.blocks.extend(candidate);
        }

        self.stats.blocks_accepted += 1;

        let last = self.blocks.last()?;
        if !last.is_last() {
            return None;
        }

        log::debug!("GBT last block received, joining {} blocks", self.blocks.len());

        let total: usize = self.blocks.iter().map(|b| b.content().len()).sum();
        if total > APDU_MAX_SIZE {
            log::warn!("Joined GBT blocks exceed APDU cap ({total} > {APDU_MAX_SIZE}), dropping");
            self.stats.apdus_oversize += 1;
            self.reset();
            return None;
        }

        let mut apdu = Vec::with_capacity(total);
        for b in &self.blocks {
            apdu.extend_from_slice(b.content());
        }

        self.blocks.clear();
        self.complete = true;
        self.stats.apdus_completed += 1;

        log_frame_hex("Reassembled APDU", &apdu);

        Some(apdu)
    }
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}
