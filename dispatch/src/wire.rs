//! Fixed-layout device commands.
//!
//! A command is `NUM_BYTES_IN_DEVICE_COMMAND` bytes of little-endian 32-bit
//! words: a 16-word header at fixed positions, then an instruction stream
//! the consumer decodes positionally. Word order and bit positions are
//! shared with the on-device dispatcher and must not change.

use meshq_hal::BufferKind;
use meshq_hal::memory::MEM_L1_SIZE;
use snafu::ensure;

use crate::error::{CommandFullSnafu, Result};

/// Total 32-bit words in one command.
pub const NUM_ENTRIES_IN_DEVICE_COMMAND: usize = 5632;
pub const NUM_BYTES_IN_DEVICE_COMMAND: u32 = (NUM_ENTRIES_IN_DEVICE_COMMAND * 4) as u32;

/// Page granule of program transfer plans.
pub const PROGRAM_PAGE_SIZE: u32 = 2048;

/// Where the consumer core stages the command it is executing.
pub const L1_COMMAND_BASE: u32 = 102_400;

/// First byte of the consumer's data section, directly after the staged command.
pub const DATA_SECTION_ADDRESS: u32 = L1_COMMAND_BASE + NUM_BYTES_IN_DEVICE_COMMAND;

/// L1 left over for the producer's and consumer's data pipes.
pub const PRODUCER_DATA_BUFFER_SIZE: u32 = MEM_L1_SIZE - DATA_SECTION_ADDRESS;
pub const CONSUMER_DATA_BUFFER_SIZE: u32 = PRODUCER_DATA_BUFFER_SIZE / 2;

// Header word positions. A wrap marker is word 0 alone, so a default
// (all-zero) command reads as a run of no-ops.
pub const CMD_WRAP: usize = 0;
pub const CMD_FINISH: usize = 1;
pub const CMD_NUM_WORKERS: usize = 2;
pub const CMD_NUM_BUFFER_TRANSFERS: usize = 3;
pub const CMD_IS_PROGRAM: usize = 4;
pub const CMD_STALL: usize = 5;
pub const CMD_PAGE_SIZE: usize = 6;
pub const CMD_NUM_PAGES: usize = 7;
pub const CMD_DATA_SIZE: usize = 8;
pub const CMD_PRODUCER_CB_SIZE: usize = 9;
pub const CMD_CONSUMER_CB_SIZE: usize = 10;
pub const CMD_PRODUCER_CB_NUM_PAGES: usize = 11;
pub const CMD_CONSUMER_CB_NUM_PAGES: usize = 12;
pub const CMD_PRODUCER_CONSUMER_TRANSFER_NUM_PAGES: usize = 13;
pub const COMMAND_HEADER_NUM_WORDS: usize = 16;

pub const NUM_WORDS_PER_BUFFER_TRANSFER: usize = 6;
pub const NUM_WORDS_PER_PAGE_PARTIAL: usize = 5;

/// Builder for one device command.
///
/// The instruction cursor starts after the header; every word not written
/// stays zero so a truncated decode degenerates to no-ops.
pub struct DeviceCommand {
    desc: Vec<u32>,
    entry_idx: usize,
}

impl Default for DeviceCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceCommand {
    pub fn new() -> Self {
        Self { desc: vec![0; NUM_ENTRIES_IN_DEVICE_COMMAND], entry_idx: COMMAND_HEADER_NUM_WORDS }
    }

    pub fn set_finish(&mut self) {
        self.desc[CMD_FINISH] = 1;
    }

    pub fn set_is_program(&mut self) {
        self.desc[CMD_IS_PROGRAM] = 1;
    }

    /// Hold the producer from prefetching until prior writes have landed.
    pub fn set_stall(&mut self) {
        self.desc[CMD_STALL] = 1;
    }

    pub fn set_num_workers(&mut self, num_workers: u32) {
        self.desc[CMD_NUM_WORKERS] = num_workers;
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.desc[CMD_PAGE_SIZE] = page_size;
    }

    pub fn set_num_pages(&mut self, num_pages: u32) {
        self.desc[CMD_NUM_PAGES] = num_pages;
    }

    pub fn set_data_size(&mut self, data_size: u32) {
        self.desc[CMD_DATA_SIZE] = data_size;
    }

    pub fn get_data_size(&self) -> u32 {
        self.desc[CMD_DATA_SIZE]
    }

    pub fn set_producer_cb_size(&mut self, size: u32) {
        self.desc[CMD_PRODUCER_CB_SIZE] = size;
    }

    pub fn set_consumer_cb_size(&mut self, size: u32) {
        self.desc[CMD_CONSUMER_CB_SIZE] = size;
    }

    pub fn set_producer_cb_num_pages(&mut self, num_pages: u32) {
        self.desc[CMD_PRODUCER_CB_NUM_PAGES] = num_pages;
    }

    pub fn set_consumer_cb_num_pages(&mut self, num_pages: u32) {
        self.desc[CMD_CONSUMER_CB_NUM_PAGES] = num_pages;
    }

    pub fn set_producer_consumer_transfer_num_pages(&mut self, num_pages: u32) {
        self.desc[CMD_PRODUCER_CONSUMER_TRANSFER_NUM_PAGES] = num_pages;
    }

    /// Append a buffer-transfer instruction and count it in the header.
    pub fn add_buffer_transfer_instruction(
        &mut self,
        src_addr: u32,
        dst_addr: u32,
        num_pages: u32,
        page_size: u32,
        src_kind: BufferKind,
        dst_kind: BufferKind,
    ) -> Result<()> {
        let entry = self.reserve(NUM_WORDS_PER_BUFFER_TRANSFER)?;
        self.desc[entry..entry + NUM_WORDS_PER_BUFFER_TRANSFER]
            .copy_from_slice(&[src_addr, dst_addr, num_pages, page_size, src_kind as u32, dst_kind as u32]);
        self.desc[CMD_NUM_BUFFER_TRANSFERS] += 1;
        Ok(())
    }

    /// Announce that the next `num_transfers` partials belong to one page.
    pub fn write_program_entry(&mut self, num_transfers: u32) -> Result<()> {
        let entry = self.reserve(1)?;
        self.desc[entry] = num_transfers;
        Ok(())
    }

    /// Append a write-page-partial instruction.
    pub fn add_write_page_partial_instruction(
        &mut self,
        num_bytes: u32,
        dst_addr: u32,
        dst_noc_multicast_encoding: u32,
        num_receivers: u32,
        last_multicast_in_group: bool,
    ) -> Result<()> {
        let entry = self.reserve(NUM_WORDS_PER_PAGE_PARTIAL)?;
        self.desc[entry..entry + NUM_WORDS_PER_PAGE_PARTIAL].copy_from_slice(&[
            num_bytes,
            dst_addr,
            dst_noc_multicast_encoding,
            num_receivers,
            last_multicast_in_group as u32,
        ]);
        Ok(())
    }

    /// Serialized word view, exactly `NUM_BYTES_IN_DEVICE_COMMAND` bytes.
    pub fn get_desc(&self) -> &[u32] {
        &self.desc
    }

    fn reserve(&mut self, num_words: usize) -> Result<usize> {
        let entry = self.entry_idx;
        ensure!(entry + num_words <= NUM_ENTRIES_IN_DEVICE_COMMAND, CommandFullSnafu);
        self.entry_idx += num_words;
        Ok(entry)
    }
}
