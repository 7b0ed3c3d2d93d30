//! The five command variants that drive the ring.
//!
//! Each variant assembles a [`DeviceCommand`] and walks the writer through
//! reserve → write → publish. The set is closed: a new kind implies new
//! on-device handling, so this is a tagged enum rather than an extension
//! point.

use meshq_hal::{Buffer, BufferKind, align};
use snafu::ensure;

use crate::error::{InvalidWriteBufferKindSnafu, PageTooLargeSnafu, Result};
use crate::map::{ProgramMap, TransferInfo};
use crate::ring::SystemMemoryWriter;
use crate::wire::{
    CONSUMER_DATA_BUFFER_SIZE, DeviceCommand, NUM_BYTES_IN_DEVICE_COMMAND, PRODUCER_DATA_BUFFER_SIZE,
    PROGRAM_PAGE_SIZE,
};

/// Command discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    ReadBuffer,
    WriteBuffer,
    Program,
    Finish,
    Wrap,
}

/// Size the producer/consumer circular buffers for a paged data stream and
/// pick the producer→consumer chunk size. Chunks are quarters of the
/// consumer buffer when it holds at least four pages, single pages below.
fn configure_paged_stream(command: &mut DeviceCommand, padded_page_size: u32) -> Result<()> {
    let mut consumer_cb_num_pages = CONSUMER_DATA_BUFFER_SIZE / padded_page_size;
    ensure!(
        consumer_cb_num_pages >= 1,
        PageTooLargeSnafu { padded_page_size, consumer_cb_size: CONSUMER_DATA_BUFFER_SIZE }
    );

    if consumer_cb_num_pages >= 4 {
        consumer_cb_num_pages = (consumer_cb_num_pages / 4) * 4;
        command.set_producer_consumer_transfer_num_pages(consumer_cb_num_pages / 4);
    } else {
        command.set_producer_consumer_transfer_num_pages(1);
    }

    let consumer_cb_size = consumer_cb_num_pages * padded_page_size;
    command.set_producer_cb_size(consumer_cb_size * 2);
    command.set_consumer_cb_size(consumer_cb_size);
    command.set_producer_cb_num_pages(consumer_cb_num_pages * 2);
    command.set_consumer_cb_num_pages(consumer_cb_num_pages);
    Ok(())
}

/// Pull a buffer's pages back into the ring's data section.
pub(crate) struct ReadBufferCommand<'a> {
    buffer: &'a Buffer,
    /// Ring byte offset where the device deposits the pages.
    pub read_buffer_addr: u32,
}

impl<'a> ReadBufferCommand<'a> {
    pub fn new(buffer: &'a Buffer) -> Self {
        Self { buffer, read_buffer_addr: 0 }
    }

    pub fn kind(&self) -> CommandKind {
        CommandKind::ReadBuffer
    }

    pub(crate) fn assemble_device_command(&self, dst_address: u32) -> Result<DeviceCommand> {
        let mut command = DeviceCommand::new();
        let padded_page_size = align(self.buffer.page_size(), 32);

        command.add_buffer_transfer_instruction(
            self.buffer.address(),
            dst_address,
            self.buffer.num_pages(),
            padded_page_size,
            self.buffer.kind(),
            BufferKind::SystemMemory,
        )?;
        configure_paged_stream(&mut command, padded_page_size)?;

        command.set_stall();
        command.set_page_size(padded_page_size);
        command.set_num_pages(self.buffer.num_pages());
        command.set_data_size(padded_page_size * self.buffer.num_pages());
        Ok(command)
    }

    pub fn process(&mut self, writer: &mut SystemMemoryWriter) -> Result<()> {
        let write_ptr = writer.cq_write_interface.fifo_wr_ptr << 4;
        let dst_address = write_ptr + NUM_BYTES_IN_DEVICE_COMMAND;
        self.read_buffer_addr = dst_address;

        let command = self.assemble_device_command(dst_address)?;
        let cmd_size = NUM_BYTES_IN_DEVICE_COMMAND + command.get_data_size();

        writer.cq_reserve_back(cmd_size);
        writer.cq_write(command.get_desc(), write_ptr);
        writer.cq_push_back(cmd_size);
        Ok(())
    }
}

/// Push host words out to a DRAM or L1 buffer.
pub(crate) struct WriteBufferCommand<'a> {
    buffer: &'a Buffer,
    src: &'a [u32],
}

impl<'a> WriteBufferCommand<'a> {
    pub fn new(buffer: &'a Buffer, src: &'a [u32]) -> Result<Self> {
        ensure!(
            matches!(buffer.kind(), BufferKind::Dram | BufferKind::L1),
            InvalidWriteBufferKindSnafu { kind: buffer.kind() }
        );
        Ok(Self { buffer, src })
    }

    pub fn kind(&self) -> CommandKind {
        CommandKind::WriteBuffer
    }

    /// A single-page buffer ships unpadded; paged buffers pad every page to
    /// the 32-byte transfer granularity.
    fn padded_page_size(&self) -> u32 {
        if self.buffer.page_size() == self.buffer.size() {
            self.buffer.page_size()
        } else {
            align(self.buffer.page_size(), 32)
        }
    }

    pub fn data_size_in_bytes(&self) -> u32 {
        self.padded_page_size() * self.buffer.num_pages()
    }

    pub(crate) fn assemble_device_command(&self, src_address: u32) -> Result<DeviceCommand> {
        let mut command = DeviceCommand::new();
        let padded_page_size = self.padded_page_size();

        command.add_buffer_transfer_instruction(
            src_address,
            self.buffer.address(),
            self.buffer.num_pages(),
            padded_page_size,
            BufferKind::SystemMemory,
            self.buffer.kind(),
        )?;
        configure_paged_stream(&mut command, padded_page_size)?;

        command.set_page_size(padded_page_size);
        command.set_num_pages(self.buffer.num_pages());
        command.set_data_size(self.data_size_in_bytes());
        Ok(command)
    }

    pub fn process(&mut self, writer: &mut SystemMemoryWriter) -> Result<()> {
        let write_ptr = writer.cq_write_interface.fifo_wr_ptr << 4;
        let data_address = write_ptr + NUM_BYTES_IN_DEVICE_COMMAND;

        let command = self.assemble_device_command(data_address)?;
        let cmd_size = NUM_BYTES_IN_DEVICE_COMMAND + command.get_data_size();

        writer.cq_reserve_back(cmd_size);
        writer.cq_write(command.get_desc(), write_ptr);

        let page_size = self.buffer.page_size();
        if page_size % 32 != 0 && page_size != self.buffer.size() {
            // Pages land at the padded stride so the consumer reads whole
            // contiguous padded pages.
            let mut dst = data_address;
            for page in self.src.chunks((page_size / 4) as usize) {
                writer.cq_write(page, dst);
                dst = align(dst + page_size, 32);
            }
        } else {
            writer.cq_write(self.src, data_address);
        }

        writer.cq_push_back(cmd_size);
        Ok(())
    }
}

/// Launch a mapped program: inline host data plus the cached DRAM image.
pub(crate) struct ProgramCommand<'a> {
    buffer: &'a Buffer,
    map: &'a ProgramMap,
    host_data: &'a [u32],
    stall: bool,
}

impl<'a> ProgramCommand<'a> {
    pub fn new(buffer: &'a Buffer, map: &'a ProgramMap, host_data: &'a [u32], stall: bool) -> Self {
        Self { buffer, map, host_data, stall }
    }

    pub fn kind(&self) -> CommandKind {
        CommandKind::Program
    }

    pub(crate) fn assemble_device_command(&self, host_data_src: u32) -> Result<DeviceCommand> {
        let mut command = DeviceCommand::new();
        command.set_is_program();
        command.set_num_workers(self.map.num_workers);

        let num_host_data_pages = self.map.num_transfers_in_host_data_pages.len() as u32;
        let num_program_binary_pages = self.map.num_transfers_in_program_pages.len() as u32;
        command.set_page_size(PROGRAM_PAGE_SIZE);
        command.set_num_pages(num_host_data_pages + num_program_binary_pages);
        // Only the host-data pages ride the ring; binaries stream from DRAM.
        command.set_data_size(PROGRAM_PAGE_SIZE * num_host_data_pages);

        // The consumer decodes program streams from the partials alone, so
        // destination address and kind in the transfer are placeholders.
        const DUMMY_DST: u32 = 0;
        const DUMMY_DST_KIND: BufferKind = BufferKind::Dram;

        if num_host_data_pages != 0 {
            command.add_buffer_transfer_instruction(
                host_data_src,
                DUMMY_DST,
                num_host_data_pages,
                PROGRAM_PAGE_SIZE,
                BufferKind::SystemMemory,
                DUMMY_DST_KIND,
            )?;
            populate_program_transfers(
                &mut command,
                &self.map.num_transfers_in_host_data_pages,
                &self.map.host_page_transfers,
            )?;
        }

        if num_program_binary_pages != 0 {
            command.add_buffer_transfer_instruction(
                self.buffer.address(),
                DUMMY_DST,
                num_program_binary_pages,
                PROGRAM_PAGE_SIZE,
                self.buffer.kind(),
                DUMMY_DST_KIND,
            )?;
            populate_program_transfers(
                &mut command,
                &self.map.num_transfers_in_program_pages,
                &self.map.program_page_transfers,
            )?;
        }

        const PRODUCER_CB_NUM_PAGES: u32 = PRODUCER_DATA_BUFFER_SIZE / PROGRAM_PAGE_SIZE;
        const CONSUMER_CB_NUM_PAGES: u32 = CONSUMER_DATA_BUFFER_SIZE / PROGRAM_PAGE_SIZE;
        command.set_producer_cb_size(PRODUCER_CB_NUM_PAGES * PROGRAM_PAGE_SIZE);
        command.set_consumer_cb_size(CONSUMER_CB_NUM_PAGES * PROGRAM_PAGE_SIZE);
        command.set_producer_cb_num_pages(PRODUCER_CB_NUM_PAGES);
        command.set_consumer_cb_num_pages(CONSUMER_CB_NUM_PAGES);

        // First launch only: the binary write must land in DRAM before the
        // producer may prefetch it.
        if self.stall {
            command.set_stall();
        }

        // Programs are small; keep producer→consumer chunks small too.
        command.set_producer_consumer_transfer_num_pages(4);
        Ok(command)
    }

    pub fn process(&mut self, writer: &mut SystemMemoryWriter) -> Result<()> {
        let write_ptr = writer.cq_write_interface.fifo_wr_ptr << 4;
        let data_address = write_ptr + NUM_BYTES_IN_DEVICE_COMMAND;

        let command = self.assemble_device_command(data_address)?;
        let cmd_size = NUM_BYTES_IN_DEVICE_COMMAND + command.get_data_size();

        writer.cq_reserve_back(cmd_size);
        writer.cq_write(command.get_desc(), write_ptr);
        if !self.host_data.is_empty() {
            writer.cq_write(self.host_data, data_address);
        }
        writer.cq_push_back(cmd_size);
        Ok(())
    }
}

/// Emit the precomputed per-page `entry(count)` + partial runs.
fn populate_program_transfers(
    command: &mut DeviceCommand,
    num_transfers_per_page: &[u32],
    transfers: &[TransferInfo],
) -> Result<()> {
    let mut next = 0usize;
    for &count in num_transfers_per_page {
        command.write_program_entry(count)?;
        for transfer in &transfers[next..next + count as usize] {
            command.add_write_page_partial_instruction(
                transfer.num_bytes,
                transfer.dst,
                transfer.dst_noc_multicast_encoding,
                transfer.num_receivers,
                transfer.last_multicast_in_group,
            )?;
        }
        next += count as usize;
    }
    debug_assert_eq!(next, transfers.len(), "per-page counts out of sync with transfer list");
    Ok(())
}

/// Header-only command that asks the consumer to raise the finish flag.
pub(crate) struct FinishCommand;

impl FinishCommand {
    pub fn kind(&self) -> CommandKind {
        CommandKind::Finish
    }

    pub fn process(&mut self, writer: &mut SystemMemoryWriter) -> Result<()> {
        let write_ptr = writer.cq_write_interface.fifo_wr_ptr << 4;
        let mut command = DeviceCommand::new();
        command.set_finish();

        writer.cq_reserve_back(NUM_BYTES_IN_DEVICE_COMMAND);
        writer.cq_write(command.get_desc(), write_ptr);
        writer.cq_push_back(NUM_BYTES_IN_DEVICE_COMMAND);
        Ok(())
    }
}

/// Fill the ring tail with no-ops and send both sides back to the start.
pub(crate) struct WrapCommand;

impl WrapCommand {
    pub fn kind(&self) -> CommandKind {
        CommandKind::Wrap
    }

    pub fn process(&mut self, writer: &mut SystemMemoryWriter) -> Result<()> {
        let write_ptr = writer.cq_write_interface.fifo_wr_ptr << 4;
        let space_left = writer.ring_size() - write_ptr;

        // All zeros decode as no-ops; the leading 1 sends the consumer home.
        let mut command_vector = vec![0u32; (space_left / 4) as usize];
        command_vector[0] = 1;

        writer.cq_reserve_back(space_left);
        writer.cq_write(&command_vector, write_ptr);
        writer.cq_push_back(space_left);
        Ok(())
    }
}
