//! The command queue: front door of the dispatch layer.
//!
//! A single host thread drives the queue; commands execute synchronously
//! and become visible to the device in publish order. The ring is a strict
//! FIFO with no resend primitive, so every precondition is checked before
//! the first byte of a command is published.

use std::collections::HashMap;
use std::sync::Arc;

use meshq_hal::memory::MEM_L1_SIZE;
use meshq_hal::{Buffer, BufferKind, Cluster, Device, align};
use meshq_program::Program;
use snafu::{ResultExt, ensure};
use tracing::debug;

use crate::bootstrap::{KernelLoader, install_dispatch_kernels};
use crate::command::{FinishCommand, ProgramCommand, ReadBufferCommand, WrapCommand, WriteBufferCommand};
use crate::error::{
    CommandTooLargeSnafu, HalSnafu, PageExceedsDataSectionSnafu, ProgramBlockingSnafu, ReadBufferNonBlockingSnafu,
    Result, SourceTooLargeSnafu, WriteBufferBlockingSnafu,
};
use crate::map::{ProgramMap, build_program_map};
use crate::ring::{CQ_START, HOST_CQ_FINISH_PTR, HOST_CQ_READ_PTR, HOST_CQ_WRITE_PTR, SystemMemoryWriter};
use crate::wire::{DATA_SECTION_ADDRESS, NUM_BYTES_IN_DEVICE_COMMAND, PROGRAM_PAGE_SIZE};

/// Ring bytes kept free so a wrap marker always fits.
const WRAP_HEADROOM: u32 = 96;

/// Program state retained across launches of the same program.
struct CachedProgram {
    buffer: Buffer,
    map: ProgramMap,
}

/// Host-side driver of the on-device dispatch pair.
pub struct CommandQueue {
    device: Arc<Device>,
    cluster: Arc<dyn Cluster>,
    sysmem_writer: SystemMemoryWriter,
    program_cache: HashMap<u64, CachedProgram>,
}

impl CommandQueue {
    /// Open the queue: seed the ring pointer block, install the dispatch
    /// producer/consumer pair, and start with an empty program cache.
    pub fn new(device: Arc<Device>, cluster: Arc<dyn Cluster>, loader: &dyn KernelLoader) -> Result<Self> {
        let sysmem_writer = SystemMemoryWriter::new(Arc::clone(&cluster))?;

        let mut pointers = vec![0u32; (CQ_START / 4) as usize];
        pointers[(HOST_CQ_READ_PTR / 4) as usize] = CQ_START >> 4;
        pointers[(HOST_CQ_WRITE_PTR / 4) as usize] = CQ_START >> 4;
        cluster.write_sysmem(0, &pointers);

        install_dispatch_kernels(&device, cluster.as_ref(), loader)?;

        Ok(Self { device, cluster, sysmem_writer, program_cache: HashMap::new() })
    }

    /// Read a buffer back through the ring. Blocking is mandatory: the data
    /// only exists in the ring's data section once the device has finished.
    pub fn enqueue_read_buffer(&mut self, buffer: &Buffer, dst: &mut Vec<u32>, blocking: bool) -> Result<()> {
        ensure!(blocking, ReadBufferNonBlockingSnafu);

        let padded_page_size = align(buffer.page_size(), 32);
        let data_size_in_bytes = padded_page_size * buffer.num_pages();
        self.wrap_if_needed(NUM_BYTES_IN_DEVICE_COMMAND + data_size_in_bytes)?;

        let mut command = ReadBufferCommand::new(buffer);
        debug!(kind = ?command.kind(), address = buffer.address(), size = buffer.size(), "enqueue");
        command.process(&mut self.sysmem_writer)?;
        self.finish()?;

        let data = self.cluster.read_sysmem(command.read_buffer_addr, data_size_in_bytes);
        if buffer.page_size() % 32 != 0 {
            // Per-page padding strip back to the logical byte length.
            let page_words = (buffer.page_size() / 4) as usize;
            let padded_words = (padded_page_size / 4) as usize;
            let total_words = (buffer.size() / 4) as usize;
            let mut out = Vec::with_capacity(total_words);
            for page in data.chunks(padded_words) {
                let take = page_words.min(total_words - out.len());
                out.extend_from_slice(&page[..take]);
                if out.len() == total_words {
                    break;
                }
            }
            *dst = out;
        } else {
            *dst = data;
        }
        Ok(())
    }

    /// Stream host words out to a DRAM or L1 buffer. Non-blocking only.
    pub fn enqueue_write_buffer(&mut self, buffer: &Buffer, src: &[u32], blocking: bool) -> Result<()> {
        ensure!(!blocking, WriteBufferBlockingSnafu);
        let src_bytes = (src.len() * 4) as u32;
        ensure!(src_bytes <= buffer.size(), SourceTooLargeSnafu { src_bytes, buffer_size: buffer.size() });
        ensure!(
            buffer.page_size() < MEM_L1_SIZE - DATA_SECTION_ADDRESS,
            PageExceedsDataSectionSnafu { page_size: buffer.page_size() }
        );

        let mut command = WriteBufferCommand::new(buffer, src)?;
        self.wrap_if_needed(NUM_BYTES_IN_DEVICE_COMMAND + command.data_size_in_bytes())?;
        debug!(kind = ?command.kind(), address = buffer.address(), size = buffer.size(), "enqueue");
        command.process(&mut self.sysmem_writer)
    }

    /// Launch a program. The first launch of a program builds its transfer
    /// plan, stages the binary image in DRAM and stalls the consumer until
    /// that write lands; later launches reuse both.
    pub fn enqueue_program(&mut self, program: &Program, blocking: bool) -> Result<()> {
        ensure!(!blocking, ProgramBlockingSnafu);
        let program_id = program.id();

        let stall = !self.program_cache.contains_key(&program_id);
        if stall {
            let map = build_program_map(&self.device, program);
            let image_bytes = (map.program_pages.len() * 4) as u32;
            let buffer =
                Buffer::new(&self.device, image_bytes, PROGRAM_PAGE_SIZE, BufferKind::Dram).context(HalSnafu)?;
            self.enqueue_write_buffer(&buffer, &map.program_pages, false)?;
            self.program_cache.insert(program_id, CachedProgram { buffer, map });
        }

        let host_data = assemble_host_data(program);
        self.wrap_if_needed(NUM_BYTES_IN_DEVICE_COMMAND + (host_data.len() * 4) as u32)?;

        let cached = &self.program_cache[&program_id];
        let mut command = ProgramCommand::new(&cached.buffer, &cached.map, &host_data, stall);
        debug!(kind = ?command.kind(), program = program_id, stall, "enqueue");
        command.process(&mut self.sysmem_writer)
    }

    /// Post a finish marker and busy-poll the device's acknowledgement.
    pub fn finish(&mut self) -> Result<()> {
        self.wrap_if_needed(NUM_BYTES_IN_DEVICE_COMMAND)?;
        let mut command = FinishCommand;
        debug!(kind = ?command.kind(), "enqueue");
        command.process(&mut self.sysmem_writer)?;

        loop {
            let finish = self.cluster.read_sysmem(HOST_CQ_FINISH_PTR, 4);
            if finish[0] == 1 {
                break;
            }
            std::thread::yield_now();
        }
        // Rearm for the next finish.
        self.cluster.write_sysmem(HOST_CQ_FINISH_PTR, &[0]);
        Ok(())
    }

    /// Insert a wrap marker when `command_size` would cross the ring end.
    fn wrap_if_needed(&mut self, command_size: u32) -> Result<()> {
        let ring_size = self.sysmem_writer.ring_size();
        ensure!(
            command_size <= ring_size - WRAP_HEADROOM,
            CommandTooLargeSnafu { size: command_size, max: ring_size - WRAP_HEADROOM }
        );
        if (self.sysmem_writer.cq_write_interface.fifo_wr_ptr << 4) + command_size >= ring_size {
            let mut command = WrapCommand;
            debug!(kind = ?command.kind(), "enqueue");
            command.process(&mut self.sysmem_writer)?;
        }
        Ok(())
    }
}

/// Per-launch inline payload: each kernel's runtime-argument vectors padded
/// to 16-byte boundaries (kernel-id order, core order within a kernel),
/// then one 4-word config per circular-buffer index.
fn assemble_host_data(program: &Program) -> Vec<u32> {
    let mut host_data = Vec::new();
    for id in program.kernel_ids() {
        for args in program.kernels()[id].runtime_args().values() {
            host_data.extend_from_slice(args);
            host_data.resize(align(host_data.len() as u32, 4) as usize, 0);
        }
    }
    for cb in program.circular_buffers() {
        for _ in cb.buffer_indices() {
            host_data.push(cb.address() >> 4);
            host_data.push(cb.total_size() >> 4);
            host_data.push(cb.num_pages());
            host_data.push(cb.page_size() >> 4);
        }
    }
    host_data
}

#[cfg(test)]
pub(crate) fn host_data_for(program: &Program) -> Vec<u32> {
    assemble_host_data(program)
}
