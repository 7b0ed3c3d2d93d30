//! Device-resident buffers.

use snafu::ensure;

use crate::device::Device;
use crate::error::{PageLargerThanBufferSnafu, Result, UnalignedBufferSizeSnafu};

/// Where a buffer (or one endpoint of a transfer) lives.
///
/// The discriminants are the wire values carried in buffer-transfer
/// instructions and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BufferKind {
    Dram = 0,
    L1 = 1,
    SystemMemory = 2,
}

/// A paged region of device memory.
///
/// `page_size` need not divide `size`; the final page is then partial and
/// transfers pad it out to the 32-byte transfer granularity.
#[derive(Debug, Clone)]
pub struct Buffer {
    address: u32,
    size: u32,
    page_size: u32,
    kind: BufferKind,
}

impl Buffer {
    pub fn new(device: &Device, size: u32, page_size: u32, kind: BufferKind) -> Result<Self> {
        ensure!(size % 4 == 0 && page_size % 4 == 0, UnalignedBufferSizeSnafu { size, page_size });
        ensure!(page_size > 0 && (page_size <= size || size == 0), PageLargerThanBufferSnafu { page_size, size });
        let address = device.allocate(kind, size)?;
        Ok(Self { address, size, page_size, kind })
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn num_pages(&self) -> u32 {
        self.size.div_ceil(self.page_size)
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }
}
