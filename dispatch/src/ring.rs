//! Reserve/write/publish window over the host-mapped command ring.
//!
//! The first `CQ_START` bytes of the mapped region form the pointer block;
//! commands start at `CQ_START` and every command begins on a 16-byte
//! boundary. The device owns the read side of the block, the host the
//! write side, and each side's pointer write is its release to the other.

use std::sync::Arc;

use meshq_hal::Cluster;
use snafu::ensure;

use crate::error::{Result, RingTooSmallSnafu};
use crate::wire::NUM_BYTES_IN_DEVICE_COMMAND;

// Pointer-block byte offsets, one 16-byte slot each.
pub const HOST_CQ_READ_PTR: u32 = 0;
pub const HOST_CQ_WRITE_PTR: u32 = 16;
pub const HOST_CQ_READ_TOGGLE_PTR: u32 = 32;
pub const HOST_CQ_WRITE_TOGGLE_PTR: u32 = 48;
pub const HOST_CQ_FINISH_PTR: u32 = 64;

/// First byte of the command ring.
pub const CQ_START: u32 = 96;

/// Host-side ring state. `fifo_wr_ptr` counts 16-byte units.
#[derive(Debug, Clone, Copy)]
pub struct CqWriteInterface {
    pub fifo_wr_ptr: u32,
    pub wr_toggle: bool,
}

/// Writer half of the host↔device ring.
pub struct SystemMemoryWriter {
    cluster: Arc<dyn Cluster>,
    ring_size: u32,
    pub cq_write_interface: CqWriteInterface,
}

impl SystemMemoryWriter {
    pub fn new(cluster: Arc<dyn Cluster>) -> Result<Self> {
        let ring_size = cluster.sysmem_size();
        ensure!(
            ring_size % 16 == 0 && ring_size > CQ_START + NUM_BYTES_IN_DEVICE_COMMAND,
            RingTooSmallSnafu { ring_size }
        );
        Ok(Self {
            cluster,
            ring_size,
            cq_write_interface: CqWriteInterface { fifo_wr_ptr: CQ_START >> 4, wr_toggle: false },
        })
    }

    /// Bytes in the mapped ring, `HUGE_PAGE_SIZE` in production.
    pub fn ring_size(&self) -> u32 {
        self.ring_size
    }

    /// Block until `n_bytes` are free at the back of the ring.
    ///
    /// Callers must already have checked the command fits the ring at all;
    /// this only waits for the device to drain. On the same lap the region
    /// from the write pointer to the ring end is free by construction, so
    /// waiting only happens after the host has wrapped ahead of the device.
    pub fn cq_reserve_back(&self, n_bytes: u32) {
        let n16 = n_bytes >> 4;
        let wr = self.cq_write_interface.fifo_wr_ptr;
        debug_assert!((wr << 4) + n_bytes <= self.ring_size, "reserve past ring end without wrap");

        loop {
            let rd = self.cluster.read_sysmem(HOST_CQ_READ_PTR, 4)[0];
            let rd_toggle = self.cluster.read_sysmem(HOST_CQ_READ_TOGGLE_PTR, 4)[0] != 0;
            if self.cq_write_interface.wr_toggle == rd_toggle || wr + n16 <= rd {
                break;
            }
            std::hint::spin_loop();
        }
    }

    /// Copy `data` into the ring at byte offset `dst_offset` (4-byte aligned).
    pub fn cq_write(&self, data: &[u32], dst_offset: u32) {
        self.cluster.write_sysmem(dst_offset, data);
    }

    /// Publish `n_bytes`: advance the write pointer and expose it to the
    /// device. Reaching the ring end returns the pointer to `CQ_START` and
    /// flips the toggle.
    pub fn cq_push_back(&mut self, n_bytes: u32) {
        let iface = &mut self.cq_write_interface;
        iface.fifo_wr_ptr += n_bytes >> 4;
        debug_assert!(iface.fifo_wr_ptr << 4 <= self.ring_size, "write pointer past ring end");

        if iface.fifo_wr_ptr << 4 == self.ring_size {
            iface.fifo_wr_ptr = CQ_START >> 4;
            iface.wr_toggle = !iface.wr_toggle;
        }

        // The cluster write is a release: the device observes the payload
        // before the moved pointer.
        let (ptr, toggle) = (iface.fifo_wr_ptr, iface.wr_toggle as u32);
        self.cluster.write_sysmem(HOST_CQ_WRITE_PTR, &[ptr]);
        self.cluster.write_sysmem(HOST_CQ_WRITE_TOGGLE_PTR, &[toggle]);
    }
}
