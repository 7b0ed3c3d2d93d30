//! Device handle: coordinate mapping and buffer placement.

use parking_lot::Mutex;
use smallvec::SmallVec;
use snafu::ensure;

use crate::buffer::BufferKind;
use crate::coord::CoreCoord;
use crate::error::{GridTooSmallSnafu, OutOfDeviceMemorySnafu, Result, UnplaceableBufferKindSnafu};
use crate::memory::{MEM_DRAM_SIZE, MEM_L1_BUFFER_BASE, MEM_L1_SIZE, align};

/// Monotonic bump allocator over one memory region.
#[derive(Debug)]
struct BumpRegion {
    cursor: u32,
    limit: u32,
}

impl BumpRegion {
    fn alloc(&mut self, kind: BufferKind, size: u32, alignment: u32) -> Result<u32> {
        let address = align(self.cursor, alignment);
        let end = address.checked_add(size);
        ensure!(
            end.is_some_and(|end| end <= self.limit),
            OutOfDeviceMemorySnafu { kind, requested: size, available: self.limit.saturating_sub(address) }
        );
        self.cursor = address + size;
        Ok(address)
    }
}

/// One accelerator chip.
///
/// The logical worker grid excludes the top row, which is reserved for the
/// dispatch producer/consumer pair. Physical row and column 0 carry routing,
/// so logical→physical mapping offsets by (1, 1).
#[derive(Debug)]
pub struct Device {
    id: u32,
    grid: CoreCoord,
    dispatch_cores: SmallVec<[CoreCoord; 2]>,
    dram: Mutex<BumpRegion>,
    l1: Mutex<BumpRegion>,
}

impl Device {
    /// Open device `id` with a logical grid of `grid.x` columns and `grid.y` rows.
    pub fn new(id: u32, grid: CoreCoord) -> Result<Self> {
        ensure!(grid.x >= 2 && grid.y >= 2, GridTooSmallSnafu { cols: grid.x, rows: grid.y });
        let dispatch_row = grid.y - 1;
        let dispatch_cores =
            SmallVec::from_iter([CoreCoord::new(0, dispatch_row), CoreCoord::new(1, dispatch_row)]);
        Ok(Self {
            id,
            grid,
            dispatch_cores,
            dram: Mutex::new(BumpRegion { cursor: 0, limit: MEM_DRAM_SIZE }),
            l1: Mutex::new(BumpRegion { cursor: MEM_L1_BUFFER_BASE, limit: MEM_L1_SIZE }),
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Logical grid extent, including the dispatch row.
    pub fn grid(&self) -> CoreCoord {
        self.grid
    }

    /// Resolve a logical worker coordinate to its physical NoC position.
    pub fn worker_core_from_logical_core(&self, logical: CoreCoord) -> CoreCoord {
        debug_assert!(logical.x < self.grid.x && logical.y < self.grid.y, "core {logical} outside grid {}", self.grid);
        CoreCoord::new(logical.x + 1, logical.y + 1)
    }

    /// Logical cores reserved for the dispatch producer/consumer pair.
    pub fn dispatch_cores(&self) -> &[CoreCoord] {
        &self.dispatch_cores
    }

    /// Place a buffer of `size` bytes, 32-byte aligned.
    pub(crate) fn allocate(&self, kind: BufferKind, size: u32) -> Result<u32> {
        match kind {
            BufferKind::Dram => self.dram.lock().alloc(kind, size, 32),
            BufferKind::L1 => self.l1.lock().alloc(kind, size, 32),
            BufferKind::SystemMemory => UnplaceableBufferKindSnafu { kind }.fail(),
        }
    }
}
