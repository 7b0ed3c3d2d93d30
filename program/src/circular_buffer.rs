//! Circular-buffer configurations delivered at launch.

use bon::bon;
use meshq_hal::CoreRangeSet;
use smallvec::SmallVec;
use snafu::ensure;

use crate::error::{Result, UnevenCircularBufferSnafu};

/// On-device SRAM pipe between dispatcher and workers.
///
/// One configuration may be bound to several buffer indices; every core in
/// `core_ranges` receives the config for each bound index.
#[derive(Debug, Clone)]
pub struct CircularBuffer {
    buffer_indices: SmallVec<[u8; 4]>,
    core_ranges: CoreRangeSet,
    address: u32,
    total_size: u32,
    page_size: u32,
}

#[bon]
impl CircularBuffer {
    #[builder]
    pub fn new(
        #[builder(into)] buffer_indices: SmallVec<[u8; 4]>,
        core_ranges: CoreRangeSet,
        address: u32,
        total_size: u32,
        page_size: u32,
    ) -> Result<Self> {
        ensure!(
            page_size > 0 && total_size % page_size == 0,
            UnevenCircularBufferSnafu { total_size, page_size }
        );
        Ok(Self { buffer_indices, core_ranges, address, total_size, page_size })
    }

    pub fn buffer_indices(&self) -> &[u8] {
        &self.buffer_indices
    }

    pub fn core_ranges(&self) -> &CoreRangeSet {
        &self.core_ranges
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn total_size(&self) -> u32 {
        self.total_size
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn num_pages(&self) -> u32 {
        self.total_size / self.page_size
    }
}
