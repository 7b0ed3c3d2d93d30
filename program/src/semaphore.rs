//! Semaphores seeded at launch.

use meshq_hal::CoreRangeSet;

/// A worker-L1 semaphore slot and its initial value.
#[derive(Debug, Clone)]
pub struct Semaphore {
    address: u32,
    initial_value: u32,
    core_range_set: CoreRangeSet,
}

impl Semaphore {
    pub fn new(address: u32, initial_value: u32, core_range_set: CoreRangeSet) -> Self {
        Self { address, initial_value, core_range_set }
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn initial_value(&self) -> u32 {
        self.initial_value
    }

    pub fn core_range_set(&self) -> &CoreRangeSet {
        &self.core_range_set
    }
}
