//! The program container and kernel-group computation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use meshq_hal::memory::{NUM_SEMAPHORES, SEMAPHORE_ALIGNMENT, SEMAPHORE_BASE};
use meshq_hal::{CoreCoord, CoreRangeSet};
use smallvec::SmallVec;
use snafu::{OptionExt, ensure};

use crate::circular_buffer::CircularBuffer;
use crate::error::{Result, TooManySemaphoresSnafu, UnknownKernelSnafu};
use crate::kernel::{Kernel, KernelId};
use crate::launch::LaunchMessage;
use crate::semaphore::Semaphore;

static NEXT_PROGRAM_ID: AtomicU64 = AtomicU64::new(0);

/// Maximal set of cores with an identical kernel assignment.
///
/// Each group receives exactly one launch message, multicast to its ranges.
#[derive(Debug, Clone)]
pub struct KernelGroup {
    pub kernel_ids: SmallVec<[KernelId; 3]>,
    pub core_ranges: CoreRangeSet,
    pub launch_msg: LaunchMessage,
}

/// Everything one launch delivers to the mesh.
#[derive(Debug)]
pub struct Program {
    id: u64,
    kernels: Vec<Kernel>,
    circular_buffers: Vec<CircularBuffer>,
    semaphores: Vec<Semaphore>,
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Program {
    pub fn new() -> Self {
        Self {
            id: NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed),
            kernels: Vec::new(),
            circular_buffers: Vec::new(),
            semaphores: Vec::new(),
        }
    }

    /// Process-unique identity, the program-cache key.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn add_kernel(&mut self, kernel: Kernel) -> KernelId {
        self.kernels.push(kernel);
        self.kernels.len() - 1
    }

    pub fn kernel(&self, id: KernelId) -> Result<&Kernel> {
        self.kernels.get(id).context(UnknownKernelSnafu { id })
    }

    pub fn kernel_mut(&mut self, id: KernelId) -> Result<&mut Kernel> {
        self.kernels.get_mut(id).context(UnknownKernelSnafu { id })
    }

    /// Kernel ids in insertion order; payload layout depends on this order.
    pub fn kernel_ids(&self) -> impl Iterator<Item = KernelId> + use<> {
        0..self.kernels.len()
    }

    pub fn kernels(&self) -> &[Kernel] {
        &self.kernels
    }

    pub fn add_circular_buffer(&mut self, cb: CircularBuffer) {
        self.circular_buffers.push(cb);
    }

    pub fn circular_buffers(&self) -> &[CircularBuffer] {
        &self.circular_buffers
    }

    /// Reserve the next semaphore slot with `initial_value` on `core_range_set`.
    ///
    /// Returns the slot's worker-L1 address.
    pub fn add_semaphore(&mut self, initial_value: u32, core_range_set: CoreRangeSet) -> Result<u32> {
        ensure!((self.semaphores.len() as u32) < NUM_SEMAPHORES, TooManySemaphoresSnafu { limit: NUM_SEMAPHORES });
        let address = SEMAPHORE_BASE + self.semaphores.len() as u32 * SEMAPHORE_ALIGNMENT;
        self.semaphores.push(Semaphore::new(address, initial_value, core_range_set));
        Ok(address)
    }

    pub fn semaphores(&self) -> &[Semaphore] {
        &self.semaphores
    }

    /// Unique logical cores running at least one kernel, in coordinate order.
    pub fn logical_cores(&self) -> Vec<CoreCoord> {
        self.assignments().into_keys().collect()
    }

    /// Group cores by identical kernel assignment and coalesce each group
    /// into rectangles. The launch message enables the union of the group's
    /// processor classes.
    pub fn kernel_groups(&self) -> Vec<KernelGroup> {
        let mut groups: BTreeMap<SmallVec<[KernelId; 3]>, Vec<CoreCoord>> = BTreeMap::new();
        for (core, kernel_ids) in self.assignments() {
            groups.entry(kernel_ids).or_default().push(core);
        }

        groups
            .into_iter()
            .map(|(kernel_ids, mut cores)| {
                cores.sort();
                let enables = kernel_ids.iter().map(|&id| self.kernels[id].processor().enable_bit()).fold(0, |m, b| m | b);
                KernelGroup {
                    core_ranges: CoreRangeSet::from_cores(&cores),
                    launch_msg: LaunchMessage::new(enables),
                    kernel_ids,
                }
            })
            .collect()
    }

    fn assignments(&self) -> BTreeMap<CoreCoord, SmallVec<[KernelId; 3]>> {
        let mut map: BTreeMap<CoreCoord, SmallVec<[KernelId; 3]>> = BTreeMap::new();
        for (id, kernel) in self.kernels.iter().enumerate() {
            for core in kernel.core_range_set().iter_cores() {
                map.entry(core).or_default().push(id);
            }
        }
        map
    }
}
