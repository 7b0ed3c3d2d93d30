//! Host-mapped I/O seam between the queue and the device.
//!
//! The production transport maps system memory over PCIe and forwards L1
//! writes through the NoC; this crate only fixes the interface and ships an
//! in-memory implementation so the dispatch layer and its tests run against
//! real memory traffic. The queue takes the cluster as an injected handle,
//! never as a process global.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;

use crate::coord::CoreCoord;

/// Host↔device I/O primitives.
///
/// `write_sysmem` must publish with release semantics: a reader that
/// observes a later pointer write must observe every payload word written
/// before it.
pub trait Cluster: Send + Sync {
    /// Bytes of host-mapped system memory (the command ring spans all of it).
    fn sysmem_size(&self) -> u32;

    /// Copy `data` into system memory at byte offset `offset` (4-byte aligned).
    fn write_sysmem(&self, offset: u32, data: &[u32]);

    /// Read `len_bytes` from system memory at byte offset `offset`.
    fn read_sysmem(&self, offset: u32, len_bytes: u32) -> Vec<u32>;

    /// Write words into a physical core's L1 at `addr`.
    fn write_core_l1(&self, core: CoreCoord, addr: u32, data: &[u32]);

    /// Deposit a launch message in a physical core's mailbox.
    fn write_launch_msg(&self, core: CoreCoord, msg: [u32; 4]);
}

/// `Cluster` over plain host memory.
///
/// Backs the ring with a word vector behind a mutex (lock release is the
/// release-store the trait requires) and records core L1 traffic so tests
/// can observe dispatch bootstrap and launch behaviour.
pub struct LocalCluster {
    sysmem: Mutex<Vec<u32>>,
    core_l1: Mutex<HashMap<CoreCoord, BTreeMap<u32, u32>>>,
    launch_msgs: Mutex<Vec<(CoreCoord, [u32; 4])>>,
}

impl LocalCluster {
    /// Map `sysmem_bytes` of system memory (16-byte multiple).
    pub fn new(sysmem_bytes: u32) -> Self {
        assert!(sysmem_bytes % 16 == 0, "system memory must be a 16-byte multiple");
        Self {
            sysmem: Mutex::new(vec![0; (sysmem_bytes / 4) as usize]),
            core_l1: Mutex::new(HashMap::new()),
            launch_msgs: Mutex::new(Vec::new()),
        }
    }

    /// Read back words previously written to a core's L1, zero-filled.
    pub fn read_core_l1(&self, core: CoreCoord, addr: u32, len_words: u32) -> Vec<u32> {
        let l1 = self.core_l1.lock();
        let words = l1.get(&core);
        (0..len_words)
            .map(|i| words.and_then(|w| w.get(&(addr + i * 4)).copied()).unwrap_or(0))
            .collect()
    }

    /// Launch messages deposited so far, in order.
    pub fn launch_msgs(&self) -> Vec<(CoreCoord, [u32; 4])> {
        self.launch_msgs.lock().clone()
    }
}

impl Cluster for LocalCluster {
    fn sysmem_size(&self) -> u32 {
        (self.sysmem.lock().len() * 4) as u32
    }

    fn write_sysmem(&self, offset: u32, data: &[u32]) {
        assert!(offset % 4 == 0, "sysmem writes must be 4-byte aligned");
        let word = (offset / 4) as usize;
        let mut sysmem = self.sysmem.lock();
        assert!(word + data.len() <= sysmem.len(), "sysmem write past end of mapping");
        sysmem[word..word + data.len()].copy_from_slice(data);
    }

    fn read_sysmem(&self, offset: u32, len_bytes: u32) -> Vec<u32> {
        assert!(offset % 4 == 0 && len_bytes % 4 == 0, "sysmem reads must be 4-byte aligned");
        let word = (offset / 4) as usize;
        let len = (len_bytes / 4) as usize;
        let sysmem = self.sysmem.lock();
        assert!(word + len <= sysmem.len(), "sysmem read past end of mapping");
        sysmem[word..word + len].to_vec()
    }

    fn write_core_l1(&self, core: CoreCoord, addr: u32, data: &[u32]) {
        let mut l1 = self.core_l1.lock();
        let words = l1.entry(core).or_default();
        for (i, value) in data.iter().enumerate() {
            words.insert(addr + (i as u32) * 4, *value);
        }
    }

    fn write_launch_msg(&self, core: CoreCoord, msg: [u32; 4]) {
        self.launch_msgs.lock().push((core, msg));
    }
}

impl std::fmt::Debug for LocalCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCluster").field("sysmem_bytes", &self.sysmem_size()).finish()
    }
}
