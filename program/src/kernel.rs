//! Kernels: binaries, runtime arguments, and the cores they run on.

use std::collections::BTreeMap;

use bon::bon;
use meshq_hal::{CoreCoord, CoreRangeSet};
use smallvec::SmallVec;
use strum::VariantArray;

/// Index of a kernel within its owning [`crate::Program`].
pub type KernelId = usize;

/// Class of RISC core a kernel is written for.
///
/// Data-movement kernels target one core class; a compute kernel spans the
/// three TRISCs and carries one sub-binary per [`TriscId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiscClass {
    Brisc,
    Ncrisc,
    Compute,
}

impl RiscClass {
    /// Bit in the launch-message enable mask.
    pub fn enable_bit(self) -> u32 {
        match self {
            RiscClass::Brisc => 1 << 0,
            RiscClass::Ncrisc => 1 << 1,
            RiscClass::Compute => 1 << 2,
        }
    }
}

/// Compute sub-kernel slots, in binary order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, VariantArray)]
pub enum TriscId {
    Trisc0,
    Trisc1,
    Trisc2,
}

/// One contiguous run of a kernel binary destined for a fixed link address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarySpan {
    pub dst: u64,
    pub words: Vec<u32>,
}

impl BinarySpan {
    pub fn num_bytes(&self) -> u32 {
        (self.words.len() * 4) as u32
    }
}

/// A compiled kernel image as a list of spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelBinary {
    pub spans: Vec<BinarySpan>,
}

/// A kernel plus everything needed to launch it.
#[derive(Debug, Clone)]
pub struct Kernel {
    name: String,
    processor: RiscClass,
    core_range_set: CoreRangeSet,
    binaries: SmallVec<[KernelBinary; 3]>,
    runtime_args: BTreeMap<CoreCoord, Vec<u32>>,
    defines: BTreeMap<String, String>,
    compile_args: Vec<u32>,
}

#[bon]
impl Kernel {
    #[builder]
    pub fn new(
        #[builder(into)] name: String,
        processor: RiscClass,
        core_range_set: CoreRangeSet,
        #[builder(default)] binaries: SmallVec<[KernelBinary; 3]>,
        #[builder(default)] defines: BTreeMap<String, String>,
        #[builder(default)] compile_args: Vec<u32>,
    ) -> Self {
        Self { name, processor, core_range_set, binaries, runtime_args: BTreeMap::new(), defines, compile_args }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn processor(&self) -> RiscClass {
        self.processor
    }

    pub fn core_range_set(&self) -> &CoreRangeSet {
        &self.core_range_set
    }

    pub fn binaries(&self) -> &[KernelBinary] {
        &self.binaries
    }

    pub fn set_binaries(&mut self, binaries: SmallVec<[KernelBinary; 3]>) {
        self.binaries = binaries;
    }

    /// Runtime arguments keyed by logical core, in deterministic core order.
    pub fn runtime_args(&self) -> &BTreeMap<CoreCoord, Vec<u32>> {
        &self.runtime_args
    }

    pub fn set_runtime_args(&mut self, core: CoreCoord, args: Vec<u32>) {
        debug_assert!(self.core_range_set.contains(core), "runtime args for core {core} outside kernel ranges");
        self.runtime_args.insert(core, args);
    }

    pub fn defines(&self) -> &BTreeMap<String, String> {
        &self.defines
    }

    pub fn compile_args(&self) -> &[u32] {
        &self.compile_args
    }
}
