//! Device memory map.
//!
//! Every constant here is shared with the on-device firmware; values and
//! positions are fixed wire/ABI contract, not tunables.

/// Size of each worker core's L1 SRAM.
pub const MEM_L1_SIZE: u32 = 1024 * 1024;

/// DRAM channel capacity visible to buffer placement.
pub const MEM_DRAM_SIZE: u32 = 1 << 30;

/// Host-mapped system-memory region backing the command ring in production.
pub const HUGE_PAGE_SIZE: u32 = 1 << 30;

// Per-processor runtime-argument blocks in worker L1.
pub const BRISC_L1_ARG_BASE: u32 = 512;
pub const NCRISC_L1_ARG_BASE: u32 = 1024;
pub const TRISC_L1_ARG_BASE: u32 = 1536;

// Circular-buffer config table in worker L1.
pub const CIRCULAR_BUFFER_CONFIG_BASE: u32 = 2048;
pub const UINT32_WORDS_PER_CIRCULAR_BUFFER_CONFIG: u32 = 4;

// Semaphore slots in worker L1, one 16-byte slot each.
pub const SEMAPHORE_BASE: u32 = 4096;
pub const SEMAPHORE_ALIGNMENT: u32 = 16;
pub const NUM_SEMAPHORES: u32 = 4;

/// Host-visible address of the launch mailbox on every worker core.
pub const LAUNCH_MAILBOX_ADDRESS: u32 = 128;

/// First L1 address available for user buffer placement.
pub const MEM_L1_BUFFER_BASE: u32 = 128 * 1024;

// Link-time windows a kernel binary may target; spans landing in these
// windows are rebased into L1 staging areas before the firmware copies
// them to their run-time home.
pub const MEM_LOCAL_BASE: u32 = 0xFFB0_0000;
pub const MEM_NCRISC_IRAM_BASE: u32 = 0xFFC0_0000;

pub const MEM_BRISC_INIT_LOCAL_L1_BASE: u32 = 0x1A000;
pub const MEM_NCRISC_INIT_LOCAL_L1_BASE: u32 = 0x1B000;
pub const MEM_TRISC0_INIT_LOCAL_L1_BASE: u32 = 0x1C000;
pub const MEM_TRISC1_INIT_LOCAL_L1_BASE: u32 = 0x1D000;
pub const MEM_TRISC2_INIT_LOCAL_L1_BASE: u32 = 0x1E000;
pub const MEM_NCRISC_INIT_IRAM_L1_BASE: u32 = 0x1F000;

/// Tensix soft-reset register, passed to the dispatch kernels at compile time.
pub const TENSIX_SOFT_RESET_ADDR: u32 = 0xFFB1_2000;

// Command-queue pointer state in the dispatch producer's L1.
pub const CQ_READ_PTR: u32 = 256;
pub const CQ_READ_TOGGLE: u32 = 260;
pub const CQ_WRITE_PTR: u32 = 264;
pub const CQ_WRITE_TOGGLE: u32 = 268;

/// Round `addr` up to the next multiple of `alignment` (a power of two).
pub const fn align(addr: u32, alignment: u32) -> u32 {
    (addr.wrapping_sub(1) | (alignment - 1)).wrapping_add(1)
}
