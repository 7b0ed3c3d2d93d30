//! Paged transfer plans for program launches.
//!
//! A [`ProgramMap`] is built once per program and replayed by the on-device
//! consumer as a stream of NoC multicast writes. Emission order is
//! contractual: the consumer walks pages linearly and decodes the per-page
//! transfer counts positionally, so the plan and the page image must stay
//! in lockstep.

use meshq_hal::memory::{
    BRISC_L1_ARG_BASE, CIRCULAR_BUFFER_CONFIG_BASE, LAUNCH_MAILBOX_ADDRESS, MEM_BRISC_INIT_LOCAL_L1_BASE,
    MEM_LOCAL_BASE, MEM_NCRISC_INIT_IRAM_L1_BASE, MEM_NCRISC_INIT_LOCAL_L1_BASE, MEM_NCRISC_IRAM_BASE,
    MEM_TRISC0_INIT_LOCAL_L1_BASE, MEM_TRISC1_INIT_LOCAL_L1_BASE, MEM_TRISC2_INIT_LOCAL_L1_BASE,
    NCRISC_L1_ARG_BASE, SEMAPHORE_ALIGNMENT, TRISC_L1_ARG_BASE, UINT32_WORDS_PER_CIRCULAR_BUFFER_CONFIG,
};
use meshq_hal::noc::noc_multicast_encoding;
use meshq_hal::{CoreRangeSet, Device, align};
use meshq_program::{DispatchMode, Program, RiscClass, TriscId};
use smallvec::{SmallVec, smallvec};
use strum::VariantArray;

use crate::wire::PROGRAM_PAGE_SIZE;

/// Source cursor re-alignment after every emitted piece.
pub const NOC_TRANSFER_ALIGNMENT_IN_BYTES: u32 = 16;

/// One write-page-partial instruction of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferInfo {
    pub num_bytes: u32,
    pub dst: u32,
    pub dst_noc_multicast_encoding: u32,
    pub num_receivers: u32,
    pub last_multicast_in_group: bool,
}

/// Paged transfer plan plus the program-binary page image, cached per
/// program id for the queue's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramMap {
    /// Unique logical worker cores in the program.
    pub num_workers: u32,
    /// Binary spans, semaphore seeds and launch messages, padded to whole pages.
    pub program_pages: Vec<u32>,
    pub program_page_transfers: Vec<TransferInfo>,
    pub host_page_transfers: Vec<TransferInfo>,
    /// Transfers belonging to each program-binary page, in page order.
    pub num_transfers_in_program_pages: Vec<u32>,
    /// Same for the inline host-data (runtime-arg + CB config) pages.
    pub num_transfers_in_host_data_pages: Vec<u32>,
}

type MulticastInfo = SmallVec<[(u32, u32); 2]>;

/// One growing stream of paged transfers with its source cursor.
struct PageStream {
    transfers: Vec<TransferInfo>,
    transfers_per_page: Vec<u32>,
    transfers_in_current_page: u32,
    src: u32,
}

impl PageStream {
    fn new() -> Self {
        Self { transfers: Vec::new(), transfers_per_page: Vec::new(), transfers_in_current_page: 0, src: 0 }
    }

    /// Emit `num_bytes` at `dst` to every multicast destination, splitting
    /// at page boundaries and re-aligning the cursor after each piece.
    fn push(&mut self, mut num_bytes: u32, mut dst: u32, multicast: &MulticastInfo) {
        while num_bytes > 0 {
            let left_in_page = PROGRAM_PAGE_SIZE - (self.src % PROGRAM_PAGE_SIZE);
            let piece = num_bytes.min(left_in_page);
            self.src = align(self.src + piece, NOC_TRANSFER_ALIGNMENT_IN_BYTES);

            for (i, &(dst_noc_multicast_encoding, num_receivers)) in multicast.iter().enumerate() {
                self.transfers.push(TransferInfo {
                    num_bytes: piece,
                    dst,
                    dst_noc_multicast_encoding,
                    num_receivers,
                    last_multicast_in_group: i + 1 == multicast.len(),
                });
                self.transfers_in_current_page += 1;
            }

            dst += piece;
            num_bytes -= piece;

            if self.src % PROGRAM_PAGE_SIZE == 0 {
                self.close_page();
            }
        }
    }

    fn close_page(&mut self) {
        self.transfers_per_page.push(self.transfers_in_current_page);
        self.transfers_in_current_page = 0;
    }

    /// Close a partially filled trailing page.
    fn flush(&mut self) {
        if self.transfers_in_current_page > 0 {
            self.close_page();
        }
    }
}

/// Translate a program into its paged transfer plan and page image.
pub fn build_program_map(device: &Device, program: &Program) -> ProgramMap {
    // Host-data pages first: runtime args come from host memory and have
    // the longest pull latency.
    let mut host = PageStream::new();
    for id in program.kernel_ids() {
        let kernel = &program.kernels()[id];
        let dst = arg_base(kernel.processor());
        for (&core, args) in kernel.runtime_args() {
            let physical = device.worker_core_from_logical_core(core);
            // Runtime arguments have exactly one receiver.
            let unicast: MulticastInfo = smallvec![(noc_multicast_encoding(physical, physical), 1)];
            host.push((args.len() * 4) as u32, dst, &unicast);
        }
    }

    for cb in program.circular_buffers() {
        let multicast = multicast_info(device, cb.core_ranges());
        let num_bytes = UINT32_WORDS_PER_CIRCULAR_BUFFER_CONFIG * 4;
        for &index in cb.buffer_indices() {
            host.push(num_bytes, CIRCULAR_BUFFER_CONFIG_BASE + index as u32 * num_bytes, &multicast);
        }
    }
    host.flush();

    // Program-binary pages: new stream, cursor back to zero.
    let mut binary = PageStream::new();
    for id in program.kernel_ids() {
        let kernel = &program.kernels()[id];
        let multicast = multicast_info(device, kernel.core_range_set());
        for (sub_idx, bin) in kernel.binaries().iter().enumerate() {
            for span in &bin.spans {
                let dst = remap_span_dst(span.dst, kernel.processor(), sub_idx);
                binary.push(span.num_bytes(), dst, &multicast);
            }
        }
    }

    for semaphore in program.semaphores() {
        let multicast = multicast_info(device, semaphore.core_range_set());
        binary.push(SEMAPHORE_ALIGNMENT, semaphore.address(), &multicast);
    }

    let mut groups = program.kernel_groups();
    for group in &mut groups {
        group.launch_msg.mode = DispatchMode::Dev;
        let multicast = multicast_info(device, &group.core_ranges);
        binary.push(16, LAUNCH_MAILBOX_ADDRESS, &multicast);
    }
    binary.flush();

    // Materialise the page image with the same cursor discipline, so image
    // offsets mirror the plan's source offsets exactly.
    let mut program_pages = vec![0u32; (align(binary.src, PROGRAM_PAGE_SIZE) / 4) as usize];
    let mut page_idx = 0u32;
    for id in program.kernel_ids() {
        for bin in program.kernels()[id].binaries() {
            for span in &bin.spans {
                let at = page_idx as usize;
                program_pages[at..at + span.words.len()].copy_from_slice(&span.words);
                page_idx = align(page_idx + span.words.len() as u32, NOC_TRANSFER_ALIGNMENT_IN_BYTES / 4);
            }
        }
    }
    for semaphore in program.semaphores() {
        program_pages[page_idx as usize] = semaphore.initial_value();
        page_idx += 4;
    }
    for group in &groups {
        let words = group.launch_msg.to_words();
        let at = page_idx as usize;
        program_pages[at..at + 4].copy_from_slice(&words);
        page_idx += 4;
    }

    ProgramMap {
        num_workers: program.logical_cores().len() as u32,
        program_pages,
        program_page_transfers: binary.transfers,
        host_page_transfers: host.transfers,
        num_transfers_in_program_pages: binary.transfers_per_page,
        num_transfers_in_host_data_pages: host.transfers_per_page,
    }
}

/// NoC multicast destinations for a set of logical core ranges.
fn multicast_info(device: &Device, ranges: &CoreRangeSet) -> MulticastInfo {
    ranges
        .ranges()
        .iter()
        .map(|range| {
            let start = device.worker_core_from_logical_core(range.start);
            let end = device.worker_core_from_logical_core(range.end);
            (noc_multicast_encoding(start, end), range.size())
        })
        .collect()
}

fn arg_base(processor: RiscClass) -> u32 {
    match processor {
        RiscClass::Brisc => BRISC_L1_ARG_BASE,
        RiscClass::Ncrisc => NCRISC_L1_ARG_BASE,
        RiscClass::Compute => TRISC_L1_ARG_BASE,
    }
}

fn local_init_base(processor: RiscClass, sub_idx: usize) -> u32 {
    match processor {
        RiscClass::Brisc => MEM_BRISC_INIT_LOCAL_L1_BASE,
        RiscClass::Ncrisc => MEM_NCRISC_INIT_LOCAL_L1_BASE,
        RiscClass::Compute => {
            debug_assert!(sub_idx < TriscId::VARIANTS.len(), "compute kernel with more than 3 sub-binaries");
            match TriscId::VARIANTS[sub_idx] {
                TriscId::Trisc0 => MEM_TRISC0_INIT_LOCAL_L1_BASE,
                TriscId::Trisc1 => MEM_TRISC1_INIT_LOCAL_L1_BASE,
                TriscId::Trisc2 => MEM_TRISC2_INIT_LOCAL_L1_BASE,
            }
        }
    }
}

/// Rebase link-time windows into their L1 staging areas.
fn remap_span_dst(dst: u64, processor: RiscClass, sub_idx: usize) -> u32 {
    let local = MEM_LOCAL_BASE as u64;
    let iram = MEM_NCRISC_IRAM_BASE as u64;
    if dst & local == local {
        ((dst & !local) + local_init_base(processor, sub_idx) as u64) as u32
    } else if dst & iram == iram {
        ((dst & !iram) + MEM_NCRISC_INIT_IRAM_L1_BASE as u64) as u32
    } else {
        dst as u32
    }
}
