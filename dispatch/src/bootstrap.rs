//! One-shot install of the dispatch producer/consumer pair.

use std::collections::BTreeMap;

use meshq_hal::memory::{CQ_READ_PTR, CQ_READ_TOGGLE, CQ_WRITE_PTR, CQ_WRITE_TOGGLE, TENSIX_SOFT_RESET_ADDR};
use meshq_hal::{Cluster, CoreRange, Device};
use meshq_program::{Kernel, LaunchMessage, Program, RiscClass};
use snafu::{ResultExt, ensure};

use crate::error::{NotEnoughDispatchCoresSnafu, ProgramModelSnafu, Result};
use crate::ring::HOST_CQ_FINISH_PTR;

/// Compiles a program's kernels and writes their firmware state to the
/// device. Stands between the queue and the kernel toolchain so tests can
/// stub it.
pub trait KernelLoader: Send + Sync {
    fn compile_and_configure(&self, device: &Device, program: &Program) -> Result<()>;
}

/// Build and launch the producer/consumer pair on the dispatch cores.
///
/// Each kernel learns its peer's physical position through compile-time
/// defines and shares the soft-reset address as a compile argument. Only
/// RISCV 0 runs on either core, so both are launched directly instead of
/// through a program enqueue.
pub(crate) fn install_dispatch_kernels(
    device: &Device,
    cluster: &dyn Cluster,
    loader: &dyn KernelLoader,
) -> Result<()> {
    let cores = device.dispatch_cores();
    ensure!(cores.len() >= 2, NotEnoughDispatchCoresSnafu { count: cores.len() });
    let (producer, consumer) = (cores[0], cores[1]);
    let producer_physical = device.worker_core_from_logical_core(producer);
    let consumer_physical = device.worker_core_from_logical_core(consumer);

    let producer_defines = BTreeMap::from([
        ("IS_DISPATCH_KERNEL".to_string(), String::new()),
        ("CONSUMER_NOC_X".to_string(), consumer_physical.x.to_string()),
        ("CONSUMER_NOC_Y".to_string(), consumer_physical.y.to_string()),
    ]);
    let consumer_defines = BTreeMap::from([
        ("PRODUCER_NOC_X".to_string(), producer_physical.x.to_string()),
        ("PRODUCER_NOC_Y".to_string(), producer_physical.y.to_string()),
    ]);
    let compile_args = vec![TENSIX_SOFT_RESET_ADDR];

    let mut dispatch_program = Program::new();
    dispatch_program.add_kernel(
        Kernel::builder()
            .name("command_queue_producer")
            .processor(RiscClass::Brisc)
            .core_range_set(CoreRange::single(producer).into())
            .defines(producer_defines)
            .compile_args(compile_args.clone())
            .build(),
    );
    dispatch_program.add_kernel(
        Kernel::builder()
            .name("command_queue_consumer")
            .processor(RiscClass::Brisc)
            .core_range_set(CoreRange::single(consumer).into())
            .defines(consumer_defines)
            .compile_args(compile_args)
            .build(),
    );
    dispatch_program.add_semaphore(2, CoreRange::single(producer).into()).context(ProgramModelSnafu)?;
    dispatch_program.add_semaphore(0, CoreRange::single(consumer).into()).context(ProgramModelSnafu)?;

    loader.compile_and_configure(device, &dispatch_program)?;

    // Seed the producer's view of the ring: both pointers at the first
    // command slot, toggles clear.
    let fifo_addr = (HOST_CQ_FINISH_PTR + 32) >> 4;
    cluster.write_core_l1(producer_physical, CQ_READ_PTR, &[fifo_addr]);
    cluster.write_core_l1(producer_physical, CQ_WRITE_PTR, &[fifo_addr]);
    cluster.write_core_l1(producer_physical, CQ_READ_TOGGLE, &[0]);
    cluster.write_core_l1(producer_physical, CQ_WRITE_TOGGLE, &[0]);

    let launch = LaunchMessage::new(RiscClass::Brisc.enable_bit());
    cluster.write_launch_msg(producer_physical, launch.to_words());
    cluster.write_launch_msg(consumer_physical, launch.to_words());
    Ok(())
}
