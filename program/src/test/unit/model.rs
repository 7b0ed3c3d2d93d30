use meshq_hal::memory::{NUM_SEMAPHORES, SEMAPHORE_ALIGNMENT, SEMAPHORE_BASE};
use meshq_hal::{CoreCoord, CoreRange, CoreRangeSet};

use crate::kernel::{Kernel, RiscClass};
use crate::program::Program;

fn single_core_set() -> CoreRangeSet {
    CoreRange::single(CoreCoord::new(0, 0)).into()
}

#[test]
fn program_ids_are_unique() {
    let a = Program::new();
    let b = Program::new();
    assert_ne!(a.id(), b.id());
}

#[test]
fn semaphore_slots_advance_and_cap() {
    let mut program = Program::new();
    for n in 0..NUM_SEMAPHORES {
        let addr = program.add_semaphore(n, single_core_set()).unwrap();
        assert_eq!(addr, SEMAPHORE_BASE + n * SEMAPHORE_ALIGNMENT);
    }
    assert!(program.add_semaphore(0, single_core_set()).is_err());
}

#[test]
fn kernel_ids_follow_insertion_order() {
    let mut program = Program::new();
    let brisc = Kernel::builder()
        .name("reader")
        .processor(RiscClass::Brisc)
        .core_range_set(single_core_set())
        .build();
    let ncrisc = Kernel::builder()
        .name("writer")
        .processor(RiscClass::Ncrisc)
        .core_range_set(single_core_set())
        .build();
    let a = program.add_kernel(brisc);
    let b = program.add_kernel(ncrisc);
    assert_eq!((a, b), (0, 1));
    assert_eq!(program.kernel_ids().collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(program.kernel(a).unwrap().name(), "reader");
    assert!(program.kernel(7).is_err());
}

#[test]
fn runtime_args_iterate_in_core_order() {
    let mut program = Program::new();
    let id = program.add_kernel(
        Kernel::builder()
            .name("args")
            .processor(RiscClass::Brisc)
            .core_range_set(CoreRange::new(CoreCoord::new(0, 0), CoreCoord::new(1, 1)).into())
            .build(),
    );
    let kernel = program.kernel_mut(id).unwrap();
    kernel.set_runtime_args(CoreCoord::new(1, 1), vec![4]);
    kernel.set_runtime_args(CoreCoord::new(0, 0), vec![1]);
    let cores: Vec<_> = kernel.runtime_args().keys().copied().collect();
    assert_eq!(cores, vec![CoreCoord::new(0, 0), CoreCoord::new(1, 1)]);
}
