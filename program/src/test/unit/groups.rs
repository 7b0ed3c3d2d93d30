use meshq_hal::{CoreCoord, CoreRange, CoreRangeSet};

use crate::kernel::{Kernel, RiscClass};
use crate::program::Program;

fn kernel(name: &str, processor: RiscClass, ranges: CoreRangeSet) -> Kernel {
    Kernel::builder().name(name).processor(processor).core_range_set(ranges).build()
}

#[test]
fn uniform_assignment_is_one_group() {
    let mut program = Program::new();
    let block = CoreRange::new(CoreCoord::new(0, 0), CoreCoord::new(1, 1));
    program.add_kernel(kernel("compute", RiscClass::Compute, block.into()));

    let groups = program.kernel_groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].kernel_ids.as_slice(), &[0]);
    assert_eq!(groups[0].core_ranges.num_cores(), 4);
    assert_eq!(groups[0].launch_msg.enables, RiscClass::Compute.enable_bit());
    assert_eq!(program.logical_cores().len(), 4);
}

#[test]
fn overlapping_kernels_split_groups() {
    let mut program = Program::new();
    // Reader covers a 2x1 row, compute only the first core: two assignments.
    program.add_kernel(kernel(
        "reader",
        RiscClass::Brisc,
        CoreRange::new(CoreCoord::new(0, 0), CoreCoord::new(1, 0)).into(),
    ));
    program.add_kernel(kernel("compute", RiscClass::Compute, CoreRange::single(CoreCoord::new(0, 0)).into()));

    let mut groups = program.kernel_groups();
    groups.sort_by_key(|g| g.kernel_ids.len());
    assert_eq!(groups.len(), 2);

    let reader_only = &groups[0];
    assert_eq!(reader_only.kernel_ids.as_slice(), &[0]);
    assert!(reader_only.core_ranges.contains(CoreCoord::new(1, 0)));
    assert_eq!(reader_only.launch_msg.enables, RiscClass::Brisc.enable_bit());

    let both = &groups[1];
    assert_eq!(both.kernel_ids.as_slice(), &[0, 1]);
    assert!(both.core_ranges.contains(CoreCoord::new(0, 0)));
    assert_eq!(both.launch_msg.enables, RiscClass::Brisc.enable_bit() | RiscClass::Compute.enable_bit());
}

#[test]
fn disjoint_identical_assignments_share_a_group() {
    let mut program = Program::new();
    let mut ranges = CoreRangeSet::new();
    ranges.push(CoreRange::single(CoreCoord::new(0, 0)));
    ranges.push(CoreRange::single(CoreCoord::new(3, 3)));
    program.add_kernel(kernel("compute", RiscClass::Compute, ranges));

    let groups = program.kernel_groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].core_ranges.ranges().len(), 2);
}
