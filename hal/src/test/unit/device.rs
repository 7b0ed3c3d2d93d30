use crate::buffer::BufferKind;
use crate::coord::CoreCoord;
use crate::device::Device;

fn device() -> Device {
    Device::new(0, CoreCoord::new(8, 9)).unwrap()
}

#[test]
fn logical_to_physical_offsets_by_one() {
    let device = device();
    assert_eq!(device.worker_core_from_logical_core(CoreCoord::new(0, 0)), CoreCoord::new(1, 1));
    assert_eq!(device.worker_core_from_logical_core(CoreCoord::new(3, 5)), CoreCoord::new(4, 6));
}

#[test]
fn dispatch_cores_sit_on_the_top_row() {
    let device = device();
    assert_eq!(device.dispatch_cores(), &[CoreCoord::new(0, 8), CoreCoord::new(1, 8)]);
}

#[test]
fn rejects_degenerate_grids() {
    assert!(Device::new(0, CoreCoord::new(1, 4)).is_err());
    assert!(Device::new(0, CoreCoord::new(4, 1)).is_err());
}

#[test]
fn dram_allocations_are_32_byte_aligned_and_disjoint() {
    let device = device();
    let a = device.allocate(BufferKind::Dram, 100).unwrap();
    let b = device.allocate(BufferKind::Dram, 100).unwrap();
    assert_eq!(a % 32, 0);
    assert_eq!(b % 32, 0);
    assert!(b >= a + 100);
}

#[test]
fn system_memory_is_not_placeable() {
    assert!(device().allocate(BufferKind::SystemMemory, 64).is_err());
}
