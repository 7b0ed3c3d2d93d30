use std::sync::Arc;

use meshq_hal::memory::{CQ_READ_PTR, CQ_READ_TOGGLE, CQ_WRITE_PTR, CQ_WRITE_TOGGLE};
use meshq_hal::{Cluster, CoreCoord};

use crate::queue::CommandQueue;
use crate::ring::{CQ_START, HOST_CQ_READ_PTR, HOST_CQ_WRITE_PTR};
use crate::test::{StubLoader, test_cluster, test_device};

#[test]
fn queue_constructor_seeds_pointers_and_installs_dispatch() {
    let cluster = test_cluster(64 * 1024);
    let loader = StubLoader::new();
    let device = test_device();
    let _queue = CommandQueue::new(Arc::clone(&device), Arc::clone(&cluster) as Arc<dyn Cluster>, &loader).unwrap();

    // Pointer block: both ring pointers at the first command slot.
    assert_eq!(cluster.read_sysmem(HOST_CQ_READ_PTR, 4)[0], CQ_START >> 4);
    assert_eq!(cluster.read_sysmem(HOST_CQ_WRITE_PTR, 4)[0], CQ_START >> 4);

    // Both dispatch kernels went through the loader, producer first.
    assert_eq!(*loader.configured.lock(), vec!["command_queue_producer", "command_queue_consumer"]);

    // Producer L1 sees the seeded ring view: pointers at the slot after the
    // finish word, toggles clear.
    let producer_physical = device.worker_core_from_logical_core(device.dispatch_cores()[0]);
    assert_eq!(cluster.read_core_l1(producer_physical, CQ_READ_PTR, 1), vec![CQ_START >> 4]);
    assert_eq!(cluster.read_core_l1(producer_physical, CQ_WRITE_PTR, 1), vec![CQ_START >> 4]);
    assert_eq!(cluster.read_core_l1(producer_physical, CQ_READ_TOGGLE, 1), vec![0]);
    assert_eq!(cluster.read_core_l1(producer_physical, CQ_WRITE_TOGGLE, 1), vec![0]);

    // Both physical dispatch cores were launched directly.
    let msgs = cluster.launch_msgs();
    assert_eq!(msgs.len(), 2);
    assert_eq!(msgs[0].0, CoreCoord::new(1, 9));
    assert_eq!(msgs[1].0, CoreCoord::new(2, 9));
    for (_, msg) in msgs {
        assert_eq!(msg[2], 1, "run flag");
    }
}
