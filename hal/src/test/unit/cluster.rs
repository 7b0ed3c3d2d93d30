use crate::cluster::{Cluster, LocalCluster};
use crate::coord::CoreCoord;

#[test]
fn sysmem_round_trip() {
    let cluster = LocalCluster::new(4096);
    cluster.write_sysmem(96, &[1, 2, 3]);
    assert_eq!(cluster.read_sysmem(96, 12), vec![1, 2, 3]);
    // Untouched words read as zero.
    assert_eq!(cluster.read_sysmem(0, 8), vec![0, 0]);
}

#[test]
fn core_l1_writes_are_per_core() {
    let cluster = LocalCluster::new(1024);
    let a = CoreCoord::new(1, 1);
    let b = CoreCoord::new(2, 1);
    cluster.write_core_l1(a, 256, &[7, 8]);
    cluster.write_core_l1(b, 256, &[9]);
    assert_eq!(cluster.read_core_l1(a, 256, 2), vec![7, 8]);
    assert_eq!(cluster.read_core_l1(b, 256, 2), vec![9, 0]);
}

#[test]
fn launch_msgs_record_in_order() {
    let cluster = LocalCluster::new(1024);
    cluster.write_launch_msg(CoreCoord::new(1, 9), [1, 0, 1, 0]);
    cluster.write_launch_msg(CoreCoord::new(2, 9), [1, 0, 1, 0]);
    let msgs = cluster.launch_msgs();
    assert_eq!(msgs.len(), 2);
    assert_eq!(msgs[0].0, CoreCoord::new(1, 9));
}
