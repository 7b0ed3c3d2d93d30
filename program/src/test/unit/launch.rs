use test_case::test_case;

use crate::kernel::RiscClass;
use crate::launch::{DispatchMode, LaunchMessage};

#[test_case(RiscClass::Brisc, 0b001; "brisc")]
#[test_case(RiscClass::Ncrisc, 0b010; "ncrisc")]
#[test_case(RiscClass::Compute, 0b100; "compute")]
fn enable_bits_are_distinct(processor: RiscClass, expected: u32) {
    assert_eq!(processor.enable_bit(), expected);
}

#[test]
fn launch_message_serializes_to_four_words() {
    let mut msg = LaunchMessage::new(RiscClass::Brisc.enable_bit() | RiscClass::Compute.enable_bit());
    assert_eq!(msg.to_words(), [0, 0b101, 1, 0]);

    msg.mode = DispatchMode::Dev;
    assert_eq!(msg.to_words(), [1, 0b101, 1, 0]);
}
