use meshq_hal::BufferKind;

use crate::wire::{
    CMD_DATA_SIZE, CMD_FINISH, CMD_NUM_BUFFER_TRANSFERS, CMD_PAGE_SIZE, CMD_STALL, COMMAND_HEADER_NUM_WORDS,
    DATA_SECTION_ADDRESS, DeviceCommand, L1_COMMAND_BASE, NUM_BYTES_IN_DEVICE_COMMAND, NUM_ENTRIES_IN_DEVICE_COMMAND,
    NUM_WORDS_PER_BUFFER_TRANSFER, NUM_WORDS_PER_PAGE_PARTIAL, PROGRAM_PAGE_SIZE,
};

#[test]
fn default_command_is_all_zeros() {
    let command = DeviceCommand::new();
    assert_eq!(command.get_desc().len(), NUM_ENTRIES_IN_DEVICE_COMMAND);
    assert!(command.get_desc().iter().all(|&word| word == 0));
}

#[test]
fn header_flags_land_on_fixed_words() {
    let mut command = DeviceCommand::new();
    command.set_finish();
    command.set_stall();
    command.set_page_size(2048);
    command.set_data_size(4096);

    let desc = command.get_desc();
    assert_eq!(desc[CMD_FINISH], 1);
    assert_eq!(desc[CMD_STALL], 1);
    assert_eq!(desc[CMD_PAGE_SIZE], 2048);
    assert_eq!(desc[CMD_DATA_SIZE], 4096);
    assert_eq!(command.get_data_size(), 4096);
}

#[test]
fn instructions_append_after_the_header() {
    let mut command = DeviceCommand::new();
    command
        .add_buffer_transfer_instruction(0x1000, 0x2000, 4, 512, BufferKind::SystemMemory, BufferKind::Dram)
        .unwrap();
    command.write_program_entry(2).unwrap();
    command.add_write_page_partial_instruction(96, 512, 0x41, 1, true).unwrap();

    let desc = command.get_desc();
    assert_eq!(desc[CMD_NUM_BUFFER_TRANSFERS], 1);

    let transfer = &desc[COMMAND_HEADER_NUM_WORDS..COMMAND_HEADER_NUM_WORDS + NUM_WORDS_PER_BUFFER_TRANSFER];
    assert_eq!(transfer, &[0x1000, 0x2000, 4, 512, 2, 0]);

    let entry = COMMAND_HEADER_NUM_WORDS + NUM_WORDS_PER_BUFFER_TRANSFER;
    assert_eq!(desc[entry], 2);
    assert_eq!(&desc[entry + 1..entry + 1 + NUM_WORDS_PER_PAGE_PARTIAL], &[96, 512, 0x41, 1, 1]);
}

#[test]
fn instruction_area_is_bounded() {
    let mut command = DeviceCommand::new();
    let capacity = (NUM_ENTRIES_IN_DEVICE_COMMAND - COMMAND_HEADER_NUM_WORDS) / NUM_WORDS_PER_PAGE_PARTIAL;
    for _ in 0..capacity {
        command.add_write_page_partial_instruction(16, 0, 0, 1, false).unwrap();
    }
    assert!(command.add_write_page_partial_instruction(16, 0, 0, 1, false).is_err());
}

#[test]
fn l1_section_constants_are_consistent() {
    assert_eq!(NUM_BYTES_IN_DEVICE_COMMAND % 16, 0);
    assert_eq!(NUM_BYTES_IN_DEVICE_COMMAND % PROGRAM_PAGE_SIZE, 0);
    assert_eq!(DATA_SECTION_ADDRESS, L1_COMMAND_BASE + NUM_BYTES_IN_DEVICE_COMMAND);
}
