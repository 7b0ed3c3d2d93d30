//! Launch messages: the 16-byte mailbox record that starts a worker.

/// Who orchestrates a launched program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u32)]
pub enum DispatchMode {
    /// Host writes configs and launch messages directly.
    #[default]
    Host = 0,
    /// The on-device dispatch consumer replays a transfer plan.
    Dev = 1,
}

/// Mailbox record, serialized as exactly four little-endian words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchMessage {
    pub mode: DispatchMode,
    /// Bitmask of [`crate::RiscClass::enable_bit`] values to start.
    pub enables: u32,
    pub run: u32,
}

impl LaunchMessage {
    pub fn new(enables: u32) -> Self {
        Self { mode: DispatchMode::Host, enables, run: 1 }
    }

    /// Word view written to the mailbox; the layout is firmware ABI.
    pub fn to_words(&self) -> [u32; 4] {
        [self.mode as u32, self.enables, self.run, 0]
    }
}
