//! Host-side command queue for the mesh accelerator.
//!
//! Three kinds of work (buffer reads, buffer writes, program launches)
//! are encoded into fixed-layout device commands and streamed through a
//! host-mapped ring that the on-device dispatch pair drains. Program
//! launches additionally compile into a paged transfer plan ([`ProgramMap`])
//! the consumer replays as NoC multicast writes; plans and their DRAM
//! binary images are cached per program for the queue's lifetime.
//!
//! ```text
//! caller → CommandQueue → command variant → DeviceCommand (wire)
//!                               │
//!                               └→ SystemMemoryWriter → host-mapped ring → device
//! ```

pub mod bootstrap;
pub mod command;
pub mod error;
pub mod map;
pub mod queue;
pub mod ring;
pub mod wire;


pub use bootstrap::KernelLoader;
pub use command::CommandKind;
pub use error::{Error, Result};
pub use map::{ProgramMap, TransferInfo, build_program_map};
pub use queue::CommandQueue;
pub use ring::{CqWriteInterface, SystemMemoryWriter};
pub use wire::DeviceCommand;
