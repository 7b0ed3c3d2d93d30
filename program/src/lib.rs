//! Program model for the meshq runtime.
//!
//! A [`Program`] bundles everything one launch delivers to the worker mesh:
//! kernels (with binaries and per-core runtime arguments), circular-buffer
//! configurations, semaphores, and the kernel groups / launch messages that
//! start execution. The dispatch layer consumes this model to build its
//! paged transfer plan; nothing here touches the ring.

pub mod circular_buffer;
pub mod error;
pub mod kernel;
pub mod launch;
pub mod program;
pub mod semaphore;

#[cfg(test)]
mod test;

pub use circular_buffer::CircularBuffer;
pub use error::{Error, Result};
pub use kernel::{BinarySpan, Kernel, KernelBinary, KernelId, RiscClass, TriscId};
pub use launch::{DispatchMode, LaunchMessage};
pub use program::{KernelGroup, Program};
pub use semaphore::Semaphore;
