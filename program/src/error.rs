use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Worker L1 carries a fixed number of semaphore slots.
    #[snafu(display("program already holds the maximum of {limit} semaphores"))]
    TooManySemaphores { limit: u32 },

    #[snafu(display("no kernel with id {id}"))]
    UnknownKernel { id: usize },

    /// Circular-buffer geometry must tile its region exactly.
    #[snafu(display("circular buffer of {total_size} bytes is not tiled by {page_size}-byte pages"))]
    UnevenCircularBuffer { total_size: u32, page_size: u32 },
}
