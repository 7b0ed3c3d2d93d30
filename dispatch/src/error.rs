use meshq_hal::BufferKind;
use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors observable at the dispatch layer.
///
/// Everything here fires before the first ring byte of the failing command
/// is published, so the ring stays consistent on error.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("enqueue_read_buffer only supports blocking mode"))]
    ReadBufferNonBlocking,

    #[snafu(display("enqueue_write_buffer only supports non-blocking mode"))]
    WriteBufferBlocking,

    #[snafu(display("enqueue_program only supports non-blocking mode"))]
    ProgramBlocking,

    #[snafu(display("cannot write to a {kind:?} buffer through the ring"))]
    InvalidWriteBufferKind { kind: BufferKind },

    #[snafu(display("source holds {src_bytes} bytes but the buffer only {buffer_size}"))]
    SourceTooLarge { src_bytes: u32, buffer_size: u32 },

    #[snafu(display("padded page of {padded_page_size} bytes does not fit the {consumer_cb_size}-byte consumer buffer"))]
    PageTooLarge { padded_page_size: u32, consumer_cb_size: u32 },

    #[snafu(display("buffer pages of {page_size} bytes do not fit the dispatch data section"))]
    PageExceedsDataSection { page_size: u32 },

    #[snafu(display("command of {size} bytes exceeds the ring budget of {max}"))]
    CommandTooLarge { size: u32, max: u32 },

    /// The fixed instruction area of a device command is full.
    #[snafu(display("device command instruction area exhausted"))]
    CommandFull,

    #[snafu(display("mapped ring of {ring_size} bytes is too small for a command window"))]
    RingTooSmall { ring_size: u32 },

    #[snafu(display("device exposes {count} dispatch cores, need at least 2"))]
    NotEnoughDispatchCores { count: usize },

    #[snafu(display("program model error: {source}"))]
    ProgramModel { source: meshq_program::Error },

    #[snafu(display("buffer placement failed: {source}"))]
    Hal { source: meshq_hal::Error },

    #[snafu(display("kernel load failed: {reason}"))]
    Loader { reason: String },
}
