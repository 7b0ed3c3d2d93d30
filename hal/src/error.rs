use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Buffer geometry does not form whole 32-bit words.
    #[snafu(display("buffer geometry {size}/{page_size} is not a multiple of 4 bytes"))]
    UnalignedBufferSize { size: u32, page_size: u32 },

    #[snafu(display("page size {page_size} exceeds buffer size {size}"))]
    PageLargerThanBuffer { page_size: u32, size: u32 },

    #[snafu(display("buffers cannot be placed in {kind:?} memory"))]
    UnplaceableBufferKind { kind: crate::buffer::BufferKind },

    /// Bump allocation ran past the end of the memory region.
    #[snafu(display("out of {kind:?} memory: requested {requested} bytes, {available} available"))]
    OutOfDeviceMemory { kind: crate::buffer::BufferKind, requested: u32, available: u32 },

    #[snafu(display("device grid {cols}x{rows} is too small to reserve a dispatch row"))]
    GridTooSmall { cols: u32, rows: u32 },
}
