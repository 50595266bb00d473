/// Errors raised by the byte-level layer: varints, tags and the two buffers.
///
/// Error hierarchy:
///
/// ```text
///   WireError
///   ├── UnexpectedEof     ← a fixed-width or varint read ran past the limit
///   ├── OutOfBounds       ← a data-controlled length points outside the range
///   ├── VarintTooLong     ← 32-bit varint longer than 5 bytes or overflowing
///   └── CapacityExceeded  ← buffer would grow past the configured ceiling
/// ```
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Input ended before a complete value could be read.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    /// A length taken from the data would read past the bound range.
    #[error("range {offset}+{len} exceeds limit {limit}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        limit: usize,
    },

    /// A 32-bit varint used more than 5 bytes, or its 5th byte carried
    /// bits that do not fit in 32.
    #[error("varint too long: exceeded 5-byte limit for 32-bit value")]
    VarintTooLong,

    /// A buffer was asked to hold more bytes than the configured maximum.
    #[error("requested capacity {requested} exceeds limit {limit}")]
    CapacityExceeded { requested: usize, limit: usize },
}
