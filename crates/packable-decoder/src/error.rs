use packable_wire::{SizeClass, WireError};

/// Errors that can occur while decoding a record.
///
/// Parsing a record validates its framing once, up front: every tag must
/// be complete and every payload must lie inside the record. Getters then
/// validate what only the requested type can tell, such as UTF-8, array
/// widths, element counts and element framing.
///
/// Error hierarchy:
///
/// ```text
///   DecodeError
///   ├── Corrupt              ← framing broken (truncated tag/payload, bad length)
///   ├── ElementCountExceeded ← array/map count above max_element_count
///   ├── InvalidArrayLength   ← fixed-width array not a multiple of its width
///   ├── InvalidUtf8          ← string payload is not UTF-8
///   ├── NullElement          ← null in a collection read as non-nullable
///   ├── UnknownType          ← stored size class does not fit the getter
///   └── Wire(WireError)      ← bounds/EOF/varint/capacity from the read buffer
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The record's framing is inconsistent at `offset`.
    #[error("corrupt record at offset {offset}: {reason}")]
    Corrupt { offset: usize, reason: &'static str },

    #[error("element count {count} exceeds limit {limit}")]
    ElementCountExceeded { count: usize, limit: usize },

    /// A fixed-width array field whose byte length is not a whole number
    /// of elements.
    #[error("field {index}: {len} bytes is not a multiple of element width {width}")]
    InvalidArrayLength { index: u8, len: usize, width: usize },

    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// A null element was found where the getter does not accept nulls.
    /// Use the `get_nullable_*` variant to read such collections.
    #[error("null element at position {position}")]
    NullElement { position: usize },

    /// The field's size class cannot hold the requested type, e.g. a
    /// string read from a numeric field. Suppressed to "missing" when
    /// `ignore_unknown_types` is set.
    #[error("field {index}: size class {size_class:?} does not match the requested type")]
    UnknownType { index: u8, size_class: SizeClass },

    #[error(transparent)]
    Wire(#[from] WireError),
}
