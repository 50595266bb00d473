use packable_wire::WireError;

/// Errors that can occur while encoding a record.
///
/// The encoder checks element counts and custom-field lengths itself and
/// propagates capacity failures from the write buffer. Adapters return the
/// same type, so a failure deep inside a nested record surfaces unchanged.
///
/// Error hierarchy:
///
/// ```text
///   EncodeError
///   ├── ElementCountExceeded ← array/map larger than max_element_count
///   ├── LengthMismatch       ← custom field writer broke its length promise
///   ├── EnumValueOutOfRange  ← compact enum value needs more than 8 bits
///   └── Wire(WireError)      ← buffer limit reached (CapacityExceeded)
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("element count {count} exceeds limit {limit}")]
    ElementCountExceeded { count: usize, limit: usize },

    #[error("custom field declared {declared} bytes but {written} were written")]
    LengthMismatch { declared: usize, written: usize },

    #[error("enum value {value} does not fit in 8 bits")]
    EnumValueOutOfRange { value: u32 },

    #[error(transparent)]
    Wire(#[from] WireError),
}
