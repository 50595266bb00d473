/// Hard upper bound for a single message (1 GiB).
///
/// Decoder info slots store offsets and lengths in 30 bits each, so no
/// configuration may raise a buffer above this.
pub const MAX_BUFFER_SIZE: usize = 1 << 30;

/// Default guard for element counts of arrays, maps and object arrays.
pub const MAX_ELEMENT_COUNT: usize = 1 << 20;

/// Size of the arrays kept by the write-buffer pool.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Below this capacity a growing write buffer doubles once more than
/// strictly needed.
pub const LARGE_BUFFER_THRESHOLD: usize = 64 * 1024;

/// Nested records whose payload is at most this long get their 4-byte
/// length placeholder shrunk to 1 byte.
pub const TRIM_SIZE_LIMIT: usize = 127;

/// Two-byte element prefix marking a null record inside an element stream.
pub const NULL_ELEMENT: u16 = 0xFFFF;

/// Runtime limits and behaviour switches shared by encoders and decoders.
///
/// ```text
/// ┌──────────────────────┬────────────┬────────────────────────────────────────┐
/// │ Field                │ Default    │ Purpose                                │
/// ├──────────────────────┼────────────┼────────────────────────────────────────┤
/// │ max_buffer_size      │ 1 GiB      │ encoder capacity / decoder input limit │
/// │ max_element_count    │ 1 << 20    │ array, map and object-array counts     │
/// │ ignore_unknown_types │ false      │ size-class mismatch → missing, not Err │
/// └──────────────────────┴────────────┴────────────────────────────────────────┘
/// ```
///
/// The struct is `Copy`; every encoder and decoder (child decoders
/// included) carries its own copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackConfig {
    /// Ceiling for an encoder's buffer and for a decoder's input.
    /// Values above [`MAX_BUFFER_SIZE`] are treated as [`MAX_BUFFER_SIZE`].
    pub max_buffer_size: usize,

    /// Largest element count accepted for arrays, maps and object arrays,
    /// on both the encode and decode side.
    pub max_element_count: usize,

    /// When set, a getter whose type does not match the stored size class
    /// returns "missing" instead of an error.
    pub ignore_unknown_types: bool,
}

impl PackConfig {
    /// The buffer ceiling after applying the hard [`MAX_BUFFER_SIZE`] cap.
    #[must_use]
    pub fn buffer_limit(&self) -> usize {
        self.max_buffer_size.min(MAX_BUFFER_SIZE)
    }
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            max_buffer_size: MAX_BUFFER_SIZE,
            max_element_count: MAX_ELEMENT_COUNT,
            ignore_unknown_types: false,
        }
    }
}
