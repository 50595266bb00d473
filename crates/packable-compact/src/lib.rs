#![warn(clippy::pedantic)]

//! Space-saving array layouts for the Packable encoder and decoder.
//!
//! The methods live on two extension traits, so the core crates stay
//! unaware of them. Each array occupies one ordinary variable-length
//! field; a reader without this crate sees opaque bytes.
//!
//! | Method pair                      | Layout                                  |
//! |----------------------------------|-----------------------------------------|
//! | `put_bool_array`                 | one bit per value                       |
//! | `put_enum_array`                 | 1, 2, 4 or 8 bits per value             |
//! | `put_compact_int_array`          | 2-bit flag + 0, 1, 2 or 4 bytes         |
//! | `put_compact_long_array`         | 2-bit flag + 0, 1, 2 or 8 bytes         |
//! | `put_compact_double_array`       | 2-bit flag + 0, 2, 4 or 8 bytes         |
//!
//! ```rust
//! use packable_compact::{CompactDecoderExt, CompactEncoderExt};
//! use packable_decoder::PackDecoder;
//! use packable_encoder::PackEncoder;
//!
//! let mut encoder = PackEncoder::new();
//! encoder.put_compact_int_array(0, &[0, 0, 0, 300, 0]).unwrap();
//! let bytes = encoder.finish();
//! assert!(bytes.len() < 20);
//!
//! let mut decoder = PackDecoder::new(&bytes).unwrap();
//! let values = decoder.get_compact_int_array(0).unwrap().unwrap();
//! assert_eq!(values, [0, 0, 0, 300, 0]);
//! ```

mod bits;
mod number;

use packable_decoder::{DecodeError, PackDecoder};
use packable_encoder::{EncodeError, PackEncoder};
use tracing::debug;

fn check_encode_count(encoder: &PackEncoder, count: usize) -> Result<u32, EncodeError> {
    let limit = encoder.config().max_element_count;
    if count > limit {
        return Err(EncodeError::ElementCountExceeded { count, limit });
    }
    u32::try_from(count).map_err(|_| EncodeError::ElementCountExceeded { count, limit })
}

fn check_decode_count<N: TryInto<usize> + Copy>(decoder: &PackDecoder<'_>, count: N) -> Result<usize, DecodeError> {
    let limit = decoder.config().max_element_count;
    let count = count.try_into().unwrap_or(usize::MAX);
    if count > limit {
        debug!(count, limit, "compact array count over limit");
        return Err(DecodeError::ElementCountExceeded { count, limit });
    }
    Ok(count)
}

/// Compact array setters for [`PackEncoder`].
///
/// An empty slice writes an empty field, which reads back as an empty
/// array. To leave the field absent, skip the call.
pub trait CompactEncoderExt {
    /// # Errors
    ///
    /// [`EncodeError::ElementCountExceeded`] or capacity errors.
    fn put_bool_array(&mut self, index: u8, values: &[bool]) -> Result<&mut Self, EncodeError>;

    /// Enum ordinals packed at the smallest width that holds all of them.
    ///
    /// # Errors
    ///
    /// [`EncodeError::EnumValueOutOfRange`] for a value above 255,
    /// [`EncodeError::ElementCountExceeded`] or capacity errors.
    fn put_enum_array(&mut self, index: u8, values: &[u32]) -> Result<&mut Self, EncodeError>;

    /// # Errors
    ///
    /// [`EncodeError::ElementCountExceeded`] or capacity errors.
    fn put_compact_int_array(&mut self, index: u8, values: &[i32]) -> Result<&mut Self, EncodeError>;

    /// # Errors
    ///
    /// [`EncodeError::ElementCountExceeded`] or capacity errors.
    fn put_compact_long_array(&mut self, index: u8, values: &[i64]) -> Result<&mut Self, EncodeError>;

    /// Doubles with short mantissas (small integers, halves, quarters) take
    /// 2 or 4 bytes. `-0.0` keeps its sign.
    ///
    /// # Errors
    ///
    /// [`EncodeError::ElementCountExceeded`] or capacity errors.
    fn put_compact_double_array(&mut self, index: u8, values: &[f64]) -> Result<&mut Self, EncodeError>;
}

impl CompactEncoderExt for PackEncoder {
    fn put_bool_array(&mut self, index: u8, values: &[bool]) -> Result<&mut Self, EncodeError> {
        bits::put_bool_array(self, index, values)
    }

    fn put_enum_array(&mut self, index: u8, values: &[u32]) -> Result<&mut Self, EncodeError> {
        bits::put_enum_array(self, index, values)
    }

    fn put_compact_int_array(&mut self, index: u8, values: &[i32]) -> Result<&mut Self, EncodeError> {
        number::put_number_array(self, index, values)
    }

    fn put_compact_long_array(&mut self, index: u8, values: &[i64]) -> Result<&mut Self, EncodeError> {
        number::put_number_array(self, index, values)
    }

    fn put_compact_double_array(&mut self, index: u8, values: &[f64]) -> Result<&mut Self, EncodeError> {
        number::put_number_array(self, index, values)
    }
}

/// Compact array getters for [`PackDecoder`]. `Ok(None)` means the field
/// is absent.
///
/// Every getter returns [`DecodeError::Corrupt`] for a payload that does
/// not match its layout, [`DecodeError::ElementCountExceeded`] for a count
/// above the configured limit, and the usual lookup errors.
#[allow(clippy::missing_errors_doc)]
pub trait CompactDecoderExt {
    fn get_bool_array(&mut self, index: u8) -> Result<Option<Vec<bool>>, DecodeError>;
    fn get_enum_array(&mut self, index: u8) -> Result<Option<Vec<u32>>, DecodeError>;
    fn get_compact_int_array(&mut self, index: u8) -> Result<Option<Vec<i32>>, DecodeError>;
    fn get_compact_long_array(&mut self, index: u8) -> Result<Option<Vec<i64>>, DecodeError>;
    fn get_compact_double_array(&mut self, index: u8) -> Result<Option<Vec<f64>>, DecodeError>;
}

impl CompactDecoderExt for PackDecoder<'_> {
    fn get_bool_array(&mut self, index: u8) -> Result<Option<Vec<bool>>, DecodeError> {
        bits::get_bool_array(self, index)
    }

    fn get_enum_array(&mut self, index: u8) -> Result<Option<Vec<u32>>, DecodeError> {
        bits::get_enum_array(self, index)
    }

    fn get_compact_int_array(&mut self, index: u8) -> Result<Option<Vec<i32>>, DecodeError> {
        number::get_number_array(self, index)
    }

    fn get_compact_long_array(&mut self, index: u8) -> Result<Option<Vec<i64>>, DecodeError> {
        number::get_number_array(self, index)
    }

    fn get_compact_double_array(&mut self, index: u8) -> Result<Option<Vec<f64>>, DecodeError> {
        number::get_number_array(self, index)
    }
}
