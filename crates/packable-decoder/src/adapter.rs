use packable_wire::{Nested, Primitive};

use crate::decoder::PackDecoder;
use crate::elements::ElementReader;
use crate::error::DecodeError;

/// Read side of a type adapter.
///
/// The adapter reads back the indices its encoding counterpart wrote, in
/// any order and any subset. Missing fields come back as `None` and the
/// adapter picks the default.
///
/// ```rust
/// use packable_decoder::{DecodeError, PackDecoder, UnpackAdapter};
///
/// struct Point { x: i32, y: i32 }
/// struct PointAdapter;
///
/// impl UnpackAdapter<Point> for PointAdapter {
///     fn decode(&self, decoder: &mut PackDecoder<'_>) -> Result<Point, DecodeError> {
///         Ok(Point {
///             x: decoder.get_int(0)?.unwrap_or(0),
///             y: decoder.get_int(1)?.unwrap_or(0),
///         })
///     }
/// }
///
/// let point = PackDecoder::unmarshal(&[0x10, 0x01, 0x01], &PointAdapter).unwrap();
/// assert_eq!((point.x, point.y), (1, 0));
/// ```
pub trait UnpackAdapter<T> {
    /// # Errors
    ///
    /// Whatever the decoder's getters return.
    fn decode(&self, decoder: &mut PackDecoder<'_>) -> Result<T, DecodeError>;
}

/// How one key or value inside a map element stream is read.
///
/// Mirror of the encoder's element trait: [`Primitive`] reads the built-in
/// layouts and [`Nested`] hands a length-prefixed record to an adapter.
pub trait ElementDecoder<'a, T> {
    /// # Errors
    ///
    /// Bounds errors from the element stream, [`DecodeError::NullElement`]
    /// for a null where a value is required, or the adapter's error.
    fn take(&self, reader: &mut ElementReader<'_, 'a>) -> Result<T, DecodeError>;
}

impl<'a> ElementDecoder<'a, bool> for Primitive {
    fn take(&self, reader: &mut ElementReader<'_, 'a>) -> Result<bool, DecodeError> {
        reader.take_bool()
    }
}

impl<'a> ElementDecoder<'a, i32> for Primitive {
    fn take(&self, reader: &mut ElementReader<'_, 'a>) -> Result<i32, DecodeError> {
        reader.take_i32()
    }
}

impl<'a> ElementDecoder<'a, i64> for Primitive {
    fn take(&self, reader: &mut ElementReader<'_, 'a>) -> Result<i64, DecodeError> {
        reader.take_i64()
    }
}

impl<'a> ElementDecoder<'a, f32> for Primitive {
    fn take(&self, reader: &mut ElementReader<'_, 'a>) -> Result<f32, DecodeError> {
        reader.take_f32()
    }
}

impl<'a> ElementDecoder<'a, f64> for Primitive {
    fn take(&self, reader: &mut ElementReader<'_, 'a>) -> Result<f64, DecodeError> {
        reader.take_f64()
    }
}

impl<'a> ElementDecoder<'a, &'a str> for Primitive {
    fn take(&self, reader: &mut ElementReader<'_, 'a>) -> Result<&'a str, DecodeError> {
        let position = reader.position();
        reader.take_str()?.ok_or(DecodeError::NullElement { position })
    }
}

impl<'a> ElementDecoder<'a, String> for Primitive {
    fn take(&self, reader: &mut ElementReader<'_, 'a>) -> Result<String, DecodeError> {
        <Self as ElementDecoder<'a, &'a str>>::take(self, reader).map(str::to_owned)
    }
}

impl<'a, T, U: UnpackAdapter<T> + ?Sized> ElementDecoder<'a, T> for Nested<'_, U> {
    fn take(&self, reader: &mut ElementReader<'_, 'a>) -> Result<T, DecodeError> {
        let position = reader.position();
        reader
            .take_object(self.0)?
            .ok_or(DecodeError::NullElement { position })
    }
}
