use packable_wire::{Nested, Primitive};

use crate::encoder::PackEncoder;
use crate::error::EncodeError;

/// Write side of a type adapter.
///
/// An adapter writes the fields of one `T` through the encoder's `put_*`
/// methods at indices of its choosing. The encoder calls it for nested
/// records, object arrays and adapter-backed map entries; it never looks at
/// what the adapter does in between.
///
/// ```rust
/// use packable_encoder::{EncodeError, PackAdapter, PackEncoder};
///
/// struct Point { x: i32, y: i32 }
/// struct PointAdapter;
///
/// impl PackAdapter<Point> for PointAdapter {
///     fn encode(&self, encoder: &mut PackEncoder, value: &Point) -> Result<(), EncodeError> {
///         encoder.put_int(0, value.x)?.put_int(1, value.y)?;
///         Ok(())
///     }
/// }
///
/// let bytes = PackEncoder::marshal(&Point { x: 1, y: 0 }, &PointAdapter).unwrap();
/// assert_eq!(bytes, [0x10, 0x01, 0x01]);
/// ```
pub trait PackAdapter<T: ?Sized> {
    /// # Errors
    ///
    /// Whatever the encoder's `put_*` calls return.
    fn encode(&self, encoder: &mut PackEncoder, value: &T) -> Result<(), EncodeError>;
}

/// How one key or value inside a map element stream is written.
///
/// Element streams carry no per-entry tags: the caller declares the type
/// on both sides. [`Primitive`] covers the built-in cases and [`Nested`]
/// routes anything else through an adapter.
pub trait ElementEncoder<T: ?Sized> {
    /// # Errors
    ///
    /// Capacity errors from the buffer, or the nested adapter's error.
    fn encode_element(&self, encoder: &mut PackEncoder, value: &T) -> Result<(), EncodeError>;
}

impl ElementEncoder<bool> for Primitive {
    fn encode_element(&self, encoder: &mut PackEncoder, value: &bool) -> Result<(), EncodeError> {
        Ok(encoder.buffer_mut().write_u8(u8::from(*value))?)
    }
}

impl ElementEncoder<i32> for Primitive {
    fn encode_element(&self, encoder: &mut PackEncoder, value: &i32) -> Result<(), EncodeError> {
        Ok(encoder.buffer_mut().write_i32(*value)?)
    }
}

impl ElementEncoder<i64> for Primitive {
    fn encode_element(&self, encoder: &mut PackEncoder, value: &i64) -> Result<(), EncodeError> {
        Ok(encoder.buffer_mut().write_i64(*value)?)
    }
}

impl ElementEncoder<f32> for Primitive {
    fn encode_element(&self, encoder: &mut PackEncoder, value: &f32) -> Result<(), EncodeError> {
        Ok(encoder.buffer_mut().write_f32(*value)?)
    }
}

impl ElementEncoder<f64> for Primitive {
    fn encode_element(&self, encoder: &mut PackEncoder, value: &f64) -> Result<(), EncodeError> {
        Ok(encoder.buffer_mut().write_f64(*value)?)
    }
}

impl ElementEncoder<str> for Primitive {
    fn encode_element(&self, encoder: &mut PackEncoder, value: &str) -> Result<(), EncodeError> {
        encoder.wrap_str(Some(value))
    }
}

impl ElementEncoder<String> for Primitive {
    fn encode_element(&self, encoder: &mut PackEncoder, value: &String) -> Result<(), EncodeError> {
        encoder.wrap_str(Some(value))
    }
}

impl<T: ?Sized, A: PackAdapter<T> + ?Sized> ElementEncoder<T> for Nested<'_, A> {
    fn encode_element(&self, encoder: &mut PackEncoder, value: &T) -> Result<(), EncodeError> {
        encoder.wrap_object(Some(value), self.0)
    }
}
