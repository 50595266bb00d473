use packable_wire::DecodeBuffer;
use packable_wire::config::NULL_ELEMENT;

use crate::adapter::UnpackAdapter;
use crate::decoder::PackDecoder;
use crate::error::DecodeError;

/// Varint length that marks a null string element (`-1` as `u32`).
const NULL_STR: u32 = u32::MAX;

/// Cursor over the element stream of an array, map or bare list.
///
/// Elements have no tags: each `take_*` call reads the next element with
/// the layout the caller asks for. Nested records are handed to pooled
/// child decoders of the decoder that owns the stream.
pub struct ElementReader<'d, 'a> {
    cursor: DecodeBuffer<'a>,
    decoder: &'d PackDecoder<'a>,
    taken: usize,
}

impl<'d, 'a> ElementReader<'d, 'a> {
    pub(crate) fn new(cursor: DecodeBuffer<'a>, decoder: &'d PackDecoder<'a>) -> Self {
        Self {
            cursor,
            decoder,
            taken: 0,
        }
    }

    /// Ordinal of the next element in the stream. Each key and each value
    /// of a map counts as one element.
    #[must_use]
    pub fn position(&self) -> usize {
        self.taken
    }

    /// Bytes left in the stream.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    pub(crate) fn finish(&self) -> Result<(), DecodeError> {
        if self.cursor.has_remaining() {
            return Err(DecodeError::Corrupt {
                offset: self.cursor.position(),
                reason: "trailing bytes after last element",
            });
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a wire error at the end of the stream.
    pub fn take_bool(&mut self) -> Result<bool, DecodeError> {
        self.taken += 1;
        Ok(self.cursor.read_u8()? != 0)
    }

    /// # Errors
    ///
    /// Returns a wire error at the end of the stream.
    pub fn take_i32(&mut self) -> Result<i32, DecodeError> {
        self.taken += 1;
        Ok(self.cursor.read_i32()?)
    }

    /// # Errors
    ///
    /// Returns a wire error at the end of the stream.
    pub fn take_i64(&mut self) -> Result<i64, DecodeError> {
        self.taken += 1;
        Ok(self.cursor.read_i64()?)
    }

    /// # Errors
    ///
    /// Returns a wire error at the end of the stream.
    pub fn take_f32(&mut self) -> Result<f32, DecodeError> {
        self.taken += 1;
        Ok(self.cursor.read_f32()?)
    }

    /// # Errors
    ///
    /// Returns a wire error at the end of the stream.
    pub fn take_f64(&mut self) -> Result<f64, DecodeError> {
        self.taken += 1;
        Ok(self.cursor.read_f64()?)
    }

    /// Varint-length-prefixed string, `None` for a null element.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::Wire`] if the length is malformed or runs past the stream.
    /// - [`DecodeError::InvalidUtf8`] if the bytes are not UTF-8.
    pub fn take_str(&mut self) -> Result<Option<&'a str>, DecodeError> {
        self.taken += 1;
        let len = self.cursor.read_varint32()?;
        if len == NULL_STR {
            return Ok(None);
        }
        let offset = self.cursor.position();
        let bytes = self.cursor.read_bytes(len as usize)?;
        std::str::from_utf8(bytes)
            .map(Some)
            .map_err(|e| DecodeError::InvalidUtf8 {
                offset: offset + e.valid_up_to(),
            })
    }

    /// Length-prefixed nested record decoded by `adapter`, `None` for a
    /// null element.
    ///
    /// # Errors
    ///
    /// Bounds errors from the element prefix, or the adapter's error.
    pub fn take_object<T, U>(&mut self, adapter: &U) -> Result<Option<T>, DecodeError>
    where
        U: UnpackAdapter<T> + ?Sized,
    {
        let Some((offset, len)) = self.take_record_bounds()? else {
            return Ok(None);
        };
        let mut child = self.decoder.child(offset, len)?;
        let value = adapter.decode(&mut child);
        child.recycle();
        value.map(Some)
    }

    /// Position and length of the next record element, `None` for null.
    fn take_record_bounds(&mut self) -> Result<Option<(usize, usize)>, DecodeError> {
        self.taken += 1;
        let first = self.cursor.read_u16()?;
        if first == NULL_ELEMENT {
            return Ok(None);
        }
        let len = if first & 0x8000 == 0 {
            usize::from(first)
        } else {
            (usize::from(first & 0x7FFF) << 16) | usize::from(self.cursor.read_u16()?)
        };
        let offset = self.cursor.position();
        self.cursor.skip(len)?;
        Ok(Some((offset, len)))
    }
}

/// One element of a [`DecoderArray`].
pub enum ArrayElement<'c, 'a> {
    Null,
    Record(&'c mut PackDecoder<'a>),
}

/// Walks an object array with a single child decoder that is rebound to
/// each element in turn.
///
/// ```rust
/// use packable_decoder::{ArrayElement, PackDecoder};
/// use packable_encoder::PackEncoder;
/// # use packable_encoder::{EncodeError, PackAdapter};
/// # struct Num;
/// # impl PackAdapter<i32> for Num {
/// #     fn encode(&self, e: &mut PackEncoder, v: &i32) -> Result<(), EncodeError> {
/// #         e.put_int(0, *v)?;
/// #         Ok(())
/// #     }
/// # }
///
/// let mut encoder = PackEncoder::new();
/// encoder.put_nullable_object_array(0, &[Some(5), None, Some(7)], &Num).unwrap();
/// let bytes = encoder.finish();
///
/// let mut decoder = PackDecoder::new(&bytes).unwrap();
/// let mut array = decoder.get_decoder_array(0).unwrap().unwrap();
/// let mut seen = Vec::new();
/// while let Some(element) = array.next_element().unwrap() {
///     match element {
///         ArrayElement::Record(child) => seen.push(child.get_int(0).unwrap()),
///         ArrayElement::Null => seen.push(None),
///     }
/// }
/// assert_eq!(seen, [Some(5), None, Some(7)]);
/// ```
pub struct DecoderArray<'d, 'a> {
    reader: ElementReader<'d, 'a>,
    count: usize,
    child: Option<PackDecoder<'a>>,
}

impl<'d, 'a> DecoderArray<'d, 'a> {
    pub(crate) fn new(reader: ElementReader<'d, 'a>, count: usize) -> Self {
        Self {
            reader,
            count,
            child: None,
        }
    }

    /// Element count declared by the array header.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Advance to the next element, or `None` once all elements were read.
    ///
    /// # Errors
    ///
    /// Bounds errors from the element prefix, a child decoder that could
    /// not be bound to the element, or [`DecodeError::Corrupt`] if bytes
    /// remain after the last element.
    pub fn next_element(&mut self) -> Result<Option<ArrayElement<'_, 'a>>, DecodeError> {
        if self.reader.position() >= self.count {
            self.reader.finish()?;
            return Ok(None);
        }
        let Some((offset, len)) = self.reader.take_record_bounds()? else {
            return Ok(Some(ArrayElement::Null));
        };
        let child = match self.child.take() {
            Some(mut child) => {
                child.rebind(offset, len)?;
                child
            }
            None => self.reader.decoder.child(offset, len)?,
        };
        Ok(Some(ArrayElement::Record(self.child.insert(child))))
    }
}

impl Drop for DecoderArray<'_, '_> {
    fn drop(&mut self) {
        if let Some(child) = self.child.take() {
            child.recycle();
        }
    }
}
