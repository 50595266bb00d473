use std::fmt;

use packable_wire::config::{NULL_ELEMENT, TRIM_SIZE_LIMIT};
use packable_wire::{BufferPool, EncodeBuffer, PackConfig, Primitive, SizeClass, Tag, WireError};
use tracing::trace;

use crate::adapter::{ElementEncoder, PackAdapter};
use crate::error::EncodeError;

/// Width of the length placeholder reserved before nested records,
/// object arrays and maps.
const RESERVED_LENGTH: usize = 4;

/// Largest element length that fits the 2-byte element prefix.
const SHORT_ELEMENT_LIMIT: usize = 0x7FFF;

/// Appends tagged fields to a pooled, growable buffer.
///
/// Every `put_*` method appends exactly one field and returns `&mut Self`
/// for chaining. Fields may be written in any index order. A value equal to
/// its type's zero (0, `false`, `0.0`, `""`, empty array) is written as a
/// bare tag of class `Zero`; a field that is never written decodes as
/// missing, which is distinct from zero.
///
/// Nested records, object/string arrays and maps use reserve-then-patch:
///
/// ```text
///   put_object(index, value, adapter)
///
///   ┌─────┬─────────────┬──────────────────────┐
///   │ tag │ 4-byte hole │ payload from adapter │   while encoding
///   └─────┴─────────────┴──────────────────────┘
///
///   payload ≤ 127 bytes  → tag|Var8,  1-byte length, payload moved left 3
///   payload > 127 bytes  → tag|Var32, 4-byte length written into the hole
///   payload empty        → hole removed, bare Zero tag
/// ```
///
/// Variable-width elements inside arrays and maps carry their own 2-byte
/// length instead (4 bytes once an element passes 0x7FFF bytes, flagged by
/// the top bit of the first length word; `0xFFFF` marks a null element).
///
/// # Usage
///
/// ```rust
/// use packable_encoder::PackEncoder;
///
/// let mut encoder = PackEncoder::new();
/// encoder.put_str(0, "Tom").unwrap().put_int(1, 20).unwrap();
/// assert_eq!(encoder.finish(), [0x50, 0x03, b'T', b'o', b'm', 0x11, 0x14]);
/// ```
///
/// # Lifecycle
///
/// [`finish`](Self::finish) copies the bytes out and consumes the encoder,
/// returning its array to the pool; the type system rules out any later
/// use. [`clear`](Self::clear) resets an encoder for reuse instead.
pub struct PackEncoder {
    buffer: EncodeBuffer,
    config: PackConfig,
}

impl PackEncoder {
    /// Encoder with the default config and the global buffer pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(PackConfig::default(), BufferPool::global())
    }

    #[must_use]
    pub fn with_config(config: PackConfig) -> Self {
        Self::with_options(config, BufferPool::global())
    }

    /// Encoder drawing its backing array from `pool`.
    #[must_use]
    pub fn with_options(config: PackConfig, pool: &'static BufferPool) -> Self {
        Self {
            buffer: EncodeBuffer::new(config.buffer_limit(), pool),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// The bytes encoded so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.position()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.position() == 0
    }

    /// Discard everything written, keeping the backing array.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Copy out the encoded bytes and release the backing array.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buffer.as_slice().to_vec()
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut EncodeBuffer {
        &mut self.buffer
    }

    // ── One-shot helpers ────────────────────────────────────────────────

    /// Encode one record with `adapter`.
    ///
    /// # Errors
    ///
    /// Whatever the adapter's `put_*` calls return.
    pub fn marshal<T, A>(value: &T, adapter: &A) -> Result<Vec<u8>, EncodeError>
    where
        T: ?Sized,
        A: PackAdapter<T> + ?Sized,
    {
        Self::marshal_with(value, adapter, PackConfig::default(), BufferPool::global())
    }

    /// [`marshal`](Self::marshal) under `config`, drawing from `pool`.
    ///
    /// # Errors
    ///
    /// Whatever the adapter's `put_*` calls return.
    pub fn marshal_with<T, A>(
        value: &T,
        adapter: &A,
        config: PackConfig,
        pool: &'static BufferPool,
    ) -> Result<Vec<u8>, EncodeError>
    where
        T: ?Sized,
        A: PackAdapter<T> + ?Sized,
    {
        let mut encoder = Self::with_options(config, pool);
        adapter.encode(&mut encoder, value)?;
        Ok(encoder.finish())
    }

    /// Encode a bare list of records: varint count, then one
    /// length-prefixed element per record. An empty list is zero bytes.
    ///
    /// # Errors
    ///
    /// [`EncodeError::ElementCountExceeded`] or adapter errors.
    pub fn marshal_list<T, A>(values: &[T], adapter: &A) -> Result<Vec<u8>, EncodeError>
    where
        A: PackAdapter<T> + ?Sized,
    {
        Self::marshal_list_with(values, adapter, PackConfig::default(), BufferPool::global())
    }

    /// [`marshal_list`](Self::marshal_list) under `config`, drawing from `pool`.
    ///
    /// # Errors
    ///
    /// [`EncodeError::ElementCountExceeded`] or adapter errors.
    pub fn marshal_list_with<T, A>(
        values: &[T],
        adapter: &A,
        config: PackConfig,
        pool: &'static BufferPool,
    ) -> Result<Vec<u8>, EncodeError>
    where
        A: PackAdapter<T> + ?Sized,
    {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let mut encoder = Self::with_options(config, pool);
        let count = encoder.check_count(values.len())?;
        encoder.buffer.write_varint32(count)?;
        for value in values {
            encoder.wrap_object(Some(value), adapter)?;
        }
        Ok(encoder.finish())
    }

    /// Varint count followed by little-endian `i32`s, without a tag.
    /// The bare-array helpers always run under the default config.
    ///
    /// # Errors
    ///
    /// [`EncodeError::ElementCountExceeded`] or capacity errors.
    pub fn encode_int_array(values: &[i32]) -> Result<Vec<u8>, EncodeError> {
        Self::encode_bare(values, |buffer, value| buffer.write_i32(*value))
    }

    /// Varint count followed by little-endian `i64`s, without a tag.
    ///
    /// # Errors
    ///
    /// [`EncodeError::ElementCountExceeded`] or capacity errors.
    pub fn encode_long_array(values: &[i64]) -> Result<Vec<u8>, EncodeError> {
        Self::encode_bare(values, |buffer, value| buffer.write_i64(*value))
    }

    /// Varint count followed by varint-length-prefixed strings, without a tag.
    ///
    /// # Errors
    ///
    /// [`EncodeError::ElementCountExceeded`] or capacity errors.
    pub fn encode_str_list<S: AsRef<str>>(values: &[S]) -> Result<Vec<u8>, EncodeError> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let mut encoder = Self::new();
        let count = encoder.check_count(values.len())?;
        encoder.buffer.write_varint32(count)?;
        for value in values {
            encoder.wrap_str(Some(value.as_ref()))?;
        }
        Ok(encoder.finish())
    }

    fn encode_bare<T, F>(values: &[T], mut write: F) -> Result<Vec<u8>, EncodeError>
    where
        F: FnMut(&mut EncodeBuffer, &T) -> Result<(), WireError>,
    {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let mut encoder = Self::new();
        let count = encoder.check_count(values.len())?;
        encoder.buffer.write_varint32(count)?;
        for value in values {
            write(&mut encoder.buffer, value)?;
        }
        Ok(encoder.finish())
    }

    // ── Scalars ─────────────────────────────────────────────────────────

    fn put_tag(&mut self, index: u8, size_class: SizeClass) -> Result<usize, EncodeError> {
        Ok(self.buffer.write_tag(Tag::new(index, size_class))?)
    }

    /// Non-negative integers take the narrowest class that holds them.
    fn put_number(&mut self, index: u8, value: u64) -> Result<&mut Self, EncodeError> {
        self.buffer.ensure_capacity(10)?;
        if value == 0 {
            self.put_tag(index, SizeClass::Zero)?;
        } else if let Ok(v) = u8::try_from(value) {
            self.put_tag(index, SizeClass::Num8)?;
            self.buffer.write_u8(v)?;
        } else if let Ok(v) = u16::try_from(value) {
            self.put_tag(index, SizeClass::Num16)?;
            self.buffer.write_u16(v)?;
        } else if let Ok(v) = u32::try_from(value) {
            self.put_tag(index, SizeClass::Num32)?;
            self.buffer.write_u32(v)?;
        } else {
            self.put_tag(index, SizeClass::Num64)?;
            self.buffer.write_u64(value)?;
        }
        Ok(self)
    }

    /// # Errors
    ///
    /// Capacity errors from the buffer.
    pub fn put_bool(&mut self, index: u8, value: bool) -> Result<&mut Self, EncodeError> {
        self.put_number(index, u64::from(value))
    }

    /// # Errors
    ///
    /// Capacity errors from the buffer.
    pub fn put_byte(&mut self, index: u8, value: u8) -> Result<&mut Self, EncodeError> {
        self.put_number(index, u64::from(value))
    }

    /// Negative values always take the full 2 bytes.
    ///
    /// # Errors
    ///
    /// Capacity errors from the buffer.
    pub fn put_short(&mut self, index: u8, value: i16) -> Result<&mut Self, EncodeError> {
        if let Ok(v) = u64::try_from(value) {
            return self.put_number(index, v);
        }
        self.buffer.ensure_capacity(4)?;
        self.put_tag(index, SizeClass::Num16)?;
        self.buffer.write_bytes(&value.to_le_bytes())?;
        Ok(self)
    }

    /// Negative values always take the full 4 bytes.
    ///
    /// # Errors
    ///
    /// Capacity errors from the buffer.
    pub fn put_int(&mut self, index: u8, value: i32) -> Result<&mut Self, EncodeError> {
        if let Ok(v) = u64::try_from(value) {
            return self.put_number(index, v);
        }
        self.buffer.ensure_capacity(6)?;
        self.put_tag(index, SizeClass::Num32)?;
        self.buffer.write_i32(value)?;
        Ok(self)
    }

    /// Values in `0..2^32` take at most 4 bytes; everything else,
    /// including negatives, takes 8.
    ///
    /// # Errors
    ///
    /// Capacity errors from the buffer.
    pub fn put_long(&mut self, index: u8, value: i64) -> Result<&mut Self, EncodeError> {
        if let Ok(v) = u64::try_from(value) {
            return self.put_number(index, v);
        }
        self.buffer.ensure_capacity(10)?;
        self.put_tag(index, SizeClass::Num64)?;
        self.buffer.write_i64(value)?;
        Ok(self)
    }

    /// Zero elision compares bit patterns, so `-0.0` keeps its sign.
    ///
    /// # Errors
    ///
    /// Capacity errors from the buffer.
    pub fn put_float(&mut self, index: u8, value: f32) -> Result<&mut Self, EncodeError> {
        self.buffer.ensure_capacity(6)?;
        let bits = value.to_bits();
        if bits == 0 {
            self.put_tag(index, SizeClass::Zero)?;
        } else {
            self.put_tag(index, SizeClass::Num32)?;
            self.buffer.write_u32(bits)?;
        }
        Ok(self)
    }

    /// # Errors
    ///
    /// Capacity errors from the buffer.
    pub fn put_double(&mut self, index: u8, value: f64) -> Result<&mut Self, EncodeError> {
        self.buffer.ensure_capacity(10)?;
        let bits = value.to_bits();
        if bits == 0 {
            self.put_tag(index, SizeClass::Zero)?;
        } else {
            self.put_tag(index, SizeClass::Num64)?;
            self.buffer.write_u64(bits)?;
        }
        Ok(self)
    }

    /// Zigzag-encoded `i32`: small negative numbers stay small.
    ///
    /// # Errors
    ///
    /// Capacity errors from the buffer.
    #[allow(clippy::cast_sign_loss)]
    pub fn put_sint(&mut self, index: u8, value: i32) -> Result<&mut Self, EncodeError> {
        let zigzag = ((value << 1) ^ (value >> 31)) as u32;
        self.put_number(index, u64::from(zigzag))
    }

    /// Zigzag-encoded `i64`.
    ///
    /// # Errors
    ///
    /// Capacity errors from the buffer.
    #[allow(clippy::cast_sign_loss)]
    pub fn put_slong(&mut self, index: u8, value: i64) -> Result<&mut Self, EncodeError> {
        let zigzag = ((value << 1) ^ (value >> 63)) as u64;
        self.put_number(index, zigzag)
    }

    /// Double with its 32-bit halves swapped, so values whose low mantissa
    /// half is zero (small integers, halves, quarters, ...) fit in 4 bytes.
    ///
    /// # Errors
    ///
    /// Capacity errors from the buffer.
    #[allow(clippy::cast_possible_truncation)]
    pub fn put_c_double(&mut self, index: u8, value: f64) -> Result<&mut Self, EncodeError> {
        self.buffer.ensure_capacity(10)?;
        let bits = value.to_bits();
        if bits == 0 {
            self.put_tag(index, SizeClass::Zero)?;
        } else if bits << 32 == 0 {
            self.put_tag(index, SizeClass::Num32)?;
            self.buffer.write_u32((bits >> 32) as u32)?;
        } else {
            self.put_tag(index, SizeClass::Num64)?;
            self.buffer.write_u64(bits.rotate_left(32))?;
        }
        Ok(self)
    }

    // ── Variable-length payloads ────────────────────────────────────────

    /// Tag with the narrowest length class for `len`, then the length.
    /// Also reserves room for the payload itself.
    fn wrap_tag_and_length(&mut self, index: u8, len: usize) -> Result<(), EncodeError> {
        self.buffer
            .ensure_capacity(len.saturating_add(2 + RESERVED_LENGTH))?;
        let size_class = SizeClass::for_length(len);
        self.put_tag(index, size_class)?;
        self.write_length(size_class, len)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_length(&mut self, size_class: SizeClass, len: usize) -> Result<(), EncodeError> {
        // len is bounded by the buffer limit (at most 1 GiB) here
        match size_class {
            SizeClass::Var8 => self.buffer.write_u8(len as u8)?,
            SizeClass::Var16 => self.buffer.write_u16(len as u16)?,
            SizeClass::Var32 => self.buffer.write_u32(len as u32)?,
            _ => {}
        }
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_length_at(&mut self, at: usize, size_class: SizeClass, len: usize) -> Result<(), EncodeError> {
        match size_class {
            SizeClass::Var8 => self.buffer.write_u8_at(at, len as u8)?,
            SizeClass::Var16 => self.buffer.write_u16_at(at, len as u16)?,
            SizeClass::Var32 => self.buffer.write_u32_at(at, len as u32)?,
            _ => {}
        }
        Ok(())
    }

    fn put_payload(&mut self, index: u8, payload: &[u8]) -> Result<&mut Self, EncodeError> {
        self.wrap_tag_and_length(index, payload.len())?;
        self.buffer.write_bytes(payload)?;
        Ok(self)
    }

    /// UTF-8 string. The empty string is a bare `Zero` tag.
    ///
    /// # Errors
    ///
    /// Capacity errors from the buffer.
    pub fn put_str(&mut self, index: u8, value: &str) -> Result<&mut Self, EncodeError> {
        self.put_payload(index, value.as_bytes())
    }

    /// Raw bytes.
    ///
    /// # Errors
    ///
    /// Capacity errors from the buffer.
    pub fn put_bytes(&mut self, index: u8, value: &[u8]) -> Result<&mut Self, EncodeError> {
        self.put_payload(index, value)
    }

    /// Nested record, framed with reserve-then-patch (see the type docs).
    ///
    /// # Errors
    ///
    /// Capacity errors, or the adapter's own error.
    pub fn put_object<T, A>(&mut self, index: u8, value: &T, adapter: &A) -> Result<&mut Self, EncodeError>
    where
        T: ?Sized,
        A: PackAdapter<T> + ?Sized,
    {
        self.buffer.ensure_capacity(2 + RESERVED_LENGTH)?;
        let tag_pos = self.put_tag(index, SizeClass::Zero)?;
        let value_pos = self.buffer.reserve(RESERVED_LENGTH)? + RESERVED_LENGTH;
        adapter.encode(self, value)?;
        if self.buffer.position() == value_pos {
            self.buffer.rewind(value_pos - RESERVED_LENGTH)?;
        } else {
            self.put_len(tag_pos, value_pos)?;
        }
        Ok(self)
    }

    /// Patch the placeholder reserved before `value_pos` with the payload
    /// length, trimming it to one byte when the payload is short.
    #[allow(clippy::cast_possible_truncation)]
    fn put_len(&mut self, tag_pos: usize, value_pos: usize) -> Result<(), EncodeError> {
        let len = self.buffer.position() - value_pos;
        let prefix_pos = value_pos - RESERVED_LENGTH;
        if len <= TRIM_SIZE_LIMIT {
            self.buffer.or_u8_at(tag_pos, SizeClass::Var8.tag_bits())?;
            self.buffer.write_u8_at(prefix_pos, len as u8)?;
            self.buffer.shift_tail(value_pos, prefix_pos + 1)?;
            trace!(len, "length prefix trimmed");
        } else {
            self.buffer.or_u8_at(tag_pos, SizeClass::Var32.tag_bits())?;
            self.buffer.write_u32_at(prefix_pos, len as u32)?;
        }
        Ok(())
    }

    // ── Fixed-width arrays ──────────────────────────────────────────────

    fn array_len(count: usize, width: usize) -> Result<usize, EncodeError> {
        count.checked_mul(width).ok_or(EncodeError::Wire(WireError::CapacityExceeded {
            requested: usize::MAX,
            limit: usize::MAX,
        }))
    }

    /// # Errors
    ///
    /// Capacity errors from the buffer.
    pub fn put_int_array(&mut self, index: u8, value: &[i32]) -> Result<&mut Self, EncodeError> {
        self.wrap_tag_and_length(index, Self::array_len(value.len(), 4)?)?;
        for &v in value {
            self.buffer.write_i32(v)?;
        }
        Ok(self)
    }

    /// # Errors
    ///
    /// Capacity errors from the buffer.
    pub fn put_long_array(&mut self, index: u8, value: &[i64]) -> Result<&mut Self, EncodeError> {
        self.wrap_tag_and_length(index, Self::array_len(value.len(), 8)?)?;
        for &v in value {
            self.buffer.write_i64(v)?;
        }
        Ok(self)
    }

    /// # Errors
    ///
    /// Capacity errors from the buffer.
    pub fn put_float_array(&mut self, index: u8, value: &[f32]) -> Result<&mut Self, EncodeError> {
        self.wrap_tag_and_length(index, Self::array_len(value.len(), 4)?)?;
        for &v in value {
            self.buffer.write_f32(v)?;
        }
        Ok(self)
    }

    /// # Errors
    ///
    /// Capacity errors from the buffer.
    pub fn put_double_array(&mut self, index: u8, value: &[f64]) -> Result<&mut Self, EncodeError> {
        self.wrap_tag_and_length(index, Self::array_len(value.len(), 8)?)?;
        for &v in value {
            self.buffer.write_f64(v)?;
        }
        Ok(self)
    }

    // ── Element streams ─────────────────────────────────────────────────

    fn check_count(&self, count: usize) -> Result<u32, EncodeError> {
        let limit = self.config.max_element_count;
        u32::try_from(count)
            .ok()
            .filter(|_| count <= limit)
            .ok_or(EncodeError::ElementCountExceeded { count, limit })
    }

    /// Tag, length placeholder and varint count for a collection.
    ///
    /// # Returns
    ///
    /// `None` for an empty collection (a bare `Zero` tag was written),
    /// otherwise the tag and payload positions to hand to `put_len`.
    fn wrap_object_array_header(&mut self, index: u8, count: usize) -> Result<Option<(usize, usize)>, EncodeError> {
        let count = self.check_count(count)?;
        self.buffer.ensure_capacity(11)?;
        let tag_pos = self.put_tag(index, SizeClass::Zero)?;
        if count == 0 {
            return Ok(None);
        }
        let value_pos = self.buffer.reserve(RESERVED_LENGTH)? + RESERVED_LENGTH;
        self.buffer.write_varint32(count)?;
        Ok(Some((tag_pos, value_pos)))
    }

    /// String element: varint length then UTF-8, or the 5-byte encoding of
    /// -1 for a null.
    pub(crate) fn wrap_str(&mut self, value: Option<&str>) -> Result<(), EncodeError> {
        let Some(value) = value else {
            return Ok(self.buffer.write_varint32(u32::MAX)?);
        };
        let len = u32::try_from(value.len()).map_err(|_| WireError::CapacityExceeded {
            requested: value.len(),
            limit: self.buffer.limit(),
        })?;
        self.buffer.ensure_capacity(value.len().saturating_add(5))?;
        self.buffer.write_varint32(len)?;
        self.buffer.write_bytes(value.as_bytes())?;
        Ok(())
    }

    /// Record element: 2-byte length (escalated to 4 above 0x7FFF), then
    /// the record, or `0xFFFF` for a null.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn wrap_object<T, A>(&mut self, value: Option<&T>, adapter: &A) -> Result<(), EncodeError>
    where
        T: ?Sized,
        A: PackAdapter<T> + ?Sized,
    {
        let Some(value) = value else {
            return Ok(self.buffer.write_u16(NULL_ELEMENT)?);
        };
        let len_pos = self.buffer.reserve(2)?;
        let value_pos = len_pos + 2;
        adapter.encode(self, value)?;
        let len = self.buffer.position() - value_pos;
        if len <= SHORT_ELEMENT_LIMIT {
            self.buffer.write_u16_at(len_pos, len as u16)?;
        } else {
            self.buffer.shift_tail(value_pos, value_pos + 2)?;
            self.buffer.write_u16_at(len_pos, ((len >> 16) as u16) | 0x8000)?;
            self.buffer.write_u16_at(len_pos + 2, len as u16)?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// [`EncodeError::ElementCountExceeded`] or capacity errors.
    pub fn put_str_array<S: AsRef<str>>(&mut self, index: u8, value: &[S]) -> Result<&mut Self, EncodeError> {
        if let Some((tag_pos, value_pos)) = self.wrap_object_array_header(index, value.len())? {
            for s in value {
                self.wrap_str(Some(s.as_ref()))?;
            }
            self.put_len(tag_pos, value_pos)?;
        }
        Ok(self)
    }

    /// String array whose elements may be null.
    ///
    /// # Errors
    ///
    /// [`EncodeError::ElementCountExceeded`] or capacity errors.
    pub fn put_nullable_str_array<S: AsRef<str>>(
        &mut self,
        index: u8,
        value: &[Option<S>],
    ) -> Result<&mut Self, EncodeError> {
        if let Some((tag_pos, value_pos)) = self.wrap_object_array_header(index, value.len())? {
            for s in value {
                self.wrap_str(s.as_ref().map(AsRef::as_ref))?;
            }
            self.put_len(tag_pos, value_pos)?;
        }
        Ok(self)
    }

    /// # Errors
    ///
    /// [`EncodeError::ElementCountExceeded`], capacity or adapter errors.
    pub fn put_object_array<T, A>(&mut self, index: u8, value: &[T], adapter: &A) -> Result<&mut Self, EncodeError>
    where
        A: PackAdapter<T> + ?Sized,
    {
        if let Some((tag_pos, value_pos)) = self.wrap_object_array_header(index, value.len())? {
            for element in value {
                self.wrap_object(Some(element), adapter)?;
            }
            self.put_len(tag_pos, value_pos)?;
        }
        Ok(self)
    }

    /// Object array whose elements may be null.
    ///
    /// # Errors
    ///
    /// [`EncodeError::ElementCountExceeded`], capacity or adapter errors.
    pub fn put_nullable_object_array<T, A>(
        &mut self,
        index: u8,
        value: &[Option<T>],
        adapter: &A,
    ) -> Result<&mut Self, EncodeError>
    where
        A: PackAdapter<T> + ?Sized,
    {
        if let Some((tag_pos, value_pos)) = self.wrap_object_array_header(index, value.len())? {
            for element in value {
                self.wrap_object(element.as_ref(), adapter)?;
            }
            self.put_len(tag_pos, value_pos)?;
        }
        Ok(self)
    }

    /// Map of built-in key and value types (see [`Primitive`]).
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use packable_encoder::PackEncoder;
    ///
    /// let map = BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 2)]);
    /// let mut encoder = PackEncoder::new();
    /// encoder.put_map(0, &map).unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// [`EncodeError::ElementCountExceeded`] or capacity errors.
    pub fn put_map<'m, K, V, I>(&mut self, index: u8, entries: I) -> Result<&mut Self, EncodeError>
    where
        K: ?Sized + 'm,
        V: ?Sized + 'm,
        I: IntoIterator<Item = (&'m K, &'m V)>,
        I::IntoIter: ExactSizeIterator,
        Primitive: ElementEncoder<K> + ElementEncoder<V>,
    {
        self.put_map_with(index, entries, &Primitive, &Primitive)
    }

    /// Map whose keys and values are written by the given element encoders,
    /// e.g. `Primitive` keys with [`Nested`](crate::Nested) record values.
    ///
    /// # Errors
    ///
    /// [`EncodeError::ElementCountExceeded`], capacity or adapter errors.
    pub fn put_map_with<'m, K, V, I, KE, VE>(
        &mut self,
        index: u8,
        entries: I,
        keys: &KE,
        values: &VE,
    ) -> Result<&mut Self, EncodeError>
    where
        K: ?Sized + 'm,
        V: ?Sized + 'm,
        I: IntoIterator<Item = (&'m K, &'m V)>,
        I::IntoIter: ExactSizeIterator,
        KE: ElementEncoder<K> + ?Sized,
        VE: ElementEncoder<V> + ?Sized,
    {
        let entries = entries.into_iter();
        if let Some((tag_pos, value_pos)) = self.wrap_object_array_header(index, entries.len())? {
            for (key, value) in entries {
                keys.encode_element(self, key)?;
                values.encode_element(self, value)?;
            }
            self.put_len(tag_pos, value_pos)?;
        }
        Ok(self)
    }

    // ── Custom fields ───────────────────────────────────────────────────

    /// Field whose payload of exactly `len` bytes is produced by `write`.
    ///
    /// # Errors
    ///
    /// [`EncodeError::LengthMismatch`] if `write` produced a different
    /// number of bytes, capacity errors, or the writer's own error.
    pub fn put_custom<F>(&mut self, index: u8, len: usize, write: F) -> Result<&mut Self, EncodeError>
    where
        F: FnOnce(&mut EncodeBuffer) -> Result<(), EncodeError>,
    {
        self.wrap_tag_and_length(index, len)?;
        let start = self.buffer.position();
        write(&mut self.buffer)?;
        let written = self.buffer.position() - start;
        if written != len {
            return Err(EncodeError::LengthMismatch { declared: len, written });
        }
        Ok(self)
    }

    /// Field whose payload length is only known to be at most `max_len`.
    /// The length prefix is sized for `max_len` and filled in afterwards.
    ///
    /// # Errors
    ///
    /// [`EncodeError::LengthMismatch`] if `write` exceeded `max_len`,
    /// capacity errors, or the writer's own error.
    pub fn put_bounded<F>(&mut self, index: u8, max_len: usize, write: F) -> Result<&mut Self, EncodeError>
    where
        F: FnOnce(&mut EncodeBuffer) -> Result<(), EncodeError>,
    {
        if max_len == 0 {
            return self.put_custom(index, 0, write);
        }
        let size_class = SizeClass::for_length(max_len);
        self.buffer
            .ensure_capacity(max_len.saturating_add(2 + size_class.width()))?;
        self.put_tag(index, size_class)?;
        let prefix_pos = self.buffer.reserve(size_class.width())?;
        let start = self.buffer.position();
        write(&mut self.buffer)?;
        let written = self.buffer.position() - start;
        if written > max_len {
            return Err(EncodeError::LengthMismatch {
                declared: max_len,
                written,
            });
        }
        self.write_length_at(prefix_pos, size_class, written)?;
        Ok(self)
    }
}

impl fmt::Debug for PackEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackEncoder")
            .field("len", &self.buffer.position())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for PackEncoder {
    fn default() -> Self {
        Self::new()
    }
}
