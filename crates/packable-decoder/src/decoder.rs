use std::cell::RefCell;
use std::rc::{Rc, Weak};

use packable_wire::{DecodeBuffer, InfoPool, PackConfig, Primitive, SizeClass, WireError};
use tracing::{debug, trace};

use crate::adapter::{ElementDecoder, UnpackAdapter};
use crate::elements::{DecoderArray, ElementReader};
use crate::error::DecodeError;
use crate::info::{InfoSlot, InfoTable};

/// Idle child decoders kept per root decoder.
pub const CHILD_POOL_CAPACITY: usize = 8;

/// Idle child decoders of one root decoder. Children hold a weak handle,
/// so a child that outlives its root is simply dropped on recycle.
struct ChildPool<'a> {
    free: Vec<PackDecoder<'a>>,
}

type SharedChildPool<'a> = Rc<RefCell<ChildPool<'a>>>;

enum Scope<'a> {
    Root(SharedChildPool<'a>),
    Child(Weak<RefCell<ChildPool<'a>>>),
}

/// Random access to the fields of one packed record.
///
/// The decoder borrows the input and never copies it: strings and byte
/// arrays come back as slices of the input, and nested records are read by
/// child decoders bound to sub-ranges of the same bytes.
///
/// # Lifecycle
///
/// ```text
///   new ──► Unparsed ──first getter──► Parsed ──recycle(self)──► (gone)
///                     one linear scan
///                     fills the info table
/// ```
///
/// The scan reads every tag once and records, per field index, either the
/// value itself (scalars up to 32 bits) or the payload position (64-bit
/// scalars and length-prefixed payloads). After that every getter is a
/// table lookup. A record whose framing does not add up, such as a
/// truncated tag or a payload running past the end, fails the scan with
/// [`DecodeError::Corrupt`] on the first getter.
///
/// `recycle` consumes the decoder, so a recycled decoder cannot be used:
///
/// ```compile_fail
/// use packable_decoder::PackDecoder;
///
/// let mut decoder = PackDecoder::new(&[0x11, 0x01]).unwrap();
/// decoder.recycle();
/// decoder.get_int(1).unwrap();
/// ```
///
/// # Missing vs. zero
///
/// Every getter returns `Ok(None)` for an index the record does not
/// contain, and the type's zero for a field encoded as `Zero`:
///
/// ```rust
/// use packable_decoder::PackDecoder;
/// use packable_encoder::PackEncoder;
///
/// let mut encoder = PackEncoder::new();
/// encoder.put_str(0, "Tom").unwrap().put_int(1, 20).unwrap().put_int(3, 0).unwrap();
/// let bytes = encoder.finish();
///
/// let mut decoder = PackDecoder::new(&bytes).unwrap();
/// assert_eq!(decoder.get_str(0).unwrap(), Some("Tom"));
/// assert_eq!(decoder.get_int(1).unwrap(), Some(20));
/// assert_eq!(decoder.get_int(2).unwrap(), None);
/// assert_eq!(decoder.get_int(3).unwrap(), Some(0));
/// assert_eq!(decoder.get_int(2).unwrap().unwrap_or(-1), -1);
/// ```
///
/// # Child decoders
///
/// Nested records are decoded by children drawn from a small pool owned by
/// the root decoder ([`CHILD_POOL_CAPACITY`] idle children). Getters that
/// take an adapter return their child to the pool themselves; a child
/// handed out by [`get_decoder`](Self::get_decoder) goes back when the
/// caller recycles it. Info tables come from an [`InfoPool`] and go back to
/// it on recycle or drop.
///
/// A decoder and its children are confined to one thread.
pub struct PackDecoder<'a> {
    buffer: DecodeBuffer<'a>,
    config: PackConfig,
    info: InfoTable,
    parsed: bool,
    max_index: Option<u8>,
    scope: Scope<'a>,
}

impl<'a> PackDecoder<'a> {
    /// Decoder over a whole record with the default config.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::CapacityExceeded`] if `bytes` is longer than the
    /// configured buffer limit.
    pub fn new(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        Self::with_options(bytes, PackConfig::default(), InfoPool::global())
    }

    /// # Errors
    ///
    /// Returns [`WireError::CapacityExceeded`] if `bytes` is longer than
    /// `config` allows.
    pub fn with_config(bytes: &'a [u8], config: PackConfig) -> Result<Self, DecodeError> {
        Self::with_options(bytes, config, InfoPool::global())
    }

    /// Decoder drawing its info tables from `info_pool`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::CapacityExceeded`] if `bytes` is longer than
    /// `config` allows.
    pub fn with_options(
        bytes: &'a [u8],
        config: PackConfig,
        info_pool: &'static InfoPool,
    ) -> Result<Self, DecodeError> {
        let limit = config.buffer_limit();
        if bytes.len() > limit {
            debug!(len = bytes.len(), limit, "decoder input over limit");
            return Err(WireError::CapacityExceeded {
                requested: bytes.len(),
                limit,
            }
            .into());
        }
        Ok(Self {
            buffer: DecodeBuffer::new(bytes),
            config,
            info: InfoTable::new(info_pool),
            parsed: false,
            max_index: None,
            scope: Scope::Root(Rc::new(RefCell::new(ChildPool { free: Vec::new() }))),
        })
    }

    #[must_use]
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Release this decoder.
    ///
    /// A child goes back to its root's pool (if the root is still alive and
    /// the pool has room) after handing its info table back to the info
    /// pool. A root simply drops, releasing its idle children with it.
    pub fn recycle(mut self) {
        let Scope::Child(pool) = &self.scope else {
            return;
        };
        let Some(pool) = pool.upgrade() else {
            return;
        };
        let mut pool = pool.borrow_mut();
        if pool.free.len() < CHILD_POOL_CAPACITY {
            self.info.release();
            self.parsed = false;
            self.max_index = None;
            pool.free.push(self);
        }
    }

    /// A child decoder bound to `bytes[offset..offset + len]` of this
    /// decoder's input, reused from the root's pool when one is idle.
    pub(crate) fn child(&self, offset: usize, len: usize) -> Result<PackDecoder<'a>, DecodeError> {
        let pool = match &self.scope {
            Scope::Root(pool) => Rc::downgrade(pool),
            Scope::Child(pool) => pool.clone(),
        };
        if let Some(shared) = pool.upgrade() {
            let idle = shared.borrow_mut().free.pop();
            if let Some(mut child) = idle {
                trace!("child decoder reused");
                child.config = self.config;
                child.rebind(offset, len)?;
                return Ok(child);
            }
        }
        trace!("child decoder pool miss");
        Ok(PackDecoder {
            buffer: DecodeBuffer::with_bounds(self.buffer.backing(), offset, len)?,
            config: self.config,
            info: InfoTable::new(self.info.pool()),
            parsed: false,
            max_index: None,
            scope: Scope::Child(pool),
        })
    }

    /// Point this decoder at another range of the same input. The info
    /// table is kept and rewritten by the next scan.
    pub(crate) fn rebind(&mut self, offset: usize, len: usize) -> Result<(), DecodeError> {
        self.buffer = DecodeBuffer::with_bounds(self.buffer.backing(), offset, len)?;
        self.parsed = false;
        self.max_index = None;
        Ok(())
    }

    // ── Scan ────────────────────────────────────────────────────────────

    fn corrupt(offset: usize, reason: &'static str) -> impl FnOnce(WireError) -> DecodeError {
        move |_| {
            debug!(offset, reason, "corrupt record");
            DecodeError::Corrupt { offset, reason }
        }
    }

    /// Build the info table with one pass over the record.
    fn parse(&mut self) -> Result<(), DecodeError> {
        if self.parsed {
            return Ok(());
        }
        let mut cursor = self.buffer;
        let mut present = [0u64; 4];
        let mut max_index: Option<u8> = None;

        while cursor.has_remaining() {
            let tag_offset = cursor.position();
            let tag = cursor
                .read_tag()
                .map_err(Self::corrupt(tag_offset, "truncated tag"))?;
            let payload_offset = cursor.position();
            let truncated = || Self::corrupt(payload_offset, "payload runs past end of record");

            let slot = match tag.size_class {
                SizeClass::Zero => InfoSlot::literal(SizeClass::Zero, 0),
                SizeClass::Num8 => {
                    let v = cursor.read_u8().map_err(truncated())?;
                    InfoSlot::literal(SizeClass::Num8, u32::from(v))
                }
                SizeClass::Num16 => {
                    let v = cursor.read_u16().map_err(truncated())?;
                    InfoSlot::literal(SizeClass::Num16, u32::from(v))
                }
                SizeClass::Num32 => {
                    let v = cursor.read_u32().map_err(truncated())?;
                    InfoSlot::literal(SizeClass::Num32, v)
                }
                SizeClass::Num64 => {
                    cursor.skip(8).map_err(truncated())?;
                    InfoSlot::located(SizeClass::Num64, payload_offset, 8)
                }
                var => {
                    let len = match var {
                        SizeClass::Var8 => cursor.read_u8().map(usize::from),
                        SizeClass::Var16 => cursor.read_u16().map(usize::from),
                        _ => cursor.read_u32().map(|v| v as usize),
                    }
                    .map_err(truncated())?;
                    let offset = cursor.position();
                    cursor.skip(len).map_err(truncated())?;
                    InfoSlot::located(var, offset, len)
                }
            };

            let index = tag.index;
            present[usize::from(index >> 6)] |= 1 << (index & 63);
            max_index = max_index.max(Some(index));
            self.info.set(index, slot);
        }

        if let Some(max) = max_index {
            self.backfill_missing(&present, max);
        }
        self.max_index = max_index;
        self.parsed = true;
        Ok(())
    }

    /// Mark every index below `max` that had no field as NULL, since the
    /// table may hold stale entries from a previous record.
    fn backfill_missing(&mut self, present: &[u64; 4], max: u8) {
        let max = usize::from(max);
        for (word_index, word) in present.iter().enumerate() {
            let base = word_index * 64;
            if base > max {
                break;
            }
            let mut missing = !word;
            while missing != 0 {
                let index = base + missing.trailing_zeros() as usize;
                if index > max {
                    break;
                }
                if let Ok(index) = u8::try_from(index) {
                    self.info.set(index, InfoSlot::NULL);
                }
                missing &= missing - 1;
            }
        }
    }

    fn slot(&mut self, index: u8) -> Result<Option<InfoSlot>, DecodeError> {
        self.parse()?;
        match self.max_index {
            Some(max) if index <= max => {
                let slot = self.info.get(index);
                Ok((!slot.is_null()).then_some(slot))
            }
            _ => Ok(None),
        }
    }

    fn mismatch<T>(&self, index: u8, size_class: SizeClass) -> Result<Option<T>, DecodeError> {
        if self.config.ignore_unknown_types {
            trace!(index, ?size_class, "size class mismatch ignored");
            Ok(None)
        } else {
            Err(DecodeError::UnknownType { index, size_class })
        }
    }

    /// Numeric payload of a scalar field, zero-extended to 64 bits.
    fn number(&mut self, index: u8) -> Result<Option<u64>, DecodeError> {
        let Some(slot) = self.slot(index)? else {
            return Ok(None);
        };
        match slot.size_class() {
            SizeClass::Zero | SizeClass::Num8 | SizeClass::Num16 | SizeClass::Num32 => {
                Ok(Some(u64::from(slot.value())))
            }
            SizeClass::Num64 => Ok(Some(self.buffer.read_u64_at(slot.offset())?)),
            other => self.mismatch(index, other),
        }
    }

    /// Position and length of a length-prefixed field. A `Zero` field is
    /// an empty payload.
    fn located(&mut self, index: u8) -> Result<Option<(usize, usize)>, DecodeError> {
        let Some(slot) = self.slot(index)? else {
            return Ok(None);
        };
        match slot.size_class() {
            SizeClass::Zero => Ok(Some((0, 0))),
            class if class.is_variable() => Ok(Some((slot.offset(), slot.len()))),
            other => self.mismatch(index, other),
        }
    }

    fn payload(&mut self, index: u8) -> Result<Option<(usize, &'a [u8])>, DecodeError> {
        let Some((offset, len)) = self.located(index)? else {
            return Ok(None);
        };
        Ok(Some((offset, self.buffer.slice(offset, len)?)))
    }

    // ── Scalars ─────────────────────────────────────────────────────────

    /// Whether the record has a field at `index` (a `Zero` field counts).
    ///
    /// # Errors
    ///
    /// [`DecodeError::Corrupt`] if the record fails its scan.
    pub fn contains(&mut self, index: u8) -> Result<bool, DecodeError> {
        Ok(self.slot(index)?.is_some())
    }

    /// # Errors
    ///
    /// [`DecodeError::Corrupt`] or [`DecodeError::UnknownType`].
    pub fn get_bool(&mut self, index: u8) -> Result<Option<bool>, DecodeError> {
        Ok(self.number(index)?.map(|n| n != 0))
    }

    /// # Errors
    ///
    /// [`DecodeError::Corrupt`] or [`DecodeError::UnknownType`].
    #[allow(clippy::cast_possible_truncation)]
    pub fn get_byte(&mut self, index: u8) -> Result<Option<u8>, DecodeError> {
        Ok(self.number(index)?.map(|n| n as u8))
    }

    /// # Errors
    ///
    /// [`DecodeError::Corrupt`] or [`DecodeError::UnknownType`].
    #[allow(clippy::cast_possible_truncation)]
    pub fn get_short(&mut self, index: u8) -> Result<Option<i16>, DecodeError> {
        Ok(self.number(index)?.map(|n| n as i16))
    }

    /// # Errors
    ///
    /// [`DecodeError::Corrupt`] or [`DecodeError::UnknownType`].
    #[allow(clippy::cast_possible_truncation)]
    pub fn get_int(&mut self, index: u8) -> Result<Option<i32>, DecodeError> {
        Ok(self.number(index)?.map(|n| n as i32))
    }

    /// # Errors
    ///
    /// [`DecodeError::Corrupt`] or [`DecodeError::UnknownType`].
    #[allow(clippy::cast_possible_wrap)]
    pub fn get_long(&mut self, index: u8) -> Result<Option<i64>, DecodeError> {
        Ok(self.number(index)?.map(|n| n as i64))
    }

    /// # Errors
    ///
    /// [`DecodeError::Corrupt`] or [`DecodeError::UnknownType`].
    #[allow(clippy::cast_possible_truncation)]
    pub fn get_float(&mut self, index: u8) -> Result<Option<f32>, DecodeError> {
        Ok(self.number(index)?.map(|n| f32::from_bits(n as u32)))
    }

    /// # Errors
    ///
    /// [`DecodeError::Corrupt`] or [`DecodeError::UnknownType`].
    pub fn get_double(&mut self, index: u8) -> Result<Option<f64>, DecodeError> {
        Ok(self.number(index)?.map(f64::from_bits))
    }

    /// Zigzag-encoded `i32`.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Corrupt`] or [`DecodeError::UnknownType`].
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn get_sint(&mut self, index: u8) -> Result<Option<i32>, DecodeError> {
        Ok(self.number(index)?.map(|n| {
            let n = n as u32;
            ((n >> 1) as i32) ^ -((n & 1) as i32)
        }))
    }

    /// Zigzag-encoded `i64`.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Corrupt`] or [`DecodeError::UnknownType`].
    #[allow(clippy::cast_possible_wrap)]
    pub fn get_slong(&mut self, index: u8) -> Result<Option<i64>, DecodeError> {
        Ok(self
            .number(index)?
            .map(|n| ((n >> 1) as i64) ^ -((n & 1) as i64)))
    }

    /// Double written with its 32-bit halves swapped. A 4-byte payload is
    /// the high half with a zero low half.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Corrupt`] or [`DecodeError::UnknownType`].
    pub fn get_c_double(&mut self, index: u8) -> Result<Option<f64>, DecodeError> {
        Ok(self
            .number(index)?
            .map(|n| f64::from_bits(n.rotate_right(32))))
    }

    // ── Variable-length payloads ────────────────────────────────────────

    /// UTF-8 string borrowed from the input.
    ///
    /// # Errors
    ///
    /// [`DecodeError::InvalidUtf8`], [`DecodeError::Corrupt`] or
    /// [`DecodeError::UnknownType`].
    pub fn get_str(&mut self, index: u8) -> Result<Option<&'a str>, DecodeError> {
        let Some((offset, bytes)) = self.payload(index)? else {
            return Ok(None);
        };
        std::str::from_utf8(bytes)
            .map(Some)
            .map_err(|e| DecodeError::InvalidUtf8 {
                offset: offset + e.valid_up_to(),
            })
    }

    /// # Errors
    ///
    /// [`DecodeError::Corrupt`] or [`DecodeError::UnknownType`].
    pub fn get_bytes(&mut self, index: u8) -> Result<Option<&'a [u8]>, DecodeError> {
        Ok(self.payload(index)?.map(|(_, bytes)| bytes))
    }

    /// Raw payload of a custom field as a read cursor bounded to the field.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Corrupt`] or [`DecodeError::UnknownType`].
    pub fn get_custom(&mut self, index: u8) -> Result<Option<DecodeBuffer<'a>>, DecodeError> {
        let Some((offset, len)) = self.located(index)? else {
            return Ok(None);
        };
        Ok(Some(DecodeBuffer::with_bounds(self.buffer.backing(), offset, len)?))
    }

    /// Nested record decoded by `adapter` in a pooled child decoder.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Corrupt`], [`DecodeError::UnknownType`] or the
    /// adapter's error.
    pub fn get_object<T, U>(&mut self, index: u8, adapter: &U) -> Result<Option<T>, DecodeError>
    where
        U: UnpackAdapter<T> + ?Sized,
    {
        let Some(mut child) = self.get_decoder(index)? else {
            return Ok(None);
        };
        let value = adapter.decode(&mut child);
        child.recycle();
        value.map(Some)
    }

    /// Child decoder over a nested record. Hand it back with
    /// [`recycle`](Self::recycle) to return it to the pool.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Corrupt`] or [`DecodeError::UnknownType`].
    pub fn get_decoder(&mut self, index: u8) -> Result<Option<PackDecoder<'a>>, DecodeError> {
        let Some((offset, len)) = self.located(index)? else {
            return Ok(None);
        };
        self.child(offset, len).map(Some)
    }

    // ── Fixed-width arrays ──────────────────────────────────────────────

    fn fixed_array<T, const W: usize>(
        &mut self,
        index: u8,
        convert: fn([u8; W]) -> T,
    ) -> Result<Option<Vec<T>>, DecodeError> {
        let Some((_, bytes)) = self.payload(index)? else {
            return Ok(None);
        };
        if bytes.len() % W != 0 {
            return Err(DecodeError::InvalidArrayLength {
                index,
                len: bytes.len(),
                width: W,
            });
        }
        let values = bytes
            .chunks_exact(W)
            .map(|chunk| {
                let mut raw = [0u8; W];
                raw.copy_from_slice(chunk);
                convert(raw)
            })
            .collect();
        Ok(Some(values))
    }

    /// # Errors
    ///
    /// [`DecodeError::InvalidArrayLength`], [`DecodeError::Corrupt`] or
    /// [`DecodeError::UnknownType`].
    pub fn get_int_array(&mut self, index: u8) -> Result<Option<Vec<i32>>, DecodeError> {
        self.fixed_array(index, i32::from_le_bytes)
    }

    /// # Errors
    ///
    /// [`DecodeError::InvalidArrayLength`], [`DecodeError::Corrupt`] or
    /// [`DecodeError::UnknownType`].
    pub fn get_long_array(&mut self, index: u8) -> Result<Option<Vec<i64>>, DecodeError> {
        self.fixed_array(index, i64::from_le_bytes)
    }

    /// # Errors
    ///
    /// [`DecodeError::InvalidArrayLength`], [`DecodeError::Corrupt`] or
    /// [`DecodeError::UnknownType`].
    pub fn get_float_array(&mut self, index: u8) -> Result<Option<Vec<f32>>, DecodeError> {
        self.fixed_array(index, f32::from_le_bytes)
    }

    /// # Errors
    ///
    /// [`DecodeError::InvalidArrayLength`], [`DecodeError::Corrupt`] or
    /// [`DecodeError::UnknownType`].
    pub fn get_double_array(&mut self, index: u8) -> Result<Option<Vec<f64>>, DecodeError> {
        self.fixed_array(index, f64::from_le_bytes)
    }

    // ── Element streams ─────────────────────────────────────────────────

    fn check_count(config: &PackConfig, count: u32) -> Result<usize, DecodeError> {
        let count = count as usize;
        let limit = config.max_element_count;
        if count > limit {
            debug!(count, limit, "element count over limit");
            return Err(DecodeError::ElementCountExceeded { count, limit });
        }
        Ok(count)
    }

    /// Element count and a cursor over the elements of a collection field.
    fn elements(&mut self, index: u8) -> Result<Option<(usize, DecodeBuffer<'a>)>, DecodeError> {
        let Some((offset, len)) = self.located(index)? else {
            return Ok(None);
        };
        let mut cursor = DecodeBuffer::with_bounds(self.buffer.backing(), offset, len)?;
        if len == 0 {
            return Ok(Some((0, cursor)));
        }
        let count = Self::check_count(&self.config, cursor.read_varint32()?)?;
        Ok(Some((count, cursor)))
    }

    fn collect_elements<T, F>(&mut self, index: u8, mut take: F) -> Result<Option<Vec<T>>, DecodeError>
    where
        F: FnMut(&mut ElementReader<'_, 'a>) -> Result<T, DecodeError>,
    {
        let Some((count, cursor)) = self.elements(index)? else {
            return Ok(None);
        };
        let mut reader = ElementReader::new(cursor, self);
        let mut values = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            values.push(take(&mut reader)?);
        }
        reader.finish()?;
        Ok(Some(values))
    }

    /// # Errors
    ///
    /// [`DecodeError::NullElement`] if an element is null, element-count,
    /// UTF-8 and framing errors.
    pub fn get_str_array(&mut self, index: u8) -> Result<Option<Vec<&'a str>>, DecodeError> {
        self.collect_elements(index, |reader| {
            let position = reader.position();
            reader.take_str()?.ok_or(DecodeError::NullElement { position })
        })
    }

    /// # Errors
    ///
    /// Element-count, UTF-8 and framing errors.
    pub fn get_nullable_str_array(&mut self, index: u8) -> Result<Option<Vec<Option<&'a str>>>, DecodeError> {
        self.collect_elements(index, |reader| reader.take_str())
    }

    /// # Errors
    ///
    /// [`DecodeError::NullElement`] if an element is null, element-count
    /// and framing errors, or the adapter's error.
    pub fn get_object_array<T, U>(&mut self, index: u8, adapter: &U) -> Result<Option<Vec<T>>, DecodeError>
    where
        U: UnpackAdapter<T> + ?Sized,
    {
        self.collect_elements(index, |reader| {
            let position = reader.position();
            reader
                .take_object(adapter)?
                .ok_or(DecodeError::NullElement { position })
        })
    }

    /// # Errors
    ///
    /// Element-count and framing errors, or the adapter's error.
    pub fn get_nullable_object_array<T, U>(
        &mut self,
        index: u8,
        adapter: &U,
    ) -> Result<Option<Vec<Option<T>>>, DecodeError>
    where
        U: UnpackAdapter<T> + ?Sized,
    {
        self.collect_elements(index, |reader| reader.take_object(adapter))
    }

    /// Object array walked with one reusable child decoder.
    ///
    /// # Errors
    ///
    /// Element-count and framing errors.
    pub fn get_decoder_array(&mut self, index: u8) -> Result<Option<DecoderArray<'_, 'a>>, DecodeError> {
        let Some((count, cursor)) = self.elements(index)? else {
            return Ok(None);
        };
        Ok(Some(DecoderArray::new(ElementReader::new(cursor, self), count)))
    }

    /// Map of built-in key and value types, collected into any
    /// `FromIterator<(K, V)>` such as `HashMap` or `BTreeMap`.
    ///
    /// ```rust
    /// use std::collections::HashMap;
    /// use packable_decoder::PackDecoder;
    /// use packable_encoder::PackEncoder;
    ///
    /// let map = HashMap::from([("a".to_string(), 1i64)]);
    /// let mut encoder = PackEncoder::new();
    /// encoder.put_map(0, &map).unwrap();
    /// let bytes = encoder.finish();
    ///
    /// let mut decoder = PackDecoder::new(&bytes).unwrap();
    /// let back: HashMap<String, i64> = decoder.get_map(0).unwrap().unwrap();
    /// assert_eq!(back, map);
    /// ```
    ///
    /// # Errors
    ///
    /// Element-count, UTF-8, null-element and framing errors.
    pub fn get_map<K, V, C>(&mut self, index: u8) -> Result<Option<C>, DecodeError>
    where
        Primitive: ElementDecoder<'a, K> + ElementDecoder<'a, V>,
        C: FromIterator<(K, V)>,
    {
        self.get_map_with(index, &Primitive, &Primitive)
    }

    /// Map whose keys and values are read by the given element decoders.
    ///
    /// # Errors
    ///
    /// Element-count, UTF-8, null-element and framing errors, or an
    /// adapter's error.
    pub fn get_map_with<K, V, C, KD, VD>(
        &mut self,
        index: u8,
        keys: &KD,
        values: &VD,
    ) -> Result<Option<C>, DecodeError>
    where
        KD: ElementDecoder<'a, K> + ?Sized,
        VD: ElementDecoder<'a, V> + ?Sized,
        C: FromIterator<(K, V)>,
    {
        let Some((count, cursor)) = self.elements(index)? else {
            return Ok(None);
        };
        let mut reader = ElementReader::new(cursor, self);
        let map = (0..count)
            .map(|_| -> Result<(K, V), DecodeError> {
                Ok((keys.take(&mut reader)?, values.take(&mut reader)?))
            })
            .collect::<Result<C, DecodeError>>()?;
        reader.finish()?;
        Ok(Some(map))
    }

    // ── One-shot helpers ────────────────────────────────────────────────

    /// Decode one record with `adapter`.
    ///
    /// # Errors
    ///
    /// Input over the size limit, or whatever the adapter's getters return.
    pub fn unmarshal<T, U>(bytes: &'a [u8], adapter: &U) -> Result<T, DecodeError>
    where
        U: UnpackAdapter<T> + ?Sized,
    {
        let mut decoder = Self::new(bytes)?;
        adapter.decode(&mut decoder)
    }

    /// Decode a bare list written by the encoder's `marshal_list`.
    ///
    /// # Errors
    ///
    /// Element-count, null-element and framing errors, or the adapter's
    /// error.
    pub fn unmarshal_list<T, U>(bytes: &'a [u8], adapter: &U) -> Result<Vec<T>, DecodeError>
    where
        U: UnpackAdapter<T> + ?Sized,
    {
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        let decoder = Self::new(bytes)?;
        let mut cursor = DecodeBuffer::new(bytes);
        let count = Self::check_count(&decoder.config, cursor.read_varint32()?)?;
        let mut reader = ElementReader::new(cursor, &decoder);
        let mut values = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            let position = reader.position();
            let value = reader
                .take_object(adapter)?
                .ok_or(DecodeError::NullElement { position })?;
            values.push(value);
        }
        reader.finish()?;
        Ok(values)
    }

    fn decode_bare<T, const W: usize>(bytes: &[u8], convert: fn([u8; W]) -> T) -> Result<Vec<T>, DecodeError> {
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        let mut cursor = DecodeBuffer::new(bytes);
        let count = Self::check_count(&PackConfig::default(), cursor.read_varint32()?)?;
        let len = count * W;
        let body = cursor.read_bytes(len)?;
        if cursor.has_remaining() {
            return Err(DecodeError::Corrupt {
                offset: cursor.position(),
                reason: "trailing bytes after last element",
            });
        }
        Ok(body
            .chunks_exact(W)
            .map(|chunk| {
                let mut raw = [0u8; W];
                raw.copy_from_slice(chunk);
                convert(raw)
            })
            .collect())
    }

    /// Inverse of the encoder's `encode_int_array`.
    ///
    /// # Errors
    ///
    /// Element-count and framing errors.
    pub fn decode_int_array(bytes: &[u8]) -> Result<Vec<i32>, DecodeError> {
        Self::decode_bare(bytes, i32::from_le_bytes)
    }

    /// Inverse of the encoder's `encode_long_array`.
    ///
    /// # Errors
    ///
    /// Element-count and framing errors.
    pub fn decode_long_array(bytes: &[u8]) -> Result<Vec<i64>, DecodeError> {
        Self::decode_bare(bytes, i64::from_le_bytes)
    }

    /// Inverse of the encoder's `encode_str_list`.
    ///
    /// # Errors
    ///
    /// Element-count, UTF-8, null-element and framing errors.
    pub fn decode_str_list(bytes: &'a [u8]) -> Result<Vec<&'a str>, DecodeError> {
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        let decoder = Self::new(bytes)?;
        let mut cursor = DecodeBuffer::new(bytes);
        let count = Self::check_count(&decoder.config, cursor.read_varint32()?)?;
        let mut reader = ElementReader::new(cursor, &decoder);
        let mut values = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            let position = reader.position();
            values.push(reader.take_str()?.ok_or(DecodeError::NullElement { position })?);
        }
        reader.finish()?;
        Ok(values)
    }
}
