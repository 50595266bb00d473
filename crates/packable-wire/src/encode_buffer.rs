use tracing::debug;

use crate::config::LARGE_BUFFER_THRESHOLD;
use crate::error::WireError;
use crate::pool::BufferPool;
use crate::tag::Tag;
use crate::varint::{MAX_VARINT32_BYTES, encode_varint32};

/// Growable output region with a write cursor.
///
/// The backing array comes from a [`BufferPool`] and goes back to it when
/// the buffer is dropped or outgrown. Only `[0, position)` is meaningful;
/// bytes past the cursor may be stale leftovers from a previous user of the
/// array.
///
/// Every writer checks capacity itself, so the encoder's up-front
/// [`ensure_capacity`](Self::ensure_capacity) calls only serve to grow once
/// per field instead of once per primitive.
///
/// ```text
///   0                      position            bytes.len()      limit
///   ├──────── written ─────────┼──── spare (stale) ───┤ · · · · · · ┤
/// ```
pub struct EncodeBuffer {
    bytes: Vec<u8>,
    position: usize,
    limit: usize,
    pool: &'static BufferPool,
}

impl EncodeBuffer {
    /// Create an empty buffer backed by a default-size array from `pool`.
    /// `limit` is the hard ceiling for the written length.
    #[must_use]
    pub fn new(limit: usize, pool: &'static BufferPool) -> Self {
        Self {
            bytes: pool.acquire(),
            position: 0,
            limit,
            pool,
        }
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Current size of the backing array.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The bytes written so far.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.position]
    }

    /// Reset the cursor, keeping the backing array.
    pub fn clear(&mut self) {
        self.position = 0;
    }

    /// Move the cursor back to `position`, discarding everything after it.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::OutOfBounds`] if `position` is ahead of the cursor.
    pub fn rewind(&mut self, position: usize) -> Result<(), WireError> {
        if position > self.position {
            return Err(WireError::OutOfBounds {
                offset: position,
                len: 0,
                limit: self.position,
            });
        }
        self.position = position;
        Ok(())
    }

    /// Make room for `additional` more bytes after the cursor.
    ///
    /// Growth doubles the array until the request fits, then doubles once
    /// more while the result is still below [`LARGE_BUFFER_THRESHOLD`].
    /// The new size never exceeds `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::CapacityExceeded`] if `position + additional`
    /// is above `limit`.
    pub fn ensure_capacity(&mut self, additional: usize) -> Result<(), WireError> {
        let required = self
            .position
            .checked_add(additional)
            .filter(|&required| required <= self.limit)
            .ok_or_else(|| {
                debug!(position = self.position, additional, limit = self.limit, "write buffer limit reached");
                WireError::CapacityExceeded {
                    requested: self.position.saturating_add(additional),
                    limit: self.limit,
                }
            })?;
        if required > self.bytes.len() {
            self.grow(required);
        }
        Ok(())
    }

    fn grow(&mut self, required: usize) {
        let mut new_size = self.bytes.len().max(1);
        while new_size < required {
            new_size <<= 1;
        }
        if new_size < LARGE_BUFFER_THRESHOLD {
            new_size <<= 1;
        }
        let new_size = new_size.min(self.limit);

        let mut grown = self.pool.allocate(new_size);
        grown[..self.position].copy_from_slice(&self.bytes[..self.position]);
        let old = std::mem::replace(&mut self.bytes, grown);
        debug!(from = old.len(), to = new_size, "write buffer grown");
        self.pool.release(old);
    }

    /// Advance the cursor over `len` placeholder bytes to be patched later.
    ///
    /// # Returns
    ///
    /// The position of the first reserved byte.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::CapacityExceeded`] past the limit.
    pub fn reserve(&mut self, len: usize) -> Result<usize, WireError> {
        self.ensure_capacity(len)?;
        let start = self.position;
        self.position += len;
        Ok(start)
    }

    /// Move the tail `[from, position)` so it starts at `to`, adjusting the
    /// cursor. Shifting left drops bytes, shifting right opens a gap of
    /// `to - from` bytes to be filled by the caller.
    ///
    /// # Errors
    ///
    /// - [`WireError::OutOfBounds`] if `from` is ahead of the cursor.
    /// - [`WireError::CapacityExceeded`] if a right shift passes the limit.
    pub fn shift_tail(&mut self, from: usize, to: usize) -> Result<(), WireError> {
        if from > self.position {
            return Err(WireError::OutOfBounds {
                offset: from,
                len: 0,
                limit: self.position,
            });
        }
        if to > from {
            self.ensure_capacity(to - from)?;
        }
        let len = self.position - from;
        self.bytes.copy_within(from..self.position, to);
        self.position = to + len;
        Ok(())
    }

    // ── Writers at the cursor ───────────────────────────────────────────

    /// Copy `src` to the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::CapacityExceeded`] past the limit.
    pub fn write_bytes(&mut self, src: &[u8]) -> Result<(), WireError> {
        self.ensure_capacity(src.len())?;
        let end = self.position + src.len();
        self.bytes[self.position..end].copy_from_slice(src);
        self.position = end;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`WireError::CapacityExceeded`] past the limit.
    pub fn write_u8(&mut self, value: u8) -> Result<(), WireError> {
        self.write_bytes(&[value])
    }

    /// # Errors
    ///
    /// Returns [`WireError::CapacityExceeded`] past the limit.
    pub fn write_u16(&mut self, value: u16) -> Result<(), WireError> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// # Errors
    ///
    /// Returns [`WireError::CapacityExceeded`] past the limit.
    pub fn write_u32(&mut self, value: u32) -> Result<(), WireError> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// # Errors
    ///
    /// Returns [`WireError::CapacityExceeded`] past the limit.
    pub fn write_u64(&mut self, value: u64) -> Result<(), WireError> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// # Errors
    ///
    /// Returns [`WireError::CapacityExceeded`] past the limit.
    pub fn write_i32(&mut self, value: i32) -> Result<(), WireError> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// # Errors
    ///
    /// Returns [`WireError::CapacityExceeded`] past the limit.
    pub fn write_i64(&mut self, value: i64) -> Result<(), WireError> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// IEEE-754 bits, little-endian.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::CapacityExceeded`] past the limit.
    pub fn write_f32(&mut self, value: f32) -> Result<(), WireError> {
        self.write_u32(value.to_bits())
    }

    /// IEEE-754 bits, little-endian.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::CapacityExceeded`] past the limit.
    pub fn write_f64(&mut self, value: f64) -> Result<(), WireError> {
        self.write_u64(value.to_bits())
    }

    /// LEB128, 1–5 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::CapacityExceeded`] past the limit.
    pub fn write_varint32(&mut self, value: u32) -> Result<(), WireError> {
        self.ensure_capacity(MAX_VARINT32_BYTES)?;
        let written = encode_varint32(value, &mut self.bytes[self.position..])?;
        self.position += written;
        Ok(())
    }

    /// Write a field tag.
    ///
    /// # Returns
    ///
    /// The position of the tag's first byte, which carries the size class.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::CapacityExceeded`] past the limit.
    pub fn write_tag(&mut self, tag: Tag) -> Result<usize, WireError> {
        self.ensure_capacity(Tag::encoded_len(tag.index))?;
        let start = self.position;
        self.position += tag.write_to(&mut self.bytes[start..])?;
        Ok(start)
    }

    // ── Patchers behind the cursor ──────────────────────────────────────

    /// Overwrite already-written bytes at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::OutOfBounds`] unless the whole range lies
    /// before the cursor.
    pub fn write_bytes_at(&mut self, offset: usize, src: &[u8]) -> Result<(), WireError> {
        let end = offset
            .checked_add(src.len())
            .filter(|&end| end <= self.position)
            .ok_or(WireError::OutOfBounds {
                offset,
                len: src.len(),
                limit: self.position,
            })?;
        self.bytes[offset..end].copy_from_slice(src);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`WireError::OutOfBounds`] if `offset` is not behind the cursor.
    pub fn write_u8_at(&mut self, offset: usize, value: u8) -> Result<(), WireError> {
        self.write_bytes_at(offset, &[value])
    }

    /// # Errors
    ///
    /// Returns [`WireError::OutOfBounds`] if the range is not behind the cursor.
    pub fn write_u16_at(&mut self, offset: usize, value: u16) -> Result<(), WireError> {
        self.write_bytes_at(offset, &value.to_le_bytes())
    }

    /// # Errors
    ///
    /// Returns [`WireError::OutOfBounds`] if the range is not behind the cursor.
    pub fn write_u32_at(&mut self, offset: usize, value: u32) -> Result<(), WireError> {
        self.write_bytes_at(offset, &value.to_le_bytes())
    }

    /// OR `bits` into an already-written byte; used to set the size class
    /// of a tag once the payload length is known.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::OutOfBounds`] if `offset` is not behind the cursor.
    pub fn or_u8_at(&mut self, offset: usize, bits: u8) -> Result<(), WireError> {
        let byte = self
            .bytes
            .get_mut(..self.position)
            .and_then(|written| written.get_mut(offset))
            .ok_or(WireError::OutOfBounds {
                offset,
                len: 1,
                limit: self.position,
            })?;
        *byte |= bits;
        Ok(())
    }
}

impl Drop for EncodeBuffer {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.bytes));
    }
}
