use crate::error::WireError;
use crate::tag::Tag;
use crate::varint::decode_varint32;

/// Read cursor over a window `[position, limit)` of a shared byte slice.
///
/// The slice is never copied: nested records are read through new
/// `DecodeBuffer`s over the same backing bytes with narrower bounds.
/// All positions are absolute offsets into the backing slice. Every read
/// is checked against `limit`, so no window can observe bytes outside its
/// own range.
#[derive(Clone, Copy, Debug)]
pub struct DecodeBuffer<'a> {
    bytes: &'a [u8],
    position: usize,
    limit: usize,
}

impl<'a> DecodeBuffer<'a> {
    /// A window over the whole slice.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            position: 0,
            limit: bytes.len(),
        }
    }

    /// A window over `bytes[offset..offset + len]`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::OutOfBounds`] if the range is not inside `bytes`.
    pub fn with_bounds(bytes: &'a [u8], offset: usize, len: usize) -> Result<Self, WireError> {
        let limit = offset
            .checked_add(len)
            .filter(|&end| end <= bytes.len())
            .ok_or(WireError::OutOfBounds {
                offset,
                len,
                limit: bytes.len(),
            })?;
        Ok(Self {
            bytes,
            position: offset,
            limit,
        })
    }

    /// An empty window positioned at this window's limit.
    #[must_use]
    pub fn empty(&self) -> Self {
        Self {
            bytes: self.bytes,
            position: self.limit,
            limit: self.limit,
        }
    }

    /// The full backing slice, shared with every other window over it.
    #[must_use]
    pub fn backing(&self) -> &'a [u8] {
        self.bytes
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    #[must_use]
    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    /// Check that `[offset, offset + len)` lies inside this window's limit.
    /// Must precede any read whose length comes from the data.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::OutOfBounds`] otherwise.
    pub fn check_bound(&self, offset: usize, len: usize) -> Result<(), WireError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.limit => Ok(()),
            _ => Err(WireError::OutOfBounds {
                offset,
                len,
                limit: self.limit,
            }),
        }
    }

    /// Bytes `[offset, offset + len)` after a bound check.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::OutOfBounds`] if the range leaves the window.
    pub fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8], WireError> {
        self.check_bound(offset, len)?;
        self.bytes
            .get(offset..offset + len)
            .ok_or(WireError::OutOfBounds {
                offset,
                len,
                limit: self.limit,
            })
    }

    /// Advance past `len` bytes without reading them.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::OutOfBounds`] if that passes the limit.
    pub fn skip(&mut self, len: usize) -> Result<(), WireError> {
        self.check_bound(self.position, len)?;
        self.position += len;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`WireError::OutOfBounds`] if fewer than `len` bytes remain.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        let bytes = self.slice(self.position, len)?;
        self.position += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        if self.remaining() < N {
            return Err(WireError::UnexpectedEof {
                offset: self.position,
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] at the limit.
    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.read_array::<1>()?[0])
    }

    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if fewer than 2 bytes remain.
    pub fn read_u16(&mut self) -> Result<u16, WireError> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if fewer than 4 bytes remain.
    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if fewer than 8 bytes remain.
    pub fn read_u64(&mut self) -> Result<u64, WireError> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if fewer than 4 bytes remain.
    pub fn read_i32(&mut self) -> Result<i32, WireError> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if fewer than 8 bytes remain.
    pub fn read_i64(&mut self) -> Result<i64, WireError> {
        self.read_array().map(i64::from_le_bytes)
    }

    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if fewer than 4 bytes remain.
    pub fn read_f32(&mut self) -> Result<f32, WireError> {
        self.read_u32().map(f32::from_bits)
    }

    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if fewer than 8 bytes remain.
    pub fn read_f64(&mut self) -> Result<f64, WireError> {
        self.read_u64().map(f64::from_bits)
    }

    /// Read 8 bytes at an absolute `offset` without moving the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::OutOfBounds`] if the range leaves the window.
    pub fn read_u64_at(&self, offset: usize) -> Result<u64, WireError> {
        let mut out = [0u8; 8];
        out.copy_from_slice(self.slice(offset, 8)?);
        Ok(u64::from_le_bytes(out))
    }

    /// # Errors
    ///
    /// - [`WireError::UnexpectedEof`] if the varint runs into the limit.
    /// - [`WireError::VarintTooLong`] for encodings above 32 bits.
    pub fn read_varint32(&mut self) -> Result<u32, WireError> {
        let rest = self.bytes.get(self.position..self.limit).unwrap_or_default();
        match decode_varint32(rest) {
            Ok((value, consumed)) => {
                self.position += consumed;
                Ok(value)
            }
            Err(WireError::UnexpectedEof { offset }) => Err(WireError::UnexpectedEof {
                offset: self.position + offset,
            }),
            Err(e) => Err(e),
        }
    }

    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if the tag is cut off by the limit.
    pub fn read_tag(&mut self) -> Result<Tag, WireError> {
        let rest = self.bytes.get(self.position..self.limit).unwrap_or_default();
        match Tag::read_from(rest) {
            Ok((tag, consumed)) => {
                self.position += consumed;
                Ok(tag)
            }
            Err(WireError::UnexpectedEof { offset }) => Err(WireError::UnexpectedEof {
                offset: self.position + offset,
            }),
            Err(e) => Err(e),
        }
    }
}
