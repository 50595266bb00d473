use crate::error::WireError;

/// Bit 7 of the first tag byte: the field index lives in a second byte.
pub const BIG_INDEX_FLAG: u8 = 0x80;

/// Bits 4–6 of the first tag byte hold the [`SizeClass`].
pub const SIZE_CLASS_MASK: u8 = 0x70;

/// Bits 0–3 of the first tag byte hold small indices.
pub const INDEX_MASK: u8 = 0x0F;

/// Indices below this fit into the single-byte form.
pub const LITTLE_INDEX_BOUND: u8 = 16;

const SIZE_CLASS_SHIFT: u8 = 4;

/// Payload framing selected by the 3-bit size-class subfield of a tag.
///
/// ```text
/// ┌───────┬────────┬──────────────────────────────────────────────┐
/// │ Bits  │ Class  │ Payload after the tag                        │
/// ├───────┼────────┼──────────────────────────────────────────────┤
/// │ 0b000 │ Zero   │ none; the type's zero, false or empty value  │
/// │ 0b001 │ Num8   │ 1 byte                                       │
/// │ 0b010 │ Num16  │ 2 bytes, little-endian                       │
/// │ 0b011 │ Num32  │ 4 bytes, little-endian                       │
/// │ 0b100 │ Num64  │ 8 bytes, little-endian                       │
/// │ 0b101 │ Var8   │ u8 length, then that many bytes              │
/// │ 0b110 │ Var16  │ u16 length, then that many bytes             │
/// │ 0b111 │ Var32  │ u32 length, then that many bytes             │
/// └───────┴────────┴──────────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SizeClass {
    Zero = 0,
    Num8 = 1,
    Num16 = 2,
    Num32 = 3,
    Num64 = 4,
    Var8 = 5,
    Var16 = 6,
    Var32 = 7,
}

impl SizeClass {
    /// Decode the 3-bit class value (only the low 3 bits are looked at).
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Self::Zero,
            1 => Self::Num8,
            2 => Self::Num16,
            3 => Self::Num32,
            4 => Self::Num64,
            5 => Self::Var8,
            6 => Self::Var16,
            _ => Self::Var32,
        }
    }

    /// The 3-bit class value.
    #[must_use]
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// The class positioned in bits 4–6, ready to be OR-ed into a tag byte.
    #[must_use]
    pub fn tag_bits(self) -> u8 {
        self.bits() << SIZE_CLASS_SHIFT
    }

    /// Smallest length-prefixed class able to describe `len` payload bytes.
    /// A zero length needs no prefix at all.
    #[must_use]
    pub fn for_length(len: usize) -> Self {
        if len == 0 {
            Self::Zero
        } else if len <= 0xFF {
            Self::Var8
        } else if len <= 0xFFFF {
            Self::Var16
        } else {
            Self::Var32
        }
    }

    /// Width in bytes of the payload (numeric classes) or of the length
    /// prefix (variable classes).
    #[must_use]
    pub fn width(self) -> usize {
        match self {
            Self::Zero => 0,
            Self::Num8 | Self::Var8 => 1,
            Self::Num16 | Self::Var16 => 2,
            Self::Num32 | Self::Var32 => 4,
            Self::Num64 => 8,
        }
    }

    pub fn is_variable(self) -> bool {
        matches!(self, Self::Var8 | Self::Var16 | Self::Var32)
    }
}

/// A field header: the field index plus the size class of its payload.
///
/// ```text
/// index < 16:   ┌───┬─────────┬─────────┐
///               │ 0 │ class:3 │ index:4 │                 (1 byte)
///               └───┴─────────┴─────────┘
/// index >= 16:  ┌───┬─────────┬─────────┐ ┌─────────────┐
///               │ 1 │ class:3 │  0000   │ │   index:8   │ (2 bytes)
///               └───┴─────────┴─────────┘ └─────────────┘
/// ```
///
/// The index is a `u8`, so every representable index is valid on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tag {
    pub index: u8,
    pub size_class: SizeClass,
}

impl Tag {
    #[must_use]
    pub fn new(index: u8, size_class: SizeClass) -> Self {
        Self { index, size_class }
    }

    /// Bytes needed for a tag carrying `index`.
    #[must_use]
    pub fn encoded_len(index: u8) -> usize {
        if index < LITTLE_INDEX_BOUND { 1 } else { 2 }
    }

    /// Write the tag into the start of `buf`.
    ///
    /// # Returns
    ///
    /// The number of bytes written (1 or 2).
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if `buf` is too short.
    pub fn write_to(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        let len = Self::encoded_len(self.index);
        let available = buf.len();
        let out = buf
            .get_mut(..len)
            .ok_or(WireError::UnexpectedEof { offset: available })?;
        if len == 1 {
            out[0] = self.size_class.tag_bits() | self.index;
        } else {
            out[0] = BIG_INDEX_FLAG | self.size_class.tag_bits();
            out[1] = self.index;
        }
        Ok(len)
    }

    /// Parse a tag from the start of `buf`.
    ///
    /// # Returns
    ///
    /// `(tag, bytes_consumed)` on success.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if `buf` is empty, or if the
    /// big-index flag is set and the second byte is missing.
    pub fn read_from(buf: &[u8]) -> Result<(Self, usize), WireError> {
        let &first = buf.first().ok_or(WireError::UnexpectedEof { offset: 0 })?;
        let size_class = SizeClass::from_bits((first & SIZE_CLASS_MASK) >> SIZE_CLASS_SHIFT);
        if first & BIG_INDEX_FLAG == 0 {
            Ok((Self::new(first & INDEX_MASK, size_class), 1))
        } else {
            let &index = buf.get(1).ok_or(WireError::UnexpectedEof { offset: 1 })?;
            Ok((Self::new(index, size_class), 2))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(index: u8, size_class: SizeClass) -> Vec<u8> {
        let mut buf = [0u8; 2];
        let len = Tag::new(index, size_class).write_to(&mut buf).unwrap();
        buf[..len].to_vec()
    }

    #[test]
    fn little_index_single_byte() {
        assert_eq!(encode(0, SizeClass::Zero), vec![0x00]);
        assert_eq!(encode(1, SizeClass::Num8), vec![0x11]);
        assert_eq!(encode(15, SizeClass::Var32), vec![0x7F]);
    }

    #[test]
    fn big_index_two_bytes() {
        assert_eq!(encode(16, SizeClass::Zero), vec![0x80, 0x10]);
        assert_eq!(encode(200, SizeClass::Num8), vec![0x90, 0xC8]);
        assert_eq!(encode(255, SizeClass::Var8), vec![0xD0, 0xFF]);
    }

    #[test]
    fn roundtrip_every_index_and_class() {
        for index in 0..=u8::MAX {
            for bits in 0..8 {
                let class = SizeClass::from_bits(bits);
                let bytes = encode(index, class);
                let (tag, consumed) = Tag::read_from(&bytes).unwrap();
                assert_eq!(tag, Tag::new(index, class));
                assert_eq!(consumed, bytes.len());
            }
        }
    }

    #[test]
    fn write_into_short_buffer() {
        let mut one = [0u8; 1];
        assert!(matches!(
            Tag::new(200, SizeClass::Num8).write_to(&mut one),
            Err(WireError::UnexpectedEof { offset: 1 })
        ));
        let mut none: [u8; 0] = [];
        assert!(matches!(
            Tag::new(3, SizeClass::Zero).write_to(&mut none),
            Err(WireError::UnexpectedEof { offset: 0 })
        ));
    }

    #[test]
    fn length_class_boundaries() {
        assert_eq!(SizeClass::for_length(0), SizeClass::Zero);
        assert_eq!(SizeClass::for_length(255), SizeClass::Var8);
        assert_eq!(SizeClass::for_length(256), SizeClass::Var16);
        assert_eq!(SizeClass::for_length(65535), SizeClass::Var16);
        assert_eq!(SizeClass::for_length(65536), SizeClass::Var32);
    }

    #[test]
    fn decode_truncated_big_index() {
        assert!(matches!(
            Tag::read_from(&[0x80]),
            Err(WireError::UnexpectedEof { offset: 1 })
        ));
    }

    #[test]
    fn decode_empty_input() {
        assert!(matches!(
            Tag::read_from(&[]),
            Err(WireError::UnexpectedEof { offset: 0 })
        ));
    }
}
