//! Per-element layouts of the flag-grouped number arrays.
//!
//! Every element gets a 2-bit flag saying how many payload bytes follow:
//!
//! ```text
//!   flag │ i32 / i64                 │ f64 (by bit pattern)
//!   ─────┼───────────────────────────┼─────────────────────────────────
//!    0   │ zero, no bytes            │ +0.0, no bytes
//!    1   │ 0 < v < 2^8, 1 byte       │ low 48 bits zero, top 16 bits
//!    2   │ 2^8 ≤ v < 2^16, 2 bytes   │ low 32 bits zero, top 32 bits
//!    3   │ anything else, full width │ all 8 bytes
//! ```
//!
//! Negative integers always take the full width.

use packable_decoder::{DecodeError, PackDecoder};
use packable_encoder::{EncodeError, PackEncoder};
use packable_wire::varint::varint32_size;
use packable_wire::{DecodeBuffer, EncodeBuffer, WireError};
use tracing::debug;

use crate::{check_decode_count, check_encode_count};

pub(crate) trait CompactNumber: Copy {
    /// Full width in bytes, the worst case per element.
    const WIDTH: usize;
    /// Write the smallest form of `self` and return its flag.
    fn write_compact(self, buf: &mut EncodeBuffer) -> Result<u8, WireError>;
    fn read_compact(flag: u8, buf: &mut DecodeBuffer<'_>) -> Result<Self, WireError>;
}

impl CompactNumber for i32 {
    const WIDTH: usize = 4;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn write_compact(self, buf: &mut EncodeBuffer) -> Result<u8, WireError> {
        if self == 0 {
            Ok(0)
        } else if self >> 8 == 0 {
            buf.write_u8(self as u8)?;
            Ok(1)
        } else if self >> 16 == 0 {
            buf.write_u16(self as u16)?;
            Ok(2)
        } else {
            buf.write_i32(self)?;
            Ok(3)
        }
    }

    fn read_compact(flag: u8, buf: &mut DecodeBuffer<'_>) -> Result<Self, WireError> {
        match flag {
            0 => Ok(0),
            1 => buf.read_u8().map(i32::from),
            2 => buf.read_u16().map(i32::from),
            _ => buf.read_i32(),
        }
    }
}

impl CompactNumber for i64 {
    const WIDTH: usize = 8;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn write_compact(self, buf: &mut EncodeBuffer) -> Result<u8, WireError> {
        if self == 0 {
            Ok(0)
        } else if self >> 8 == 0 {
            buf.write_u8(self as u8)?;
            Ok(1)
        } else if self >> 16 == 0 {
            buf.write_u16(self as u16)?;
            Ok(2)
        } else {
            buf.write_i64(self)?;
            Ok(3)
        }
    }

    fn read_compact(flag: u8, buf: &mut DecodeBuffer<'_>) -> Result<Self, WireError> {
        match flag {
            0 => Ok(0),
            1 => buf.read_u8().map(i64::from),
            2 => buf.read_u16().map(i64::from),
            _ => buf.read_i64(),
        }
    }
}

impl CompactNumber for f64 {
    const WIDTH: usize = 8;

    #[allow(clippy::cast_possible_truncation)]
    fn write_compact(self, buf: &mut EncodeBuffer) -> Result<u8, WireError> {
        let bits = self.to_bits();
        if bits == 0 {
            Ok(0)
        } else if bits << 16 == 0 {
            buf.write_u16((bits >> 48) as u16)?;
            Ok(1)
        } else if bits << 32 == 0 {
            buf.write_u32((bits >> 32) as u32)?;
            Ok(2)
        } else {
            buf.write_u64(bits)?;
            Ok(3)
        }
    }

    fn read_compact(flag: u8, buf: &mut DecodeBuffer<'_>) -> Result<Self, WireError> {
        let bits = match flag {
            0 => 0,
            1 => u64::from(buf.read_u16()?) << 48,
            2 => u64::from(buf.read_u32()?) << 32,
            _ => buf.read_u64()?,
        };
        Ok(f64::from_bits(bits))
    }
}

/// Payload layout: varint count, `ceil(n / 4)` flag bytes (four 2-bit
/// flags each, element `i` at bits `2 * (i % 4)`), then the element bytes.
pub(crate) fn put_number_array<'e, T: CompactNumber>(
    encoder: &'e mut PackEncoder,
    index: u8,
    values: &[T],
) -> Result<&'e mut PackEncoder, EncodeError> {
    if values.is_empty() {
        return encoder.put_custom(index, 0, |_| Ok(()));
    }
    let count = check_encode_count(encoder, values.len())?;
    let flag_len = values.len().div_ceil(4);
    let max_len = varint32_size(count) + flag_len + values.len() * T::WIDTH;
    encoder.put_bounded(index, max_len, |buf| {
        buf.write_varint32(count)?;
        let flag_pos = buf.reserve(flag_len)?;
        for (group, chunk) in values.chunks(4).enumerate() {
            let mut flags = 0u8;
            for (i, value) in chunk.iter().enumerate() {
                flags |= value.write_compact(buf)? << (i << 1);
            }
            buf.write_u8_at(flag_pos + group, flags)?;
        }
        Ok(())
    })
}

pub(crate) fn get_number_array<T: CompactNumber>(
    decoder: &mut PackDecoder<'_>,
    index: u8,
) -> Result<Option<Vec<T>>, DecodeError> {
    let Some(mut buf) = decoder.get_custom(index)? else {
        return Ok(None);
    };
    if !buf.has_remaining() {
        return Ok(Some(Vec::new()));
    }
    let count = check_decode_count(decoder, buf.read_varint32()?)?;
    let flags = buf.read_bytes(count.div_ceil(4))?;
    let mut values = Vec::with_capacity(count);
    for (group, &flag_byte) in flags.iter().enumerate() {
        let in_group = (count - group * 4).min(4);
        for i in 0..in_group {
            let flag = (flag_byte >> (i << 1)) & 0b11;
            values.push(T::read_compact(flag, &mut buf)?);
        }
    }
    if buf.has_remaining() {
        debug!(index, trailing = buf.remaining(), "number array longer than its elements");
        return Err(DecodeError::Corrupt {
            offset: buf.position(),
            reason: "trailing bytes after number array",
        });
    }
    Ok(Some(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use packable_wire::BufferPool;

    static POOL: BufferPool = BufferPool::new(0);

    fn flag_and_len<T: CompactNumber>(value: T) -> (u8, usize) {
        let mut buf = EncodeBuffer::new(1 << 10, &POOL);
        let flag = value.write_compact(&mut buf).unwrap();
        (flag, buf.position())
    }

    #[test]
    fn int_widths() {
        assert_eq!(flag_and_len(0i32), (0, 0));
        assert_eq!(flag_and_len(255i32), (1, 1));
        assert_eq!(flag_and_len(256i32), (2, 2));
        assert_eq!(flag_and_len(65_536i32), (3, 4));
        assert_eq!(flag_and_len(-1i32), (3, 4));
        assert_eq!(flag_and_len(-1i64), (3, 8));
    }

    #[test]
    fn double_widths() {
        assert_eq!(flag_and_len(0.0f64), (0, 0));
        assert_eq!(flag_and_len(-0.0f64), (1, 2));
        assert_eq!(flag_and_len(1.0f64), (1, 2));
        assert_eq!(flag_and_len(f64::from_bits(0x3FF0_0001_0000_0000)), (2, 4));
        assert_eq!(flag_and_len(f64::from(1.1f32)), (3, 8));
        assert_eq!(flag_and_len(0.1f64), (3, 8));
    }

    #[test]
    fn read_back_each_flag() {
        for value in [0i64, 7, 300, -5, i64::MAX] {
            let mut buf = EncodeBuffer::new(64, &POOL);
            let flag = value.write_compact(&mut buf).unwrap();
            let mut read = DecodeBuffer::new(buf.as_slice());
            assert_eq!(i64::read_compact(flag, &mut read).unwrap(), value);
            assert!(!read.has_remaining());
        }
        for value in [0.0f64, -0.0, 2.0, f64::from_bits(0x4000_0001_0000_0000), std::f64::consts::E] {
            let mut buf = EncodeBuffer::new(64, &POOL);
            let flag = value.write_compact(&mut buf).unwrap();
            let mut read = DecodeBuffer::new(buf.as_slice());
            assert_eq!(f64::read_compact(flag, &mut read).unwrap().to_bits(), value.to_bits());
        }
    }
}
