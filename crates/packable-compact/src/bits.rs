//! Bit-packed bool and enum arrays.
//!
//! Both payloads start with a header byte and have exact, precomputed
//! lengths, so they go through `put_custom`.
//!
//! ```text
//!   bool, n ≤ 5     [ n:3 | b4 b3 b2 b1 b0 ]                  1 byte
//!   bool, n > 5     [ n % 8 ] [ b7..b0 ] [ b15..b8 ] ...       1 + ceil(n / 8)
//!   enum, w < 8     [ 0 0 0 | shift:2 | rem:3 ] [ packed ] ... 1 + ceil(n * w / 8)
//!   enum, w = 8     [ 0x18 ] [ v0 ] [ v1 ] ...                 1 + n
//! ```
//!
//! `w = 1 << shift` is the bit width shared by every value of an enum
//! array, chosen from the OR of all values. `rem` is the bit count used in
//! the last packed byte, 0 when that byte is full.

use packable_decoder::{DecodeError, PackDecoder};
use packable_encoder::{EncodeError, PackEncoder};
use packable_wire::DecodeBuffer;
use tracing::{debug, trace};

use crate::{check_decode_count, check_encode_count};

/// Counts up to this many fit in the single-byte bool form.
const SHORT_BOOL_MAX: usize = 5;

/// Shift that marks the one-byte-per-value enum form.
const BYTE_SHIFT: u8 = 3;

fn corrupt(buf: &DecodeBuffer<'_>, reason: &'static str) -> DecodeError {
    debug!(offset = buf.position(), reason, "compact array rejected");
    DecodeError::Corrupt {
        offset: buf.position(),
        reason,
    }
}

fn pack_bits(chunk: &[bool]) -> u8 {
    chunk
        .iter()
        .enumerate()
        .fold(0u8, |byte, (i, &set)| if set { byte | (1u8 << i) } else { byte })
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn put_bool_array<'e>(
    encoder: &'e mut PackEncoder,
    index: u8,
    values: &[bool],
) -> Result<&'e mut PackEncoder, EncodeError> {
    let n = values.len();
    if n == 0 {
        return encoder.put_custom(index, 0, |_| Ok(()));
    }
    check_encode_count(encoder, n)?;
    if n <= SHORT_BOOL_MAX {
        let byte = ((n as u8) << 5) | pack_bits(values);
        return encoder.put_custom(index, 1, |buf| Ok(buf.write_u8(byte)?));
    }
    let remain = n & 7;
    let len = 1 + n.div_ceil(8);
    encoder.put_custom(index, len, |buf| {
        buf.write_u8(remain as u8)?;
        for chunk in values.chunks(8) {
            buf.write_u8(pack_bits(chunk))?;
        }
        Ok(())
    })
}

pub(crate) fn get_bool_array(decoder: &mut PackDecoder<'_>, index: u8) -> Result<Option<Vec<bool>>, DecodeError> {
    let Some(mut buf) = decoder.get_custom(index)? else {
        return Ok(None);
    };
    let len = buf.remaining();
    if len == 0 {
        return Ok(Some(Vec::new()));
    }
    let header = buf.read_u8()?;
    if len == 1 {
        let n = usize::from(header >> 5);
        if n > SHORT_BOOL_MAX {
            return Err(corrupt(&buf, "short bool array count above 5"));
        }
        check_decode_count(decoder, n)?;
        return Ok(Some((0..n).map(|i| header & (1u8 << i) != 0).collect()));
    }
    if header >= 8 {
        return Err(corrupt(&buf, "bool array remainder above 7"));
    }
    let data_len = len - 1;
    let unused = if header == 0 { 0 } else { 8 - usize::from(header) };
    let n = check_decode_count(decoder, data_len * 8 - unused)?;
    let bytes = buf.read_bytes(data_len)?;
    let values = bytes
        .iter()
        .flat_map(|&byte| (0..8).map(move |i| byte & (1u8 << i) != 0))
        .take(n)
        .collect();
    Ok(Some(values))
}

/// Smallest shift whose width `1 << shift` holds every bit set in `sum`.
fn bit_shift(sum: u32) -> Option<u8> {
    match sum {
        0..=0x1 => Some(0),
        0x2..=0x3 => Some(1),
        0x4..=0xF => Some(2),
        0x10..=0xFF => Some(BYTE_SHIFT),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn put_enum_array<'e>(
    encoder: &'e mut PackEncoder,
    index: u8,
    values: &[u32],
) -> Result<&'e mut PackEncoder, EncodeError> {
    let n = values.len();
    if n == 0 {
        return encoder.put_custom(index, 0, |_| Ok(()));
    }
    check_encode_count(encoder, n)?;
    let sum = values.iter().fold(0, |acc, &v| acc | v);
    let Some(shift) = bit_shift(sum) else {
        let value = values.iter().copied().find(|&v| v > 0xFF).unwrap_or(sum);
        return Err(EncodeError::EnumValueOutOfRange { value });
    };
    trace!(index, count = n, bits = 1u8 << shift, "enum array width");
    if shift == BYTE_SHIFT {
        return encoder.put_custom(index, n + 1, |buf| {
            buf.write_u8(BYTE_SHIFT << 3)?;
            for &value in values {
                buf.write_u8(value as u8)?;
            }
            Ok(())
        });
    }
    let total_bits = n << shift;
    let remain = (total_bits & 7) as u8;
    let per_byte: usize = 8 >> shift;
    encoder.put_custom(index, 1 + total_bits.div_ceil(8), |buf| {
        buf.write_u8((shift << 3) | remain)?;
        for chunk in values.chunks(per_byte) {
            let byte = chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (i, &value)| byte | ((value as u8) << (i << shift)));
            buf.write_u8(byte)?;
        }
        Ok(())
    })
}

pub(crate) fn get_enum_array(decoder: &mut PackDecoder<'_>, index: u8) -> Result<Option<Vec<u32>>, DecodeError> {
    let Some(mut buf) = decoder.get_custom(index)? else {
        return Ok(None);
    };
    let len = buf.remaining();
    if len == 0 {
        return Ok(Some(Vec::new()));
    }
    let header = buf.read_u8()?;
    if header >> 5 != 0 {
        return Err(corrupt(&buf, "enum array header has high bits set"));
    }
    let shift = header >> 3;
    let data_len = len - 1;
    if shift == BYTE_SHIFT {
        check_decode_count(decoder, data_len)?;
        let bytes = buf.read_bytes(data_len)?;
        return Ok(Some(bytes.iter().map(|&b| u32::from(b)).collect()));
    }
    let remain = usize::from(header & 7);
    let unused = if remain == 0 { 0 } else { (8 - remain) >> shift };
    let Some(n) = (data_len << (BYTE_SHIFT - shift)).checked_sub(unused) else {
        return Err(corrupt(&buf, "enum array shorter than its remainder"));
    };
    let n = check_decode_count(decoder, n)?;
    let width = 1u8 << shift;
    let mask = (1u8 << width) - 1;
    let per_byte: u8 = 8 >> shift;
    let bytes = buf.read_bytes(data_len)?;
    let values = bytes
        .iter()
        .flat_map(|&byte| (0..per_byte).map(move |i| u32::from((byte >> (i * width)) & mask)))
        .take(n)
        .collect();
    Ok(Some(values))
}
