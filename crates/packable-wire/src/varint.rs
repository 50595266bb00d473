/// Maximum number of bytes a u32 varint can occupy.
/// ceil(32 / 7) = 5 bytes.
pub const MAX_VARINT32_BYTES: usize = 5;

use crate::error::WireError;

/// Number of bytes [`encode_varint32`] will produce for `value`.
///
/// | Value range          | Bytes |
/// |----------------------|-------|
/// | 0 ..= 0x7F           | 1     |
/// | ..= 0x3FFF           | 2     |
/// | ..= 0x1F_FFFF        | 3     |
/// | ..= 0x0FFF_FFFF      | 4     |
/// | above                | 5     |
#[must_use]
pub fn varint32_size(value: u32) -> usize {
    if value >> 7 == 0 {
        1
    } else if value >> 14 == 0 {
        2
    } else if value >> 21 == 0 {
        3
    } else if value >> 28 == 0 {
        4
    } else {
        5
    }
}

/// Encode a `u32` value as an unsigned LEB128 varint into the provided buffer.
///
/// # Returns
///
/// The number of bytes written (1–5).
///
/// # Errors
///
/// Returns [`WireError::UnexpectedEof`] if `buf` is shorter than the
/// encoding. A 5-byte buffer is always sufficient.
///
/// # Wire format examples
///
/// | Value        | Encoded bytes                      | Length |
/// |--------------|------------------------------------|--------|
/// | 0            | `[0x00]`                           | 1      |
/// | 127          | `[0x7F]`                           | 1      |
/// | 128          | `[0x80, 0x01]`                     | 2      |
/// | 300          | `[0xAC, 0x02]`                     | 2      |
/// | `u32::MAX`   | `[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]`   | 5      |
pub fn encode_varint32(mut value: u32, buf: &mut [u8]) -> Result<usize, WireError> {
    let mut i = 0;
    loop {
        // Take the lowest 7 bits
        #[allow(clippy::cast_possible_truncation)]
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;

        if value > 0 {
            // More bytes to come: set the continuation bit
            byte |= 0x80;
        }

        let slot = buf.get_mut(i).ok_or(WireError::UnexpectedEof { offset: i })?;
        *slot = byte;
        i += 1;

        if value == 0 {
            return Ok(i);
        }
    }
}

/// Decode an unsigned LEB128 varint holding at most 32 bits.
///
/// # Returns
///
/// `(decoded_value, bytes_consumed)` on success.
///
/// # Errors
///
/// - [`WireError::VarintTooLong`] if the 5th byte still has its
///   continuation bit set or carries more than the top 4 bits.
/// - [`WireError::UnexpectedEof`] if the slice ends mid-varint.
pub fn decode_varint32(buf: &[u8]) -> Result<(u32, usize), WireError> {
    let mut result: u32 = 0;
    let mut shift: u32 = 0;

    for (i, &byte) in buf.iter().take(MAX_VARINT32_BYTES).enumerate() {
        if i == MAX_VARINT32_BYTES - 1 && byte > 0x0F {
            return Err(WireError::VarintTooLong);
        }

        // Extract the 7 data bits and shift them into position
        result |= u32::from(byte & 0x7F) << shift;
        shift += 7;

        // If MSB is clear, this is the last byte
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    // We ran out of input bytes while MSB was still set
    Err(WireError::UnexpectedEof { offset: buf.len() })
}
