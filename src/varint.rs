//! Variable-length integer encoding and decoding.
//!

/// Most-significant byte, == 0x80
pub const MSB: u8 = 0b1000_0000;
/// All bits except for the most significant. Can be used as bitmask to drop the most-signficant
/// bit using `&` (binary-and).
const DROP_MSB: u8 = 0b0111_1111;

/// Longest valid varint, in bytes.
pub const MAX_VARINT_LEN: usize = 10;

/// Why a varint could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarintError {
    /// Input ended while the continuation bit was still set.
    Truncated,
    /// More than ten bytes, or the tenth byte carries bits beyond 64.
    Overflow,
}

/// Decode a variable-length integer from a byte slice.
///
/// On success the slice is advanced past the varint. On failure it is left untouched.
pub fn decode_var(src: &mut &[u8]) -> Result<u64, VarintError> {
    let mut result: u64 = 0;

    for (i, b) in src.iter().enumerate() {
        if i == MAX_VARINT_LEN - 1 && *b > 1 {
            return Err(VarintError::Overflow);
        }
        result |= ((b & DROP_MSB) as u64) << (7 * i);

        if b & MSB == 0 {
            *src = &src[i + 1..];
            return Ok(result);
        }
    }

    Err(VarintError::Truncated)
}

/// Append `value` to `buf` as a varint.
pub fn encode_var(mut value: u64, buf: &mut Vec<u8>) {
    while value >= MSB as u64 {
        buf.push((value as u8 & DROP_MSB) | MSB);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Number of bytes `encode_var` emits for `value`.
pub fn encoded_len(value: u64) -> usize {
    // zero still takes one byte
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// ZigZag-map a signed value so small magnitudes stay short.
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
