//! Base-128 varint arithmetic and zigzag transforms.
//!
//! Varints are little-endian groups of seven data bits; the top bit of
//! each byte is set while more bytes follow. The 64-bit decoder accepts at
//! most ten bytes, the 32-bit decoder at most five. Neither ever wraps a
//! value that does not fit its domain.

use smallvec::SmallVec;

use crate::error::WireError;

/// Longest encoding of a 64-bit varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Longest encoding of a 32-bit varint.
pub const MAX_VARINT32_LEN: usize = 5;

/// Inline storage for one encoded varint.
pub type VarintBytes = SmallVec<[u8; MAX_VARINT_LEN]>;

// ── Encoding ────────────────────────────────────────────────────

/// Encode `value` as a varint. Zero encodes as a single `0x00` byte.
pub fn encode_varint(mut value: u64) -> VarintBytes {
    let mut out = VarintBytes::new();
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

/// Encode a 32-bit value. Always at most [`MAX_VARINT32_LEN`] bytes.
pub fn encode_varint32(value: u32) -> VarintBytes {
    encode_varint(u64::from(value))
}

/// Append the varint encoding of `value` to `buf`.
pub fn write_varint(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&encode_varint(value));
}

/// Number of bytes [`encode_varint`] produces for `value`.
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

// ── Decoding ────────────────────────────────────────────────────

/// Decode a 64-bit varint starting at `offset`.
///
/// Returns the value and the offset just past its last byte. The tenth
/// byte may only carry bit 63, so it must be `0x00` or `0x01`.
///
/// # Errors
///
/// [`WireError::Truncated`] if the input ends before the terminating byte,
/// [`WireError::VarintOverflow`] if the encoding does not fit 64 bits.
pub fn decode_varint(bytes: &[u8], offset: usize) -> Result<(u64, usize), WireError> {
    let available = bytes.len().saturating_sub(offset);
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN - 1 {
        let Some(&byte) = bytes.get(offset + i) else {
            return Err(WireError::Truncated {
                needed: i + 1,
                available,
            });
        };
        value |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, offset + i + 1));
        }
    }

    let last = MAX_VARINT_LEN - 1;
    let Some(&byte) = bytes.get(offset + last) else {
        return Err(WireError::Truncated {
            needed: MAX_VARINT_LEN,
            available,
        });
    };
    if byte > 1 {
        return Err(WireError::VarintOverflow { bits: 64 });
    }
    value |= u64::from(byte) << 63;
    Ok((value, offset + MAX_VARINT_LEN))
}

/// Decode a varint that must fit in 32 bits, reading at most five bytes.
///
/// The first four bytes contribute bits 0..28 by plain shifting. The fifth
/// byte can only contribute bits 28..32, so it is checked and assembled
/// separately: any bit above its low nibble (including the continuation
/// bit) means the value does not fit.
///
/// # Errors
///
/// [`WireError::Truncated`] if the input ends early,
/// [`WireError::VarintOverflow`] if the value needs more than 32 bits.
pub fn decode_varint32(bytes: &[u8], offset: usize) -> Result<(u32, usize), WireError> {
    let available = bytes.len().saturating_sub(offset);
    let mut value = 0u32;
    for i in 0..MAX_VARINT32_LEN - 1 {
        let Some(&byte) = bytes.get(offset + i) else {
            return Err(WireError::Truncated {
                needed: i + 1,
                available,
            });
        };
        value |= u32::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, offset + i + 1));
        }
    }

    let Some(&top) = bytes.get(offset + MAX_VARINT32_LEN - 1) else {
        return Err(WireError::Truncated {
            needed: MAX_VARINT32_LEN,
            available,
        });
    };
    if top & 0xF0 != 0 {
        return Err(WireError::VarintOverflow { bits: 32 });
    }
    value |= u32::from(top) << 28;
    Ok((value, offset + MAX_VARINT32_LEN))
}

// ── Zigzag ──────────────────────────────────────────────────────

/// Map a signed 32-bit value onto the unsigned domain, small magnitudes first.
pub fn zigzag32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

/// Inverse of [`zigzag32`].
pub fn unzigzag32(z: u32) -> i32 {
    ((z >> 1) as i32) ^ -((z & 1) as i32)
}

/// Map a signed 64-bit value onto the unsigned domain, small magnitudes first.
pub fn zigzag64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Inverse of [`zigzag64`].
pub fn unzigzag64(z: u64) -> i64 {
    ((z >> 1) as i64) ^ -((z & 1) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encodes_300_as_two_bytes() {
        assert_eq!(encode_varint(300).as_slice(), &[0xAC, 0x02]);
        assert_eq!(decode_varint(&[0xAC, 0x02], 0).unwrap(), (300, 2));
    }

    #[test]
    fn zero_is_one_byte() {
        assert_eq!(encode_varint(0).as_slice(), &[0x00]);
        assert_eq!(varint_len(0), 1);
    }

    #[test]
    fn max_u64_uses_ten_bytes() {
        let bytes = encode_varint(u64::MAX);
        assert_eq!(bytes.len(), MAX_VARINT_LEN);
        assert_eq!(bytes[9], 0x01);
        assert_eq!(decode_varint(&bytes, 0).unwrap(), (u64::MAX, 10));
    }

    #[test]
    fn decode_honours_offset() {
        let bytes = [0xFF, 0xAC, 0x02, 0x07];
        assert_eq!(decode_varint(&bytes, 1).unwrap(), (300, 3));
        assert_eq!(decode_varint(&bytes, 3).unwrap(), (7, 4));
    }

    #[test]
    fn tenth_byte_above_one_overflows() {
        let mut bytes = vec![0xFF; 9];
        bytes.push(0x02);
        assert_eq!(
            decode_varint(&bytes, 0),
            Err(WireError::VarintOverflow { bits: 64 })
        );
    }

    #[test]
    fn eleven_byte_varint_is_rejected() {
        let mut bytes = vec![0x80; 10];
        bytes.push(0x00);
        assert_eq!(
            decode_varint(&bytes, 0),
            Err(WireError::VarintOverflow { bits: 64 })
        );
    }

    #[test]
    fn unterminated_varint_is_truncation() {
        let err = decode_varint(&[0x80, 0x80], 0).unwrap_err();
        assert!(err.is_exhaustion());
        assert_eq!(
            err,
            WireError::Truncated {
                needed: 3,
                available: 2
            }
        );
        assert!(decode_varint(&[], 0).unwrap_err().is_exhaustion());
    }

    #[test]
    fn non_minimal_encoding_still_decodes() {
        assert_eq!(decode_varint(&[0x80, 0x00], 0).unwrap(), (0, 2));
        assert_eq!(decode_varint32(&[0x81, 0x80, 0x00], 0).unwrap(), (1, 3));
    }

    // ── varint32 boundary ───────────────────────────────────────

    #[test]
    fn varint32_accepts_full_five_byte_maximum() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0x0F];
        assert_eq!(decode_varint32(&bytes, 0).unwrap(), (u32::MAX, 5));
        assert_eq!(encode_varint32(u32::MAX).as_slice(), &bytes);
    }

    #[test]
    fn varint32_top_bit_of_fifth_byte() {
        // Bit 31 lives in bit 3 of the fifth byte.
        let bytes = [0x80, 0x80, 0x80, 0x80, 0x08];
        assert_eq!(decode_varint32(&bytes, 0).unwrap(), (1 << 31, 5));
    }

    #[test]
    fn varint32_rejects_bit_32() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0x1F];
        assert_eq!(
            decode_varint32(&bytes, 0),
            Err(WireError::VarintOverflow { bits: 32 })
        );
    }

    #[test]
    fn varint32_rejects_sixth_byte() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0x8F, 0x00];
        assert_eq!(
            decode_varint32(&bytes, 0),
            Err(WireError::VarintOverflow { bits: 32 })
        );
    }

    #[test]
    fn varint32_never_reads_past_five_bytes() {
        // Four continuation bytes then end of input: needs exactly five.
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(
            decode_varint32(&bytes, 0),
            Err(WireError::Truncated {
                needed: 5,
                available: 4
            })
        );
    }

    // ── Zigzag ──────────────────────────────────────────────────

    #[test]
    fn zigzag_small_values() {
        assert_eq!(zigzag32(0), 0);
        assert_eq!(zigzag32(-1), 1);
        assert_eq!(zigzag32(1), 2);
        assert_eq!(zigzag32(-3), 5);
        assert_eq!(unzigzag32(5), -3);
        assert_eq!(zigzag64(-3), 5);
        assert_eq!(unzigzag64(5), -3);
    }

    #[test]
    fn zigzag_extremes() {
        assert_eq!(zigzag64(i64::MIN), u64::MAX);
        assert_eq!(zigzag64(i64::MAX), u64::MAX - 1);
        assert_eq!(unzigzag64(u64::MAX), i64::MIN);
        assert_eq!(unzigzag64(u64::MAX - 1), i64::MAX);
        assert_eq!(zigzag32(i32::MIN), u32::MAX);
        assert_eq!(zigzag32(i32::MAX), u32::MAX - 1);
        assert_eq!(unzigzag32(u32::MAX), i32::MIN);
    }

    proptest! {
        #[test]
        fn roundtrip_u64(v in any::<u64>()) {
            let bytes = encode_varint(v);
            prop_assert_eq!(bytes.len(), varint_len(v));
            prop_assert_eq!(decode_varint(&bytes, 0).unwrap(), (v, bytes.len()));
        }

        #[test]
        fn roundtrip_u32_through_both_decoders(v in any::<u32>()) {
            let bytes = encode_varint32(v);
            prop_assert!(bytes.len() <= MAX_VARINT32_LEN);
            prop_assert_eq!(decode_varint32(&bytes, 0).unwrap(), (v, bytes.len()));
            prop_assert_eq!(decode_varint(&bytes, 0).unwrap(), (u64::from(v), bytes.len()));
        }

        #[test]
        fn varint32_rejects_everything_past_u32(v in (u64::from(u32::MAX) + 1)..=u64::MAX) {
            let bytes = encode_varint(v);
            prop_assert_eq!(
                decode_varint32(&bytes, 0),
                Err(WireError::VarintOverflow { bits: 32 })
            );
        }

        #[test]
        fn zigzag64_roundtrip(n in any::<i64>()) {
            prop_assert_eq!(unzigzag64(zigzag64(n)), n);
        }

        #[test]
        fn zigzag32_roundtrip(n in any::<i32>()) {
            prop_assert_eq!(unzigzag32(zigzag32(n)), n);
        }

        #[test]
        fn every_strict_prefix_is_truncation(v in any::<u64>()) {
            let bytes = encode_varint(v);
            for cut in 0..bytes.len() {
                prop_assert!(decode_varint(&bytes[..cut], 0).unwrap_err().is_exhaustion());
            }
        }
    }
}
