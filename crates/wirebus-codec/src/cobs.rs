//! COBS (Consistent Overhead Byte Stuffing) framing (spec §6, §4.6).
//!
//! Stateless, allocation-free encode/decode over caller-supplied buffers —
//! the wire stream is `cobs_encode(packet_bytes)` followed by a single
//! `0x00` delimiter (§4.6 "Wire format").

/// Encode `src` into `dst` using COBS. Returns the number of bytes written
/// to `dst`, or `None` if `dst` is too small.
///
/// `dst` must have room for `src.len() + src.len() / 254 + 1` bytes in the
/// worst case (one overhead byte per 254-byte run, plus the leading
/// overhead byte). The trailing `0x00` frame delimiter is *not* written by
/// this function; callers append it when framing for the wire.
#[must_use]
pub fn cobs_encode(src: &[u8], dst: &mut [u8]) -> Option<usize> {
    if src.is_empty() {
        if dst.is_empty() {
            return None;
        }
        dst[0] = 0x01;
        return Some(1);
    }

    let mut out = 0usize;
    let mut code_idx = 0usize;
    let mut code = 1u8;

    if dst.is_empty() {
        return None;
    }
    out += 1; // reserve the first code byte

    for &byte in src {
        if byte == 0x00 {
            if code_idx >= dst.len() {
                return None;
            }
            dst[code_idx] = code;
            code_idx = out;
            out += 1;
            if out > dst.len() {
                return None;
            }
            code = 1;
        } else {
            if out >= dst.len() {
                return None;
            }
            dst[out] = byte;
            out += 1;
            code += 1;
            if code == 0xFF {
                dst[code_idx] = code;
                code_idx = out;
                out += 1;
                if out > dst.len() {
                    return None;
                }
                code = 1;
            }
        }
    }

    if code_idx >= dst.len() {
        return None;
    }
    dst[code_idx] = code;
    Some(out)
}

/// Decode a COBS-encoded frame `src` (without the trailing `0x00`
/// delimiter) into `dst`. Returns the number of decoded bytes, or `None` on
/// malformed input or an undersized `dst`.
#[must_use]
pub fn cobs_decode(src: &[u8], dst: &mut [u8]) -> Option<usize> {
    if src.is_empty() {
        return None;
    }

    let mut out = 0usize;
    let mut idx = 0usize;

    while idx < src.len() {
        let code = src[idx] as usize;
        if code == 0 {
            return None;
        }
        idx += 1;
        let run = code - 1;
        if idx + run > src.len() {
            return None;
        }
        if out + run > dst.len() {
            return None;
        }
        dst[out..out + run].copy_from_slice(&src[idx..idx + run]);
        out += run;
        idx += run;
        if code != 0xFF && idx < src.len() {
            if out >= dst.len() {
                return None;
            }
            dst[out] = 0x00;
            out += 1;
        }
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(input: &[u8]) {
        let mut enc = [0u8; 320];
        let enc_len = cobs_encode(input, &mut enc).expect("encode");
        let mut dec = [0u8; 320];
        let dec_len = cobs_decode(&enc[..enc_len], &mut dec).expect("decode");
        assert_eq!(&dec[..dec_len], input);
    }

    #[test]
    fn empty_payload() {
        round_trip(&[]);
    }

    #[test]
    fn no_zero_bytes() {
        round_trip(&[1, 2, 3, 4, 5]);
    }

    #[test]
    fn leading_and_trailing_zero() {
        round_trip(&[0, 1, 2, 0]);
    }

    #[test]
    fn all_zero_bytes() {
        round_trip(&[0, 0, 0, 0]);
    }

    #[test]
    fn run_longer_than_254() {
        let input: [u8; 300] = core::array::from_fn(|i| (i % 255 + 1) as u8);
        round_trip(&input);
    }

    #[test]
    fn classic_vectors() {
        // From the original Cheshire/Stuart COBS paper's example table.
        let mut enc = [0u8; 16];
        let n = cobs_encode(&[0x11, 0x22, 0x00, 0x33], &mut enc).unwrap();
        assert_eq!(&enc[..n], &[0x03, 0x11, 0x22, 0x02, 0x33]);

        let mut dec = [0u8; 16];
        let m = cobs_decode(&enc[..n], &mut dec).unwrap();
        assert_eq!(&dec[..m], &[0x11, 0x22, 0x00, 0x33]);
    }

    #[test]
    fn decode_rejects_zero_code_byte() {
        let mut dst = [0u8; 8];
        assert!(cobs_decode(&[0x00], &mut dst).is_none());
    }
}
