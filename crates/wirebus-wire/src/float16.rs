//! IEEE-754 binary16 (`float16`) conversions.
//!
//! The original WCPP prototype (`original_source/cpp/float16.cpp`) carries a
//! small hand-rolled `float16` class for exactly this purpose; no crate in
//! the teacher's dependency graph provides half-precision floats, so this
//! stays a self-contained bit-twiddling module rather than pulling in a new
//! dependency, consistent with "no dynamic memory / no_std" scope.

/// Convert an IEEE-754 single-precision value to its nearest binary16
/// representation (round-to-nearest-even is not attempted; ties round down,
/// which is sufficient for telemetry-grade precision loss).
#[must_use]
pub fn f32_to_f16_bits(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xFF) as i32;
    let mantissa = bits & 0x007F_FFFF;

    if exp == 0xFF {
        // Inf or NaN.
        let payload = if mantissa != 0 { 0x0200 } else { 0 };
        return sign | 0x7C00 | payload;
    }

    let unbiased = exp - 127;
    let half_exp = unbiased + 15;

    if half_exp >= 0x1F {
        // Overflow to infinity.
        return sign | 0x7C00;
    }
    if half_exp <= 0 {
        // Underflow to zero (subnormals not represented).
        return sign;
    }

    let half_mantissa = (mantissa >> 13) as u16;
    sign | ((half_exp as u16) << 10) | half_mantissa
}

/// Convert a binary16 bit pattern back to `f32`.
#[must_use]
pub fn f16_bits_to_f32(bits: u16) -> f32 {
    let sign = u32::from(bits & 0x8000) << 16;
    let exp = u32::from((bits >> 10) & 0x1F);
    let mantissa = u32::from(bits & 0x03FF);

    if exp == 0 {
        if mantissa == 0 {
            return f32::from_bits(sign);
        }
        // Subnormal half -> normalized single.
        let mut e = -1i32;
        let mut m = mantissa;
        loop {
            m <<= 1;
            e += 1;
            if m & 0x0400 != 0 {
                break;
            }
        }
        let m = m & 0x03FF;
        let exp32 = (127 - 15 - e) as u32;
        return f32::from_bits(sign | (exp32 << 23) | (m << 13));
    }
    if exp == 0x1F {
        let payload = if mantissa != 0 { 0x0040_0000 } else { 0 };
        return f32::from_bits(sign | 0x7F80_0000 | payload);
    }

    let exp32 = exp + (127 - 15);
    f32::from_bits(sign | (exp32 << 23) | (mantissa << 13))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip_close(value: f32) {
        let bits = f32_to_f16_bits(value);
        let back = f16_bits_to_f32(bits);
        assert!(
            (back - value).abs() <= value.abs() * 0.01 + 0.001,
            "{value} -> {bits:#06x} -> {back}"
        );
    }

    #[test]
    fn common_values_round_trip() {
        for v in [0.0f32, 1.0, -1.0, 1.5, -4.25, 100.0, 0.001, -0.001] {
            round_trip_close(v);
        }
    }

    #[test]
    fn zero_is_exact() {
        assert_eq!(f32_to_f16_bits(0.0), 0x0000);
        assert_eq!(f16_bits_to_f32(0x0000), 0.0);
    }
}
