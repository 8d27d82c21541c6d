pub trait FloatExt: Copy {
    /// Returns the value if it is a normal float, otherwise zero.
    ///
    /// NaN, infinities, subnormals and zero all map to `0.0`.
    fn sanitized(self) -> Self;
}

impl FloatExt for f32 {
    #[inline]
    fn sanitized(self) -> Self {
        if self.is_normal() {
            self
        } else {
            0.0
        }
    }
}

impl FloatExt for f64 {
    #[inline]
    fn sanitized(self) -> Self {
        if self.is_normal() {
            self
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_keeps_normal_values() {
        assert_eq!(0.25_f32.sanitized(), 0.25);
        assert_eq!((-3.5_f32).sanitized(), -3.5);
        assert_eq!(1e20_f64.sanitized(), 1e20);
    }

    #[test]
    fn sanitized_zeroes_invalid_values() {
        assert_eq!(f32::NAN.sanitized(), 0.0);
        assert_eq!(f32::INFINITY.sanitized(), 0.0);
        assert_eq!(f32::NEG_INFINITY.sanitized(), 0.0);
        // smallest positive subnormal
        assert_eq!(f32::from_bits(1).sanitized(), 0.0);
        assert_eq!(f64::NAN.sanitized(), 0.0);
        assert_eq!(f64::MIN_POSITIVE.sanitized(), f64::MIN_POSITIVE);
    }
}
