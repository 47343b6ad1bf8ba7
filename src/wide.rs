//! Exact integer arithmetic for the geometric predicates.
//!
//! Coordinates are 32-bit, so a product of two coordinates (or a 2x2
//! determinant of them) needs 64 bits, and a product of such a determinant
//! with another coordinate needs up to 96 bits. We use `i128` for the latter.
//!
//! All divisions here are *floored*: the quotient is rounded towards negative
//! infinity and the remainder has the sign of the divisor. Edge slopes are
//! frequently negative, and truncating division would make the rounding
//! direction depend on the sign of the slope.

use std::cmp::Ordering;

/// A quotient and remainder, with `dividend == quo * divisor + rem`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuoRem<T> {
    /// The quotient, rounded towards negative infinity.
    pub quo: T,
    /// The remainder, which is zero or has the same sign as the divisor.
    pub rem: T,
}

/// How a rounded quotient relates to the true (rational) value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Exactness {
    /// The quotient is exact.
    Exact,
    /// The stored value is slightly larger than the true value.
    RoundedUp,
    /// The stored value is slightly smaller than the true value.
    RoundedDown,
}

impl Exactness {
    /// Compares a rounded value against an exact one, using the rounding
    /// direction to break ties.
    ///
    /// If `value` was rounded up from something smaller, then a tie with an
    /// exact `other` means the true value was actually less than `other`.
    pub fn compare(self, value: i64, other: i64) -> Ordering {
        value.cmp(&other).then(match self {
            Exactness::Exact => Ordering::Equal,
            Exactness::RoundedUp => Ordering::Less,
            Exactness::RoundedDown => Ordering::Greater,
        })
    }
}

/// Multiplies two 32-bit values into a 64-bit one.
#[inline]
pub fn mul32(a: i32, b: i32) -> i64 {
    a as i64 * b as i64
}

/// Multiplies two unsigned 32-bit values into an unsigned 64-bit one.
#[inline]
pub fn umul32(a: u32, b: u32) -> u64 {
    a as u64 * b as u64
}

/// Computes the determinant `a * d - b * c` of 32-bit values.
#[inline]
pub fn det32(a: i32, b: i32, c: i32, d: i32) -> i64 {
    mul32(a, d) - mul32(b, c)
}

/// Multiplies a 64-bit value by a 32-bit one, without overflow.
#[inline]
pub fn mul64x32(a: i64, b: i32) -> i128 {
    a as i128 * b as i128
}

/// Multiplies two 64-bit values into a 128-bit one.
///
/// Differences of coordinates need 33 bits, so their products go through
/// here.
#[inline]
pub fn mul64(a: i64, b: i64) -> i128 {
    a as i128 * b as i128
}

/// Computes the determinant `a * d - b * c` of 64-bit values.
///
/// The caller guarantees that the products fit in 127 bits, which they do
/// for anything built from coordinates and their differences.
#[inline]
pub fn det64(a: i64, b: i64, c: i64, d: i64) -> i128 {
    mul64(a, d) - mul64(b, c)
}

/// Computes the determinant `a * d - c * b` where `a` and `c` are 64-bit and
/// `b` and `d` are 32-bit.
#[inline]
pub fn det64x32(a: i64, b: i32, c: i64, d: i32) -> i128 {
    mul64x32(a, d) - mul64x32(c, b)
}

/// Floored division with remainder of 64-bit values.
///
/// `den` must be non-zero.
#[inline]
pub fn floored_divrem(num: i64, den: i64) -> QuoRem<i64> {
    debug_assert_ne!(den, 0);
    let mut quo = num / den;
    let mut rem = num % den;
    if rem != 0 && ((rem < 0) != (den < 0)) {
        quo -= 1;
        rem += den;
    }
    QuoRem { quo, rem }
}

/// Floored division with remainder of a 128-bit value by a 64-bit one.
///
/// The remainder always fits in 64 bits; the quotient might not, so it is
/// returned at full width and callers decide what to do with overflow.
#[inline]
pub fn floored_divrem_128(num: i128, den: i64) -> QuoRem<i128> {
    debug_assert_ne!(den, 0);
    let den = den as i128;
    let mut quo = num / den;
    let mut rem = num % den;
    if rem != 0 && ((rem < 0) != (den < 0)) {
        quo -= 1;
        rem += den;
    }
    QuoRem { quo, rem }
}

/// Computes `x * a / b`, floored, with a 128-bit intermediate product.
///
/// The caller guarantees that the quotient fits in 64 bits.
#[inline]
pub fn floored_muldivrem(x: i64, a: i64, b: i64) -> QuoRem<i64> {
    let QuoRem { quo, rem } = floored_divrem_128(x as i128 * a as i128, b);
    debug_assert!(i64::try_from(quo).is_ok());
    QuoRem {
        quo: quo as i64,
        rem: rem as i64,
    }
}

/// Divides and rounds to the nearest integer (halves round up), reporting
/// which way the rounding went.
#[inline]
pub fn round_div(num: i128, den: i128) -> (i128, Exactness) {
    debug_assert_ne!(den, 0);
    let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
    let quo = num.div_euclid(den);
    let rem = num.rem_euclid(den);
    if rem == 0 {
        (quo, Exactness::Exact)
    } else if 2 * rem >= den {
        (quo + 1, Exactness::RoundedUp)
    } else {
        (quo, Exactness::RoundedDown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn floored_signs() {
        assert_eq!(floored_divrem(7, 2), QuoRem { quo: 3, rem: 1 });
        assert_eq!(floored_divrem(-7, 2), QuoRem { quo: -4, rem: 1 });
        assert_eq!(floored_divrem(7, -2), QuoRem { quo: -4, rem: -1 });
        assert_eq!(floored_divrem(-7, -2), QuoRem { quo: 3, rem: -1 });
        assert_eq!(floored_divrem(-8, 2), QuoRem { quo: -4, rem: 0 });
    }

    #[test]
    fn rounding() {
        assert_eq!(round_div(7, 2), (4, Exactness::RoundedUp));
        assert_eq!(round_div(5, 3), (2, Exactness::RoundedUp));
        assert_eq!(round_div(4, 3), (1, Exactness::RoundedDown));
        assert_eq!(round_div(-4, 3), (-1, Exactness::RoundedUp));
        assert_eq!(round_div(-5, 3), (-2, Exactness::RoundedDown));
        assert_eq!(round_div(9, -3), (-3, Exactness::Exact));
    }

    #[test]
    fn exactness_breaks_ties() {
        assert_eq!(Exactness::Exact.compare(3, 3), Ordering::Equal);
        assert_eq!(Exactness::RoundedUp.compare(3, 3), Ordering::Less);
        assert_eq!(Exactness::RoundedDown.compare(3, 3), Ordering::Greater);
        assert_eq!(Exactness::RoundedUp.compare(4, 3), Ordering::Greater);
    }

    #[test]
    fn wide_products() {
        assert_eq!(det32(i32::MAX, i32::MIN, i32::MIN, i32::MAX), {
            let a = i32::MAX as i64;
            let b = i32::MIN as i64;
            a * a - b * b
        });
        assert_eq!(
            mul64x32(i64::MAX, i32::MIN),
            i64::MAX as i128 * i32::MIN as i128
        );
        assert_eq!(umul32(u32::MAX, u32::MAX), 18446744065119617025);

        // Differences of extreme coordinates, and their cross products.
        let span = i32::MAX as i64 - i32::MIN as i64;
        assert_eq!(det64(span, -span, span, span), 2 * span as i128 * span as i128);
    }

    proptest! {
        #[test]
        fn divrem_law(num in any::<i64>(), den in any::<i64>().prop_filter("nonzero", |d| *d != 0)) {
            prop_assume!(!(num == i64::MIN && den == -1));
            let QuoRem { quo, rem } = floored_divrem(num, den);
            prop_assert_eq!(quo as i128 * den as i128 + rem as i128, num as i128);
            prop_assert!(rem == 0 || (rem < 0) == (den < 0));
            prop_assert!((rem as i128).abs() < (den as i128).abs());
        }

        #[test]
        fn divrem_128_law(num in any::<i128>(), den in any::<i64>().prop_filter("nonzero", |d| *d != 0)) {
            prop_assume!(num.checked_abs().is_some());
            let QuoRem { quo, rem } = floored_divrem_128(num, den);
            prop_assert_eq!(quo.checked_mul(den as i128).and_then(|p| p.checked_add(rem)), Some(num));
            prop_assert!(rem == 0 || (rem < 0) == (den < 0));
            prop_assert!(rem.abs() < (den as i128).abs());
        }

        #[test]
        fn round_div_is_nearest(num in -1_000_000_000i128..1_000_000_000, den in 1i128..100_000) {
            let (q, exactness) = round_div(num, den);
            let err = q * den - num;
            prop_assert!(2 * err.abs() <= den);
            match exactness {
                Exactness::Exact => prop_assert_eq!(err, 0),
                Exactness::RoundedUp => prop_assert!(err > 0),
                Exactness::RoundedDown => prop_assert!(err < 0),
            }
        }
    }
}
