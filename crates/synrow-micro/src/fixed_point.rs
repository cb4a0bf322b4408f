//! Fixed-point arithmetic for deterministic plasticity computation
//!
//! Traces and weight changes are computed in signed 32-bit fixed point with a
//! compile-time number of fractional bits. All arithmetic saturates.

use core::{fmt, ops};

/// Signed 32-bit fixed-point number with `FRAC_BITS` fractional bits
///
/// `Fixed<11>` (S20.11) is used for traces and STDP lookup tables,
/// `Fixed<15>` (S16.15) for generator parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Fixed<const FRAC_BITS: u32>(i32);

/// S20.11 fixed point: traces, lookup tables and plasticity updates
pub type S2011 = Fixed<11>;

/// S16.15 fixed point: generator parameters
pub type S1615 = Fixed<15>;

impl<const FRAC_BITS: u32> Fixed<FRAC_BITS> {
    /// Number of fractional bits
    pub const FRAC_BITS: u32 = FRAC_BITS;
    /// Scale factor (2^FRAC_BITS)
    pub const SCALE: i32 = 1 << FRAC_BITS;
    /// Maximum representable value
    pub const MAX: Self = Self(i32::MAX);
    /// Minimum representable value
    pub const MIN: Self = Self(i32::MIN);
    /// Zero value
    pub const ZERO: Self = Self(0);
    /// One value
    pub const ONE: Self = Self(Self::SCALE);

    /// Create from raw i32 value
    #[inline(always)]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Get raw i32 value
    #[inline(always)]
    pub const fn to_raw(self) -> i32 {
        self.0
    }

    /// Create from integer value
    #[inline(always)]
    pub const fn from_int(value: i32) -> Self {
        if value > i32::MAX >> FRAC_BITS {
            Self::MAX
        } else if value < i32::MIN >> FRAC_BITS {
            Self::MIN
        } else {
            Self(value << FRAC_BITS)
        }
    }

    /// Create from float, rounding to nearest (host-side configuration only)
    #[inline]
    pub fn from_float(value: f64) -> Self {
        let scaled = libm::round(value * Self::SCALE as f64);
        if scaled >= i32::MAX as f64 {
            Self::MAX
        } else if scaled <= i32::MIN as f64 {
            Self::MIN
        } else {
            Self(scaled as i32)
        }
    }

    /// Convert to float
    #[inline]
    pub fn to_float(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    /// Convert to integer (truncating towards negative infinity)
    #[inline(always)]
    pub const fn to_int(self) -> i32 {
        self.0 >> FRAC_BITS
    }

    /// Is this value zero
    #[inline(always)]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Maximum of two values
    #[inline(always)]
    pub const fn max(self, other: Self) -> Self {
        if self.0 > other.0 { self } else { other }
    }

    /// Minimum of two values
    #[inline(always)]
    pub const fn min(self, other: Self) -> Self {
        if self.0 < other.0 { self } else { other }
    }

    /// Saturating addition
    #[inline(always)]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction
    #[inline(always)]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Saturating multiplication
    #[inline(always)]
    pub const fn saturating_mul(self, other: Self) -> Self {
        Self(saturate((self.0 as i64 * other.0 as i64) >> FRAC_BITS))
    }

    /// Multiply a plain integer quantity (e.g. a weight) by this factor
    ///
    /// The result has the units of `value`.
    #[inline(always)]
    pub const fn scale(self, value: i32) -> i32 {
        saturate((value as i64 * self.0 as i64) >> FRAC_BITS)
    }

    /// Re-express this value with `frac_bits` fractional bits
    ///
    /// Fractional bits are truncated when narrowing; `None` if the
    /// result does not fit an i32.
    pub const fn rescale(self, frac_bits: u32) -> Option<i32> {
        let raw = self.0 as i64;
        let value = if frac_bits >= FRAC_BITS {
            let shift = frac_bits - FRAC_BITS;
            if shift >= 32 {
                return if raw == 0 { Some(0) } else { None };
            }
            raw << shift
        } else {
            raw >> (FRAC_BITS - frac_bits)
        };
        if value > i32::MAX as i64 || value < i32::MIN as i64 {
            None
        } else {
            Some(value as i32)
        }
    }

    /// Negate value
    #[inline(always)]
    pub const fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }

    /// Shift right (divide by power of 2)
    #[inline(always)]
    pub const fn shr(self, bits: u32) -> Self {
        if bits >= 32 {
            Self::ZERO
        } else {
            Self(self.0 >> bits)
        }
    }
}

#[inline(always)]
const fn saturate(value: i64) -> i32 {
    if value > i32::MAX as i64 {
        i32::MAX
    } else if value < i32::MIN as i64 {
        i32::MIN
    } else {
        value as i32
    }
}

/// Multiply a signed value by an unsigned U0.32 fraction
///
/// Used to draw uniformly distributed values from a 32-bit random word.
#[inline(always)]
pub const fn mul_u032(value: i32, fraction: u32) -> i32 {
    ((value as i64 * fraction as i64) >> 32) as i32
}

/// Convert a probability in `[0, 1]` to a U0.32 threshold
///
/// A probability of 1.0 maps to `u32::MAX`.
pub fn u032_from_probability(probability: f64) -> u32 {
    if probability <= 0.0 {
        0
    } else if probability >= 1.0 {
        u32::MAX
    } else {
        libm::round(probability * 4_294_967_296.0) as u32
    }
}

impl<const FRAC_BITS: u32> fmt::Display for Fixed<FRAC_BITS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.to_float())
    }
}

impl<const FRAC_BITS: u32> ops::Add for Fixed<FRAC_BITS> {
    type Output = Self;

    #[inline(always)]
    fn add(self, other: Self) -> Self {
        self.saturating_add(other)
    }
}

impl<const FRAC_BITS: u32> ops::Sub for Fixed<FRAC_BITS> {
    type Output = Self;

    #[inline(always)]
    fn sub(self, other: Self) -> Self {
        self.saturating_sub(other)
    }
}

impl<const FRAC_BITS: u32> ops::Mul for Fixed<FRAC_BITS> {
    type Output = Self;

    #[inline(always)]
    fn mul(self, other: Self) -> Self {
        self.saturating_mul(other)
    }
}

impl<const FRAC_BITS: u32> ops::Neg for Fixed<FRAC_BITS> {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self {
        Fixed::neg(self)
    }
}

impl<const FRAC_BITS: u32> ops::AddAssign for Fixed<FRAC_BITS> {
    #[inline(always)]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl<const FRAC_BITS: u32> ops::SubAssign for Fixed<FRAC_BITS> {
    #[inline(always)]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl<const FRAC_BITS: u32> Default for Fixed<FRAC_BITS> {
    #[inline(always)]
    fn default() -> Self {
        Self::ZERO
    }
}
