//! Parameter generators for delays and weights
//!
//! Parameters are held as S16.15 and converted to the fixed point requested
//! by the matrix generator (zero for delays, the weight fixed point for
//! weights) by shifting.

use std::fmt::Debug;

use rand::Rng;
use rand_core::RngCore;
use synrow_micro::fixed_point::{mul_u032, S1615};

use crate::error::{BuilderError, Result};

/// Produces per-synapse values for one row
pub trait ParamGenerator: Debug {
    /// Append `count` values with `fixed_point` fractional bits to `values`
    fn generate(
        &self,
        count: usize,
        fixed_point: u32,
        rng: &mut dyn RngCore,
        values: &mut Vec<i32>,
    ) -> Result<()>;
}

fn convert(value: S1615, fixed_point: u32) -> Result<i32> {
    value
        .rescale(fixed_point)
        .ok_or_else(|| BuilderError::invalid_parameter("value", value, format!("representable with {} fractional bits", fixed_point)))
}

/// Every synapse gets the same value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constant {
    /// The value
    pub value: S1615,
}

impl ParamGenerator for Constant {
    fn generate(
        &self,
        count: usize,
        fixed_point: u32,
        _rng: &mut dyn RngCore,
        values: &mut Vec<i32>,
    ) -> Result<()> {
        let value = convert(self.value, fixed_point)?;
        values.extend(std::iter::repeat(value).take(count));
        Ok(())
    }
}

/// Values drawn uniformly from `[low, high)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uniform {
    low: S1615,
    high: S1615,
}

impl Uniform {
    /// Create a generator; `low` must not exceed `high`
    pub fn new(low: S1615, high: S1615) -> Result<Self> {
        if low > high {
            return Err(BuilderError::invalid_parameter(
                "low",
                low,
                format!("no greater than high ({})", high),
            ));
        }
        Ok(Self { low, high })
    }
}

impl ParamGenerator for Uniform {
    fn generate(
        &self,
        count: usize,
        fixed_point: u32,
        rng: &mut dyn RngCore,
        values: &mut Vec<i32>,
    ) -> Result<()> {
        let range = self.high.to_raw().saturating_sub(self.low.to_raw());
        for _ in 0..count {
            let offset = mul_u032(range, rng.next_u32());
            let value = S1615::from_raw(self.low.to_raw().saturating_add(offset));
            values.push(convert(value, fixed_point)?);
        }
        Ok(())
    }
}

/// Integers drawn uniformly from `[low, high]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformInt {
    low: i32,
    high: i32,
}

impl UniformInt {
    /// Create a generator; `low` must not exceed `high`
    pub fn new(low: i32, high: i32) -> Result<Self> {
        if low > high {
            return Err(BuilderError::invalid_parameter(
                "low",
                low,
                format!("no greater than high ({})", high),
            ));
        }
        Ok(Self { low, high })
    }
}

impl ParamGenerator for UniformInt {
    fn generate(
        &self,
        count: usize,
        fixed_point: u32,
        rng: &mut dyn RngCore,
        values: &mut Vec<i32>,
    ) -> Result<()> {
        for _ in 0..count {
            let value: i32 = rng.gen_range(self.low..=self.high);
            let shifted = (fixed_point < 32)
                .then(|| (value as i64) << fixed_point)
                .and_then(|shifted| i32::try_from(shifted).ok())
                .ok_or_else(|| {
                    BuilderError::invalid_parameter(
                        "value",
                        value,
                        format!("representable with {} fractional bits", fixed_point),
                    )
                })?;
            values.push(shifted);
        }
        Ok(())
    }
}
