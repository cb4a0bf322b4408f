//! Weight dependences

use super::{FromRegion, WeightDependence};
use crate::{region::RegionReader, Result, SynrowError, S2011};

fn check_bounds(min_weight: i32, max_weight: i32) -> Result<()> {
    if min_weight < 0 || max_weight > u16::MAX as i32 || min_weight > max_weight {
        return Err(SynrowError::WeightOutOfRange {
            weight: if min_weight < 0 { min_weight as i64 } else { max_weight as i64 },
            max: u16::MAX as i64,
        });
    }
    Ok(())
}

/// Weight change independent of the current weight
///
/// Each adjustment is scaled by `a2_minus` or `a2_plus` (in weight units) and
/// clamped to `[min_weight, max_weight]` as it is applied, so the weight does
/// not depend on how adjustments are split across row activations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Additive {
    min_weight: i32,
    max_weight: i32,
    a2_plus: i32,
    a2_minus: i32,
}

impl Additive {
    /// Create with weight bounds and amplitudes in weight units
    pub fn new(min_weight: i32, max_weight: i32, a2_plus: i32, a2_minus: i32) -> Result<Self> {
        check_bounds(min_weight, max_weight)?;
        if a2_plus < 0 || a2_minus < 0 {
            return Err(SynrowError::InvalidConfig { reason: "amplitudes must be non-negative" });
        }
        Ok(Self { min_weight, max_weight, a2_plus, a2_minus })
    }
}

impl WeightDependence for Additive {
    type State = i32;

    fn initial_state(&self, weight: u16) -> i32 {
        weight as i32
    }

    fn apply_depression(&self, weight: &mut i32, depression: S2011) {
        *weight = weight
            .saturating_sub(depression.scale(self.a2_minus))
            .clamp(self.min_weight, self.max_weight);
    }

    fn apply_potentiation(&self, weight: &mut i32, potentiation: S2011) {
        *weight = weight
            .saturating_add(potentiation.scale(self.a2_plus))
            .clamp(self.min_weight, self.max_weight);
    }

    fn final_weight(&self, weight: i32) -> u16 {
        weight.clamp(self.min_weight, self.max_weight) as u16
    }
}

/// Region layout: min weight, max weight, A2+, A2- (one signed word each)
impl FromRegion for Additive {
    fn from_region(reader: &mut RegionReader<'_>) -> Result<Self> {
        let min_weight = reader.read_i32()?;
        let max_weight = reader.read_i32()?;
        let a2_plus = reader.read_i32()?;
        let a2_minus = reader.read_i32()?;
        Self::new(min_weight, max_weight, a2_plus, a2_minus)
            .map_err(|_| SynrowError::InvalidRegion { field: "additive weight dependence" })
    }
}

/// Soft-bounded weight change
///
/// Potentiation is proportional to the distance to `max_weight`, depression
/// to the distance from `min_weight`. Each adjustment applies immediately and
/// is clamped, so the distances never change sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Multiplicative {
    min_weight: i32,
    max_weight: i32,
    a2_plus: S2011,
    a2_minus: S2011,
}

impl Multiplicative {
    /// Create with weight bounds and fractional amplitudes
    pub fn new(min_weight: i32, max_weight: i32, a2_plus: S2011, a2_minus: S2011) -> Result<Self> {
        check_bounds(min_weight, max_weight)?;
        if a2_plus < S2011::ZERO || a2_minus < S2011::ZERO {
            return Err(SynrowError::InvalidConfig { reason: "amplitudes must be non-negative" });
        }
        Ok(Self { min_weight, max_weight, a2_plus, a2_minus })
    }
}

impl WeightDependence for Multiplicative {
    type State = i32;

    fn initial_state(&self, weight: u16) -> i32 {
        weight as i32
    }

    fn apply_depression(&self, weight: &mut i32, depression: S2011) {
        let scale = self.a2_minus.scale(*weight - self.min_weight);
        *weight = weight
            .saturating_sub(depression.scale(scale))
            .clamp(self.min_weight, self.max_weight);
    }

    fn apply_potentiation(&self, weight: &mut i32, potentiation: S2011) {
        let scale = self.a2_plus.scale(self.max_weight - *weight);
        *weight = weight
            .saturating_add(potentiation.scale(scale))
            .clamp(self.min_weight, self.max_weight);
    }

    fn final_weight(&self, weight: i32) -> u16 {
        weight.clamp(self.min_weight, self.max_weight) as u16
    }
}

/// Region layout: min weight, max weight, raw S20.11 A2+, raw S20.11 A2-
impl FromRegion for Multiplicative {
    fn from_region(reader: &mut RegionReader<'_>) -> Result<Self> {
        let min_weight = reader.read_i32()?;
        let max_weight = reader.read_i32()?;
        let a2_plus = S2011::from_raw(reader.read_i32()?);
        let a2_minus = S2011::from_raw(reader.read_i32()?);
        Self::new(min_weight, max_weight, a2_plus, a2_minus)
            .map_err(|_| SynrowError::InvalidRegion { field: "multiplicative weight dependence" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_additive_clamps() {
        let additive = Additive::new(100, 1000, 400, 400).unwrap();

        let mut state = additive.initial_state(900);
        additive.apply_potentiation(&mut state, S2011::ONE);
        assert_eq!(additive.final_weight(state), 1000);

        let mut state = additive.initial_state(300);
        additive.apply_depression(&mut state, S2011::ONE);
        assert_eq!(additive.final_weight(state), 100);
    }

    #[test]
    fn test_additive_fractional_amounts() {
        let additive = Additive::new(0, 1000, 200, 100).unwrap();
        let mut state = additive.initial_state(500);
        additive.apply_potentiation(&mut state, S2011::from_float(0.5));
        additive.apply_depression(&mut state, S2011::from_float(0.25));

        assert_eq!(additive.final_weight(state), 500 + 100 - 25);
    }

    #[test]
    fn test_additive_clamps_each_step() {
        let additive = Additive::new(0, 1000, 200, 200).unwrap();

        let mut weight = additive.initial_state(950);
        additive.apply_potentiation(&mut weight, S2011::ONE);
        assert_eq!(weight, 1000);
        additive.apply_depression(&mut weight, S2011::from_float(0.5));
        assert_eq!(additive.final_weight(weight), 900);

        let mut weight = additive.initial_state(50);
        additive.apply_depression(&mut weight, S2011::ONE);
        additive.apply_potentiation(&mut weight, S2011::from_float(0.5));
        assert_eq!(additive.final_weight(weight), 100);
    }

    #[test]
    fn test_multiplicative_large_amplitude_stays_bounded() {
        let rule = Multiplicative::new(0, 1000, S2011::from_int(2), S2011::from_int(2)).unwrap();

        // Without a clamp the second step would see a negative distance
        let mut weight = rule.initial_state(800);
        rule.apply_potentiation(&mut weight, S2011::ONE);
        assert_eq!(weight, 1000);
        rule.apply_potentiation(&mut weight, S2011::ONE);
        assert_eq!(weight, 1000);

        let mut weight = rule.initial_state(200);
        rule.apply_depression(&mut weight, S2011::ONE);
        assert_eq!(weight, 0);
        rule.apply_depression(&mut weight, S2011::ONE);
        assert_eq!(rule.final_weight(weight), 0);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(Additive::new(-1, 100, 1, 1).is_err());
        assert!(Additive::new(10, 5, 1, 1).is_err());
        assert!(Additive::new(0, 70_000, 1, 1).is_err());
        assert!(Additive::new(0, 100, -1, 1).is_err());
        assert!(Multiplicative::new(0, 100, S2011::from_int(-1), S2011::ONE).is_err());
    }

    #[test]
    fn test_multiplicative_soft_bounds() {
        let rule = Multiplicative::new(0, 1000, S2011::from_float(0.5), S2011::from_float(0.5)).unwrap();

        let mut weight = rule.initial_state(600);
        rule.apply_potentiation(&mut weight, S2011::ONE);
        assert_eq!(weight, 800);
        rule.apply_potentiation(&mut weight, S2011::ONE);
        assert_eq!(weight, 900);

        rule.apply_depression(&mut weight, S2011::ONE);
        assert_eq!(rule.final_weight(weight), 450);
    }

    #[test]
    fn test_from_region() {
        let region = [0u32, 1000, 50, 60];
        let additive = Additive::from_region(&mut RegionReader::new(&region)).unwrap();
        assert_eq!(additive, Additive::new(0, 1000, 50, 60).unwrap());

        let bad = [500u32, 100, 50, 60];
        assert_eq!(
            Additive::from_region(&mut RegionReader::new(&bad)),
            Err(SynrowError::InvalidRegion { field: "additive weight dependence" })
        );
    }
}
