use crate::{
    plasticity::FromRegion, region::RegionReader, Result, SynrowError, Tick, S2011,
};

/// Exponential decay lookup table in S20.11
///
/// Entry `i` holds `exp(-(i << shift) / tau)`; intervals beyond the table
/// decay to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpDecayLut<const N: usize> {
    entries: [S2011; N],
    shift: u32,
}

impl<const N: usize> ExpDecayLut<N> {
    /// Build the table for a time constant given in ticks
    pub fn from_time_constant(tau_ticks: f64, shift: u32) -> Result<Self> {
        if tau_ticks.is_nan() || tau_ticks <= 0.0 {
            return Err(SynrowError::InvalidConfig { reason: "time constant must be positive" });
        }
        if shift >= Tick::BITS {
            return Err(SynrowError::InvalidConfig { reason: "lookup shift must be below 32" });
        }
        let entries = core::array::from_fn(|i| {
            let dt = ((i as u64) << shift) as f64;
            S2011::from_float(libm::exp(-dt / tau_ticks))
        });
        Ok(Self { entries, shift })
    }

    /// Table from precomputed entries
    pub fn from_entries(entries: [S2011; N], shift: u32) -> Result<Self> {
        if shift >= Tick::BITS {
            return Err(SynrowError::InvalidConfig { reason: "lookup shift must be below 32" });
        }
        Ok(Self { entries, shift })
    }

    /// Decay after `dt` ticks
    #[inline]
    pub fn get(&self, dt: Tick) -> S2011 {
        self.entries.get((dt >> self.shift) as usize).copied().unwrap_or(S2011::ZERO)
    }

    /// Ticks covered by one entry, as a power of two
    pub fn shift(&self) -> u32 {
        self.shift
    }
}

/// Region layout: shift word followed by `N` signed half-words
impl<const N: usize> FromRegion for ExpDecayLut<N> {
    fn from_region(reader: &mut RegionReader<'_>) -> Result<Self> {
        let shift = reader.read_u32()?;
        if shift >= Tick::BITS {
            return Err(SynrowError::InvalidRegion { field: "lookup shift" });
        }

        let mut raw = [0u16; N];
        reader.read_halfwords(&mut raw)?;
        let entries = raw.map(|value| S2011::from_raw(value as i16 as i32));
        Ok(Self { entries, shift })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_table() {
        let lut = ExpDecayLut::<256>::from_time_constant(20.0, 0).unwrap();

        assert_eq!(lut.get(0), S2011::ONE);
        // exp(-1) * 2048 = 753.4
        assert_eq!(lut.get(20).to_raw(), 753);
        assert!(lut.get(10) > lut.get(11));
        assert_eq!(lut.get(256), S2011::ZERO);
    }

    #[test]
    fn test_shifted_table() {
        let lut = ExpDecayLut::<16>::from_time_constant(16.0, 2).unwrap();
        assert_eq!(lut.get(4), lut.get(7));
        assert_eq!(lut.get(64), S2011::ZERO);
    }

    #[test]
    fn test_invalid_time_constant() {
        assert!(ExpDecayLut::<4>::from_time_constant(0.0, 0).is_err());
        assert!(ExpDecayLut::<4>::from_time_constant(f64::NAN, 0).is_err());
        assert!(ExpDecayLut::<4>::from_time_constant(1.0, 32).is_err());
    }

    #[test]
    fn test_from_region() {
        let region = [1u32, 0x0400_0800, 0x0000_0100];
        let mut reader = RegionReader::new(&region);
        let lut = ExpDecayLut::<3>::from_region(&mut reader).unwrap();

        assert_eq!(lut.get(0), S2011::ONE);
        assert_eq!(lut.get(3).to_raw(), 0x400);
        assert_eq!(lut.get(5).to_raw(), 0x100);
        assert_eq!(lut.get(6), S2011::ZERO);

        let bad = [40u32, 0, 0];
        assert!(ExpDecayLut::<3>::from_region(&mut RegionReader::new(&bad)).is_err());
    }
}
