//! Delay ring buffer
//!
//! Input computed now is accumulated into the slot of the tick it is due and
//! drained by the neuron model on that tick. Slots are indexed by
//! `tick mod SLOTS`; every delay written must be shorter than `SLOTS` or it
//! aliases a later tick.

use crate::{Result, SynrowError, Tick};

/// Time-indexed accumulator of synaptic input
#[derive(Debug, Clone)]
pub struct RingBuffer<const SLOTS: usize, const NEURONS: usize> {
    slots: [[u32; NEURONS]; SLOTS],
}

impl<const SLOTS: usize, const NEURONS: usize> RingBuffer<SLOTS, NEURONS> {
    const VALID: () = assert!(
        SLOTS.is_power_of_two() && NEURONS > 0,
        "Ring buffer needs a power-of-two slot count and at least one neuron"
    );

    /// Create a zeroed ring buffer
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID;
        Self { slots: [[0; NEURONS]; SLOTS] }
    }

    /// Number of tick slots
    pub const fn slots(&self) -> usize {
        SLOTS
    }

    #[inline(always)]
    fn entry(&mut self, tick: Tick, index: u32) -> Result<&mut u32> {
        let slot = tick as usize & (SLOTS - 1);
        self.slots[slot]
            .get_mut(index as usize)
            .ok_or(SynrowError::NeuronOutOfRange { index, neurons: NEURONS })
    }

    /// Accumulate `weight` into the input of neuron `index` at `tick` (saturating)
    #[inline]
    pub fn add(&mut self, tick: Tick, index: u32, weight: u32) -> Result<()> {
        let entry = self.entry(tick, index)?;
        *entry = entry.saturating_add(weight);
        Ok(())
    }

    /// Take the accumulated input of neuron `index` at `tick`, zeroing the slot
    #[inline]
    pub fn read_and_clear(&mut self, tick: Tick, index: u32) -> Result<u32> {
        let entry = self.entry(tick, index)?;
        Ok(core::mem::take(entry))
    }

    /// Accumulated input without clearing
    pub fn peek(&self, tick: Tick, index: u32) -> Result<u32> {
        let slot = tick as usize & (SLOTS - 1);
        self.slots[slot]
            .get(index as usize)
            .copied()
            .ok_or(SynrowError::NeuronOutOfRange { index, neurons: NEURONS })
    }
}

impl<const SLOTS: usize, const NEURONS: usize> Default for RingBuffer<SLOTS, NEURONS> {
    fn default() -> Self {
        Self::new()
    }
}
