//! Spike-timing-dependent plasticity components
//!
//! A plastic synapse type is assembled from three parts chosen at compile
//! time:
//!
//! - a [`TimingDependence`] which maintains pre/post traces and decides how
//!   much depression or potentiation each spike pairing causes,
//! - a [`WeightDependence`] which turns those amounts into a new weight,
//! - a [`SynapseStructure`] which maps the stored 16-bit plastic word to and
//!   from a weight.
//!
//! All quantities are S20.11 fixed point so that cores without an FPU produce
//! bit-identical results.

mod lut;
mod timing;
mod weight;

pub use lut::ExpDecayLut;
pub use timing::{NearestPair, Pair};
pub use weight::{Additive, Multiplicative};

use crate::{post_events::PostEvent, region::RegionReader, Result, Tick, S2011};

/// Receiver of the adjustments produced by a timing dependence
pub trait PlasticityUpdate {
    /// Apply a depression of the given size
    fn depress(&mut self, depression: S2011);

    /// Apply a potentiation of the given size
    fn potentiate(&mut self, potentiation: S2011);
}

/// Trace value persisted in whole words inside a plastic row
pub trait TraceWords: Copy + Default {
    /// Words occupied in the row
    const WORDS: usize;

    /// Decode from the row's trace words
    fn read_words(words: &[u32]) -> Self;

    /// Encode into the row's trace words
    fn write_words(self, words: &mut [u32]);
}

impl TraceWords for S2011 {
    const WORDS: usize = 1;

    fn read_words(words: &[u32]) -> Self {
        S2011::from_raw(words[0] as i32)
    }

    fn write_words(self, words: &mut [u32]) {
        words[0] = self.to_raw() as u32;
    }
}

/// Parameter block loadable from a configuration region
pub trait FromRegion: Sized {
    /// Read parameters, advancing the reader past them
    fn from_region(reader: &mut RegionReader<'_>) -> Result<Self>;
}

/// Timing rule deciding depression and potentiation from spike pairings
///
/// Ticks passed to the `apply_*` methods already include synaptic delays.
pub trait TimingDependence {
    /// Trace stored in each plastic row
    type PreTrace: TraceWords;

    /// Trace stored with each post-synaptic event
    type PostTrace: Copy + Default;

    /// Trace after a genuine pre-synaptic spike at `tick`
    fn update_pre_trace(&self, tick: Tick, last_trace: Self::PreTrace, last_tick: Tick) -> Self::PreTrace;

    /// Trace after a post-synaptic spike at `tick`
    fn update_post_trace(&self, tick: Tick, last: Option<PostEvent<Self::PostTrace>>) -> Self::PostTrace;

    /// Replay one post-synaptic event against the last pre-synaptic spike
    fn apply_post_spike<U: PlasticityUpdate>(
        &self,
        update: &mut U,
        post: PostEvent<Self::PostTrace>,
        last_pre_tick: Tick,
        last_pre_trace: Self::PreTrace,
        prev_post: Option<PostEvent<Self::PostTrace>>,
    );

    /// Apply a genuine pre-synaptic spike against the preceding post event
    fn apply_pre_spike<U: PlasticityUpdate>(
        &self,
        update: &mut U,
        pre_tick: Tick,
        pre_trace: Self::PreTrace,
        last_pre_tick: Tick,
        last_pre_trace: Self::PreTrace,
        prev_post: Option<PostEvent<Self::PostTrace>>,
    );
}

/// Weight rule applying clamped adjustments to a running weight
pub trait WeightDependence {
    /// Working state of one synapse while its row is processed
    type State: Copy;

    /// State for a synapse currently holding `weight`
    fn initial_state(&self, weight: u16) -> Self::State;

    /// Apply a depression to the working state
    fn apply_depression(&self, state: &mut Self::State, depression: S2011);

    /// Apply a potentiation to the working state
    fn apply_potentiation(&self, state: &mut Self::State, potentiation: S2011);

    /// Final weight, clamped to the rule's bounds
    fn final_weight(&self, state: Self::State) -> u16;
}

/// Mapping between the stored 16-bit plastic word and a weight
pub trait SynapseStructure {
    /// Weight held by a plastic word
    fn weight(plastic: u16) -> u16;

    /// Plastic word after its weight becomes `weight`
    fn with_weight(plastic: u16, weight: u16) -> u16;
}

/// Plastic word is the weight itself
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightOnly;

impl SynapseStructure for WeightOnly {
    #[inline(always)]
    fn weight(plastic: u16) -> u16 {
        plastic
    }

    #[inline(always)]
    fn with_weight(_plastic: u16, weight: u16) -> u16 {
        weight
    }
}

/// Adapter applying timing-rule adjustments through a weight dependence
pub struct WeightUpdate<'a, W: WeightDependence> {
    dependence: &'a W,
    state: W::State,
}

impl<'a, W: WeightDependence> WeightUpdate<'a, W> {
    /// Start updating a synapse holding `weight`
    pub fn new(dependence: &'a W, weight: u16) -> Self {
        Self { dependence, state: dependence.initial_state(weight) }
    }

    /// Final weight after all adjustments
    pub fn finish(self) -> u16 {
        self.dependence.final_weight(self.state)
    }
}

impl<'a, W: WeightDependence> PlasticityUpdate for WeightUpdate<'a, W> {
    #[inline]
    fn depress(&mut self, depression: S2011) {
        self.dependence.apply_depression(&mut self.state, depression);
    }

    #[inline]
    fn potentiate(&mut self, potentiation: S2011) {
        self.dependence.apply_potentiation(&mut self.state, potentiation);
    }
}
