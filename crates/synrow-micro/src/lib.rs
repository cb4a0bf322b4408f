//! # Synrow Micro: On-Core Synaptic Row Processing
//!
//! Allocation-free synaptic row engine for small neuromorphic cores. Each core
//! owns a slice of post-synaptic neurons and, every simulation tick, turns
//! incoming spike keys into weighted input delivered to its neurons through a
//! delay ring buffer, updating plastic weights with STDP on the way.
//!
//! ## Components
//!
//! - **Row format**: bit-packed control words and the static/plastic row layouts
//! - **Buffers**: spike input queue, delay ring buffer and delay-extension buffer
//! - **Post-event history**: per-neuron (tick, trace) log with windowed replay
//! - **Plasticity**: timing and weight dependences with fixed-point lookup tables
//! - **Processor**: the per-core context tying the pieces together
//!
//! ## Quick Start
//!
//! ```rust
//! use synrow_micro::prelude::*;
//!
//! let format = SynrowConfig::CONTROL_FORMAT;
//! let word = format.encode_static(5, 2, 100).unwrap();
//!
//! assert_eq!(format.index(word), 5);
//! assert_eq!(format.delay(word), 2);
//! assert_eq!(format.static_weight(word), 100);
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod error;
pub mod fixed_point;
pub mod row;
pub mod region;

// Buffers
pub mod delay_buffer;
pub mod ring_buffer;
pub mod spike_input;

// Plasticity and row processing
pub mod plasticity;
pub mod post_events;
pub mod processor;
pub mod synapse_types;

// Re-export core types
pub use crate::{
    delay_buffer::{DelayBuffer, DelayedRow},
    error::{Result, SynrowError},
    fixed_point::{Fixed, S1615, S2011},
    post_events::{PostEvent, PostEventHistory, PostEventWindow},
    processor::{KeyLookup, ProcessorStats, RowMemory, SliceMemory, SynapseProcessor},
    region::RegionReader,
    ring_buffer::RingBuffer,
    row::{ControlFormat, PlasticRowLayout, RowHeader, RowOffsetLength},
    spike_input::SpikeInputBuffer,
    synapse_types::{SynapseType, StaticSynapse, StdpSynapse},
};

/// Simulation time in ticks
pub type Tick = u32;

/// Build-time configuration shared by the matrix generator and the core
pub struct SynrowConfig;

impl SynrowConfig {
    /// Dendritic delay bits in a control word
    pub const DELAY_BITS: u32 = 3;

    /// Post-synaptic index bits in a control word
    pub const INDEX_BITS: u32 = 10;

    /// Control word layout for the bit widths above
    pub const CONTROL_FORMAT: ControlFormat = ControlFormat::new(Self::DELAY_BITS, Self::INDEX_BITS);

    /// Bits of the synapse count in a [`RowOffsetLength`] word
    pub const ROW_SYNAPSES_BITS: u32 = 10;

    /// Maximum synapses in a static row
    pub const MAX_STATIC_ROW_SYNAPSES: usize = 1 << Self::ROW_SYNAPSES_BITS;

    /// Maximum synapses in a plastic row (bounded by the row working buffer)
    pub const MAX_PLASTIC_ROW_SYNAPSES: usize = 512;

    /// Post-synaptic events remembered per neuron
    pub const POST_EVENT_HISTORY: usize = 10;

    /// Spike input queue capacity
    pub const SPIKE_INPUT_BUFFER_SIZE: usize = {
        #[cfg(feature = "large-spike-buffer")]
        { 512 }
        #[cfg(not(feature = "large-spike-buffer"))]
        { 256 }
    };

    /// Ticks covered by the delay-extension buffer
    pub const DELAY_BUFFER_SLOTS: usize = 16;

    /// Delayed rows held per delay-extension slot
    pub const DELAY_BUFFER_ROWS: usize = 32;

    /// Entries in each STDP exponential decay table
    pub const STDP_LUT_ENTRIES: usize = 256;
}

/// Spike input queue sized by [`SynrowConfig`]
pub type DefaultSpikeInputBuffer = SpikeInputBuffer<{ SynrowConfig::SPIKE_INPUT_BUFFER_SIZE }>;

/// Delay-extension buffer sized by [`SynrowConfig`]
pub type DefaultDelayBuffer =
    DelayBuffer<{ SynrowConfig::DELAY_BUFFER_SLOTS }, { SynrowConfig::DELAY_BUFFER_ROWS }>;

/// Static synapse type with the configured control format
pub type DefaultStaticSynapse = StaticSynapse<{ SynrowConfig::DELAY_BITS }, { SynrowConfig::INDEX_BITS }>;

/// Nearest-pair STDP with additive weights, the standard plastic configuration
pub type NearestPairAdditiveStdp<const NEURONS: usize> = StdpSynapse<
    plasticity::NearestPair<{ SynrowConfig::STDP_LUT_ENTRIES }>,
    plasticity::Additive,
    plasticity::WeightOnly,
    { SynrowConfig::DELAY_BITS },
    { SynrowConfig::INDEX_BITS },
    { SynrowConfig::POST_EVENT_HISTORY },
    NEURONS,
>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile-time assertions to validate configuration
const _: () = {
    assert!(
        SynrowConfig::DELAY_BITS + SynrowConfig::INDEX_BITS <= 16,
        "Plastic control words must fit 16 bits"
    );
    assert!(
        SynrowConfig::MAX_PLASTIC_ROW_SYNAPSES <= SynrowConfig::MAX_STATIC_ROW_SYNAPSES,
        "Plastic rows cannot exceed the row-length field"
    );
    assert!(SynrowConfig::DELAY_BUFFER_SLOTS > 1, "Delay buffer needs at least two slots");
    assert!(SynrowConfig::POST_EVENT_HISTORY > 0, "Post-event history must be non-empty");
};

/// Common imports
pub mod prelude {
    pub use crate::{
        plasticity::{
            Additive, ExpDecayLut, Multiplicative, NearestPair, Pair, PlasticityUpdate,
            SynapseStructure, TimingDependence, WeightDependence, WeightOnly,
        },
        ControlFormat, DelayBuffer, KeyLookup, PostEventHistory, PlasticRowLayout, RegionReader,
        Result, RingBuffer, RowHeader, RowMemory, RowOffsetLength, SliceMemory, SpikeInputBuffer,
        StaticSynapse, StdpSynapse, SynapseProcessor, SynapseType, SynrowConfig, SynrowError,
        Tick, S2011,
    };
}
