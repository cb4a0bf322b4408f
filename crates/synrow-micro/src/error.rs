//! Error handling for on-core synaptic processing
//!
//! Errors carry only `Copy` data so they can be returned from interrupt-driven
//! code paths without allocation.

use core::fmt;

use crate::Tick;

/// Result type for synrow operations
pub type Result<T> = core::result::Result<T, SynrowError>;

/// Errors raised by row decoding, buffering and plasticity processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynrowError {
    /// Row declares more synapses than the synapse type can hold
    RowTooLong {
        /// Synapse count found in the row header
        synapses: usize,
        /// Maximum synapses per row
        max: usize,
    },
    /// Word buffer is shorter than the layout requires
    BufferTooSmall {
        /// Words required
        needed: usize,
        /// Words available
        available: usize,
    },
    /// Post-synaptic neuron index outside the core's neuron range
    NeuronOutOfRange {
        /// Offending index
        index: u32,
        /// Number of neurons simulated on this core
        neurons: usize,
    },
    /// Synaptic index not representable in the control word
    IndexOutOfRange {
        /// Offending index
        index: u32,
        /// Largest encodable index
        max: u32,
    },
    /// Delay not representable in the control word or buffer window
    DelayOutOfRange {
        /// Offending delay in ticks
        delay: u32,
        /// Largest accepted delay
        max: u32,
    },
    /// Weight not representable in the row format
    WeightOutOfRange {
        /// Offending weight (fixed point)
        weight: i64,
        /// Largest encodable weight
        max: i64,
    },
    /// Control word does not fit the requested width
    FormatTooWide {
        /// Delay plus index bits requested
        bits: u32,
        /// Width of the control word
        width: u32,
    },
    /// Post-synaptic events must be recorded in strictly increasing tick order
    NonMonotonicTick {
        /// Tick being added
        tick: Tick,
        /// Most recent tick already recorded
        last: Tick,
    },
    /// Configuration region ended before all parameters were read
    RegionTooShort {
        /// Words required
        needed: usize,
        /// Words remaining
        available: usize,
    },
    /// Configuration region contains an invalid value
    InvalidRegion {
        /// Description of the invalid field
        field: &'static str,
    },
    /// Invalid static configuration (ring length, working buffer, ...)
    InvalidConfig {
        /// Description of the violated constraint
        reason: &'static str,
    },
    /// Routing key with no matching row
    UnknownKey {
        /// Offending key
        key: u32,
    },
    /// Bulk memory access outside the backing store
    MemoryAccess {
        /// Word offset of the access
        offset: u32,
        /// Length of the access in words
        words: usize,
    },
}

impl fmt::Display for SynrowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowTooLong { synapses, max } => {
                write!(f, "Row has {} synapses (max: {})", synapses, max)
            }
            Self::BufferTooSmall { needed, available } => {
                write!(f, "Buffer too small: need {} words, got {}", needed, available)
            }
            Self::NeuronOutOfRange { index, neurons } => {
                write!(f, "Neuron {} out of range ({} neurons)", index, neurons)
            }
            Self::IndexOutOfRange { index, max } => {
                write!(f, "Index {} not encodable (max: {})", index, max)
            }
            Self::DelayOutOfRange { delay, max } => {
                write!(f, "Delay {} out of range (max: {})", delay, max)
            }
            Self::WeightOutOfRange { weight, max } => {
                write!(f, "Weight {} out of range (0..={})", weight, max)
            }
            Self::FormatTooWide { bits, width } => {
                write!(f, "Control format needs {} bits, word has {}", bits, width)
            }
            Self::NonMonotonicTick { tick, last } => {
                write!(f, "Tick {} does not follow last recorded tick {}", tick, last)
            }
            Self::RegionTooShort { needed, available } => {
                write!(f, "Region too short: need {} words, {} remaining", needed, available)
            }
            Self::InvalidRegion { field } => write!(f, "Invalid region field: {}", field),
            Self::InvalidConfig { reason } => write!(f, "Invalid configuration: {}", reason),
            Self::UnknownKey { key } => write!(f, "No row for key {:#x}", key),
            Self::MemoryAccess { offset, words } => {
                write!(f, "Memory access out of bounds: {} words at offset {}", words, offset)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SynrowError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SynrowError::RowTooLong { synapses: 600, max: 512 };
        assert_eq!(err.to_string(), "Row has 600 synapses (max: 512)");

        let err = SynrowError::NonMonotonicTick { tick: 3, last: 5 };
        assert!(err.to_string().contains("last recorded tick 5"));
    }
}
