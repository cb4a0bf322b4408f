//! Error types for matrix generation

use synrow_micro::SynrowError;
use thiserror::Error;

/// Result type for builder operations
pub type Result<T> = std::result::Result<T, BuilderError>;

/// Errors raised while configuring or generating a synaptic matrix
#[derive(Error, Debug)]
pub enum BuilderError {
    /// Connector produced more synapses than a row can hold
    #[error("Row {row}: connector produced {count} synapses (max: {max})")]
    ConnectorOverflow {
        /// Row being generated
        row: u32,
        /// Synapses produced
        count: usize,
        /// Maximum synapses per row
        max: usize,
    },

    /// Delay or weight generator produced the wrong number of values
    #[error("Row {row}: {generator} generator produced {produced} values, expected {expected}")]
    CountMismatch {
        /// Row being generated
        row: u32,
        /// Which generator misbehaved
        generator: &'static str,
        /// Values produced
        produced: usize,
        /// Values requested
        expected: usize,
    },

    /// Connector produced an index outside the post-synaptic population
    #[error("Row {row}: post index {index} out of range ({num_post_neurons} post neurons)")]
    PostIndexOutOfRange {
        /// Row being generated
        row: u32,
        /// Offending index
        index: u32,
        /// Post-synaptic population size
        num_post_neurons: u32,
    },

    /// Synapse could not be encoded in the row format
    #[error("Row {row}, synapse {synapse}: {source}")]
    Encoding {
        /// Row being generated
        row: u32,
        /// Synapse within the row
        synapse: usize,
        /// Underlying format error
        #[source]
        source: SynrowError,
    },

    /// Destination matrix buffer is too small
    #[error("Matrix buffer too small: need {needed} words, have {available}")]
    BufferTooSmall {
        /// Words required
        needed: usize,
        /// Words available
        available: usize,
    },

    /// Invalid generator or projection parameter
    #[error("Invalid parameter '{name}': {value} (expected {expected})")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Provided value
        value: String,
        /// Description of valid values
        expected: String,
    },

    /// Invalid projection configuration
    #[error("Configuration error: {reason}")]
    Config {
        /// Reason for the configuration error
        reason: String,
    },

    /// Serialized matrix is malformed
    #[error("Invalid matrix format: {reason}")]
    InvalidFormat {
        /// Reason for invalid format
        reason: String,
    },

    /// Row format error outside a specific synapse
    #[error("Row format error: {0}")]
    Format(#[from] SynrowError),

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        /// Source I/O error
        source: std::io::Error,
    },

    /// Configuration file parse error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl BuilderError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config { reason: reason.into() }
    }

    /// Create an invalid format error
    pub fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidFormat { reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = BuilderError::invalid_parameter("probability", 1.5, "0.0..=1.0");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'probability': 1.5 (expected 0.0..=1.0)"
        );

        let err = BuilderError::Encoding {
            row: 3,
            synapse: 1,
            source: SynrowError::DelayOutOfRange { delay: 9, max: 7 },
        };
        assert_eq!(err.to_string(), "Row 3, synapse 1: Delay 9 out of range (max: 7)");
    }

    #[test]
    fn test_error_conversion() {
        let err: BuilderError = SynrowError::InvalidConfig { reason: "test" }.into();
        assert!(matches!(err, BuilderError::Format(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: BuilderError = io_err.into();
        assert!(matches!(err, BuilderError::Io { .. }));
    }
}
