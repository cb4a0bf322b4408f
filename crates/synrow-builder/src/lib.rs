//! # Synrow Builder: Synaptic Matrix Generation
//!
//! Generates the bit-packed synaptic matrices consumed by `synrow-micro`
//! cores. A matrix is produced row by row from three pluggable generators,
//! a connector choosing post-synaptic targets and two parameter generators
//! producing delays and weights, all drawing from one reproducible
//! random stream.
//!
//! ## Quick Start
//!
//! ```rust
//! use synrow_builder::prelude::*;
//! use synrow_micro::{SynrowConfig, S1615};
//!
//! let generator = MatrixGenerator::new_static(SynrowConfig::CONTROL_FORMAT, 4, 4, 0).unwrap();
//! let mut matrix = vec![0u32; generator.matrix_words(4)];
//! let mut rng = MarsKiss64::new();
//!
//! let summary = generator
//!     .generate(
//!         &mut matrix,
//!         4,
//!         &OneToOne,
//!         &Constant { value: S1615::from_int(1) },
//!         &Constant { value: S1615::from_int(10) },
//!         &mut rng,
//!     )
//!     .unwrap();
//! assert_eq!(summary.synapses, 4);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod connector;
pub mod error;
pub mod matrix;
pub mod param;
pub mod rng;

pub use crate::{
    config::{ConnectorConfig, ParamConfig, ProjectionConfig, RowKind},
    connector::{
        AllToAll, ConnectorGenerator, FixedNumberPost, FixedProbability, FixedTotalNumber, OneToOne,
    },
    error::{BuilderError, Result},
    matrix::{matrix_from_le_bytes, matrix_to_le_bytes, GenerationSummary, MatrixGenerator, MatrixKind},
    param::{Constant, ParamGenerator, Uniform, UniformInt},
    rng::MarsKiss64,
};

/// Builder version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        AllToAll, BuilderError, Constant, ConnectorGenerator, FixedNumberPost, FixedProbability,
        FixedTotalNumber, GenerationSummary, MarsKiss64, MatrixGenerator, MatrixKind, OneToOne, ParamGenerator,
        ProjectionConfig, Result, Uniform, UniformInt,
    };
}
