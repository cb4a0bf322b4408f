//! Projection configuration
//!
//! A projection is described in TOML:
//!
//! ```toml
//! num_rows = 100
//! num_post_neurons = 64
//! max_row_synapses = 32
//! weight_fixed_point = 4
//! kind = "static"
//! seed = [1, 2, 3, 4]
//!
//! [connector]
//! type = "fixed_probability"
//! probability = 0.1
//!
//! [delay]
//! type = "uniform_int"
//! low = 1
//! high = 7
//!
//! [weight]
//! type = "constant"
//! value = 2.5
//! ```

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use synrow_micro::{ControlFormat, SynrowConfig, S1615};

use crate::connector::{
    AllToAll, ConnectorGenerator, FixedNumberPost, FixedProbability, FixedTotalNumber, OneToOne,
};
use crate::error::{BuilderError, Result};
use crate::matrix::{GenerationSummary, MatrixGenerator, MatrixKind};
use crate::param::{Constant, ParamGenerator, Uniform, UniformInt};
use crate::rng::MarsKiss64;

/// Row layout selected in a configuration file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    /// Static rows
    #[default]
    Static,
    /// Plastic rows
    Plastic,
}

/// Connector selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectorConfig {
    /// See [`AllToAll`]
    AllToAll {
        /// Include self connections
        #[serde(default = "default_true")]
        allow_self_connections: bool,
    },
    /// See [`OneToOne`]
    OneToOne,
    /// See [`FixedProbability`]
    FixedProbability {
        /// Connection probability
        probability: f64,
        /// Include self connections
        #[serde(default = "default_true")]
        allow_self_connections: bool,
    },
    /// See [`FixedNumberPost`]
    FixedNumberPost {
        /// Connections per row
        number: u32,
        /// Draw with replacement
        #[serde(default)]
        with_replacement: bool,
        /// Include self connections
        #[serde(default = "default_true")]
        allow_self_connections: bool,
    },
    /// See [`FixedTotalNumber`]
    FixedTotalNumber {
        /// Connections across the projection
        total: u32,
        /// Draw with replacement
        #[serde(default)]
        with_replacement: bool,
        /// Include self connections
        #[serde(default = "default_true")]
        allow_self_connections: bool,
    },
}

/// Delay or weight generator selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamConfig {
    /// See [`Constant`]
    Constant {
        /// Value
        value: f64,
    },
    /// See [`Uniform`]
    Uniform {
        /// Inclusive lower bound
        low: f64,
        /// Exclusive upper bound
        high: f64,
    },
    /// See [`UniformInt`]
    UniformInt {
        /// Inclusive lower bound
        low: i32,
        /// Inclusive upper bound
        high: i32,
    },
}

fn default_true() -> bool {
    true
}

fn default_pre_trace_words() -> usize {
    1
}

fn default_delay_bits() -> u32 {
    SynrowConfig::DELAY_BITS
}

fn default_index_bits() -> u32 {
    SynrowConfig::INDEX_BITS
}

/// One projection to generate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Pre-synaptic rows
    pub num_rows: u32,
    /// Post-synaptic population size
    pub num_post_neurons: u32,
    /// Maximum synapses per row
    pub max_row_synapses: usize,
    /// Fractional bits of generated weights
    #[serde(default)]
    pub weight_fixed_point: u32,
    /// Generator state words; the default state when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<[u32; 4]>,
    /// Row layout
    #[serde(default)]
    pub kind: RowKind,
    /// Pre-synaptic trace words of plastic rows
    #[serde(default = "default_pre_trace_words")]
    pub pre_trace_words: usize,
    /// Dendritic delay bits
    #[serde(default = "default_delay_bits")]
    pub delay_bits: u32,
    /// Post-synaptic index bits
    #[serde(default = "default_index_bits")]
    pub index_bits: u32,
    /// Connector
    pub connector: ConnectorConfig,
    /// Delay generator
    pub delay: ParamConfig,
    /// Weight generator
    pub weight: ParamConfig,
}

impl ProjectionConfig {
    /// Parse a configuration
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Save to a configuration file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| BuilderError::config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check every generator can be built
    pub fn validate(&self) -> Result<()> {
        self.generator()?;
        self.connector()?;
        self.delay_generator()?;
        self.weight_generator()?;
        Ok(())
    }

    /// Control word format
    pub fn format(&self) -> Result<ControlFormat> {
        let width = match self.kind {
            RowKind::Static => 32,
            RowKind::Plastic => 16,
        };
        let format = ControlFormat::checked(self.delay_bits, self.index_bits, width)?;
        if self.num_post_neurons > format.index_mask() + 1 {
            return Err(BuilderError::config(format!(
                "{} post neurons need more than {} index bits",
                self.num_post_neurons, self.index_bits
            )));
        }
        Ok(format)
    }

    /// Matrix generator for this projection
    pub fn generator(&self) -> Result<MatrixGenerator> {
        let kind = match self.kind {
            RowKind::Static => MatrixKind::Static,
            RowKind::Plastic => MatrixKind::Plastic {
                pre_trace_words: self.pre_trace_words,
            },
        };
        MatrixGenerator::new(
            kind,
            self.format()?,
            self.max_row_synapses,
            self.num_post_neurons,
            self.weight_fixed_point,
        )
    }

    /// Connector for this projection
    pub fn connector(&self) -> Result<Box<dyn ConnectorGenerator>> {
        Ok(match self.connector {
            ConnectorConfig::AllToAll {
                allow_self_connections,
            } => Box::new(AllToAll {
                allow_self_connections,
            }),
            ConnectorConfig::OneToOne => Box::new(OneToOne),
            ConnectorConfig::FixedProbability {
                probability,
                allow_self_connections,
            } => Box::new(FixedProbability::new(probability, allow_self_connections)?),
            ConnectorConfig::FixedNumberPost {
                number,
                with_replacement,
                allow_self_connections,
            } => {
                // Row 0 loses its self candidate when self connections are excluded
                let self_excluded = !allow_self_connections && self.num_rows > 0;
                let available = self.num_post_neurons.saturating_sub(self_excluded as u32);
                if !with_replacement && number > available {
                    return Err(BuilderError::invalid_parameter(
                        "connector.number",
                        number,
                        format!("at most {} candidate post neurons", available),
                    ));
                }
                Box::new(FixedNumberPost {
                    number,
                    with_replacement,
                    allow_self_connections,
                })
            }
            ConnectorConfig::FixedTotalNumber {
                total,
                with_replacement,
                allow_self_connections,
            } => Box::new(FixedTotalNumber::new(
                total,
                self.num_rows,
                self.num_post_neurons,
                with_replacement,
                allow_self_connections,
            )?),
        })
    }

    /// Delay generator for this projection
    pub fn delay_generator(&self) -> Result<Box<dyn ParamGenerator>> {
        build_param("delay", &self.delay)
    }

    /// Weight generator for this projection
    pub fn weight_generator(&self) -> Result<Box<dyn ParamGenerator>> {
        build_param("weight", &self.weight)
    }

    /// Generate the projection's matrix
    pub fn generate(&self) -> Result<(Vec<u32>, GenerationSummary)> {
        let generator = self.generator()?;
        let connector = self.connector()?;
        let delay = self.delay_generator()?;
        let weight = self.weight_generator()?;
        let mut rng = self.seed.map(MarsKiss64::from_state).unwrap_or_default();

        info!(
            "Generating {:?} projection: {} rows onto {} post neurons",
            self.kind, self.num_rows, self.num_post_neurons
        );
        let mut matrix = vec![0u32; generator.matrix_words(self.num_rows)];
        let summary = generator.generate(
            &mut matrix,
            self.num_rows,
            connector.as_ref(),
            delay.as_ref(),
            weight.as_ref(),
            &mut rng,
        )?;
        Ok((matrix, summary))
    }
}

fn build_param(name: &str, config: &ParamConfig) -> Result<Box<dyn ParamGenerator>> {
    let fixed = |value: f64| {
        if value.is_finite() && value.abs() < 65536.0 {
            Ok(S1615::from_float(value))
        } else {
            Err(BuilderError::invalid_parameter(name, value, "a finite S16.15 value"))
        }
    };
    Ok(match *config {
        ParamConfig::Constant { value } => Box::new(Constant { value: fixed(value)? }),
        ParamConfig::Uniform { low, high } => Box::new(Uniform::new(fixed(low)?, fixed(high)?)?),
        ParamConfig::UniformInt { low, high } => Box::new(UniformInt::new(low, high)?),
    })
}
