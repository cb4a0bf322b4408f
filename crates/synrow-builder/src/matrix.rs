//! Synaptic matrix generation
//!
//! A matrix is `num_rows` rows laid out at a fixed stride, the word count of
//! a row holding `max_row_synapses`. Each row is filled by running the
//! connector, then the delay generator, then the weight generator on one
//! shared random stream; that order is part of the reproducibility contract
//! with cores generating the same matrix on chip.

use log::{info, trace};
use rand_core::RngCore;
use synrow_micro::row::{
    static_row_words, write_half, EXTENSION_DELAY_WORD, EXTENSION_ROW_WORD, NUM_SYNAPSES_WORD,
};
use synrow_micro::{ControlFormat, PlasticRowLayout, SynrowConfig, SynrowError};

use crate::connector::ConnectorGenerator;
use crate::error::{BuilderError, Result};
use crate::param::ParamGenerator;

/// Row layout produced by a [`MatrixGenerator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixKind {
    /// 32-bit control words carrying the weight
    Static,
    /// 16-bit weights and control words after a plastic header
    Plastic {
        /// Pre-synaptic trace words reserved per row
        pre_trace_words: usize,
    },
}

/// Counts reported after generating a matrix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Rows generated
    pub rows: u32,
    /// Synapses across all rows
    pub synapses: usize,
    /// Longest row generated
    pub max_row_length: usize,
    /// Words between consecutive rows
    pub row_words: usize,
    /// Words occupied by the whole matrix
    pub total_words: usize,
}

/// Generates static or plastic synaptic matrices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixGenerator {
    kind: MatrixKind,
    format: ControlFormat,
    max_row_synapses: usize,
    num_post_neurons: u32,
    weight_fixed_point: u32,
}

impl MatrixGenerator {
    /// Generator for static rows
    pub fn new_static(
        format: ControlFormat,
        max_row_synapses: usize,
        num_post_neurons: u32,
        weight_fixed_point: u32,
    ) -> Result<Self> {
        Self::new(
            MatrixKind::Static,
            format,
            max_row_synapses,
            num_post_neurons,
            weight_fixed_point,
        )
    }

    /// Generator for plastic rows with `pre_trace_words` of pre-synaptic trace
    pub fn new_plastic(
        format: ControlFormat,
        pre_trace_words: usize,
        max_row_synapses: usize,
        num_post_neurons: u32,
        weight_fixed_point: u32,
    ) -> Result<Self> {
        Self::new(
            MatrixKind::Plastic { pre_trace_words },
            format,
            max_row_synapses,
            num_post_neurons,
            weight_fixed_point,
        )
    }

    /// Generator for `kind` rows
    pub fn new(
        kind: MatrixKind,
        format: ControlFormat,
        max_row_synapses: usize,
        num_post_neurons: u32,
        weight_fixed_point: u32,
    ) -> Result<Self> {
        let limit = match kind {
            MatrixKind::Static => SynrowConfig::MAX_STATIC_ROW_SYNAPSES,
            MatrixKind::Plastic { .. } => {
                let bits = format.delay_bits() + format.index_bits();
                if bits > 16 {
                    return Err(SynrowError::FormatTooWide { bits, width: 16 }.into());
                }
                SynrowConfig::MAX_PLASTIC_ROW_SYNAPSES
            }
        };
        if max_row_synapses > limit {
            return Err(BuilderError::invalid_parameter(
                "max_row_synapses",
                max_row_synapses,
                format!("at most {}", limit),
            ));
        }
        if weight_fixed_point >= 32 {
            return Err(BuilderError::invalid_parameter(
                "weight_fixed_point",
                weight_fixed_point,
                "less than 32",
            ));
        }

        Ok(Self {
            kind,
            format,
            max_row_synapses,
            num_post_neurons,
            weight_fixed_point,
        })
    }

    /// Row layout
    pub fn kind(&self) -> MatrixKind {
        self.kind
    }

    /// Control word format
    pub fn format(&self) -> ControlFormat {
        self.format
    }

    /// Maximum synapses per row
    pub fn max_row_synapses(&self) -> usize {
        self.max_row_synapses
    }

    /// Words occupied by a row of `num_synapses`
    pub fn row_words(&self, num_synapses: usize) -> usize {
        match self.kind {
            MatrixKind::Static => static_row_words(num_synapses),
            MatrixKind::Plastic { pre_trace_words } => {
                PlasticRowLayout::new(pre_trace_words).row_words(num_synapses)
            }
        }
    }

    /// Words between consecutive rows
    pub fn stride(&self) -> usize {
        self.row_words(self.max_row_synapses)
    }

    /// Words occupied by a matrix of `num_rows`
    pub fn matrix_words(&self, num_rows: u32) -> usize {
        self.stride() * num_rows as usize
    }

    /// Fill `matrix` with `num_rows` rows
    ///
    /// Words past the end of each row, up to the stride, are left untouched.
    /// On error the failing row and all following rows are not written.
    pub fn generate(
        &self,
        matrix: &mut [u32],
        num_rows: u32,
        connector: &dyn ConnectorGenerator,
        delay_generator: &dyn ParamGenerator,
        weight_generator: &dyn ParamGenerator,
        rng: &mut dyn RngCore,
    ) -> Result<GenerationSummary> {
        let stride = self.stride();
        let needed = self.matrix_words(num_rows);
        if matrix.len() < needed {
            return Err(BuilderError::BufferTooSmall {
                needed,
                available: matrix.len(),
            });
        }

        let mut indices = Vec::with_capacity(self.max_row_synapses);
        let mut delays = Vec::with_capacity(self.max_row_synapses);
        let mut weights = Vec::with_capacity(self.max_row_synapses);
        let mut scratch = vec![0u32; stride];
        let mut summary = GenerationSummary {
            rows: num_rows,
            row_words: stride,
            total_words: needed,
            ..GenerationSummary::default()
        };

        for row in 0..num_rows {
            trace!("\tRow {}", row);

            trace!("\t\tGenerating indices");
            indices.clear();
            connector.generate(row, self.max_row_synapses, self.num_post_neurons, rng, &mut indices)?;
            let count = indices.len();
            if count > self.max_row_synapses {
                return Err(BuilderError::ConnectorOverflow {
                    row,
                    count,
                    max: self.max_row_synapses,
                });
            }

            trace!("\t\tGenerating delays");
            delays.clear();
            delay_generator.generate(count, 0, rng, &mut delays)?;
            check_count(row, "delay", delays.len(), count)?;

            trace!("\t\tGenerating weights");
            weights.clear();
            weight_generator.generate(count, self.weight_fixed_point, rng, &mut weights)?;
            check_count(row, "weight", weights.len(), count)?;

            let words = self.encode_row(row, &indices, &delays, &weights, &mut scratch)?;
            let start = row as usize * stride;
            matrix[start..start + words].copy_from_slice(&scratch[..words]);

            summary.synapses += count;
            summary.max_row_length = summary.max_row_length.max(count);
        }

        info!(
            "Generated {} rows ({} synapses, longest row {}) at {} words per row",
            summary.rows, summary.synapses, summary.max_row_length, stride
        );
        Ok(summary)
    }

    /// Encode one row into `scratch`, returning its word count
    fn encode_row(
        &self,
        row: u32,
        indices: &[u32],
        delays: &[i32],
        weights: &[i32],
        scratch: &mut [u32],
    ) -> Result<usize> {
        let count = indices.len();
        let words = self.row_words(count);
        scratch[..words].fill(0);
        scratch[NUM_SYNAPSES_WORD] = count as u32;
        scratch[EXTENSION_DELAY_WORD] = 0;
        scratch[EXTENSION_ROW_WORD] = 0;

        let synapses = indices.iter().zip(delays).zip(weights).enumerate();
        match self.kind {
            MatrixKind::Static => {
                for (synapse, ((&index, &delay), &weight)) in synapses {
                    let index = self.check_index(row, index)?;
                    let delay = check_delay(row, synapse, delay)?;
                    let weight = u32::try_from(weight).map_err(|_| {
                        encoding(
                            row,
                            synapse,
                            SynrowError::WeightOutOfRange {
                                weight: weight as i64,
                                max: self.format.max_static_weight() as i64,
                            },
                        )
                    })?;
                    scratch[static_row_words(0) + synapse] = self
                        .format
                        .encode_static(index, delay, weight)
                        .map_err(|source| encoding(row, synapse, source))?;
                }
            }
            MatrixKind::Plastic { pre_trace_words } => {
                let layout = PlasticRowLayout::new(pre_trace_words);
                let plastic_start = layout.plastic_start();
                let control_start = layout.control_start(count);
                for (synapse, ((&index, &delay), &weight)) in synapses {
                    let index = self.check_index(row, index)?;
                    let delay = check_delay(row, synapse, delay)?;
                    let weight = u16::try_from(weight).map_err(|_| {
                        encoding(
                            row,
                            synapse,
                            SynrowError::WeightOutOfRange {
                                weight: weight as i64,
                                max: u16::MAX as i64,
                            },
                        )
                    })?;
                    let control = self
                        .format
                        .encode_plastic(index, delay)
                        .map_err(|source| encoding(row, synapse, source))?;
                    write_half(&mut scratch[plastic_start..control_start], synapse, weight);
                    write_half(&mut scratch[control_start..words], synapse, control);
                }
            }
        }
        Ok(words)
    }

    fn check_index(&self, row: u32, index: u32) -> Result<u32> {
        if index >= self.num_post_neurons {
            return Err(BuilderError::PostIndexOutOfRange {
                row,
                index,
                num_post_neurons: self.num_post_neurons,
            });
        }
        Ok(index)
    }
}

fn check_count(row: u32, generator: &'static str, produced: usize, expected: usize) -> Result<()> {
    if produced != expected {
        return Err(BuilderError::CountMismatch {
            row,
            generator,
            produced,
            expected,
        });
    }
    Ok(())
}

fn check_delay(row: u32, synapse: usize, delay: i32) -> Result<u32> {
    u32::try_from(delay).map_err(|_| {
        BuilderError::invalid_parameter(
            format!("delay (row {}, synapse {})", row, synapse),
            delay,
            "a non-negative tick count",
        )
    })
}

fn encoding(row: u32, synapse: usize, source: SynrowError) -> BuilderError {
    BuilderError::Encoding { row, synapse, source }
}

/// Serialize matrix words as little-endian bytes
pub fn matrix_to_le_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_le_bytes()).collect()
}

/// Deserialize little-endian matrix bytes
pub fn matrix_from_le_bytes(bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        return Err(BuilderError::invalid_format(format!(
            "{} bytes is not a whole number of words",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
