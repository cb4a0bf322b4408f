//! Connectivity generators
//!
//! A connector chooses, for one pre-synaptic row, which post-synaptic
//! neurons it connects to. Self connections are those whose post index
//! equals the row index.

use std::cell::Cell;
use std::fmt::Debug;

use rand::seq::index;
use rand::Rng;
use rand_core::RngCore;
use synrow_micro::fixed_point::u032_from_probability;

use crate::error::{BuilderError, Result};

/// Produces the post-synaptic indices of one row
pub trait ConnectorGenerator: Debug {
    /// Append the indices of `row` to `indices`
    ///
    /// Connectors may produce more than `max_row_synapses` indices; the
    /// matrix generator rejects such rows rather than truncating them.
    fn generate(
        &self,
        row: u32,
        max_row_synapses: usize,
        num_post_neurons: u32,
        rng: &mut dyn RngCore,
        indices: &mut Vec<u32>,
    ) -> Result<()>;
}

/// Every pre-synaptic neuron connects to every post-synaptic neuron
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllToAll {
    /// Include the connection whose post index equals the row
    pub allow_self_connections: bool,
}

impl ConnectorGenerator for AllToAll {
    fn generate(
        &self,
        row: u32,
        _max_row_synapses: usize,
        num_post_neurons: u32,
        _rng: &mut dyn RngCore,
        indices: &mut Vec<u32>,
    ) -> Result<()> {
        indices.extend(
            (0..num_post_neurons).filter(|&post| self.allow_self_connections || post != row),
        );
        Ok(())
    }
}

/// Row `i` connects to post neuron `i` when it exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OneToOne;

impl ConnectorGenerator for OneToOne {
    fn generate(
        &self,
        row: u32,
        _max_row_synapses: usize,
        num_post_neurons: u32,
        _rng: &mut dyn RngCore,
        indices: &mut Vec<u32>,
    ) -> Result<()> {
        if row < num_post_neurons {
            indices.push(row);
        }
        Ok(())
    }
}

/// Each candidate connection is made independently with a fixed probability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedProbability {
    threshold: u32,
    allow_self_connections: bool,
}

impl FixedProbability {
    /// Create a connector; `probability` must lie in `[0, 1]`
    pub fn new(probability: f64, allow_self_connections: bool) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(BuilderError::invalid_parameter(
                "probability",
                probability,
                "0.0..=1.0",
            ));
        }
        Ok(Self {
            threshold: u032_from_probability(probability),
            allow_self_connections,
        })
    }

    /// Connection probability as a U0.32 threshold
    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

impl ConnectorGenerator for FixedProbability {
    fn generate(
        &self,
        row: u32,
        _max_row_synapses: usize,
        num_post_neurons: u32,
        rng: &mut dyn RngCore,
        indices: &mut Vec<u32>,
    ) -> Result<()> {
        for post in 0..num_post_neurons {
            // One draw per candidate keeps the stream independent of the self flag
            let draw = rng.next_u32();
            if post == row && !self.allow_self_connections {
                continue;
            }
            if self.threshold == u32::MAX || draw < self.threshold {
                indices.push(post);
            }
        }
        Ok(())
    }
}

/// Post neurons `row` may connect to, and whether `row` itself is skipped
fn candidates(row: u32, num_post_neurons: u32, allow_self_connections: bool) -> (u32, bool) {
    let skip_self = !allow_self_connections && row < num_post_neurons;
    (num_post_neurons - skip_self as u32, skip_self)
}

/// Map a candidate position to its post index, stepping over `row`
fn candidate_index(position: u32, row: u32, skip_self: bool) -> u32 {
    if skip_self && position >= row {
        position + 1
    } else {
        position
    }
}

/// Each row connects to a fixed number of post-synaptic neurons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedNumberPost {
    /// Connections per row
    pub number: u32,
    /// Allow the same post neuron to be drawn more than once
    pub with_replacement: bool,
    /// Allow the post neuron whose index equals the row
    pub allow_self_connections: bool,
}

impl ConnectorGenerator for FixedNumberPost {
    fn generate(
        &self,
        row: u32,
        _max_row_synapses: usize,
        num_post_neurons: u32,
        rng: &mut dyn RngCore,
        indices: &mut Vec<u32>,
    ) -> Result<()> {
        if self.number == 0 {
            return Ok(());
        }
        let (available, skip_self) = candidates(row, num_post_neurons, self.allow_self_connections);
        let start = indices.len();
        if self.with_replacement {
            if available == 0 {
                return Err(BuilderError::invalid_parameter(
                    "num_post_neurons",
                    num_post_neurons,
                    format!("at least one post neuron to draw from (row {})", row),
                ));
            }
            for _ in 0..self.number {
                let position = rng.gen_range(0..available);
                indices.push(candidate_index(position, row, skip_self));
            }
        } else {
            if self.number > available {
                return Err(BuilderError::invalid_parameter(
                    "number",
                    self.number,
                    format!("at most {} without replacement (row {})", available, row),
                ));
            }
            let chosen = index::sample(rng, available as usize, self.number as usize);
            indices.extend(
                chosen
                    .into_iter()
                    .map(|position| candidate_index(position as u32, row, skip_self)),
            );
        }
        indices[start..].sort_unstable();
        Ok(())
    }
}

/// Progress of a [`FixedTotalNumber`] connector through its rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TotalProgress {
    next_row: u32,
    remaining_connections: u32,
    remaining_candidates: u64,
}

/// A fixed number of connections spread over the whole projection
///
/// Rows must be generated in order starting from row 0; generating row 0
/// again restarts the projection. Without replacement every candidate
/// pair is selected with equal probability (sequential selection
/// sampling). With replacement each remaining connection lands in the
/// current row with probability proportional to its candidate count and
/// picks a uniform post neuron within it.
#[derive(Debug, Clone)]
pub struct FixedTotalNumber {
    total: u32,
    num_rows: u32,
    num_post_neurons: u32,
    with_replacement: bool,
    allow_self_connections: bool,
    progress: Cell<TotalProgress>,
}

impl FixedTotalNumber {
    /// Create a connector for `num_rows` rows onto `num_post_neurons` neurons
    pub fn new(
        total: u32,
        num_rows: u32,
        num_post_neurons: u32,
        with_replacement: bool,
        allow_self_connections: bool,
    ) -> Result<Self> {
        let connector = Self {
            total,
            num_rows,
            num_post_neurons,
            with_replacement,
            allow_self_connections,
            progress: Cell::new(TotalProgress {
                next_row: 0,
                remaining_connections: 0,
                remaining_candidates: 0,
            }),
        };
        let available = connector.total_candidates();
        if total > 0 && available == 0 {
            return Err(BuilderError::invalid_parameter(
                "total",
                total,
                "a projection with at least one candidate connection",
            ));
        }
        if !with_replacement && u64::from(total) > available {
            return Err(BuilderError::invalid_parameter(
                "total",
                total,
                format!("at most {} without replacement", available),
            ));
        }
        connector.restart();
        Ok(connector)
    }

    /// Connections across the whole projection
    pub fn total(&self) -> u32 {
        self.total
    }

    fn total_candidates(&self) -> u64 {
        (0..self.num_rows)
            .map(|row| {
                u64::from(candidates(row, self.num_post_neurons, self.allow_self_connections).0)
            })
            .sum()
    }

    fn restart(&self) {
        self.progress.set(TotalProgress {
            next_row: 0,
            remaining_connections: self.total,
            remaining_candidates: self.total_candidates(),
        });
    }
}

impl ConnectorGenerator for FixedTotalNumber {
    fn generate(
        &self,
        row: u32,
        _max_row_synapses: usize,
        num_post_neurons: u32,
        rng: &mut dyn RngCore,
        indices: &mut Vec<u32>,
    ) -> Result<()> {
        if num_post_neurons != self.num_post_neurons {
            return Err(BuilderError::invalid_parameter(
                "num_post_neurons",
                num_post_neurons,
                format!("{} as configured for the connector", self.num_post_neurons),
            ));
        }
        if row == 0 {
            self.restart();
        }
        let mut progress = self.progress.get();
        if row != progress.next_row || row >= self.num_rows {
            return Err(BuilderError::invalid_parameter(
                "row",
                row,
                format!("row {} of {} in order", progress.next_row, self.num_rows),
            ));
        }

        let (available, skip_self) = candidates(row, num_post_neurons, self.allow_self_connections);
        let start = indices.len();
        if self.with_replacement && available > 0 {
            let mut placed = 0;
            for _ in 0..progress.remaining_connections {
                if rng.gen_range(0..progress.remaining_candidates) < u64::from(available) {
                    let position = rng.gen_range(0..available);
                    indices.push(candidate_index(position, row, skip_self));
                    placed += 1;
                }
            }
            progress.remaining_connections -= placed;
        } else if !self.with_replacement {
            for position in 0..available {
                if progress.remaining_connections == 0 {
                    break;
                }
                let left = progress.remaining_candidates - u64::from(position);
                if rng.gen_range(0..left) < u64::from(progress.remaining_connections) {
                    indices.push(candidate_index(position, row, skip_self));
                    progress.remaining_connections -= 1;
                }
            }
        }
        progress.remaining_candidates -= u64::from(available);
        progress.next_row += 1;
        self.progress.set(progress);

        indices[start..].sort_unstable();
        Ok(())
    }
}
