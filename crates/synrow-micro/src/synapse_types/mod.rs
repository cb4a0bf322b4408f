//! Synapse types: per-row processing of static and plastic rows

mod static_synapse;
mod stdp;

pub use static_synapse::StaticSynapse;
pub use stdp::StdpSynapse;

use crate::{row::RowOffsetLength, Result, Tick};

/// Row processing strategy of a core
///
/// `process_row` is handed one row resident in the working buffer and three
/// callbacks:
///
/// - `apply_input(tick, index, weight)` accumulates input due at `tick`,
/// - `add_delay_row(due_tick, row, flush)` registers a delay extension,
/// - `write_back(word, words)` persists `words` at word offset `word` of the row.
///
/// Rows failing validation are rejected before any callback runs or any word
/// is modified.
pub trait SynapseType {
    /// Largest row accepted
    const MAX_ROW_SYNAPSES: usize;

    /// Largest dendritic delay a control word can carry
    const MAX_DELAY: u32;

    /// Post-synaptic neurons rows may target
    fn num_neurons(&self) -> usize;

    /// Words occupied by a row of `num_synapses`
    fn row_words(&self, num_synapses: usize) -> usize;

    /// Process one row activation
    fn process_row<A, E, W>(
        &mut self,
        tick: Tick,
        row: &mut [u32],
        flush: bool,
        apply_input: A,
        add_delay_row: E,
        write_back: W,
    ) -> Result<()>
    where
        A: FnMut(Tick, u32, u32) -> Result<()>,
        E: FnMut(Tick, RowOffsetLength, bool) -> Result<()>,
        W: FnMut(usize, &[u32]) -> Result<()>;

    /// Record a spike of post-synaptic neuron `neuron` at `tick`
    fn add_post_synaptic_spike(&mut self, tick: Tick, neuron: u32) -> Result<()>;
}
