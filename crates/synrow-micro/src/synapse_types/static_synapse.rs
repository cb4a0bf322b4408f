use log::trace;

use super::SynapseType;
use crate::{
    row::{static_row_words, ControlFormat, RowHeader, STATIC_HEADER_WORDS},
    Result, SynrowConfig, SynrowError, Tick,
};

/// Fixed-weight synapses with the weight packed into the control word
#[derive(Debug, Clone)]
pub struct StaticSynapse<const D: u32, const I: u32> {
    num_neurons: usize,
}

impl<const D: u32, const I: u32> StaticSynapse<D, I> {
    const FORMAT: ControlFormat = ControlFormat::new(D, I);

    /// Static synapses targeting `num_neurons` post-synaptic neurons
    pub fn new(num_neurons: usize) -> Result<Self> {
        if num_neurons == 0 || num_neurons > Self::FORMAT.index_mask() as usize + 1 {
            return Err(SynrowError::InvalidConfig {
                reason: "neuron count must be non-zero and addressable by the index field",
            });
        }
        Ok(Self { num_neurons })
    }
}

impl<const D: u32, const I: u32> SynapseType for StaticSynapse<D, I> {
    const MAX_ROW_SYNAPSES: usize = SynrowConfig::MAX_STATIC_ROW_SYNAPSES;
    const MAX_DELAY: u32 = Self::FORMAT.max_delay();

    fn num_neurons(&self) -> usize {
        self.num_neurons
    }

    fn row_words(&self, num_synapses: usize) -> usize {
        static_row_words(num_synapses)
    }

    fn process_row<A, E, W>(
        &mut self,
        tick: Tick,
        row: &mut [u32],
        flush: bool,
        mut apply_input: A,
        mut add_delay_row: E,
        _write_back: W,
    ) -> Result<()>
    where
        A: FnMut(Tick, u32, u32) -> Result<()>,
        E: FnMut(Tick, crate::row::RowOffsetLength, bool) -> Result<()>,
        W: FnMut(usize, &[u32]) -> Result<()>,
    {
        let header = RowHeader::read(row)?;
        let count = header.num_synapses;
        if count > Self::MAX_ROW_SYNAPSES {
            return Err(SynrowError::RowTooLong { synapses: count, max: Self::MAX_ROW_SYNAPSES });
        }
        let controls = row
            .get(STATIC_HEADER_WORDS..static_row_words(count))
            .ok_or(SynrowError::BufferTooSmall { needed: static_row_words(count), available: row.len() })?;
        if let Some(&bad) = controls
            .iter()
            .find(|&&word| Self::FORMAT.index(word) as usize >= self.num_neurons)
        {
            return Err(SynrowError::NeuronOutOfRange {
                index: Self::FORMAT.index(bad),
                neurons: self.num_neurons,
            });
        }

        trace!("\tProcessing static row with {} synapses", count);

        if let Some(extension) = header.extension {
            add_delay_row(tick.wrapping_add(extension.delay), extension.row, flush)?;
        }

        // Flushes only carry the delay extension
        if flush {
            return Ok(());
        }

        for &word in controls {
            let control = Self::FORMAT.decode_static(word);
            apply_input(tick.wrapping_add(control.delay), control.index, control.weight)?;
        }
        Ok(())
    }

    fn add_post_synaptic_spike(&mut self, _tick: Tick, neuron: u32) -> Result<()> {
        if neuron as usize >= self.num_neurons {
            return Err(SynrowError::NeuronOutOfRange { index: neuron, neurons: self.num_neurons });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::RowOffsetLength;

    type Static = StaticSynapse<3, 10>;

    fn row_of(controls: &[(u32, u32, u32)]) -> Vec<u32> {
        let format = ControlFormat::new(3, 10);
        let mut row = vec![controls.len() as u32, 0, 0];
        for &(index, delay, weight) in controls {
            row.push(format.encode_static(index, delay, weight).unwrap());
        }
        row
    }

    #[test]
    fn test_injects_each_synapse() {
        let mut synapse = Static::new(16).unwrap();
        let mut row = row_of(&[(5, 2, 100), (9, 0, 50)]);
        let mut inputs = Vec::new();

        synapse
            .process_row(
                10,
                &mut row,
                false,
                |tick, index, weight| {
                    inputs.push((tick, index, weight));
                    Ok(())
                },
                |_, _, _| Ok(()),
                |_, _| Ok(()),
            )
            .unwrap();

        assert_eq!(inputs, vec![(12, 5, 100), (10, 9, 50)]);
    }

    #[test]
    fn test_flush_carries_extension_only() {
        let mut synapse = Static::new(16).unwrap();
        let mut row = row_of(&[(1, 0, 10)]);
        let extension = RowOffsetLength::new(1, 40).unwrap();
        row[1] = 12;
        row[2] = extension.to_word();
        let mut delayed = Vec::new();

        synapse
            .process_row(
                100,
                &mut row,
                true,
                |_, _, _| panic!("flush must not inject input"),
                |due, row, flush| {
                    delayed.push((due, row, flush));
                    Ok(())
                },
                |_, _| Ok(()),
            )
            .unwrap();

        assert_eq!(delayed, vec![(112, extension, true)]);
    }

    #[test]
    fn test_rejects_invalid_rows() {
        let mut synapse = Static::new(8).unwrap();

        let mut row = row_of(&[(1, 0, 10), (8, 0, 10)]);
        let result = synapse.process_row(0, &mut row, false, |_, _, _| panic!(), |_, _, _| Ok(()), |_, _| Ok(()));
        assert_eq!(result, Err(SynrowError::NeuronOutOfRange { index: 8, neurons: 8 }));

        let mut short = row_of(&[(1, 0, 10), (2, 0, 10)]);
        short.pop();
        let result = synapse.process_row(0, &mut short, false, |_, _, _| panic!(), |_, _, _| Ok(()), |_, _| Ok(()));
        assert_eq!(result, Err(SynrowError::BufferTooSmall { needed: 5, available: 4 }));

        assert!(Static::new(0).is_err());
        assert!(Static::new(1025).is_err());
    }
}
