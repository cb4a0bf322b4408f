//! Synapse processor context
//!
//! One [`SynapseProcessor`] per core owns everything row processing touches:
//! the synapse type, the spike input queue, the ring buffer, the
//! delay-extension buffer and the single row working buffer. The network
//! receive path only calls [`SynapseProcessor::receive_spike`]; all row work
//! happens in [`SynapseProcessor::timer_tick`] and
//! [`SynapseProcessor::process_flush`], one row at a time.

use log::{debug, info, trace, warn};

use crate::{
    row::RowOffsetLength, synapse_types::SynapseType, DefaultDelayBuffer, DefaultSpikeInputBuffer,
    Result, RingBuffer, SynrowError, Tick,
};

/// Routing key to row lookup
pub trait KeyLookup {
    /// Row driven by `key`, if any
    fn lookup(&self, key: u32) -> Option<RowOffsetLength>;
}

impl<F> KeyLookup for F
where
    F: Fn(u32) -> Option<RowOffsetLength>,
{
    fn lookup(&self, key: u32) -> Option<RowOffsetLength> {
        self(key)
    }
}

/// Bulk memory holding the synaptic matrix
pub trait RowMemory {
    /// Copy `buffer.len()` words starting at `word_offset` into `buffer`
    fn read_row(&mut self, word_offset: u32, buffer: &mut [u32]) -> Result<()>;

    /// Store `words` at `word_offset`
    fn write_back(&mut self, word_offset: u32, words: &[u32]) -> Result<()>;
}

/// Matrix held in a word slice
#[derive(Debug)]
pub struct SliceMemory<'a> {
    words: &'a mut [u32],
}

impl<'a> SliceMemory<'a> {
    /// Wrap a word slice
    pub fn new(words: &'a mut [u32]) -> Self {
        Self { words }
    }

    /// Current contents
    pub fn words(&self) -> &[u32] {
        self.words
    }

    fn range(&self, word_offset: u32, words: usize) -> Result<core::ops::Range<usize>> {
        let start = word_offset as usize;
        start
            .checked_add(words)
            .filter(|end| *end <= self.words.len())
            .map(|end| start..end)
            .ok_or(SynrowError::MemoryAccess { offset: word_offset, words })
    }
}

impl RowMemory for SliceMemory<'_> {
    fn read_row(&mut self, word_offset: u32, buffer: &mut [u32]) -> Result<()> {
        let range = self.range(word_offset, buffer.len())?;
        buffer.copy_from_slice(&self.words[range]);
        Ok(())
    }

    fn write_back(&mut self, word_offset: u32, words: &[u32]) -> Result<()> {
        let range = self.range(word_offset, words.len())?;
        self.words[range].copy_from_slice(words);
        Ok(())
    }
}

/// Counters of processor activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorStats {
    /// Rows processed for genuine spikes
    pub rows_processed: u32,
    /// Rows processed as flushes
    pub flushes_processed: u32,
    /// Delay-extension rows re-delivered
    pub delayed_rows_processed: u32,
    /// Keys with no matching row
    pub key_misses: u32,
    /// Rows rejected by validation or memory access
    pub rows_rejected: u32,
    /// Spikes dropped because the input queue was full
    pub spike_overflows: u32,
    /// Delay-extension rows dropped because their slot was full
    pub delay_row_overflows: u32,
}

/// Per-core synapse processing context
///
/// `NEURONS` post-synaptic neurons, a ring buffer of `RING_SLOTS` ticks and a
/// working buffer of `ROW_WORDS` words.
pub struct SynapseProcessor<ST, K, M, const NEURONS: usize, const RING_SLOTS: usize, const ROW_WORDS: usize>
{
    synapse_type: ST,
    key_lookup: K,
    memory: M,
    spike_input: DefaultSpikeInputBuffer,
    ring_buffer: RingBuffer<RING_SLOTS, NEURONS>,
    delay_buffer: DefaultDelayBuffer,
    row_buffer: [u32; ROW_WORDS],
    stats: ProcessorStats,
}

impl<ST, K, M, const NEURONS: usize, const RING_SLOTS: usize, const ROW_WORDS: usize>
    SynapseProcessor<ST, K, M, NEURONS, RING_SLOTS, ROW_WORDS>
where
    ST: SynapseType,
    K: KeyLookup,
    M: RowMemory,
{
    /// Create a processor, checking the buffers against the synapse type
    pub fn new(synapse_type: ST, key_lookup: K, memory: M) -> Result<Self> {
        if RING_SLOTS as u64 <= ST::MAX_DELAY as u64 {
            return Err(SynrowError::InvalidConfig {
                reason: "ring buffer must be longer than the maximum delay",
            });
        }
        if synapse_type.num_neurons() > NEURONS {
            return Err(SynrowError::InvalidConfig {
                reason: "synapse type targets more neurons than the ring buffer holds",
            });
        }
        let max_row_words = synapse_type.row_words(ST::MAX_ROW_SYNAPSES);
        if ROW_WORDS < max_row_words {
            return Err(SynrowError::BufferTooSmall { needed: max_row_words, available: ROW_WORDS });
        }

        info!(
            "Synapse processor: {} neurons, {} ring slots, {} row words",
            NEURONS, RING_SLOTS, ROW_WORDS
        );
        Ok(Self {
            synapse_type,
            key_lookup,
            memory,
            spike_input: DefaultSpikeInputBuffer::new(),
            ring_buffer: RingBuffer::new(),
            delay_buffer: DefaultDelayBuffer::new(),
            row_buffer: [0; ROW_WORDS],
            stats: ProcessorStats::default(),
        })
    }

    /// Queue an incoming spike key; bounded work suitable for the receive path
    pub fn receive_spike(&mut self, key: u32) -> bool {
        let queued = self.spike_input.add_spike(key);
        if !queued {
            warn!("Spike input buffer full, dropping key {:#x}", key);
        }
        queued
    }

    /// Process the rows due at `tick`: delay extensions due on or before `tick`
    /// first, then queued spikes
    ///
    /// Returns the number of rows processed. Rejected rows are counted and
    /// skipped.
    pub fn timer_tick(&mut self, tick: Tick) -> usize {
        let mut processed = 0;

        while let Some(due) = self.delay_buffer.take_due(tick) {
            for delayed in due {
                if self.handle_row(tick, delayed.row, delayed.flush) {
                    self.stats.delayed_rows_processed += 1;
                    processed += 1;
                }
            }
        }

        while !self.spike_input.is_empty() {
            let Some(key) = self.spike_input.next_spike() else { break };
            let Some(row) = self.key_lookup.lookup(key) else {
                self.stats.key_misses += 1;
                warn!("No row for key {:#x}", key);
                continue;
            };
            if self.handle_row(tick, row, false) {
                self.stats.rows_processed += 1;
                processed += 1;
            }
        }

        debug!("Tick {}: processed {} rows", tick, processed);
        processed
    }

    /// Re-evaluate the row of `key` without a new spike
    pub fn process_flush(&mut self, tick: Tick, key: u32) -> Result<()> {
        let Some(row) = self.key_lookup.lookup(key) else {
            self.stats.key_misses += 1;
            return Err(SynrowError::UnknownKey { key });
        };
        match self.process_row(tick, row, true) {
            Ok(()) => {
                self.stats.flushes_processed += 1;
                Ok(())
            }
            Err(error) => {
                self.stats.rows_rejected += 1;
                Err(error)
            }
        }
    }

    /// Record a spike of post-synaptic neuron `neuron`
    pub fn add_post_synaptic_spike(&mut self, tick: Tick, neuron: u32) -> Result<()> {
        if neuron as usize >= NEURONS {
            return Err(SynrowError::NeuronOutOfRange { index: neuron, neurons: NEURONS });
        }
        self.synapse_type.add_post_synaptic_spike(tick, neuron)
    }

    /// Take the input accumulated for `neuron` at `tick`
    pub fn read_and_clear_input(&mut self, tick: Tick, neuron: u32) -> Result<u32> {
        self.ring_buffer.read_and_clear(tick, neuron)
    }

    /// Activity counters
    pub fn stats(&self) -> ProcessorStats {
        ProcessorStats {
            spike_overflows: self.spike_input.num_overflows(),
            delay_row_overflows: self.delay_buffer.num_overflows(),
            ..self.stats
        }
    }

    /// Synapse type
    pub fn synapse_type(&self) -> &ST {
        &self.synapse_type
    }

    /// Bulk memory
    pub fn memory(&self) -> &M {
        &self.memory
    }

    fn handle_row(&mut self, tick: Tick, row: RowOffsetLength, flush: bool) -> bool {
        match self.process_row(tick, row, flush) {
            Ok(()) => true,
            Err(error) => {
                self.stats.rows_rejected += 1;
                warn!("Rejected row at offset {}: {}", row.word_offset(), error);
                false
            }
        }
    }

    fn process_row(&mut self, tick: Tick, row: RowOffsetLength, flush: bool) -> Result<()> {
        let Self { synapse_type, memory, ring_buffer, delay_buffer, row_buffer, .. } = self;

        let row_words = synapse_type.row_words(row.num_synapses());
        let buffer = row_buffer
            .get_mut(..row_words)
            .ok_or(SynrowError::BufferTooSmall { needed: row_words, available: ROW_WORDS })?;
        memory.read_row(row.word_offset(), buffer)?;

        trace!("Processing row at offset {} (flush: {})", row.word_offset(), flush);
        synapse_type.process_row(
            tick,
            buffer,
            flush,
            |due, index, weight| ring_buffer.add(due, index, weight),
            |due, extension, extension_flush| {
                delay_buffer.add_delay_row(tick, due, extension, extension_flush).map(|_| ())
            },
            |offset, words| memory.write_back(row.word_offset() + offset as u32, words),
        )
    }
}
