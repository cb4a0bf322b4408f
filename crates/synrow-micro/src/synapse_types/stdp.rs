use log::{info, trace};

use super::SynapseType;
use crate::{
    plasticity::{
        FromRegion, SynapseStructure, TimingDependence, TraceWords, WeightDependence, WeightUpdate,
    },
    post_events::{PostEvent, PostEventHistory},
    region::RegionReader,
    row::{
        read_half, write_half, ControlFormat, PlasticRowLayout, RowHeader, RowOffsetLength,
        LAST_PRE_TICK_WORD, LAST_UPDATE_TICK_WORD,
    },
    Result, SynrowConfig, SynrowError, Tick,
};

/// Plastic synapses updated by spike-timing-dependent plasticity
///
/// Rows are updated lazily: a row is only touched when a spike (or a flush)
/// arrives for it, at which point every post-synaptic event since the row's
/// last update is replayed against the row's last genuine pre-synaptic spike.
///
/// The row stores both its last update tick and its last genuine
/// pre-synaptic tick. Windows of post-synaptic events start at the last
/// update, so a flush consumes the events it has replayed and a later spike
/// never replays them again. Pairing always uses the last genuine
/// pre-synaptic spike, which flushes leave unchanged.
///
/// Axonal delay is always zero; the window computation keeps the term so
/// rows can carry one in future.
pub struct StdpSynapse<TD, WD, SS, const D: u32, const I: u32, const HISTORY: usize, const NEURONS: usize>
where
    TD: TimingDependence,
{
    timing: TD,
    weight_dependence: WD,
    post_events: [PostEventHistory<TD::PostTrace, HISTORY>; NEURONS],
    _structure: core::marker::PhantomData<SS>,
}

impl<TD, WD, SS, const D: u32, const I: u32, const HISTORY: usize, const NEURONS: usize>
    StdpSynapse<TD, WD, SS, D, I, HISTORY, NEURONS>
where
    TD: TimingDependence,
    WD: WeightDependence,
    SS: SynapseStructure,
{
    const FORMAT: ControlFormat = ControlFormat::new(D, I);
    const LAYOUT: PlasticRowLayout = PlasticRowLayout::new(<TD::PreTrace as TraceWords>::WORDS);
    const VALID: () = assert!(
        D + I <= 16 && NEURONS > 0 && NEURONS <= 1 << I,
        "Plastic control words must fit 16 bits and address every neuron"
    );

    /// Create from a timing and a weight dependence
    pub fn new(timing: TD, weight_dependence: WD) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID;
        Self {
            timing,
            weight_dependence,
            post_events: core::array::from_fn(|_| PostEventHistory::new()),
            _structure: core::marker::PhantomData,
        }
    }

    /// Read the timing dependence then the weight dependence from a region
    pub fn from_region(reader: &mut RegionReader<'_>) -> Result<Self>
    where
        TD: FromRegion,
        WD: FromRegion,
    {
        let timing = TD::from_region(reader)?;
        let weight_dependence = WD::from_region(reader)?;
        info!("Read STDP configuration ({} words)", reader.position());
        Ok(Self::new(timing, weight_dependence))
    }

    /// Row layout used by this synapse type
    pub const fn layout(&self) -> PlasticRowLayout {
        Self::LAYOUT
    }

    /// Timing dependence
    pub fn timing(&self) -> &TD {
        &self.timing
    }

    /// Weight dependence
    pub fn weight_dependence(&self) -> &WD {
        &self.weight_dependence
    }

    /// Post-synaptic history of `neuron`
    pub fn post_events(&self, neuron: u32) -> Option<&PostEventHistory<TD::PostTrace, HISTORY>> {
        self.post_events.get(neuron as usize)
    }

    /// Check a row before touching it; returns the synapse count
    fn validate_row(&self, row: &[u32]) -> Result<(RowHeader, usize)> {
        let header = RowHeader::read(row)?;
        let count = header.num_synapses;
        if count > <Self as SynapseType>::MAX_ROW_SYNAPSES {
            return Err(SynrowError::RowTooLong {
                synapses: count,
                max: <Self as SynapseType>::MAX_ROW_SYNAPSES,
            });
        }
        let needed = Self::LAYOUT.row_words(count);
        if row.len() < needed {
            return Err(SynrowError::BufferTooSmall { needed, available: row.len() });
        }

        let controls = &row[Self::LAYOUT.control_start(count)..needed];
        for j in 0..count {
            let index = Self::FORMAT.index(read_half(controls, j) as u32);
            if index as usize >= NEURONS {
                return Err(SynrowError::NeuronOutOfRange { index, neurons: NEURONS });
            }
        }
        Ok((header, count))
    }
}

impl<TD, WD, SS, const D: u32, const I: u32, const HISTORY: usize, const NEURONS: usize> SynapseType
    for StdpSynapse<TD, WD, SS, D, I, HISTORY, NEURONS>
where
    TD: TimingDependence,
    WD: WeightDependence,
    SS: SynapseStructure,
{
    const MAX_ROW_SYNAPSES: usize = SynrowConfig::MAX_PLASTIC_ROW_SYNAPSES;
    const MAX_DELAY: u32 = Self::FORMAT.max_delay();

    fn num_neurons(&self) -> usize {
        NEURONS
    }

    fn row_words(&self, num_synapses: usize) -> usize {
        Self::LAYOUT.row_words(num_synapses)
    }

    fn process_row<A, E, W>(
        &mut self,
        tick: Tick,
        row: &mut [u32],
        flush: bool,
        mut apply_input: A,
        mut add_delay_row: E,
        mut write_back: W,
    ) -> Result<()>
    where
        A: FnMut(Tick, u32, u32) -> Result<()>,
        E: FnMut(Tick, RowOffsetLength, bool) -> Result<()>,
        W: FnMut(usize, &[u32]) -> Result<()>,
    {
        let (header, count) = self.validate_row(row)?;
        trace!("\tProcessing STDP row with {} synapses (flush: {})", count, flush);

        if let Some(extension) = header.extension {
            add_delay_row(tick.wrapping_add(extension.delay), extension.row, flush)?;
        }

        let layout = Self::LAYOUT;
        let trace_words = layout.pre_trace_start()..layout.plastic_start();

        let last_update_tick = row[LAST_UPDATE_TICK_WORD];
        row[LAST_UPDATE_TICK_WORD] = tick;

        let last_pre_tick = row[LAST_PRE_TICK_WORD];
        let last_pre_trace = <TD::PreTrace as TraceWords>::read_words(&row[trace_words.clone()]);
        let new_pre_trace = if flush {
            last_pre_trace
        } else {
            let trace = self.timing.update_pre_trace(tick, last_pre_trace, last_pre_tick);
            trace.write_words(&mut row[trace_words]);
            row[LAST_PRE_TICK_WORD] = tick;
            trace
        };

        let plastic_start = layout.plastic_start();
        let control_start = layout.control_start(count);
        let row_end = layout.row_words(count);
        let (state, controls) = row[..row_end].split_at_mut(control_start);
        let plastic = &mut state[plastic_start..];

        for j in 0..count {
            let control = read_half(controls, j) as u32;
            let delay_dendritic = Self::FORMAT.delay(control);
            let delay_axonal = 0;
            let index = Self::FORMAT.index(control);

            let plastic_word = read_half(plastic, j);
            let mut update = WeightUpdate::new(&self.weight_dependence, SS::weight(plastic_word));

            let delayed_last_pre_tick = last_pre_tick.wrapping_add(delay_axonal);
            let window_begin = last_update_tick
                .wrapping_add(delay_axonal)
                .saturating_sub(delay_dendritic);
            let window_end = tick.wrapping_add(delay_axonal).saturating_sub(delay_dendritic);

            let delayed = |event: PostEvent<TD::PostTrace>| PostEvent {
                tick: event.tick.wrapping_add(delay_dendritic),
                trace: event.trace,
            };

            let mut window = self.post_events[index as usize].window(window_begin, window_end);
            loop {
                let prev_post = window.prev().map(delayed);
                let Some(event) = window.next() else { break };
                let post = delayed(event);
                trace!("\t\tApplying post-synaptic event at delayed tick {}", post.tick);
                self.timing.apply_post_spike(
                    &mut update,
                    post,
                    delayed_last_pre_tick,
                    last_pre_trace,
                    prev_post,
                );
            }

            if !flush {
                let delayed_pre_tick = tick.wrapping_add(delay_axonal);
                self.timing.apply_pre_spike(
                    &mut update,
                    delayed_pre_tick,
                    new_pre_trace,
                    delayed_last_pre_tick,
                    last_pre_trace,
                    window.prev().map(delayed),
                );
            }

            let weight = update.finish();
            if !flush {
                apply_input(
                    tick.wrapping_add(delay_dendritic + delay_axonal),
                    index,
                    weight as u32,
                )?;
            }
            write_half(plastic, j, SS::with_weight(plastic_word, weight));
        }

        write_back(LAST_UPDATE_TICK_WORD, &row[LAST_UPDATE_TICK_WORD..control_start])
    }

    fn add_post_synaptic_spike(&mut self, tick: Tick, neuron: u32) -> Result<()> {
        let history = self
            .post_events
            .get_mut(neuron as usize)
            .ok_or(SynrowError::NeuronOutOfRange { index: neuron, neurons: NEURONS })?;

        trace!("Adding post-synaptic event to neuron {} at tick {}", neuron, tick);
        let trace = self.timing.update_post_trace(tick, history.last_event());
        history.add(tick, trace)
    }
}
