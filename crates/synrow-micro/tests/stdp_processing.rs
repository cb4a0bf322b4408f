use std::cell::Cell;

use synrow_micro::plasticity::{Additive, NearestPair, WeightDependence, WeightOnly};
use synrow_micro::row::{read_half, write_half, ControlFormat, LAST_PRE_TICK_WORD, LAST_UPDATE_TICK_WORD};
use synrow_micro::{
    PlasticRowLayout, RowOffsetLength, SliceMemory, StdpSynapse, SynapseProcessor, S2011,
};

/// Additive weight dependence counting every adjustment it receives
struct CountingAdditive {
    inner: Additive,
    potentiations: Cell<u32>,
    depressions: Cell<u32>,
}

impl CountingAdditive {
    fn new() -> Self {
        Self {
            inner: Additive::new(0, 1000, 200, 200).unwrap(),
            potentiations: Cell::new(0),
            depressions: Cell::new(0),
        }
    }
}

impl WeightDependence for CountingAdditive {
    type State = i32;

    fn initial_state(&self, weight: u16) -> i32 {
        self.inner.initial_state(weight)
    }

    fn apply_depression(&self, weight: &mut i32, depression: S2011) {
        self.depressions.set(self.depressions.get() + 1);
        self.inner.apply_depression(weight, depression);
    }

    fn apply_potentiation(&self, weight: &mut i32, potentiation: S2011) {
        self.potentiations.set(self.potentiations.get() + 1);
        self.inner.apply_potentiation(weight, potentiation);
    }

    fn final_weight(&self, weight: i32) -> u16 {
        self.inner.final_weight(weight)
    }
}

const NEURONS: usize = 4;
const KEY: u32 = 0x100;

type Stdp = StdpSynapse<NearestPair<256>, CountingAdditive, WeightOnly, 3, 10, 10, NEURONS>;
type Lookup = fn(u32) -> Option<RowOffsetLength>;
type Processor<'a> = SynapseProcessor<Stdp, Lookup, SliceMemory<'a>, NEURONS, 16, 518>;

const LAYOUT: PlasticRowLayout = PlasticRowLayout::new(1);

fn lookup(key: u32) -> Option<RowOffsetLength> {
    (key == KEY).then(|| RowOffsetLength::new(1, 0).unwrap())
}

/// One plastic synapse onto `index` with the given dendritic delay
fn single_synapse_row(index: u32, delay: u32, weight: u16) -> Vec<u32> {
    let mut row = vec![0u32; LAYOUT.row_words(1)];
    row[0] = 1;
    let control = ControlFormat::new(3, 10).encode_plastic(index, delay).unwrap();
    write_half(&mut row[LAYOUT.plastic_start()..], 0, weight);
    write_half(&mut row[LAYOUT.control_start(1)..], 0, control);
    row
}

fn processor(words: &mut [u32]) -> Processor<'_> {
    let _ = env_logger::Builder::from_default_env().is_test(true).try_init();
    let stdp = Stdp::new(NearestPair::new(16.0, 16.0).unwrap(), CountingAdditive::new());
    Processor::new(stdp, lookup as Lookup, SliceMemory::new(words)).unwrap()
}

fn stored_weight(processor: &Processor<'_>) -> u16 {
    read_half(&processor.memory().words()[LAYOUT.plastic_start()..], 0)
}

fn spike(processor: &mut Processor<'_>, tick: u32) {
    assert!(processor.receive_spike(KEY));
    assert_eq!(processor.timer_tick(tick), 1);
}

#[test]
fn flush_sees_post_event_exactly_once() {
    let mut words = single_synapse_row(2, 3, 500);
    let mut processor = processor(&mut words);

    spike(&mut processor, 10);
    assert_eq!(processor.read_and_clear_input(13, 2).unwrap(), 500);

    processor.add_post_synaptic_spike(12, 2).unwrap();
    processor.process_flush(20, KEY).unwrap();

    let dependence = processor.synapse_type().weight_dependence();
    assert_eq!(dependence.potentiations.get(), 1);
    assert_eq!(dependence.depressions.get(), 0);
    assert!(stored_weight(&processor) > 500);

    // A second flush has nothing new to replay
    let after_first_flush = stored_weight(&processor);
    processor.process_flush(30, KEY).unwrap();
    assert_eq!(processor.synapse_type().weight_dependence().potentiations.get(), 1);
    assert_eq!(stored_weight(&processor), after_first_flush);

    let row = processor.memory().words();
    assert_eq!(row[LAST_UPDATE_TICK_WORD], 30);
    assert_eq!(row[LAST_PRE_TICK_WORD], 10);
    assert_eq!(processor.stats().flushes_processed, 2);
}

#[test]
fn flush_does_not_change_final_weight() {
    let mut flushed_words = single_synapse_row(1, 3, 500);
    let mut plain_words = single_synapse_row(1, 3, 500);
    let mut flushed = processor(&mut flushed_words);
    let mut plain = processor(&mut plain_words);

    spike(&mut flushed, 10);
    spike(&mut plain, 10);
    flushed.add_post_synaptic_spike(12, 1).unwrap();
    plain.add_post_synaptic_spike(12, 1).unwrap();

    flushed.process_flush(20, KEY).unwrap();
    assert_eq!(flushed.memory().words()[LAST_UPDATE_TICK_WORD], 20);
    assert_eq!(plain.memory().words()[LAST_UPDATE_TICK_WORD], 10);

    spike(&mut flushed, 30);
    spike(&mut plain, 30);

    assert_eq!(stored_weight(&flushed), stored_weight(&plain));
    assert_eq!(
        flushed.read_and_clear_input(33, 1).unwrap(),
        plain.read_and_clear_input(33, 1).unwrap()
    );
    assert_eq!(flushed.memory().words(), plain.memory().words());

    let counts = |p: &Processor<'_>| {
        let dependence = p.synapse_type().weight_dependence();
        (dependence.potentiations.get(), dependence.depressions.get())
    };
    assert_eq!(counts(&flushed), (1, 1));
    assert_eq!(counts(&plain), (1, 1));
}

#[test]
fn post_spikes_before_row_depress() {
    let mut words = single_synapse_row(0, 0, 500);
    let mut processor = processor(&mut words);

    processor.add_post_synaptic_spike(8, 0).unwrap();
    spike(&mut processor, 10);

    let input = processor.read_and_clear_input(10, 0).unwrap();
    assert!(input < 500);
    assert_eq!(stored_weight(&processor) as u32, input);
}

#[test]
fn rejected_plastic_row_is_not_written() {
    let mut words = single_synapse_row(7, 0, 500);
    let before = words.clone();
    let mut processor = processor(&mut words);

    assert!(processor.receive_spike(KEY));
    assert_eq!(processor.timer_tick(10), 0);
    assert_eq!(processor.stats().rows_rejected, 1);
    assert_eq!(processor.memory().words(), before.as_slice());
}
