use synrow_micro::plasticity::{Additive, Multiplicative, NearestPair, WeightDependence, WeightOnly};
use synrow_micro::row::{read_half, write_half, ControlFormat};
use synrow_micro::{PlasticRowLayout, RowOffsetLength, SliceMemory, StdpSynapse, SynapseProcessor, S2011};

const NEURONS: usize = 4;
const KEY: u32 = 0x200;
const TARGET: u32 = 1;

type Stdp<W> = StdpSynapse<NearestPair<256>, W, WeightOnly, 3, 10, 10, NEURONS>;
type Lookup = fn(u32) -> Option<RowOffsetLength>;
type Processor<'a, W> = SynapseProcessor<Stdp<W>, Lookup, SliceMemory<'a>, NEURONS, 16, 518>;

const LAYOUT: PlasticRowLayout = PlasticRowLayout::new(1);

fn lookup(key: u32) -> Option<RowOffsetLength> {
    (key == KEY).then(|| RowOffsetLength::new(1, 0).unwrap())
}

fn row(weight: u16) -> Vec<u32> {
    let mut row = vec![0u32; LAYOUT.row_words(1)];
    row[0] = 1;
    let control = ControlFormat::new(3, 10).encode_plastic(TARGET, 3).unwrap();
    write_half(&mut row[LAYOUT.plastic_start()..], 0, weight);
    write_half(&mut row[LAYOUT.control_start(1)..], 0, control);
    row
}

fn spike<W: WeightDependence>(processor: &mut Processor<'_, W>, tick: u32) {
    assert!(processor.receive_spike(KEY));
    assert_eq!(processor.timer_tick(tick), 1);
}

/// Runs pre spikes at 10 and 30 around post spikes, optionally flushing at 20.
/// Returns the row words and the input delivered by the second spike.
fn run<W: WeightDependence>(
    weight_dependence: W,
    weight: u16,
    post_ticks: &[u32],
    flush: bool,
) -> (Vec<u32>, u32) {
    let _ = env_logger::Builder::from_default_env().is_test(true).try_init();
    let mut words = row(weight);
    let stdp = Stdp::new(NearestPair::new(16.0, 16.0).unwrap(), weight_dependence);
    let mut processor: Processor<'_, W> =
        Processor::new(stdp, lookup as Lookup, SliceMemory::new(&mut words)).unwrap();

    for &tick in post_ticks.iter().filter(|&&tick| tick < 10) {
        processor.add_post_synaptic_spike(tick, TARGET).unwrap();
    }
    spike(&mut processor, 10);
    for &tick in post_ticks.iter().filter(|&&tick| tick > 10) {
        processor.add_post_synaptic_spike(tick, TARGET).unwrap();
    }
    if flush {
        processor.process_flush(20, KEY).unwrap();
    }
    spike(&mut processor, 30);

    let input = processor.read_and_clear_input(33, TARGET).unwrap();
    let words = processor.memory().words().to_vec();
    (words, input)
}

fn stored_weight(words: &[u32]) -> u16 {
    read_half(&words[LAYOUT.plastic_start()..], 0)
}

fn assert_flush_invariant<W: WeightDependence + Copy>(
    weight_dependence: W,
    weight: u16,
    post_ticks: &[u32],
) -> u16 {
    let (flushed, flushed_input) = run(weight_dependence, weight, post_ticks, true);
    let (plain, plain_input) = run(weight_dependence, weight, post_ticks, false);
    assert_eq!(stored_weight(&flushed), stored_weight(&plain));
    assert_eq!(flushed_input, plain_input);
    assert_eq!(flushed, plain);
    stored_weight(&plain)
}

#[test]
fn additive_flush_invariant_near_max() {
    let additive = Additive::new(0, 1000, 200, 200).unwrap();
    let weight = assert_flush_invariant(additive, 950, &[12]);
    // Potentiation saturates at the bound before the later depression applies
    assert!(weight < 1000);
    assert!(weight > 900);
}

#[test]
fn additive_flush_invariant_near_min() {
    let additive = Additive::new(0, 1000, 200, 200).unwrap();
    let weight = assert_flush_invariant(additive, 50, &[5, 12]);
    assert!(weight > 0);
}

#[test]
fn multiplicative_flush_invariant_near_max() {
    let rule = Multiplicative::new(0, 1000, S2011::from_int(2), S2011::from_int(2)).unwrap();
    let weight = assert_flush_invariant(rule, 950, &[12]);
    assert!(weight < 1000);
}

#[test]
fn multiplicative_flush_invariant_near_min() {
    let rule = Multiplicative::new(0, 1000, S2011::from_int(2), S2011::from_int(2)).unwrap();
    assert_flush_invariant(rule, 50, &[5, 12]);
}
