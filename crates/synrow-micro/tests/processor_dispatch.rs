use synrow_micro::{
    DefaultStaticSynapse, RowOffsetLength, SliceMemory, SynapseProcessor, SynrowConfig,
};

const NEURONS: usize = 4;

type Lookup = fn(u32) -> Option<RowOffsetLength>;
type Processor<'a> = SynapseProcessor<DefaultStaticSynapse, Lookup, SliceMemory<'a>, NEURONS, 8, 1027>;

const ROW_A: u32 = 0;
const ROW_B: u32 = 4;
const ROW_BAD: u32 = 8;

fn lookup(key: u32) -> Option<RowOffsetLength> {
    match key {
        1 => RowOffsetLength::new(1, ROW_A).ok(),
        2 => RowOffsetLength::new(1, ROW_B).ok(),
        3 => RowOffsetLength::new(1, ROW_BAD).ok(),
        _ => None,
    }
}

fn control(index: u32, delay: u32, weight: u32) -> u32 {
    SynrowConfig::CONTROL_FORMAT.encode_static(index, delay, weight).unwrap()
}

/// Row A continues into row B five ticks later; the third row targets a missing neuron
fn matrix() -> Vec<u32> {
    let row_b = RowOffsetLength::new(1, ROW_B).unwrap();
    vec![
        1, 5, row_b.to_word(), control(0, 1, 10),
        1, 0, 0, control(1, 0, 20),
        1, 0, 0, control(9, 0, 30),
    ]
}

fn processor(words: &mut [u32]) -> Processor<'_> {
    let _ = env_logger::Builder::from_default_env().is_test(true).try_init();
    Processor::new(DefaultStaticSynapse::new(NEURONS).unwrap(), lookup as Lookup, SliceMemory::new(words))
        .unwrap()
}

#[test]
fn delay_extension_redelivered_once() {
    let mut words = matrix();
    let mut processor = processor(&mut words);

    assert!(processor.receive_spike(1));
    assert_eq!(processor.timer_tick(10), 1);
    assert_eq!(processor.read_and_clear_input(11, 0).unwrap(), 10);

    for tick in 11..15 {
        assert_eq!(processor.timer_tick(tick), 0);
    }
    assert_eq!(processor.timer_tick(15), 1);
    assert_eq!(processor.read_and_clear_input(15, 1).unwrap(), 20);

    for tick in 16..40 {
        assert_eq!(processor.timer_tick(tick), 0);
    }
    let stats = processor.stats();
    assert_eq!(stats.rows_processed, 1);
    assert_eq!(stats.delayed_rows_processed, 1);
}

#[test]
fn delay_extension_delivered_after_skipped_ticks() {
    let mut words = matrix();
    let mut processor = processor(&mut words);

    assert!(processor.receive_spike(1));
    assert_eq!(processor.timer_tick(10), 1);
    assert_eq!(processor.read_and_clear_input(11, 0).unwrap(), 10);

    // Ticks 11 to 16 are never serviced
    assert_eq!(processor.timer_tick(17), 1);
    assert_eq!(processor.read_and_clear_input(17, 1).unwrap(), 20);

    for tick in 18..60 {
        assert_eq!(processor.timer_tick(tick), 0);
    }
    assert_eq!(processor.stats().delayed_rows_processed, 1);
}

#[test]
fn flush_extension_stays_a_flush() {
    let mut words = matrix();
    let mut processor = processor(&mut words);

    processor.process_flush(10, 1).unwrap();
    for tick in 10..=15 {
        processor.timer_tick(tick);
    }

    for tick in 10..=15 {
        for neuron in 0..NEURONS as u32 {
            assert_eq!(processor.read_and_clear_input(tick, neuron).unwrap(), 0);
        }
    }
    assert_eq!(processor.stats().delayed_rows_processed, 1);
    assert_eq!(processor.stats().flushes_processed, 1);
}

#[test]
fn bad_row_rejected_without_stopping_tick() {
    let mut words = matrix();
    let mut processor = processor(&mut words);

    assert!(processor.receive_spike(3));
    assert!(processor.receive_spike(2));
    assert!(processor.receive_spike(99));
    assert_eq!(processor.timer_tick(0), 1);

    assert_eq!(processor.read_and_clear_input(0, 1).unwrap(), 20);
    let stats = processor.stats();
    assert_eq!(stats.rows_rejected, 1);
    assert_eq!(stats.key_misses, 1);
    assert!(processor.process_flush(1, 99).is_err());
}

#[test]
fn spike_input_overflow_counted() {
    let mut words = matrix();
    let mut processor = processor(&mut words);

    for _ in 0..SynrowConfig::SPIKE_INPUT_BUFFER_SIZE {
        assert!(processor.receive_spike(2));
    }
    assert!(!processor.receive_spike(2));
    assert_eq!(processor.stats().spike_overflows, 1);

    assert_eq!(processor.timer_tick(3), SynrowConfig::SPIKE_INPUT_BUFFER_SIZE);
    assert_eq!(
        processor.read_and_clear_input(3, 1).unwrap(),
        20 * SynrowConfig::SPIKE_INPUT_BUFFER_SIZE as u32
    );
}

#[test]
fn post_synaptic_spike_bounds_checked() {
    let mut words = matrix();
    let mut processor = processor(&mut words);

    assert!(processor.add_post_synaptic_spike(0, 3).is_ok());
    assert!(processor.add_post_synaptic_spike(0, 4).is_err());
}
