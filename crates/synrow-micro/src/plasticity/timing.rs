//! Timing dependences

use log::trace;

use super::{ExpDecayLut, FromRegion, PlasticityUpdate, TimingDependence};
use crate::{post_events::PostEvent, region::RegionReader, Result, Tick, S2011};

/// Interval from `earlier` to `later`, if strictly positive
#[inline(always)]
fn interval(earlier: Tick, later: Tick) -> Option<Tick> {
    later.checked_sub(earlier).filter(|dt| *dt > 0)
}

/// Nearest-neighbour spike pairing
///
/// Every post-synaptic spike potentiates against the most recent
/// pre-synaptic spike and every pre-synaptic spike depresses against the most
/// recent post-synaptic spike. Traces only mark that a spike has happened and
/// are reset to 1.0 on each spike.
#[derive(Debug, Clone)]
pub struct NearestPair<const N: usize> {
    potentiation: ExpDecayLut<N>,
    depression: ExpDecayLut<N>,
}

impl<const N: usize> NearestPair<N> {
    /// Rule with exponential windows of the given time constants (in ticks)
    pub fn new(tau_plus: f64, tau_minus: f64) -> Result<Self> {
        Ok(Self::from_luts(
            ExpDecayLut::from_time_constant(tau_plus, 0)?,
            ExpDecayLut::from_time_constant(tau_minus, 0)?,
        ))
    }

    /// Rule from prebuilt potentiation and depression tables
    pub fn from_luts(potentiation: ExpDecayLut<N>, depression: ExpDecayLut<N>) -> Self {
        Self { potentiation, depression }
    }
}

impl<const N: usize> TimingDependence for NearestPair<N> {
    type PreTrace = S2011;
    type PostTrace = S2011;

    fn update_pre_trace(&self, _tick: Tick, _last_trace: S2011, _last_tick: Tick) -> S2011 {
        S2011::ONE
    }

    fn update_post_trace(&self, _tick: Tick, _last: Option<PostEvent<S2011>>) -> S2011 {
        S2011::ONE
    }

    fn apply_post_spike<U: PlasticityUpdate>(
        &self,
        update: &mut U,
        post: PostEvent<S2011>,
        last_pre_tick: Tick,
        last_pre_trace: S2011,
        _prev_post: Option<PostEvent<S2011>>,
    ) {
        // Zero trace: no pre-synaptic spike yet
        if last_pre_trace.is_zero() {
            return;
        }
        if let Some(dt) = interval(last_pre_tick, post.tick) {
            let potentiation = self.potentiation.get(dt);
            trace!("\t\tNearest pair potentiation dt={} amount={}", dt, potentiation);
            update.potentiate(potentiation);
        }
    }

    fn apply_pre_spike<U: PlasticityUpdate>(
        &self,
        update: &mut U,
        pre_tick: Tick,
        _pre_trace: S2011,
        _last_pre_tick: Tick,
        _last_pre_trace: S2011,
        prev_post: Option<PostEvent<S2011>>,
    ) {
        if let Some(dt) = prev_post.and_then(|post| interval(post.tick, pre_tick)) {
            let depression = self.depression.get(dt);
            trace!("\t\tNearest pair depression dt={} amount={}", dt, depression);
            update.depress(depression);
        }
    }
}

impl<const N: usize> FromRegion for NearestPair<N> {
    fn from_region(reader: &mut RegionReader<'_>) -> Result<Self> {
        let potentiation = ExpDecayLut::from_region(reader)?;
        let depression = ExpDecayLut::from_region(reader)?;
        Ok(Self::from_luts(potentiation, depression))
    }
}

/// All-to-all spike pairing with exponentially decaying traces
///
/// Each spike decays the previous trace to the current tick and adds 1.0.
/// Post-synaptic spikes potentiate in proportion to the decayed pre trace,
/// pre-synaptic spikes depress in proportion to the decayed post trace.
#[derive(Debug, Clone)]
pub struct Pair<const N: usize> {
    potentiation: ExpDecayLut<N>,
    depression: ExpDecayLut<N>,
}

impl<const N: usize> Pair<N> {
    /// Rule with exponential windows of the given time constants (in ticks)
    pub fn new(tau_plus: f64, tau_minus: f64) -> Result<Self> {
        Ok(Self::from_luts(
            ExpDecayLut::from_time_constant(tau_plus, 0)?,
            ExpDecayLut::from_time_constant(tau_minus, 0)?,
        ))
    }

    /// Rule from prebuilt potentiation and depression tables
    pub fn from_luts(potentiation: ExpDecayLut<N>, depression: ExpDecayLut<N>) -> Self {
        Self { potentiation, depression }
    }
}

impl<const N: usize> TimingDependence for Pair<N> {
    type PreTrace = S2011;
    type PostTrace = S2011;

    fn update_pre_trace(&self, tick: Tick, last_trace: S2011, last_tick: Tick) -> S2011 {
        let decay = self.potentiation.get(tick.wrapping_sub(last_tick));
        last_trace * decay + S2011::ONE
    }

    fn update_post_trace(&self, tick: Tick, last: Option<PostEvent<S2011>>) -> S2011 {
        match last {
            Some(last) => last.trace * self.depression.get(tick.wrapping_sub(last.tick)) + S2011::ONE,
            None => S2011::ONE,
        }
    }

    fn apply_post_spike<U: PlasticityUpdate>(
        &self,
        update: &mut U,
        post: PostEvent<S2011>,
        last_pre_tick: Tick,
        last_pre_trace: S2011,
        _prev_post: Option<PostEvent<S2011>>,
    ) {
        if last_pre_trace.is_zero() {
            return;
        }
        if let Some(dt) = interval(last_pre_tick, post.tick) {
            update.potentiate(last_pre_trace * self.potentiation.get(dt));
        }
    }

    fn apply_pre_spike<U: PlasticityUpdate>(
        &self,
        update: &mut U,
        pre_tick: Tick,
        _pre_trace: S2011,
        _last_pre_tick: Tick,
        _last_pre_trace: S2011,
        prev_post: Option<PostEvent<S2011>>,
    ) {
        if let Some(post) = prev_post {
            if let Some(dt) = interval(post.tick, pre_tick) {
                update.depress(post.trace * self.depression.get(dt));
            }
        }
    }
}

impl<const N: usize> FromRegion for Pair<N> {
    fn from_region(reader: &mut RegionReader<'_>) -> Result<Self> {
        let potentiation = ExpDecayLut::from_region(reader)?;
        let depression = ExpDecayLut::from_region(reader)?;
        Ok(Self::from_luts(potentiation, depression))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        potentiation: Vec<S2011>,
        depression: Vec<S2011>,
    }

    impl PlasticityUpdate for Recorder {
        fn depress(&mut self, depression: S2011) {
            self.depression.push(depression);
        }

        fn potentiate(&mut self, potentiation: S2011) {
            self.potentiation.push(potentiation);
        }
    }

    fn post(tick: Tick) -> PostEvent<S2011> {
        PostEvent { tick, trace: S2011::ONE }
    }

    #[test]
    fn test_nearest_pair_potentiation() {
        let rule = NearestPair::<256>::new(20.0, 20.0).unwrap();
        let mut recorder = Recorder::default();

        rule.apply_post_spike(&mut recorder, post(15), 10, S2011::ONE, None);
        assert_eq!(recorder.potentiation, vec![rule.potentiation.get(5)]);

        // No pre spike yet, or post not after pre
        rule.apply_post_spike(&mut recorder, post(15), 0, S2011::ZERO, None);
        rule.apply_post_spike(&mut recorder, post(10), 10, S2011::ONE, None);
        assert_eq!(recorder.potentiation.len(), 1);
    }

    #[test]
    fn test_nearest_pair_depression() {
        let rule = NearestPair::<256>::new(20.0, 20.0).unwrap();
        let mut recorder = Recorder::default();

        rule.apply_pre_spike(&mut recorder, 30, S2011::ONE, 10, S2011::ONE, Some(post(15)));
        rule.apply_pre_spike(&mut recorder, 30, S2011::ONE, 10, S2011::ONE, None);

        assert_eq!(recorder.depression, vec![rule.depression.get(15)]);
        assert!(recorder.potentiation.is_empty());
    }

    #[test]
    fn test_pair_traces_accumulate() {
        let rule = Pair::<256>::new(20.0, 20.0).unwrap();

        let first = rule.update_pre_trace(10, S2011::ZERO, 0);
        assert_eq!(first, S2011::ONE);

        let second = rule.update_pre_trace(10, first, 10);
        assert_eq!(second, S2011::from_int(2));

        let decayed = rule.update_pre_trace(30, first, 10);
        assert_eq!(decayed, rule.potentiation.get(20) + S2011::ONE);

        assert_eq!(rule.update_post_trace(5, None), S2011::ONE);
    }

    #[test]
    fn test_pair_scaled_by_trace() {
        let rule = Pair::<256>::new(20.0, 20.0).unwrap();
        let mut recorder = Recorder::default();
        let trace = S2011::from_int(2);

        rule.apply_post_spike(&mut recorder, post(12), 10, trace, None);
        assert_eq!(recorder.potentiation, vec![trace * rule.potentiation.get(2)]);
    }

    #[test]
    fn test_from_region() {
        let mut region = vec![0u32];
        region.extend(std::iter::repeat(0x0800_0800).take(2));
        region.push(0);
        region.extend(std::iter::repeat(0x0400_0400).take(2));

        let rule = NearestPair::<4>::from_region(&mut RegionReader::new(&region)).unwrap();
        assert_eq!(rule.potentiation.get(1), S2011::ONE);
        assert_eq!(rule.depression.get(1).to_raw(), 0x400);
    }
}
