//! Post-synaptic event history
//!
//! Each post-synaptic neuron keeps a short log of its spike ticks and the
//! trace value after each spike. Rows replay the part of the log falling in
//! their causal window.

use heapless::Deque;

use crate::{Result, SynrowError, Tick};

/// A recorded post-synaptic spike
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostEvent<T> {
    /// Tick of the spike
    pub tick: Tick,
    /// Trace value after the spike
    pub trace: T,
}

/// Fixed-capacity log of post-synaptic events in strictly increasing tick order
///
/// When full, the oldest event is evicted. The most recently evicted event is
/// kept so windows starting after it still see their preceding event.
#[derive(Debug, Clone)]
pub struct PostEventHistory<T, const N: usize> {
    events: Deque<PostEvent<T>, N>,
    evicted: Option<PostEvent<T>>,
}

impl<T: Copy, const N: usize> PostEventHistory<T, N> {
    /// Create an empty history
    pub const fn new() -> Self {
        Self { events: Deque::new(), evicted: None }
    }

    /// Append an event, evicting the oldest at capacity
    pub fn add(&mut self, tick: Tick, trace: T) -> Result<()> {
        if let Some(last) = self.last_event() {
            if tick <= last.tick {
                return Err(SynrowError::NonMonotonicTick { tick, last: last.tick });
            }
        }

        if self.events.is_full() {
            self.evicted = self.events.pop_front();
        }
        if let Err(event) = self.events.push_back(PostEvent { tick, trace }) {
            // Zero capacity: the event is only ever left-edge context
            self.evicted = Some(event);
        }
        Ok(())
    }

    /// Most recent event, including an evicted one
    pub fn last_event(&self) -> Option<PostEvent<T>> {
        self.events.back().copied().or(self.evicted)
    }

    /// Tick of the most recent event
    pub fn last_time(&self) -> Option<Tick> {
        self.last_event().map(|event| event.tick)
    }

    /// Trace of the most recent event
    pub fn last_trace(&self) -> Option<T> {
        self.last_event().map(|event| event.trace)
    }

    /// Stored events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// No events stored
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Stored events, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &PostEvent<T>> {
        self.events.iter()
    }

    fn get(&self, position: usize) -> Option<PostEvent<T>> {
        let (front, back) = self.events.as_slices();
        match front.get(position) {
            Some(event) => Some(*event),
            None => back.get(position - front.len()).copied(),
        }
    }

    /// Cursor over events with tick in `[begin, end)`
    ///
    /// The cursor starts with the event immediately preceding `begin` as its
    /// previous event, or `None` if no such event is known.
    pub fn window(&self, begin: Tick, end: Tick) -> PostEventWindow<'_, T, N> {
        let start = self.iter().take_while(|event| event.tick < begin).count();
        let stop = start + self.iter().skip(start).take_while(|event| event.tick < end).count();
        let prev = match start {
            0 => self.evicted.filter(|event| event.tick < begin),
            _ => self.get(start - 1),
        };
        PostEventWindow { history: self, next: start, end: stop, prev }
    }
}

impl<T: Copy, const N: usize> Default for PostEventHistory<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cursor over a window of post-synaptic events
#[derive(Debug)]
pub struct PostEventWindow<'a, T, const N: usize> {
    history: &'a PostEventHistory<T, N>,
    next: usize,
    end: usize,
    prev: Option<PostEvent<T>>,
}

impl<'a, T: Copy, const N: usize> PostEventWindow<'a, T, N> {
    /// Event preceding the next one to be consumed
    pub fn prev(&self) -> Option<PostEvent<T>> {
        self.prev
    }

    /// Next event without consuming it
    pub fn peek(&self) -> Option<PostEvent<T>> {
        if self.next < self.end {
            self.history.get(self.next)
        } else {
            None
        }
    }

    /// Events remaining in the window
    pub fn num_events(&self) -> usize {
        self.end - self.next
    }
}

impl<'a, T: Copy, const N: usize> Iterator for PostEventWindow<'a, T, N> {
    type Item = PostEvent<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let event = self.peek()?;
        self.next += 1;
        self.prev = Some(event);
        Some(event)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.num_events(), Some(self.num_events()))
    }
}
