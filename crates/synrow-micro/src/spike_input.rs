//! Bounded spike input queue
//!
//! Decouples the network receive path, which must return immediately, from
//! row processing. Overflow and underflow are counted, never fatal.

use heapless::Deque;

/// Fixed-capacity FIFO of incoming routing keys
#[derive(Debug)]
pub struct SpikeInputBuffer<const N: usize> {
    keys: Deque<u32, N>,
    num_overflows: u32,
    num_underflows: u32,
}

impl<const N: usize> SpikeInputBuffer<N> {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self { keys: Deque::new(), num_overflows: 0, num_underflows: 0 }
    }

    /// Queue a key; returns false and counts an overflow when full
    #[inline]
    pub fn add_spike(&mut self, key: u32) -> bool {
        match self.keys.push_back(key) {
            Ok(()) => true,
            Err(_) => {
                self.num_overflows = self.num_overflows.saturating_add(1);
                false
            }
        }
    }

    /// Dequeue the oldest key; counts an underflow when empty
    #[inline]
    pub fn next_spike(&mut self) -> Option<u32> {
        let key = self.keys.pop_front();
        if key.is_none() {
            self.num_underflows = self.num_underflows.saturating_add(1);
        }
        key
    }

    /// Queued keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// No keys queued
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Capacity in keys
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Spikes dropped because the buffer was full
    pub fn num_overflows(&self) -> u32 {
        self.num_overflows
    }

    /// Reads attempted on an empty buffer
    pub fn num_underflows(&self) -> u32 {
        self.num_underflows
    }
}

impl<const N: usize> Default for SpikeInputBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut buffer = SpikeInputBuffer::<4>::new();
        assert!(buffer.add_spike(7));
        assert!(buffer.add_spike(3));

        assert_eq!(buffer.next_spike(), Some(7));
        assert_eq!(buffer.next_spike(), Some(3));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_overflow_keeps_contents() {
        let mut buffer = SpikeInputBuffer::<2>::new();
        assert!(buffer.add_spike(1));
        assert!(buffer.add_spike(2));
        assert!(!buffer.add_spike(3));

        assert_eq!(buffer.num_overflows(), 1);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.next_spike(), Some(1));
        assert_eq!(buffer.next_spike(), Some(2));
    }

    #[test]
    fn test_underflow_counted() {
        let mut buffer = SpikeInputBuffer::<2>::new();
        assert_eq!(buffer.next_spike(), None);
        assert_eq!(buffer.next_spike(), None);
        assert_eq!(buffer.num_underflows(), 2);
        assert_eq!(buffer.num_overflows(), 0);
    }
}
