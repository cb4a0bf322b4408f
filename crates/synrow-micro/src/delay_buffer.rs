//! Delay-extension buffer
//!
//! Rows whose delay does not fit the control word carry a reference to a
//! continuation row. The reference is held here until its due tick and then
//! re-submitted for processing exactly once, keeping its flush flag.

use heapless::Vec;
use log::{debug, warn};

use crate::{row::RowOffsetLength, Result, SynrowError, Tick};

/// Row reference waiting for its due tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayedRow {
    /// Tick the row becomes due
    pub due: Tick,
    /// Row to process
    pub row: RowOffsetLength,
    /// Whether the originating activation was a flush
    pub flush: bool,
}

#[inline(always)]
fn reached(due: Tick, tick: Tick) -> bool {
    tick.wrapping_sub(due) <= i32::MAX as u32
}

/// Slotted buffer of delayed rows covering the next `SLOTS - 1` ticks
///
/// Slots are drained in tick order by [`DelayBuffer::take_due`]; ticks
/// skipped by the caller are caught up on the next call.
#[derive(Debug)]
pub struct DelayBuffer<const SLOTS: usize, const ROWS: usize> {
    slots: [Vec<DelayedRow, ROWS>; SLOTS],
    next_tick: Option<Tick>,
    num_overflows: u32,
}

impl<const SLOTS: usize, const ROWS: usize> DelayBuffer<SLOTS, ROWS> {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self { slots: core::array::from_fn(|_| Vec::new()), next_tick: None, num_overflows: 0 }
    }

    #[inline(always)]
    fn slot(tick: Tick) -> usize {
        tick as usize % SLOTS
    }

    /// Schedule `row` for delivery at `due`
    ///
    /// `due` must lie in `(now, now + SLOTS)`. Returns `Ok(false)` and counts
    /// an overflow when the due slot is full.
    pub fn add_delay_row(
        &mut self,
        now: Tick,
        due: Tick,
        row: RowOffsetLength,
        flush: bool,
    ) -> Result<bool> {
        let delay = due.wrapping_sub(now);
        if delay == 0 || delay as usize >= SLOTS {
            return Err(SynrowError::DelayOutOfRange { delay, max: SLOTS as u32 - 1 });
        }
        self.next_tick.get_or_insert(now.wrapping_add(1));

        match self.slots[Self::slot(due)].push(DelayedRow { due, row, flush }) {
            Ok(()) => Ok(true),
            Err(_) => {
                self.num_overflows = self.num_overflows.saturating_add(1);
                warn!("Delay buffer slot for tick {} full, dropping row {:#x}", due, row.to_word());
                Ok(false)
            }
        }
    }

    /// Remove and return the rows of the oldest undrained slot up to `tick`
    ///
    /// Returns `None` once every slot up to `tick` has been drained; call
    /// until then to deliver every row due on or before `tick`. Rows
    /// scheduled while draining are kept until they are due.
    pub fn take_due(&mut self, tick: Tick) -> Option<Vec<DelayedRow, ROWS>> {
        let next = self.next_tick.unwrap_or(tick);
        if !reached(next, tick) {
            return None;
        }

        let behind = tick.wrapping_sub(next) as usize;
        let current = if behind >= SLOTS {
            debug!("Delay buffer skipping {} ticks to {}", behind - (SLOTS - 1), tick);
            tick.wrapping_sub(SLOTS as u32 - 1)
        } else {
            next
        };
        self.next_tick = Some(current.wrapping_add(1));

        let mut due = Vec::new();
        self.slots[Self::slot(current)].retain(|delayed| {
            if reached(delayed.due, tick) {
                // Same capacity as the slot
                let _ = due.push(*delayed);
                false
            } else {
                true
            }
        });
        Some(due)
    }

    /// Rows currently waiting
    pub fn len(&self) -> usize {
        self.slots.iter().map(|slot| slot.len()).sum()
    }

    /// No rows waiting
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_empty())
    }

    /// Rows dropped because their slot was full
    pub fn num_overflows(&self) -> u32 {
        self.num_overflows
    }
}

impl<const SLOTS: usize, const ROWS: usize> Default for DelayBuffer<SLOTS, ROWS> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(offset: u32) -> RowOffsetLength {
        RowOffsetLength::new(4, offset).unwrap()
    }

    fn drain(buffer: &mut DelayBuffer<16, 4>, tick: Tick) -> std::vec::Vec<DelayedRow> {
        let mut rows = std::vec::Vec::new();
        while let Some(due) = buffer.take_due(tick) {
            rows.extend_from_slice(&due);
        }
        rows
    }

    #[test]
    fn test_delivered_once_at_due_tick() {
        let mut buffer = DelayBuffer::<16, 4>::new();
        assert!(buffer.add_delay_row(100, 105, row(8), true).unwrap());

        for tick in 101..105 {
            assert!(drain(&mut buffer, tick).is_empty());
        }
        assert_eq!(drain(&mut buffer, 105), vec![DelayedRow { due: 105, row: row(8), flush: true }]);
        assert!(drain(&mut buffer, 105).is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_skipped_ticks_caught_up() {
        let mut buffer = DelayBuffer::<16, 4>::new();
        assert!(buffer.add_delay_row(10, 12, row(0), false).unwrap());
        assert!(buffer.add_delay_row(10, 14, row(4), false).unwrap());
        assert!(buffer.add_delay_row(10, 20, row(8), false).unwrap());

        assert!(drain(&mut buffer, 11).is_empty());
        // Ticks 12 and 13 never serviced
        let due: std::vec::Vec<_> = drain(&mut buffer, 14).iter().map(|d| d.due).collect();
        assert_eq!(due, vec![12, 14]);
        assert_eq!(buffer.len(), 1);

        // Far behind: every slot is drained once
        let due: std::vec::Vec<_> = drain(&mut buffer, 60).iter().map(|d| d.due).collect();
        assert_eq!(due, vec![20]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_rows_added_while_draining_wait() {
        let mut buffer = DelayBuffer::<16, 4>::new();
        assert!(buffer.add_delay_row(0, 1, row(0), false).unwrap());

        // Catching up from tick 1 to tick 3; a row scheduled at 3 for 17
        // shares slot 1 but is not yet due
        let first = buffer.take_due(3).unwrap();
        assert_eq!(first.len(), 1);
        assert!(buffer.add_delay_row(3, 17, row(4), false).unwrap());
        while let Some(due) = buffer.take_due(3) {
            assert!(due.is_empty());
        }
        assert_eq!(buffer.len(), 1);
        assert_eq!(drain(&mut buffer, 17), vec![DelayedRow { due: 17, row: row(4), flush: false }]);
    }

    #[test]
    fn test_rejects_due_outside_window() {
        let mut buffer = DelayBuffer::<16, 4>::new();
        assert!(buffer.add_delay_row(10, 10, row(0), false).is_err());
        assert!(buffer.add_delay_row(10, 26, row(0), false).is_err());
        assert!(buffer.add_delay_row(10, 9, row(0), false).is_err());
        assert!(buffer.add_delay_row(10, 25, row(0), false).unwrap());
    }

    #[test]
    fn test_full_slot_counts_overflow() {
        let mut buffer = DelayBuffer::<4, 1>::new();
        assert!(buffer.add_delay_row(0, 2, row(0), false).unwrap());
        assert!(!buffer.add_delay_row(0, 2, row(1), false).unwrap());

        assert_eq!(buffer.num_overflows(), 1);
        assert_eq!(buffer.len(), 1);
    }
}
