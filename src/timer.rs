//! Virtual-time timer queue.
//!
//! All "concurrency" in the sequencer is delayed callbacks on one queue.
//! Every entry is tagged with the generation it was scheduled under; a
//! popped entry whose generation is no longer current is discarded, which
//! is what makes stale per-shape timers harmless after a run is replaced.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

pub type Generation = u64;

#[derive(Debug)]
struct Entry<E> {
    fire_at: f64,
    seq: u64,
    generation: Generation,
    event: E,
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    // Max-heap on reversed keys: earliest fire time first, insertion order
    // breaking ties so same-instant events fire FIFO.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fire_at
            .total_cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug)]
pub struct TimerQueue<E> {
    heap: BinaryHeap<Entry<E>>,
    seq: u64,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }

    pub fn schedule(&mut self, fire_at: f64, generation: Generation, event: E) {
        self.seq += 1;
        self.heap.push(Entry {
            fire_at,
            seq: self.seq,
            generation,
            event,
        });
    }

    /// Pop the earliest event that is due at `now` and still belongs to the
    /// current generation. Stale entries encountered on the way are dropped.
    pub fn pop_due(&mut self, now: f64, current: Generation) -> Option<E> {
        while let Some(top) = self.heap.peek() {
            if top.generation != current {
                self.heap.pop();
                continue;
            }
            if top.fire_at <= now {
                return self.heap.pop().map(|e| e.event);
            }
            return None;
        }
        None
    }

    /// Fire time of the earliest live entry, for host wake-up scheduling.
    pub fn next_due(&mut self, current: Generation) -> Option<f64> {
        while let Some(top) = self.heap.peek() {
            if top.generation != current {
                self.heap.pop();
                continue;
            }
            return Some(top.fire_at);
        }
        None
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_time_order_with_fifo_ties() {
        let mut q = TimerQueue::new();
        q.schedule(2.0, 1, "late");
        q.schedule(1.0, 1, "first");
        q.schedule(1.0, 1, "second");
        assert_eq!(q.pop_due(5.0, 1), Some("first"));
        assert_eq!(q.pop_due(5.0, 1), Some("second"));
        assert_eq!(q.pop_due(5.0, 1), Some("late"));
        assert_eq!(q.pop_due(5.0, 1), None);
    }

    #[test]
    fn not_due_yet_stays_queued() {
        let mut q = TimerQueue::new();
        q.schedule(3.0, 1, "x");
        assert_eq!(q.pop_due(2.9, 1), None);
        assert!(!q.is_empty());
        assert_eq!(q.pop_due(3.0, 1), Some("x"));
    }

    #[test]
    fn stale_generation_is_discarded() {
        let mut q = TimerQueue::new();
        q.schedule(1.0, 1, "old");
        q.schedule(2.0, 2, "new");
        assert_eq!(q.pop_due(5.0, 2), Some("new"));
        assert!(q.is_empty());
    }

    #[test]
    fn next_due_skips_stale_entries() {
        let mut q = TimerQueue::new();
        q.schedule(1.0, 1, "old");
        q.schedule(4.0, 2, "new");
        assert_eq!(q.next_due(2), Some(4.0));
    }
}
