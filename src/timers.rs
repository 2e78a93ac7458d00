/// Virtual-time timer queue.
///
/// Entries are ordered by due time, then by insertion order, so two timers
/// due at the same instant fire in the order they were scheduled.  Each
/// entry carries the epoch it was scheduled under; the owner compares that
/// against its current epoch and ignores stale entries.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use crate::entities::{ItemId, Millis};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    CountdownTick,
    Spawn,
    ItemLanded(ItemId),
    FeverEnded { activation: u64 },
    MagnetEnded { activation: u64 },
    MagnetSweep { activation: u64 },
    CatchReleased(ItemId),
}

/// Handle returned by `schedule`, usable with `cancel`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// A timer that came due.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fired {
    pub due: Millis,
    pub epoch: u64,
    pub event: TimerEvent,
}

#[derive(Debug, PartialEq, Eq)]
struct Entry {
    due: Millis,
    seq: u64,
    epoch: u64,
    event: TimerEvent,
}

// BinaryHeap is a max-heap; reverse so the earliest (due, seq) pops first.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.due, other.seq).cmp(&(self.due, self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Entry>,
    cancelled: HashSet<u64>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Millis, epoch: u64, event: TimerEvent) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            due,
            seq,
            epoch,
            event,
        });
        TimerHandle(seq)
    }

    pub fn cancel(&mut self, handle: TimerHandle) {
        self.cancelled.insert(handle.0);
    }

    /// Drop every pending entry.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.cancelled.clear();
    }

    /// Pop the earliest live entry due at or before `now`.
    pub fn pop_due(&mut self, now: Millis) -> Option<Fired> {
        while let Some(top) = self.heap.peek() {
            if top.due > now {
                return None;
            }
            let entry = self.heap.pop()?;
            if self.cancelled.remove(&entry.seq) {
                continue;
            }
            return Some(Fired {
                due: entry.due,
                epoch: entry.epoch,
                event: entry.event,
            });
        }
        None
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.heap
            .iter()
            .filter(|e| !self.cancelled.contains(&e.seq))
            .map(|e| e.due)
            .min()
    }

    pub fn len(&self) -> usize {
        self.heap
            .iter()
            .filter(|e| !self.cancelled.contains(&e.seq))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
