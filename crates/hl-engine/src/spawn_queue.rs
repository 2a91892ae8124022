//! Spawn queue keyed by `hit_time - travel_time`.

use alloc::vec::Vec;
use hl_chart::NoteEvent;

/// A chart note waiting to be spawned.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnEntry {
    /// Notes-clock time at which the note appears at the spawn point.
    pub spawn_time: f64,
    /// Index of the note in its chart.
    pub chart_index: usize,
    pub note: NoteEvent,
}

/// Chart notes sorted by spawn time.
///
/// During playback, entries are consumed via a cursor that advances forward
/// without removing elements, so the per-frame drain path never allocates.
#[derive(Clone, Debug, Default)]
pub struct SpawnQueue {
    entries: Vec<SpawnEntry>,
    /// Next entry index to spawn (advances during playback).
    cursor: usize,
}

impl SpawnQueue {
    pub fn new() -> Self {
        Self { entries: Vec::new(), cursor: 0 }
    }

    /// Replace the queue contents with `notes`, each spawning `travel_time` early.
    pub fn load(&mut self, notes: &[NoteEvent], travel_time: f64) {
        self.clear();
        self.entries.reserve(notes.len());
        for (chart_index, note) in notes.iter().enumerate() {
            self.push(SpawnEntry {
                spawn_time: note.hit_time - travel_time,
                chart_index,
                note: *note,
            });
        }
    }

    /// Insert an entry after any entries with the same spawn time.
    pub fn push(&mut self, entry: SpawnEntry) {
        let pos = self
            .entries
            .partition_point(|e| e.spawn_time <= entry.spawn_time);
        self.entries.insert(pos, entry);
    }

    /// Return the index range of entries due at or before `time` (cursor-based, zero allocation).
    pub fn drain_until(&mut self, time: f64) -> core::ops::Range<usize> {
        let start = self.cursor;
        while self.cursor < self.entries.len() {
            if self.entries[self.cursor].spawn_time <= time {
                self.cursor += 1;
            } else {
                break;
            }
        }
        start..self.cursor
    }

    /// Get an entry by index (for use with `drain_until` ranges).
    pub fn get(&self, index: usize) -> Option<&SpawnEntry> {
        self.entries.get(index)
    }

    /// Spawn time of the next entry not yet drained.
    pub fn next_spawn_time(&self) -> Option<f64> {
        self.entries.get(self.cursor).map(|e| e.spawn_time)
    }

    /// Entries not yet drained.
    pub fn remaining(&self) -> usize {
        self.entries.len() - self.cursor
    }

    /// Rewind to the first entry (retry without reloading).
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(times: &[f64], travel: f64) -> SpawnQueue {
        let notes: Vec<NoteEvent> = times.iter().map(|&t| NoteEvent::tap(0, t)).collect();
        let mut q = SpawnQueue::new();
        q.load(&notes, travel);
        q
    }

    #[test]
    fn spawn_time_subtracts_travel() {
        let q = queue(&[2.0, 5.0], 3.0);
        assert_eq!(q.get(0).unwrap().spawn_time, -1.0);
        assert_eq!(q.get(1).unwrap().spawn_time, 2.0);
    }

    #[test]
    fn drain_yields_due_notes_as_range() {
        let mut q = queue(&[5.0, 10.0, 15.0], 0.0);
        assert_eq!(q.drain_until(12.0), 0..2);
        assert_eq!(q.next_spawn_time(), Some(15.0));
        assert_eq!(q.drain_until(12.0), 2..2);
        assert_eq!(q.drain_until(20.0), 2..3);
        assert_eq!(q.remaining(), 0);
    }

    #[test]
    fn equal_times_keep_chart_order() {
        let mut q = SpawnQueue::new();
        q.load(&[NoteEvent::tap(2, 1.0), NoteEvent::tap(0, 1.0), NoteEvent::tap(1, 1.0)], 1.0);
        let lanes: Vec<u8> = (0..3).map(|i| q.get(i).unwrap().note.lane).collect();
        assert_eq!(lanes, [2, 0, 1]);
    }

    #[test]
    fn rewound_queue_spawns_again() {
        let mut q = queue(&[1.0], 0.0);
        assert_eq!(q.drain_until(5.0).len(), 1);
        q.reset_cursor();
        assert_eq!(q.drain_until(5.0).len(), 1);
    }
}
