//! Note runtime: spawns chart notes into a pool and retires them.
//!
//! Positions are never integrated. A note's distance from the judgment line
//! is `(hit_time - song_position) * note_speed`, so it is exactly zero at
//! `hit_time` regardless of frame timing.

use hl_chart::{NoteEvent, NoteKind};
use log::warn;

use crate::config::PlayConfig;
use crate::events::{EventBuffer, SessionEvent};
use crate::pool::{InstanceId, Pool};
use crate::spawn_queue::SpawnQueue;

/// Where a live note is in its judgment lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteState {
    /// Approaching, not yet the pending note of its lane.
    Travelling,
    /// The pending note of its lane.
    Armed,
    /// A hold note whose head has been hit.
    Holding,
}

/// A spawned note.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteInstance {
    pub chart_index: usize,
    pub lane: u8,
    pub kind: NoteKind,
    pub hit_time: f64,
    pub hold_duration: f64,
    pub state: NoteState,
}

impl NoteInstance {
    fn from_event(chart_index: usize, note: &NoteEvent) -> Self {
        Self {
            chart_index,
            lane: note.lane,
            kind: note.kind,
            hit_time: note.hit_time,
            hold_duration: note.hold_duration,
            state: NoteState::Travelling,
        }
    }

    /// Signed distance ahead of the judgment line.
    pub fn position(&self, song_position: f64, note_speed: f64) -> f64 {
        (self.hit_time - song_position) * note_speed
    }

    /// Length of the hold band behind the head.
    pub fn tail_length(&self, note_speed: f64) -> f64 {
        self.hold_duration * note_speed
    }
}

/// What a renderer needs to draw one note.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteView {
    pub id: InstanceId,
    pub lane: u8,
    pub kind: NoteKind,
    pub state: NoteState,
    pub position: f64,
    pub tail_length: f64,
}

/// Live notes for one session.
pub struct NoteRuntime {
    pool: Pool<NoteInstance>,
    queue: SpawnQueue,
    lane_count: u8,
    note_speed: f64,
    travel_time: f64,
    cleanup_distance: f64,
}

impl NoteRuntime {
    pub fn new(config: &PlayConfig) -> Self {
        Self {
            pool: Pool::with_capacity("note", config.note_pool_size),
            queue: SpawnQueue::new(),
            lane_count: config.lane_count,
            note_speed: config.note_speed,
            travel_time: config.travel_time(),
            cleanup_distance: config.cleanup_distance,
        }
    }

    /// Queue a chart's notes for spawning and return every live note to the pool.
    pub fn load(&mut self, notes: &[NoteEvent]) {
        self.pool.clear();
        self.queue.load(notes, self.travel_time);
    }

    pub fn travel_time(&self) -> f64 {
        self.travel_time
    }

    pub fn note_speed(&self) -> f64 {
        self.note_speed
    }

    /// Spawn every queued note whose spawn time has arrived.
    pub fn spawn_due(&mut self, song_position: f64, events: &mut EventBuffer) {
        let range = self.queue.drain_until(song_position);
        for index in range {
            let Some(entry) = self.queue.get(index) else { continue };
            let note = entry.note;
            if note.lane >= self.lane_count {
                warn!(
                    "note {} has lane {} but only {} lanes are configured, skipping",
                    entry.chart_index, note.lane, self.lane_count
                );
                continue;
            }
            let id = self
                .pool
                .acquire(NoteInstance::from_event(entry.chart_index, &note));
            events.push(SessionEvent::NoteSpawned { id, lane: note.lane, kind: note.kind });
        }
    }

    /// Return a note to the pool.
    pub fn retire(&mut self, id: InstanceId, events: &mut EventBuffer) -> Option<NoteInstance> {
        let note = self.pool.release(id)?;
        events.push(SessionEvent::NoteRetired { id, lane: note.lane });
        Some(note)
    }

    /// Retire notes whose tail has passed the cleanup boundary. Held notes stay.
    pub fn retire_passed(&mut self, song_position: f64, events: &mut EventBuffer) {
        let speed = self.note_speed;
        let limit = -self.cleanup_distance;
        self.pool.retain(|id, note| {
            let tail_end = note.position(song_position, speed) + note.tail_length(speed);
            let keep = note.state == NoteState::Holding || tail_end >= limit;
            if !keep {
                events.push(SessionEvent::NoteRetired { id, lane: note.lane });
            }
            keep
        });
    }

    /// The live note with the earliest hit time matching `pred`.
    pub fn earliest<F>(&self, pred: F) -> Option<(InstanceId, NoteInstance)>
    where
        F: Fn(&NoteInstance) -> bool,
    {
        self.pool
            .iter()
            .filter(|(_, note)| pred(note))
            .min_by(|(_, a), (_, b)| {
                a.hit_time
                    .total_cmp(&b.hit_time)
                    .then(a.chart_index.cmp(&b.chart_index))
            })
            .map(|(id, note)| (id, *note))
    }

    pub fn get(&self, id: InstanceId) -> Option<&NoteInstance> {
        self.pool.get(id)
    }

    pub fn set_state(&mut self, id: InstanceId, state: NoteState) {
        if let Some(note) = self.pool.get_mut(id) {
            note.state = state;
        }
    }

    pub fn position(&self, id: InstanceId, song_position: f64) -> Option<f64> {
        self.pool
            .get(id)
            .map(|note| note.position(song_position, self.note_speed))
    }

    /// Render views of every live note.
    pub fn views(&self, song_position: f64) -> impl Iterator<Item = NoteView> + '_ {
        let speed = self.note_speed;
        self.pool.iter().map(move |(id, note)| NoteView {
            id,
            lane: note.lane,
            kind: note.kind,
            state: note.state,
            position: note.position(song_position, speed),
            tail_length: note.tail_length(speed),
        })
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn pool_capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn pool_grown(&self) -> usize {
        self.pool.grown()
    }

    /// True once every queued note has spawned and retired.
    pub fn is_drained(&self) -> bool {
        self.queue.remaining() == 0 && self.pool.is_empty()
    }

    /// Return every live note to the pool and rewind the spawn queue.
    pub fn clear(&mut self) {
        self.pool.clear();
        self.queue.reset_cursor();
    }
}
