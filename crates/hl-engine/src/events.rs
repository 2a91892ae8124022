//! Session output events.

use heapless::Deque;
use hl_chart::NoteKind;
use log::warn;

use crate::judgment::Judgment;
use crate::pool::InstanceId;
use crate::scheduler::ScheduleError;
use crate::score::SessionReport;

/// Events buffered between two drains.
pub const EVENT_CAPACITY: usize = 256;

/// Something the presentation layer may want to show.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SessionEvent {
    /// The clip has been scheduled and the notes clock started.
    AudioScheduled { start_dsp: f64, audio_delay: f64 },
    StartFailed(ScheduleError),
    NoteSpawned { id: InstanceId, lane: u8, kind: NoteKind },
    NoteRetired { id: InstanceId, lane: u8 },
    Judgment { lane: u8, judgment: Judgment },
    Score { delta: u32, total: u64 },
    Combo(u32),
    AchievementRate(f64),
    HoldStarted { lane: u8 },
    HoldTick { lane: u8, combo: u32 },
    HoldCompleted { lane: u8 },
    HoldBroken { lane: u8 },
    /// A breakpoint reached the judgment line and paused playback.
    BreakpointReached { lane: u8, time: f64 },
    Paused,
    Resumed,
    SongFinished(SessionReport),
    Aborted,
}

/// Fixed-capacity FIFO of session events.
///
/// When full, the oldest event is dropped so the latest state always survives.
pub struct EventBuffer {
    queue: Deque<SessionEvent, EVENT_CAPACITY>,
    dropped: usize,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self { queue: Deque::new(), dropped: 0 }
    }

    pub fn push(&mut self, event: SessionEvent) {
        if let Err(event) = self.queue.push_back(event) {
            self.queue.pop_front();
            self.dropped += 1;
            if self.dropped == 1 {
                warn!("session event buffer full, dropping oldest events");
            }
            let _ = self.queue.push_back(event);
        }
    }

    pub fn pop(&mut self) -> Option<SessionEvent> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Events lost to overflow since creation.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::new()
    }
}
