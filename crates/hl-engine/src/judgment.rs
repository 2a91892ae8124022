//! Judgment engine: matches lane input against armed notes.
//!
//! Per note the lifecycle is `Travelling -> Armed -> {hit, miss}`, with hold
//! notes adding `Armed -> Holding -> {completed, broken}`. A lane arms one
//! note at a time. When a second note enters the trigger zone while an older
//! one is still pending, the newer note waits unarmed until the older one
//! resolves; if it leaves the zone while waiting it counts as a miss.

use alloc::vec::Vec;
use core::fmt;
use hl_chart::NoteKind;
use log::{debug, warn};

use crate::config::PlayConfig;
use crate::effects::EffectRuntime;
use crate::events::{EventBuffer, SessionEvent};
use crate::lane::{HeldNote, LaneState};
use crate::notes::{NoteRuntime, NoteState};
use crate::score::ScoreState;

/// Timing grade of one judged note.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Judgment {
    Perfect,
    Good,
    Miss,
}

impl Judgment {
    pub fn label(self) -> &'static str {
        match self {
            Judgment::Perfect => "Perfect",
            Judgment::Good => "Good",
            Judgment::Miss => "Miss",
        }
    }
}

impl fmt::Display for Judgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Grade a distance from the judgment line against a perfect/good window pair.
fn classify(distance: f64, perfect: f64, good: f64) -> Option<Judgment> {
    if distance < perfect {
        Some(Judgment::Perfect)
    } else if distance < good {
        Some(Judgment::Good)
    } else {
        None
    }
}

/// Lane states and scoring for one session.
pub struct JudgmentEngine {
    lanes: Vec<LaneState>,
    score: ScoreState,
    trigger_distance: f64,
    perfect_distance: f64,
    good_distance: f64,
    hold_perfect_distance: f64,
    hold_good_distance: f64,
    hold_tick_interval: f64,
    perfect_points: u32,
    good_points: u32,
    hold_complete_points: u32,
    note_speed: f64,
}

impl JudgmentEngine {
    pub fn new(config: &PlayConfig) -> Self {
        Self {
            lanes: (0..config.lane_count).map(|_| LaneState::new()).collect(),
            score: ScoreState::new(0),
            trigger_distance: config.trigger_distance,
            perfect_distance: config.perfect_distance,
            good_distance: config.good_distance,
            hold_perfect_distance: config.hold_perfect_distance,
            hold_good_distance: config.hold_good_distance,
            hold_tick_interval: config.hold_tick_interval,
            perfect_points: config.perfect_points,
            good_points: config.good_points,
            hold_complete_points: config.hold_complete_points,
            note_speed: config.note_speed,
        }
    }

    /// Clear every lane and start a fresh score for `total_notes` judged notes.
    pub fn reset(&mut self, total_notes: u32) {
        for lane in &mut self.lanes {
            lane.clear();
        }
        self.score = ScoreState::new(total_notes);
    }

    pub fn score(&self) -> &ScoreState {
        &self.score
    }

    pub fn lane(&self, lane: u8) -> Option<&LaneState> {
        self.lanes.get(lane as usize)
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    fn points(&self, judgment: Judgment) -> u32 {
        match judgment {
            Judgment::Perfect => self.perfect_points,
            Judgment::Good => self.good_points,
            Judgment::Miss => 0,
        }
    }

    /// Advance every lane to `song_position`: hold ticks and completion,
    /// broken holds, notes leaving the trigger zone, then arming.
    pub fn sweep(
        &mut self,
        song_position: f64,
        notes: &mut NoteRuntime,
        effects: &mut EffectRuntime,
        events: &mut EventBuffer,
    ) {
        for lane in 0..self.lanes.len() {
            self.update_hold(lane, song_position, notes, effects, events);
        }
        self.resolve_exits(song_position, notes, effects, events);
        self.arm_lanes(song_position, notes);
    }

    fn update_hold(
        &mut self,
        lane: usize,
        song_position: f64,
        notes: &mut NoteRuntime,
        effects: &mut EffectRuntime,
        events: &mut EventBuffer,
    ) {
        let Some(mut held) = self.lanes[lane].held() else { return };
        let lane_id = lane as u8;

        if !self.lanes[lane].is_pressed() {
            self.lanes[lane].take_held();
            effects.stop_hold(lane_id);
            self.score.miss();
            effects.burst(lane_id, Judgment::Miss);
            events.push(SessionEvent::HoldBroken { lane: lane_id });
            events.push(SessionEvent::Judgment { lane: lane_id, judgment: Judgment::Miss });
            events.push(SessionEvent::Combo(0));
            notes.retire(held.id, events);
            return;
        }

        if self.hold_tick_interval > 0.0 {
            loop {
                let next = held.last_tick + self.hold_tick_interval;
                if next > song_position || next >= held.end_time() {
                    break;
                }
                held.last_tick = next;
                let combo = self.score.add_combo();
                events.push(SessionEvent::HoldTick { lane: lane_id, combo });
                events.push(SessionEvent::Combo(combo));
            }
        }

        if song_position >= held.end_time() {
            self.lanes[lane].take_held();
            effects.stop_hold(lane_id);
            let points = self.hold_complete_points;
            self.score.award(points);
            let combo = self.score.add_combo();
            self.score.register_hit();
            events.push(SessionEvent::HoldCompleted { lane: lane_id });
            events.push(SessionEvent::Judgment { lane: lane_id, judgment: Judgment::Perfect });
            events.push(SessionEvent::Score { delta: points, total: self.score.score() });
            events.push(SessionEvent::Combo(combo));
            events.push(SessionEvent::AchievementRate(self.score.achievement_rate()));
            notes.retire(held.id, events);
        } else {
            self.lanes[lane].set_held(held);
        }
    }

    fn resolve_exits(
        &mut self,
        song_position: f64,
        notes: &mut NoteRuntime,
        effects: &mut EffectRuntime,
        events: &mut EventBuffer,
    ) {
        let speed = self.note_speed;
        let limit = -self.trigger_distance;
        while let Some((id, note)) = notes.earliest(|n| {
            n.kind != NoteKind::Breakpoint
                && n.state != NoteState::Holding
                && n.position(song_position, speed) <= limit
        }) {
            if let Some(lane) = self.lanes.get_mut(note.lane as usize) {
                if lane.pending() == Some(id) {
                    lane.take_pending();
                }
            }
            self.score.miss();
            effects.burst(note.lane, Judgment::Miss);
            events.push(SessionEvent::Judgment { lane: note.lane, judgment: Judgment::Miss });
            events.push(SessionEvent::Combo(0));
            notes.retire(id, events);
        }
    }

    fn arm_lanes(&mut self, song_position: f64, notes: &mut NoteRuntime) {
        let speed = self.note_speed;
        let trigger = self.trigger_distance;
        for (index, lane) in self.lanes.iter_mut().enumerate() {
            let lane_id = index as u8;
            let candidate = notes.earliest(|n| {
                n.lane == lane_id
                    && n.state == NoteState::Travelling
                    && n.kind != NoteKind::Breakpoint
                    && libm::fabs(n.position(song_position, speed)) < trigger
            });
            let Some((id, _)) = candidate else { continue };
            match lane.arm(id) {
                Ok(()) => notes.set_state(id, NoteState::Armed),
                Err(err) => debug!("lane {}: deferring note, {}", lane_id, err),
            }
        }
    }

    /// Handle a press on `lane` at `song_position`.
    pub fn press(
        &mut self,
        lane: u8,
        song_position: f64,
        notes: &mut NoteRuntime,
        effects: &mut EffectRuntime,
        events: &mut EventBuffer,
    ) {
        let index = lane as usize;
        let Some(state) = self.lanes.get_mut(index) else {
            warn!("press on lane {} ignored, only {} lanes", lane, self.lanes.len());
            return;
        };
        if !state.set_pressed(true) || state.held().is_some() {
            return;
        }
        let Some(id) = state.pending() else { return };
        let Some(note) = notes.get(id).copied() else {
            state.take_pending();
            return;
        };

        let distance = libm::fabs(note.position(song_position, self.note_speed));
        match note.kind {
            NoteKind::Tap => {
                let Some(judgment) = classify(distance, self.perfect_distance, self.good_distance)
                else {
                    return;
                };
                self.lanes[index].take_pending();
                let points = self.points(judgment);
                self.score.award(points);
                let combo = self.score.add_combo();
                self.score.register_hit();
                effects.burst(lane, judgment);
                events.push(SessionEvent::Judgment { lane, judgment });
                events.push(SessionEvent::Score { delta: points, total: self.score.score() });
                events.push(SessionEvent::Combo(combo));
                events.push(SessionEvent::AchievementRate(self.score.achievement_rate()));
                notes.retire(id, events);
            }
            NoteKind::Hold => {
                let Some(judgment) =
                    classify(distance, self.hold_perfect_distance, self.hold_good_distance)
                else {
                    return;
                };
                let lane_state = &mut self.lanes[index];
                lane_state.take_pending();
                lane_state.set_held(HeldNote {
                    id,
                    start_time: song_position,
                    duration: note.hold_duration,
                    last_tick: song_position,
                });
                notes.set_state(id, NoteState::Holding);
                let points = self.points(judgment);
                self.score.award(points);
                let combo = self.score.add_combo();
                effects.burst(lane, judgment);
                effects.start_hold(lane);
                events.push(SessionEvent::Judgment { lane, judgment });
                events.push(SessionEvent::HoldStarted { lane });
                events.push(SessionEvent::Score { delta: points, total: self.score.score() });
                events.push(SessionEvent::Combo(combo));
            }
            NoteKind::Breakpoint => {}
        }
    }

    /// Handle a release on `lane`. A held note breaks on the next sweep.
    pub fn release(&mut self, lane: u8) {
        match self.lanes.get_mut(lane as usize) {
            Some(state) => {
                state.set_pressed(false);
            }
            None => warn!("release on lane {} ignored, only {} lanes", lane, self.lanes.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hl_chart::NoteEvent;

    struct Rig {
        judge: JudgmentEngine,
        notes: NoteRuntime,
        effects: EffectRuntime,
        events: EventBuffer,
    }

    impl Rig {
        fn new(chart: &[NoteEvent]) -> Self {
            let config = PlayConfig::default();
            let mut rig = Self {
                judge: JudgmentEngine::new(&config),
                notes: NoteRuntime::new(&config),
                effects: EffectRuntime::new(&config),
                events: EventBuffer::new(),
            };
            rig.notes.load(chart);
            rig.judge.reset(chart.iter().filter(|n| n.is_judged()).count() as u32);
            rig
        }

        fn at(&mut self, t: f64) {
            self.notes.spawn_due(t, &mut self.events);
            self.judge.sweep(t, &mut self.notes, &mut self.effects, &mut self.events);
        }

        fn press(&mut self, lane: u8, t: f64) {
            self.at(t);
            self.judge.press(lane, t, &mut self.notes, &mut self.effects, &mut self.events);
        }

        fn release(&mut self, lane: u8, t: f64) {
            self.at(t);
            self.judge.release(lane);
        }

        fn judgments(&mut self) -> Vec<Judgment> {
            let mut out = Vec::new();
            while let Some(event) = self.events.pop() {
                if let SessionEvent::Judgment { judgment, .. } = event {
                    out.push(judgment);
                }
            }
            out
        }
    }

    #[test]
    fn classify_windows() {
        assert_eq!(classify(1.99, 2.0, 4.0), Some(Judgment::Perfect));
        assert_eq!(classify(2.0, 2.0, 4.0), Some(Judgment::Good));
        assert_eq!(classify(4.0, 2.0, 4.0), None);
    }

    #[test]
    fn tap_on_time_is_perfect() {
        let mut rig = Rig::new(&[NoteEvent::tap(0, 2.0)]);
        rig.press(0, 2.0);
        let score = rig.judge.score();
        assert_eq!(score.score(), 100);
        assert_eq!(score.combo(), 1);
        assert_eq!(score.successful_hits(), 1);
        assert_eq!(rig.judgments(), [Judgment::Perfect]);
        assert_eq!(rig.notes.active_count(), 0);
    }

    #[test]
    fn tap_slightly_late_is_good() {
        let mut rig = Rig::new(&[NoteEvent::tap(0, 2.0)]);
        rig.press(0, 2.3);
        assert_eq!(rig.judge.score().score(), 50);
        assert_eq!(rig.judgments(), [Judgment::Good]);
    }

    #[test]
    fn unpressed_tap_misses_on_exit() {
        let mut rig = Rig::new(&[NoteEvent::tap(0, 1.0), NoteEvent::tap(0, 3.0)]);
        rig.press(0, 1.0);
        rig.release(0, 1.1);
        rig.at(3.5);
        let score = rig.judge.score();
        assert_eq!(score.combo(), 0);
        assert_eq!(score.max_combo(), 1);
        assert!(!score.is_full_combo());
        assert_eq!(rig.judgments(), [Judgment::Perfect, Judgment::Miss]);
    }

    #[test]
    fn press_while_pressed_is_ignored() {
        let mut rig = Rig::new(&[NoteEvent::tap(0, 1.0), NoteEvent::tap(0, 1.2)]);
        rig.press(0, 1.0);
        rig.press(0, 1.2);
        assert_eq!(rig.judge.score().successful_hits(), 1);
    }

    #[test]
    fn hold_completes_after_duration() {
        let mut rig = Rig::new(&[NoteEvent::hold(0, 1.0, 1.0)]);
        rig.press(0, 1.0);
        assert_eq!(rig.judge.score().successful_hits(), 0);
        assert!(rig.effects.is_holding(0));

        let mut t: f64 = 1.0;
        while t < 2.0 {
            t += 1.0 / 60.0;
            rig.at(t.min(2.0));
        }
        rig.release(0, 2.0);

        let score = rig.judge.score();
        assert_eq!(score.score(), 200);
        assert_eq!(score.successful_hits(), 1);
        assert!(score.combo() >= 2);
        assert!(score.is_full_combo());
        assert!(!rig.effects.is_holding(0));
        assert_eq!(rig.notes.active_count(), 0);
        // Head and completion are both labelled.
        assert_eq!(rig.judgments(), [Judgment::Perfect, Judgment::Perfect]);
    }

    #[test]
    fn press_during_hold_is_ignored() {
        let mut rig = Rig::new(&[NoteEvent::hold(0, 1.0, 1.0), NoteEvent::tap(0, 1.5)]);
        rig.press(0, 1.0);
        rig.press(0, 1.5);
        let lane = rig.judge.lane(0).unwrap();
        assert!(lane.held().is_some());
        assert!(lane.pending().is_some());
        assert_eq!(rig.judge.score().score(), 100);
        assert_eq!(rig.judge.score().successful_hits(), 0);
    }

    #[test]
    fn early_release_breaks_hold() {
        let mut rig = Rig::new(&[NoteEvent::hold(0, 1.0, 1.0)]);
        rig.press(0, 1.0);
        rig.release(0, 1.5);
        rig.at(1.51);
        let score = rig.judge.score();
        assert_eq!(score.combo(), 0);
        assert_eq!(score.successful_hits(), 0);
        assert!(!score.is_full_combo());
        assert_eq!(rig.judgments(), [Judgment::Perfect, Judgment::Miss]);
    }

    #[test]
    fn hold_head_outside_hold_window_stays_armed() {
        let mut rig = Rig::new(&[NoteEvent::hold(0, 1.0, 1.0)]);
        // 0.2s early is 2.0 units away: armed, but outside the 1.5 hold window.
        rig.press(0, 0.8);
        assert!(rig.judge.lane(0).unwrap().pending().is_some());
        assert!(rig.judge.lane(0).unwrap().held().is_none());
        assert_eq!(rig.judge.score().score(), 0);
    }

    #[test]
    fn hold_ticks_add_combo_without_score() {
        let mut rig = Rig::new(&[NoteEvent::hold(0, 1.0, 1.0)]);
        rig.press(0, 1.0);
        rig.at(1.35);
        let score = rig.judge.score();
        assert_eq!(score.combo(), 4);
        assert_eq!(score.score(), 100);
    }

    #[test]
    fn newer_note_waits_for_older() {
        // Both notes sit inside the trigger zone at 1.0.
        let mut rig = Rig::new(&[NoteEvent::tap(0, 1.0), NoteEvent::tap(0, 1.2)]);
        rig.at(1.0);
        let first = rig.judge.lane(0).unwrap().pending().unwrap();
        assert_eq!(rig.notes.get(first).unwrap().hit_time, 1.0);

        rig.press(0, 1.0);
        rig.release(0, 1.05);
        rig.at(1.1);
        let second = rig.judge.lane(0).unwrap().pending().unwrap();
        assert_eq!(rig.notes.get(second).unwrap().hit_time, 1.2);
        rig.press(0, 1.2);
        assert_eq!(rig.judge.score().successful_hits(), 2);
    }

    #[test]
    fn deferred_note_leaving_zone_is_missed() {
        let mut rig = Rig::new(&[NoteEvent::tap(0, 1.0), NoteEvent::tap(0, 1.1)]);
        rig.at(1.0);
        rig.at(2.0);
        assert_eq!(rig.judgments(), [Judgment::Miss, Judgment::Miss]);
        assert_eq!(rig.notes.active_count(), 0);
    }

    #[test]
    fn breakpoints_are_never_armed() {
        let mut rig = Rig::new(&[NoteEvent::breakpoint(0, 1.0)]);
        rig.at(1.0);
        assert!(rig.judge.lane(0).unwrap().pending().is_none());
        rig.at(5.0);
        assert!(rig.judgments().is_empty());
    }

    #[test]
    fn invalid_lane_input_is_ignored() {
        let mut rig = Rig::new(&[NoteEvent::tap(0, 1.0)]);
        rig.press(7, 1.0);
        rig.judge.release(7);
        assert_eq!(rig.judge.score().score(), 0);
    }
}
