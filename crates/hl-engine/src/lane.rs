//! Per-lane judgment state.

use core::fmt;

use crate::pool::InstanceId;

/// A hold note currently being held down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeldNote {
    pub id: InstanceId,
    /// Song position at which the hold was entered.
    pub start_time: f64,
    pub duration: f64,
    /// Song position of the last combo tick.
    pub last_tick: f64,
}

impl HeldNote {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

/// Arming a lane that already has a pending note.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArmError {
    Occupied { pending: InstanceId },
}

impl fmt::Display for ArmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArmError::Occupied { pending } => write!(f, "lane already has pending note {:?}", pending),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ArmError {}

/// Judgment state of one lane.
///
/// A lane has at most one pending (armed) note and at most one held note.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LaneState {
    pending: Option<InstanceId>,
    held: Option<HeldNote>,
    pressed: bool,
}

impl LaneState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `id` the lane's pending note. Refuses while another note is pending.
    pub fn arm(&mut self, id: InstanceId) -> Result<(), ArmError> {
        match self.pending {
            Some(pending) => Err(ArmError::Occupied { pending }),
            None => {
                self.pending = Some(id);
                Ok(())
            }
        }
    }

    pub fn pending(&self) -> Option<InstanceId> {
        self.pending
    }

    pub fn take_pending(&mut self) -> Option<InstanceId> {
        self.pending.take()
    }

    pub fn held(&self) -> Option<HeldNote> {
        self.held
    }

    pub fn set_held(&mut self, held: HeldNote) {
        self.held = Some(held);
    }

    pub fn take_held(&mut self) -> Option<HeldNote> {
        self.held.take()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Update the physical input state, returning true if it changed.
    pub fn set_pressed(&mut self, pressed: bool) -> bool {
        let changed = self.pressed != pressed;
        self.pressed = pressed;
        changed
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Pool;

    fn ids() -> (InstanceId, InstanceId) {
        let mut pool = Pool::with_capacity("test", 2);
        (pool.acquire(()), pool.acquire(()))
    }

    #[test]
    fn second_arm_is_rejected() {
        let (a, b) = ids();
        let mut lane = LaneState::new();
        lane.arm(a).unwrap();
        assert_eq!(lane.arm(b), Err(ArmError::Occupied { pending: a }));
        assert_eq!(lane.pending(), Some(a));
    }

    #[test]
    fn take_pending_frees_lane() {
        let (a, b) = ids();
        let mut lane = LaneState::new();
        lane.arm(a).unwrap();
        assert_eq!(lane.take_pending(), Some(a));
        assert!(lane.arm(b).is_ok());
    }

    #[test]
    fn repeated_press_is_not_a_change() {
        let mut lane = LaneState::new();
        assert!(lane.set_pressed(true));
        assert!(!lane.set_pressed(true));
        assert!(lane.set_pressed(false));
    }

    #[test]
    fn clear_resets_everything() {
        let (a, _) = ids();
        let mut lane = LaneState::new();
        lane.arm(a).unwrap();
        lane.set_pressed(true);
        lane.set_held(HeldNote { id: a, start_time: 1.0, duration: 1.0, last_tick: 1.0 });
        lane.clear();
        assert_eq!(lane, LaneState::default());
    }
}
