//! Score and combo accounting.

/// Running score for one session.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreState {
    score: u64,
    combo: u32,
    max_combo: u32,
    successful_hits: u32,
    total_notes: u32,
    full_combo: bool,
}

impl ScoreState {
    pub fn new(total_notes: u32) -> Self {
        Self {
            score: 0,
            combo: 0,
            max_combo: 0,
            successful_hits: 0,
            total_notes,
            full_combo: true,
        }
    }

    pub fn award(&mut self, points: u32) {
        self.score += points as u64;
    }

    /// Increment the combo, returning the new value.
    pub fn add_combo(&mut self) -> u32 {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.combo
    }

    /// Count a note as successfully hit. Never exceeds the chart's total.
    pub fn register_hit(&mut self) {
        if self.successful_hits < self.total_notes {
            self.successful_hits += 1;
        }
    }

    /// A miss or broken hold: reset the combo and lose the full-combo flag for good.
    pub fn miss(&mut self) {
        self.combo = 0;
        self.full_combo = false;
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn successful_hits(&self) -> u32 {
        self.successful_hits
    }

    pub fn total_notes(&self) -> u32 {
        self.total_notes
    }

    pub fn is_full_combo(&self) -> bool {
        self.full_combo
    }

    /// Successful hits as a percentage of judged notes, in `[0, 100]`.
    pub fn achievement_rate(&self) -> f64 {
        if self.total_notes == 0 {
            return 0.0;
        }
        (self.successful_hits as f64 / self.total_notes as f64 * 100.0).min(100.0)
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            score: self.score,
            max_combo: self.max_combo,
            successful_hits: self.successful_hits,
            total_notes: self.total_notes,
            achievement_rate: self.achievement_rate(),
            full_combo: self.full_combo,
        }
    }
}

/// Final result of a session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionReport {
    pub score: u64,
    pub max_combo: u32,
    pub successful_hits: u32,
    pub total_notes: u32,
    pub achievement_rate: f64,
    pub full_combo: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_chart_rate_is_zero() {
        assert_eq!(ScoreState::new(0).achievement_rate(), 0.0);
    }

    #[test]
    fn full_combo_latches() {
        let mut s = ScoreState::new(3);
        s.add_combo();
        s.register_hit();
        s.miss();
        s.add_combo();
        s.register_hit();
        s.add_combo();
        s.register_hit();
        assert!(!s.is_full_combo());
        assert_eq!(s.combo(), 2);
        assert_eq!(s.max_combo(), 2);
        assert_eq!(s.achievement_rate(), 100.0);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Hit,
        HoldTick,
        Miss,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![Just(Op::Hit), Just(Op::HoldTick), Just(Op::Miss)]
    }

    proptest! {
        #[test]
        fn combo_and_rate_invariants(total in 0u32..50, ops in proptest::collection::vec(op(), 0..200)) {
            let mut s = ScoreState::new(total);
            let mut missed = false;
            for op in ops {
                let before = s.combo();
                match op {
                    Op::Hit => {
                        s.award(100);
                        s.add_combo();
                        s.register_hit();
                        prop_assert_eq!(s.combo(), before + 1);
                    }
                    Op::HoldTick => {
                        s.add_combo();
                        prop_assert_eq!(s.combo(), before + 1);
                    }
                    Op::Miss => {
                        s.miss();
                        missed = true;
                        prop_assert_eq!(s.combo(), 0);
                    }
                }
                prop_assert!(s.max_combo() >= s.combo());
                prop_assert!(s.successful_hits() <= s.total_notes());
                prop_assert!((0.0..=100.0).contains(&s.achievement_rate()));
                prop_assert_eq!(s.is_full_combo(), !missed);
            }
        }
    }
}
