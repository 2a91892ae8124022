//! Pooled hit effects.

use alloc::vec;
use alloc::vec::Vec;

use crate::config::PlayConfig;
use crate::judgment::Judgment;
use crate::pool::{InstanceId, Pool};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectKind {
    Perfect,
    Good,
    Miss,
    /// Loops for as long as a hold note is held.
    Hold,
}

impl From<Judgment> for EffectKind {
    fn from(judgment: Judgment) -> Self {
        match judgment {
            Judgment::Perfect => EffectKind::Perfect,
            Judgment::Good => EffectKind::Good,
            Judgment::Miss => EffectKind::Miss,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectInstance {
    pub kind: EffectKind,
    pub lane: u8,
    /// Seconds since the effect started.
    pub age: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectView {
    pub kind: EffectKind,
    pub lane: u8,
    pub age: f64,
}

/// Live effects: one-shot judgment bursts and one hold loop per lane.
pub struct EffectRuntime {
    pool: Pool<EffectInstance>,
    hold_loops: Vec<Option<InstanceId>>,
    lifetime: f64,
}

impl EffectRuntime {
    pub fn new(config: &PlayConfig) -> Self {
        Self {
            pool: Pool::with_capacity("effect", config.effect_pool_size),
            hold_loops: vec![None; config.lane_count as usize],
            lifetime: config.effect_lifetime,
        }
    }

    /// Play the burst for a judgment on `lane`.
    pub fn burst(&mut self, lane: u8, judgment: Judgment) {
        self.pool.acquire(EffectInstance { kind: judgment.into(), lane, age: 0.0 });
    }

    /// Start the hold loop on `lane`, replacing any loop already there.
    pub fn start_hold(&mut self, lane: u8) {
        self.stop_hold(lane);
        let id = self.pool.acquire(EffectInstance { kind: EffectKind::Hold, lane, age: 0.0 });
        if let Some(slot) = self.hold_loops.get_mut(lane as usize) {
            *slot = Some(id);
        }
    }

    pub fn stop_hold(&mut self, lane: u8) {
        if let Some(id) = self.hold_loops.get_mut(lane as usize).and_then(Option::take) {
            self.pool.release(id);
        }
    }

    pub fn is_holding(&self, lane: u8) -> bool {
        self.hold_loops.get(lane as usize).is_some_and(Option::is_some)
    }

    /// Age every effect and release expired bursts.
    pub fn advance(&mut self, dt: f64) {
        let lifetime = self.lifetime;
        self.pool.retain(|_, effect| {
            effect.age += dt;
            effect.kind == EffectKind::Hold || effect.age < lifetime
        });
    }

    pub fn views(&self) -> impl Iterator<Item = EffectView> + '_ {
        self.pool.iter().map(|(_, e)| EffectView { kind: e.kind, lane: e.lane, age: e.age })
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn clear(&mut self) {
        self.pool.clear();
        for slot in &mut self.hold_loops {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bursts_expire_hold_loops_do_not() {
        let mut fx = EffectRuntime::new(&PlayConfig::default());
        fx.burst(0, Judgment::Perfect);
        fx.start_hold(1);
        fx.advance(1.0);
        assert_eq!(fx.active_count(), 1);
        assert!(fx.is_holding(1));
        fx.stop_hold(1);
        assert_eq!(fx.active_count(), 0);
    }

    #[test]
    fn one_hold_loop_per_lane() {
        let mut fx = EffectRuntime::new(&PlayConfig::default());
        fx.start_hold(2);
        fx.start_hold(2);
        assert_eq!(fx.active_count(), 1);
    }
}
