//! Timed player status effects.
//!
//! The [`EffectManager`] is the only writer of the player's numeric modifiers.
//! At most one effect per [`EffectKind`] is active: adding a kind that is
//! already present replaces it, reversing the old modifier before the new one
//! is applied so multipliers never compound.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sparkrun_core::render::Rgba;
use sparkrun_core::time::{self, Millis, SimClock};

use crate::config::EffectTuning;
use crate::events::{GameBus, GameEvent};

/// Modifiers below this distance from 1.0 are snapped back to exactly 1.0.
const IDENTITY_EPSILON: f32 = 1e-4;

/// Player status effect kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    SpeedBoost,
    JumpBoost,
    Shield,
    Magnet,
    DoubleJump,
    /// Kinds introduced by level scripts. They carry display data but no modifier.
    Custom(String),
}

/// Which numeric modifier an effect kind scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Speed,
    Jump,
}

impl EffectKind {
    pub fn modifier(&self) -> Option<Modifier> {
        match self {
            EffectKind::SpeedBoost => Some(Modifier::Speed),
            EffectKind::JumpBoost => Some(Modifier::Jump),
            EffectKind::Shield
            | EffectKind::Magnet
            | EffectKind::DoubleJump
            | EffectKind::Custom(_) => None,
        }
    }

    /// Stable string key, used in logs and overlay ids.
    pub fn key(&self) -> &str {
        match self {
            EffectKind::SpeedBoost => "speed_boost",
            EffectKind::JumpBoost => "jump_boost",
            EffectKind::Shield => "shield",
            EffectKind::Magnet => "magnet",
            EffectKind::DoubleJump => "double_jump",
            EffectKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Parameters for a new effect instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    pub name: String,
    pub icon: String,
    pub color: Rgba,
    pub duration: Millis,
    pub multiplier: f32,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl EffectSpec {
    /// Defaults for `kind`, taking durations and multipliers from `tuning`.
    pub fn for_kind(kind: &EffectKind, tuning: &EffectTuning) -> Self {
        let (name, icon, color, duration, multiplier) = match kind {
            EffectKind::SpeedBoost => (
                "Speed Boost",
                "⚡",
                Rgba::from_rgb8(0xff, 0xc1, 0x07),
                tuning.speed_boost_ms,
                tuning.speed_boost_multiplier,
            ),
            EffectKind::JumpBoost => (
                "Super Jump",
                "⬆",
                Rgba::from_rgb8(0x4c, 0xaf, 0x50),
                tuning.jump_boost_ms,
                tuning.jump_boost_multiplier,
            ),
            EffectKind::Shield => (
                "Shield",
                "🛡",
                Rgba::from_rgb8(0x21, 0x96, 0xf3),
                tuning.shield_ms,
                1.0,
            ),
            EffectKind::Magnet => (
                "Magnet",
                "🧲",
                Rgba::from_rgb8(0xe9, 0x1e, 0x63),
                tuning.magnet_ms,
                1.0,
            ),
            EffectKind::DoubleJump => (
                "Double Jump",
                "⇈",
                Rgba::from_rgb8(0x9c, 0x27, 0xb0),
                tuning.double_jump_ms,
                1.0,
            ),
            EffectKind::Custom(name) => (name.as_str(), "★", Rgba::WHITE, tuning.custom_ms, 1.0),
        };
        Self {
            name: name.to_string(),
            icon: icon.to_string(),
            color,
            duration,
            multiplier,
            data: Map::new(),
        }
    }

    pub fn with_multiplier(mut self, multiplier: f32) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_duration(mut self, duration: Millis) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// An effect currently applied to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEffect {
    pub kind: EffectKind,
    pub name: String,
    pub icon: String,
    pub color: Rgba,
    pub start_time: Millis,
    pub duration: Millis,
    pub multiplier: f32,
    pub data: Map<String, Value>,
    pub active: bool,
}

impl PlayerEffect {
    pub fn elapsed(&self, now: Millis) -> Millis {
        (now - self.start_time).max(0.0)
    }

    pub fn remaining(&self, now: Millis) -> Millis {
        time::remaining(self.start_time, self.duration, now)
    }

    pub fn is_expired(&self, now: Millis) -> bool {
        self.elapsed(now) >= self.duration
    }

    /// Fraction of the duration still remaining, in `0..=1`.
    pub fn remaining_fraction(&self, now: Millis) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.remaining(now) / self.duration).clamp(0.0, 1.0)
    }
}

/// Numeric modifiers on the player. Identity is 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerModifiers {
    pub speed: f32,
    pub jump: f32,
}

impl PlayerModifiers {
    pub const IDENTITY: PlayerModifiers = PlayerModifiers {
        speed: 1.0,
        jump: 1.0,
    };

    fn slot(&mut self, modifier: Modifier) -> &mut f32 {
        match modifier {
            Modifier::Speed => &mut self.speed,
            Modifier::Jump => &mut self.jump,
        }
    }

    pub fn get(&self, modifier: Modifier) -> f32 {
        match modifier {
            Modifier::Speed => self.speed,
            Modifier::Jump => self.jump,
        }
    }
}

impl Default for PlayerModifiers {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Tracks the player's active status effects and owns their modifiers.
pub struct EffectManager {
    clock: SimClock,
    effects: Vec<PlayerEffect>,
    modifiers: PlayerModifiers,
    tuning: EffectTuning,
    bus: GameBus,
}

impl EffectManager {
    pub fn new(bus: GameBus, tuning: EffectTuning) -> Self {
        Self {
            clock: SimClock::new(),
            effects: Vec::new(),
            modifiers: PlayerModifiers::IDENTITY,
            tuning,
            bus,
        }
    }

    /// Default parameters for `kind` under this manager's tuning.
    pub fn spec_for(&self, kind: &EffectKind) -> EffectSpec {
        EffectSpec::for_kind(kind, &self.tuning)
    }

    /// Insert or replace the effect for `kind` and publish `EffectAdded`.
    pub fn add_effect(&mut self, kind: EffectKind, spec: EffectSpec) -> &PlayerEffect {
        if let Some(pos) = self.position(&kind) {
            let old = self.effects.remove(pos);
            self.reverse(&old);
            tracing::debug!(kind = %kind, "Replacing active effect");
        }

        let multiplier = if spec.multiplier.is_finite() && spec.multiplier > 0.0 {
            spec.multiplier
        } else {
            tracing::warn!(
                kind = %kind,
                multiplier = spec.multiplier,
                "Rejecting non-positive multiplier"
            );
            1.0
        };

        let effect = PlayerEffect {
            kind,
            name: spec.name,
            icon: spec.icon,
            color: spec.color,
            start_time: self.clock.now(),
            duration: spec.duration.max(0.0),
            multiplier,
            data: spec.data,
            active: true,
        };
        self.apply(&effect);
        tracing::debug!(
            kind = %effect.kind,
            duration = effect.duration,
            multiplier,
            "Effect added"
        );

        self.effects.push(effect.clone());
        self.bus.publish(GameEvent::EffectAdded(effect));
        let last = self.effects.len() - 1;
        &self.effects[last]
    }

    /// Convenience for `add_effect(kind, spec_for(kind))`.
    pub fn add_default_effect(&mut self, kind: EffectKind) -> &PlayerEffect {
        let spec = self.spec_for(&kind);
        self.add_effect(kind, spec)
    }

    /// Remove the effect for `kind`, reversing its modifier. No-op when absent.
    pub fn remove_effect(&mut self, kind: &EffectKind) -> Option<PlayerEffect> {
        let pos = self.position(kind)?;
        let mut effect = self.effects.remove(pos);
        effect.active = false;
        self.reverse(&effect);
        tracing::debug!(kind = %effect.kind, "Effect removed");
        self.bus.publish(GameEvent::EffectRemoved(effect.clone()));
        Some(effect)
    }

    /// Advance the clock by `delta` and remove every expired effect.
    ///
    /// Expired kinds are collected first and removed after the scan.
    pub fn update(&mut self, delta: Millis) -> Vec<EffectKind> {
        let now = self.clock.advance(delta);
        let expired: Vec<EffectKind> = self
            .effects
            .iter()
            .filter(|e| e.active && e.is_expired(now))
            .map(|e| e.kind.clone())
            .collect();
        for kind in &expired {
            self.remove_effect(kind);
        }
        expired
    }

    /// Reverse and remove every effect, then reset modifiers to identity.
    pub fn clear(&mut self) {
        let kinds: Vec<EffectKind> = self.effects.iter().map(|e| e.kind.clone()).collect();
        for kind in &kinds {
            self.remove_effect(kind);
        }
        self.modifiers = PlayerModifiers::IDENTITY;
    }

    pub fn active_effects(&self) -> &[PlayerEffect] {
        &self.effects
    }

    pub fn effect(&self, kind: &EffectKind) -> Option<&PlayerEffect> {
        self.effects.iter().find(|e| &e.kind == kind)
    }

    /// Milliseconds left on `kind`, or 0 if it is not active.
    pub fn remaining_time(&self, kind: &EffectKind) -> Millis {
        self.effect(kind)
            .map(|e| e.remaining(self.clock.now()))
            .unwrap_or(0.0)
    }

    pub fn has_effect(&self, kind: &EffectKind) -> bool {
        self.effect(kind).is_some()
    }

    pub fn modifiers(&self) -> PlayerModifiers {
        self.modifiers
    }

    pub fn now(&self) -> Millis {
        self.clock.now()
    }

    fn position(&self, kind: &EffectKind) -> Option<usize> {
        self.effects.iter().position(|e| &e.kind == kind)
    }

    fn apply(&mut self, effect: &PlayerEffect) {
        match effect.kind.modifier() {
            Some(m) => *self.modifiers.slot(m) *= effect.multiplier,
            None => {
                if let EffectKind::Custom(name) = &effect.kind {
                    tracing::debug!(kind = %name, "Custom effect has no modifier, ignoring");
                }
            },
        }
    }

    fn reverse(&mut self, effect: &PlayerEffect) {
        let Some(m) = effect.kind.modifier() else {
            return;
        };
        let slot = self.modifiers.slot(m);
        *slot /= effect.multiplier;
        if *slot < 1.0 || (*slot - 1.0).abs() < IDENTITY_EPSILON {
            *slot = 1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparkrun_core::EventQueue;

    fn manager() -> (EffectManager, EventQueue<GameEvent>) {
        let bus = GameBus::new();
        let queue = bus.queue();
        (EffectManager::new(bus, EffectTuning::default()), queue)
    }

    fn speed(multiplier: f32) -> EffectSpec {
        EffectSpec::for_kind(&EffectKind::SpeedBoost, &EffectTuning::default())
            .with_multiplier(multiplier)
            .with_duration(1000.0)
    }

    #[test]
    fn add_applies_modifier_and_publishes() {
        let (mut fx, queue) = manager();
        fx.add_effect(EffectKind::SpeedBoost, speed(2.0));
        assert_eq!(fx.modifiers().speed, 2.0);
        assert_eq!(fx.modifiers().jump, 1.0);

        let events = queue.drain();
        assert_eq!(events.len(), 1);
        match &events[0] {
            GameEvent::EffectAdded(e) => {
                assert_eq!(e.kind, EffectKind::SpeedBoost);
                assert!(e.active);
                assert_eq!(e.multiplier, 2.0);
            },
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn modifier_lookup_by_slot() {
        let (mut fx, _queue) = manager();
        fx.add_effect(EffectKind::JumpBoost, speed(1.3));
        assert_eq!(fx.modifiers().get(Modifier::Jump), 1.3);
        assert_eq!(fx.modifiers().get(Modifier::Speed), 1.0);
        assert_eq!(EffectKind::Shield.modifier(), None);
    }

    #[test]
    fn replacing_does_not_compound() {
        let (mut fx, _queue) = manager();
        fx.add_effect(EffectKind::SpeedBoost, speed(2.0));
        fx.add_effect(EffectKind::SpeedBoost, speed(3.0));
        assert_eq!(fx.modifiers().speed, 3.0);
        assert_eq!(fx.active_effects().len(), 1);
    }

    #[test]
    fn replacing_restarts_the_timer() {
        let (mut fx, _queue) = manager();
        fx.add_effect(EffectKind::SpeedBoost, speed(2.0));
        fx.update(600.0);
        fx.add_effect(EffectKind::SpeedBoost, speed(2.0));
        assert_eq!(fx.remaining_time(&EffectKind::SpeedBoost), 1000.0);
    }

    #[test]
    fn remove_reverses_and_publishes() {
        let (mut fx, queue) = manager();
        fx.add_effect(EffectKind::JumpBoost, speed(1.3));
        let removed = fx.remove_effect(&EffectKind::JumpBoost).unwrap();
        assert!(!removed.active);
        assert_eq!(fx.modifiers(), PlayerModifiers::IDENTITY);
        let events = queue.drain();
        assert!(matches!(events.last(), Some(GameEvent::EffectRemoved(e)) if !e.active));
    }

    #[test]
    fn remove_absent_is_noop() {
        let (mut fx, queue) = manager();
        assert!(fx.remove_effect(&EffectKind::Shield).is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn update_expires_effects() {
        let (mut fx, queue) = manager();
        fx.add_effect(EffectKind::SpeedBoost, speed(2.0));
        fx.add_default_effect(EffectKind::Shield);
        queue.drain();

        let expired = fx.update(999.0);
        assert!(expired.is_empty());
        let expired = fx.update(1.0);
        assert_eq!(expired, vec![EffectKind::SpeedBoost]);
        assert!(!fx.has_effect(&EffectKind::SpeedBoost));
        assert!(fx.has_effect(&EffectKind::Shield));
        assert_eq!(fx.modifiers().speed, 1.0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn remaining_time_counts_down_to_zero() {
        let (mut fx, _queue) = manager();
        fx.add_effect(EffectKind::SpeedBoost, speed(2.0));
        assert_eq!(fx.remaining_time(&EffectKind::SpeedBoost), 1000.0);
        fx.update(250.0);
        assert_eq!(fx.remaining_time(&EffectKind::SpeedBoost), 750.0);
        assert_eq!(fx.remaining_time(&EffectKind::Magnet), 0.0);
    }

    #[test]
    fn clear_resets_to_identity() {
        let (mut fx, queue) = manager();
        fx.add_effect(EffectKind::SpeedBoost, speed(1.7));
        fx.add_effect(EffectKind::JumpBoost, speed(1.3));
        fx.add_default_effect(EffectKind::Magnet);
        queue.drain();

        fx.clear();
        assert!(fx.active_effects().is_empty());
        assert_eq!(fx.modifiers(), PlayerModifiers::IDENTITY);
        let removed = queue
            .drain()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::EffectRemoved(_)))
            .count();
        assert_eq!(removed, 3);
    }

    #[test]
    fn sub_unity_multiplier_reverses_to_identity() {
        let (mut fx, _queue) = manager();
        fx.add_effect(EffectKind::SpeedBoost, speed(0.5));
        assert_eq!(fx.modifiers().speed, 0.5);
        fx.remove_effect(&EffectKind::SpeedBoost);
        assert_eq!(fx.modifiers().speed, 1.0);
    }

    #[test]
    fn non_positive_multiplier_is_neutralised() {
        let (mut fx, _queue) = manager();
        fx.add_effect(EffectKind::SpeedBoost, speed(0.0));
        assert_eq!(fx.modifiers().speed, 1.0);
        fx.add_effect(EffectKind::SpeedBoost, speed(f32::NAN));
        assert_eq!(fx.modifiers().speed, 1.0);
    }

    #[test]
    fn custom_kind_is_tracked_without_modifier() {
        let (mut fx, _queue) = manager();
        let kind = EffectKind::Custom("low_gravity".to_string());
        let spec = fx
            .spec_for(&kind)
            .with_multiplier(4.0)
            .with_data("gravity", serde_json::json!(0.5));
        fx.add_effect(kind.clone(), spec);
        assert!(fx.has_effect(&kind));
        assert_eq!(fx.modifiers(), PlayerModifiers::IDENTITY);
        assert_eq!(fx.effect(&kind).unwrap().data["gravity"], serde_json::json!(0.5));
    }

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&EffectKind::SpeedBoost).unwrap(),
            "\"speed_boost\""
        );
        assert_eq!(EffectKind::Custom("x".into()).key(), "x");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add(u8, f32),
            Remove(u8),
            Tick(f64),
        }

        fn kind(i: u8) -> EffectKind {
            match i % 4 {
                0 => EffectKind::SpeedBoost,
                1 => EffectKind::JumpBoost,
                2 => EffectKind::Shield,
                _ => EffectKind::Magnet,
            }
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u8..4, 0.1f32..5.0).prop_map(|(k, m)| Op::Add(k, m)),
                (0u8..4).prop_map(Op::Remove),
                (0.0f64..2000.0).prop_map(Op::Tick),
            ]
        }

        proptest! {
            #[test]
            fn clear_always_restores_identity(ops in proptest::collection::vec(op(), 0..60)) {
                let (mut fx, _queue) = manager();
                for op in ops {
                    match op {
                        Op::Add(k, m) => {
                            let spec = fx.spec_for(&kind(k)).with_multiplier(m);
                            fx.add_effect(kind(k), spec);
                        },
                        Op::Remove(k) => {
                            fx.remove_effect(&kind(k));
                        },
                        Op::Tick(dt) => {
                            fx.update(dt);
                        },
                    }
                }
                fx.clear();
                prop_assert_eq!(fx.modifiers(), PlayerModifiers::IDENTITY);
                prop_assert!(fx.active_effects().is_empty());
            }

            #[test]
            fn latest_multiplier_wins(first in 0.1f32..5.0, second in 0.1f32..5.0) {
                let (mut fx, _queue) = manager();
                fx.add_effect(EffectKind::SpeedBoost, speed(first));
                fx.add_effect(EffectKind::SpeedBoost, speed(second));
                // Reversal clamps at identity, so a sub-unity first effect is
                // fully undone before the second applies.
                prop_assert!((fx.modifiers().speed - second).abs() < 1e-4);
            }

            #[test]
            fn remaining_time_never_increases(
                ticks in proptest::collection::vec(0.0f64..400.0, 1..30)
            ) {
                let (mut fx, _queue) = manager();
                fx.add_effect(EffectKind::SpeedBoost, speed(2.0));
                let mut last = fx.remaining_time(&EffectKind::SpeedBoost);
                let mut elapsed = 0.0;
                for dt in ticks {
                    fx.update(dt);
                    elapsed += dt;
                    let now = fx.remaining_time(&EffectKind::SpeedBoost);
                    prop_assert!(now <= last);
                    prop_assert!(now >= 0.0);
                    if elapsed >= 1000.0 {
                        prop_assert_eq!(now, 0.0);
                    }
                    last = now;
                }
            }
        }
    }
}
