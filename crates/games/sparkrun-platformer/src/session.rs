use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use sparkrun_core::render::{Camera, DrawSurface};
use sparkrun_core::{Millis, SimClock, SubscriptionId};

use crate::config::PlatformerConfig;
use crate::effects::{EffectKind, EffectManager};
use crate::events::{GameBus, GameEvent};
use crate::item::{Item, ItemContext, ItemKind};
use crate::particles::ParticleSystem;
use crate::platform_effects::{DeviceClass, Platform, PlatformEffectManager, PlatformId};

/// The player's collision box. Movement is owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerBody {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PlayerBody {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            width: 0.8,
            height: 1.0,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Move so the body is centered on `center`.
    pub fn set_center(&mut self, center: Vec2) {
        self.x = center.x - self.width / 2.0;
        self.y = center.y - self.height / 2.0;
    }
}

impl Default for PlayerBody {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// One running level: the player, its items and every effect system.
pub struct GameSession {
    config: PlatformerConfig,
    clock: SimClock,
    bus: GameBus,
    player: PlayerBody,
    platforms: HashMap<PlatformId, Platform>,
    items: Vec<Item>,
    particles: ParticleSystem,
    effects: EffectManager,
    platform_effects: PlatformEffectManager,
    rng: fastrand::Rng,
    paused: bool,
    initializing: bool,
}

impl GameSession {
    pub fn new(config: PlatformerConfig, device: DeviceClass) -> Self {
        Self::build(config, device, fastrand::Rng::new(), ParticleSystem::new())
    }

    /// Deterministic session: item phases and particle bursts replay exactly.
    pub fn with_seed(config: PlatformerConfig, device: DeviceClass, seed: u64) -> Self {
        Self::build(
            config,
            device,
            fastrand::Rng::with_seed(seed),
            ParticleSystem::with_seed(seed.wrapping_add(1)),
        )
    }

    fn build(
        config: PlatformerConfig,
        device: DeviceClass,
        rng: fastrand::Rng,
        particles: ParticleSystem,
    ) -> Self {
        let bus = GameBus::new();
        Self {
            effects: EffectManager::new(bus.clone(), config.effects.clone()),
            platform_effects: PlatformEffectManager::new(device, &config.render),
            config,
            clock: SimClock::new(),
            bus,
            player: PlayerBody::default(),
            platforms: HashMap::new(),
            items: Vec::new(),
            particles,
            rng,
            paused: false,
            initializing: false,
        }
    }

    /// Advance the session by `delta` milliseconds.
    ///
    /// Order: player effects, platform effects, items, particles. Items that
    /// finished this frame (collected or expired) are dropped from the list.
    pub fn update(&mut self, delta: Millis) {
        if self.paused {
            return;
        }
        let prev = self.clock.now();
        let now = self.clock.advance(delta);
        let applied = now - prev;

        self.effects.update(applied);
        self.platform_effects.update(applied);

        let radius_scale = if self.effects.has_effect(&EffectKind::Magnet) {
            self.config.items.magnet_radius_scale
        } else {
            1.0
        };
        let mut ctx = ItemContext {
            now,
            player_center: self.player.center(),
            world_initializing: self.initializing,
            radius_scale,
            burst_particles: self.config.items.burst_particles,
            effects: &mut self.effects,
            particles: &mut self.particles,
            bus: &self.bus,
        };
        for item in &mut self.items {
            item.update(&mut ctx);
        }
        let before = self.items.len();
        self.items.retain(|item| !item.is_done());
        if self.items.len() != before {
            tracing::trace!(removed = before - self.items.len(), "Dropped finished items");
        }

        self.particles.update(applied);
    }

    /// Draw platform effects, then items, then particles.
    pub fn render(&self, surface: &mut dyn DrawSurface, camera: &dyn Camera) {
        let now = self.clock.now();
        self.platform_effects.render(surface, camera, &self.platforms);
        for item in &self.items {
            item.render(surface, camera, now, self.config.items.show_lifespan_bar);
        }
        self.particles.render(surface, camera);
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// While initializing, items neither expire nor get collected.
    pub fn set_initializing(&mut self, initializing: bool) {
        self.initializing = initializing;
    }

    /// Spawn an item at `(x, y)` using the configured item tuning.
    pub fn spawn_item(&mut self, kind: ItemKind, x: f32, y: f32) -> &mut Item {
        let item = Item::from_tuning(
            kind,
            x,
            y,
            self.clock.now(),
            &self.config.items,
            &mut self.rng,
        );
        tracing::debug!(?kind, x, y, "Spawned item");
        self.items.push(item);
        let last = self.items.len() - 1;
        &mut self.items[last]
    }

    pub fn add_platform(&mut self, platform: Platform) {
        self.platforms.insert(platform.id, platform);
    }

    pub fn platform(&self, id: PlatformId) -> Option<&Platform> {
        self.platforms.get(&id)
    }

    /// Listen to every notification the session publishes.
    pub fn subscribe(&self, listener: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        self.bus.subscribe(listener)
    }

    pub fn bus(&self) -> &GameBus {
        &self.bus
    }

    pub fn player(&self) -> &PlayerBody {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlayerBody {
        &mut self.player
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn effects(&self) -> &EffectManager {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut EffectManager {
        &mut self.effects
    }

    pub fn platform_effects(&self) -> &PlatformEffectManager {
        &self.platform_effects
    }

    pub fn platform_effects_mut(&mut self) -> &mut PlatformEffectManager {
        &mut self.platform_effects
    }

    pub fn config(&self) -> &PlatformerConfig {
        &self.config
    }

    pub fn now(&self) -> Millis {
        self.clock.now()
    }
}
