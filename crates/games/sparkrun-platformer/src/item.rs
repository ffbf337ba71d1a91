//! Collectible items.
//!
//! Every item is the same [`Item`] record; what differs per kind (icon, colors,
//! what happens on pickup) lives behind the [`ItemBehavior`] selected by
//! [`ItemKind::behavior`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use sparkrun_core::Millis;
use sparkrun_core::render::{Camera, DrawSurface, Rect, Rgba};

use crate::config::{COLLECT_RADIUS, ITEM_FADE_OUT_MS, ItemTuning};
use crate::effects::{EffectKind, EffectManager};
use crate::events::{GameBus, GameEvent, ItemCollected};
use crate::particles::ParticleSystem;

const BAR_GREEN: Rgba = Rgba::rgb(0.30, 0.69, 0.31);
const BAR_AMBER: Rgba = Rgba::rgb(1.0, 0.76, 0.03);
const BAR_RED: Rgba = Rgba::rgb(0.96, 0.26, 0.21);
const BAR_BACKGROUND: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.5);

/// Collectible kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    SpeedBoost,
    JumpBoost,
    Shield,
    Magnet,
    DoubleJump,
    Coin,
}

impl ItemKind {
    pub const ALL: [ItemKind; 6] = [
        ItemKind::SpeedBoost,
        ItemKind::JumpBoost,
        ItemKind::Shield,
        ItemKind::Magnet,
        ItemKind::DoubleJump,
        ItemKind::Coin,
    ];

    pub fn behavior(self) -> &'static dyn ItemBehavior {
        match self {
            ItemKind::SpeedBoost => &SpeedBoostItem,
            ItemKind::JumpBoost => &JumpBoostItem,
            ItemKind::Shield => &ShieldItem,
            ItemKind::Magnet => &MagnetItem,
            ItemKind::DoubleJump => &DoubleJumpItem,
            ItemKind::Coin => &CoinItem,
        }
    }
}

/// Effect payload carried by an item. Unset fields fall back to the effect
/// manager's defaults for `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEffect {
    pub kind: EffectKind,
    #[serde(default)]
    pub multiplier: Option<f32>,
    #[serde(default)]
    pub duration: Option<Millis>,
}

impl ItemEffect {
    pub fn of(kind: EffectKind) -> Self {
        Self {
            kind,
            multiplier: None,
            duration: None,
        }
    }
}

/// Where an item is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemLifecycle {
    Spawned,
    Fading,
    Collected,
    Expired,
}

/// Per-kind behavior: presentation and what a pickup does.
pub trait ItemBehavior: Sync {
    fn display_name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// Primary and glow colors.
    fn colors(&self) -> (Rgba, Rgba);
    fn default_effect(&self) -> Option<ItemEffect>;
    /// Draw the icon centered at `center` (screen space), `size` pixels wide.
    fn draw_icon(&self, surface: &mut dyn DrawSurface, center: Vec2, size: f32, rotation: f32);

    /// Apply the item's effect payload on pickup.
    fn apply_effect(&self, effect: Option<&ItemEffect>, effects: &mut EffectManager) {
        let Some(effect) = effect else {
            return;
        };
        let mut spec = effects.spec_for(&effect.kind);
        if let Some(m) = effect.multiplier {
            spec.multiplier = m;
        }
        if let Some(d) = effect.duration {
            spec.duration = d;
        }
        effects.add_effect(effect.kind.clone(), spec);
    }
}

/// Everything an item needs from the world during `update`.
pub struct ItemContext<'a> {
    pub now: Millis,
    pub player_center: Vec2,
    pub world_initializing: bool,
    /// Scales every item's pickup radius (magnet effect).
    pub radius_scale: f32,
    pub burst_particles: usize,
    pub effects: &'a mut EffectManager,
    pub particles: &'a mut ParticleSystem,
    pub bus: &'a GameBus,
}

/// Per-instance animation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemVisuals {
    pub primary: Rgba,
    pub glow: Rgba,
    pub float_phase: f32,
    pub rotation_phase: f32,
    pub pulse_phase: f32,
}

/// A collectible in the world. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub kind: ItemKind,
    pub name: String,
    pub description: String,
    pub collected: bool,
    pub expired: bool,
    #[serde(default)]
    fading: bool,
    pub spawn_time: Millis,
    pub lifespan: Option<Millis>,
    pub fade_out_duration: Millis,
    pub collect_radius: f32,
    pub visuals: ItemVisuals,
    pub effect: Option<ItemEffect>,
}

impl Item {
    pub fn new(kind: ItemKind, x: f32, y: f32, spawn_time: Millis) -> Self {
        let behavior = kind.behavior();
        let (primary, glow) = behavior.colors();
        Self {
            x,
            y,
            size: 1.0,
            kind,
            name: behavior.display_name().to_string(),
            description: behavior.description().to_string(),
            collected: false,
            expired: false,
            fading: false,
            spawn_time,
            lifespan: None,
            fade_out_duration: ITEM_FADE_OUT_MS,
            collect_radius: COLLECT_RADIUS,
            visuals: ItemVisuals {
                primary,
                glow,
                float_phase: 0.0,
                rotation_phase: 0.0,
                pulse_phase: 0.0,
            },
            effect: behavior.default_effect(),
        }
    }

    /// Build an item with sizes and timings from `tuning` and random phases.
    pub fn from_tuning(
        kind: ItemKind,
        x: f32,
        y: f32,
        spawn_time: Millis,
        tuning: &ItemTuning,
        rng: &mut fastrand::Rng,
    ) -> Self {
        let mut item = Self::new(kind, x, y, spawn_time);
        item.size = tuning.size;
        item.collect_radius = tuning.collect_radius;
        item.fade_out_duration = tuning.fade_out_ms;
        item.lifespan = tuning.default_lifespan_ms;
        item.visuals.float_phase = rng.f32() * std::f32::consts::TAU;
        item.visuals.rotation_phase = rng.f32() * std::f32::consts::TAU;
        item.visuals.pulse_phase = rng.f32() * std::f32::consts::TAU;
        item
    }

    pub fn with_effect(mut self, effect: Option<ItemEffect>) -> Self {
        self.effect = effect;
        self
    }

    /// Set or clear the lifespan. `None` disables expiry entirely.
    pub fn set_lifespan(&mut self, lifespan: Option<Millis>) {
        self.lifespan = lifespan.map(|l| l.max(0.0));
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.size / 2.0, self.y + self.size / 2.0)
    }

    pub fn age(&self, now: Millis) -> Millis {
        (now - self.spawn_time).max(0.0)
    }

    /// Time left before expiry, or `None` for items without a lifespan.
    pub fn remaining_life(&self, now: Millis) -> Option<Millis> {
        self.lifespan.map(|l| (l - self.age(now)).max(0.0))
    }

    pub fn lifecycle(&self) -> ItemLifecycle {
        if self.collected {
            ItemLifecycle::Collected
        } else if self.expired {
            ItemLifecycle::Expired
        } else if self.fading {
            ItemLifecycle::Fading
        } else {
            ItemLifecycle::Spawned
        }
    }

    pub fn is_done(&self) -> bool {
        self.collected || self.expired
    }

    /// Advance the expiry state machine. Returns true only on the call that
    /// flips the item to expired.
    pub fn check_expiration(&mut self, now: Millis) -> bool {
        if self.collected || self.expired {
            return false;
        }
        let Some(lifespan) = self.lifespan else {
            return false;
        };
        let age = self.age(now);
        if !self.fading && age >= lifespan - self.fade_out_duration {
            self.fading = true;
        }
        if age >= lifespan {
            self.expired = true;
            tracing::trace!(kind = ?self.kind, age, "Item expired");
            return true;
        }
        false
    }

    /// 1.0 until the fade window opens, then linearly down to 0.
    pub fn fade_alpha(&self, now: Millis) -> f32 {
        let Some(lifespan) = self.lifespan else {
            return 1.0;
        };
        let age = self.age(now);
        if self.fade_out_duration <= 0.0 {
            return if age < lifespan { 1.0 } else { 0.0 };
        }
        let fade_start = lifespan - self.fade_out_duration;
        if age < fade_start {
            return 1.0;
        }
        (1.0 - (age - fade_start) / self.fade_out_duration).max(0.0) as f32
    }

    /// Per-frame step: expiry first, then proximity pickup.
    pub fn update(&mut self, ctx: &mut ItemContext<'_>) -> ItemLifecycle {
        if ctx.world_initializing || self.is_done() {
            return self.lifecycle();
        }
        if self.check_expiration(ctx.now) {
            return self.lifecycle();
        }
        let reach = self.collect_radius * ctx.radius_scale.max(0.0);
        if self.center().distance(ctx.player_center) <= reach {
            self.collect(ctx);
        }
        self.lifecycle()
    }

    /// Pick the item up. Idempotent: returns false if already collected or expired.
    pub fn collect(&mut self, ctx: &mut ItemContext<'_>) -> bool {
        if self.is_done() {
            return false;
        }
        self.collected = true;

        ctx.particles
            .burst(self.center(), self.visuals.glow, ctx.burst_particles);
        self.kind
            .behavior()
            .apply_effect(self.effect.as_ref(), ctx.effects);
        tracing::debug!(kind = ?self.kind, name = %self.name, "Item collected");
        ctx.bus.publish(GameEvent::ItemCollected(ItemCollected {
            kind: self.kind,
            name: self.name.clone(),
            effect: self.effect.clone(),
        }));
        true
    }

    pub fn render(
        &self,
        surface: &mut dyn DrawSurface,
        camera: &dyn Camera,
        now: Millis,
        show_lifespan_bar: bool,
    ) {
        if self.is_done() {
            return;
        }
        let age_s = (self.age(now) / 1000.0) as f32;
        let v = &self.visuals;
        let bob = (age_s * 3.0 + v.float_phase).sin() * self.size * 0.1;
        let rotation = age_s * 1.5 + v.rotation_phase;
        let pulse = 0.6 + 0.4 * (age_s * 4.0 + v.pulse_phase).sin();

        let center = camera.transform_coordinates(self.center() + Vec2::new(0.0, bob));
        let px = camera.transform_x(self.size);

        surface.save();
        surface.set_global_alpha(self.fade_alpha(now));
        surface.set_shadow(v.glow, 12.0 * pulse);
        surface.fill_circle(center, px * 0.6, v.glow.with_alpha(0.35 * pulse));
        surface.set_shadow(Rgba::TRANSPARENT, 0.0);
        self.kind.behavior().draw_icon(surface, center, px, rotation);

        if show_lifespan_bar && let Some(remaining) = self.remaining_life(now) {
            let lifespan = self.lifespan.unwrap_or(0.0);
            let fraction = if lifespan > 0.0 {
                (remaining / lifespan) as f32
            } else {
                0.0
            };
            let bar = Rect::new(center.x - px / 2.0, center.y + px * 0.7, px, px * 0.1);
            surface.fill_rect(bar, BAR_BACKGROUND);
            surface.fill_rect(
                Rect::new(bar.x, bar.y, bar.w * fraction, bar.h),
                lifespan_bar_color(fraction, age_s),
            );
        }
        surface.restore();
    }
}

/// Lifespan bar color for the remaining fraction: green above 0.6, amber above
/// 0.3, and a blinking red below.
pub fn lifespan_bar_color(fraction: f32, age_s: f32) -> Rgba {
    if fraction > 0.6 {
        BAR_GREEN
    } else if fraction > 0.3 {
        BAR_AMBER
    } else {
        BAR_RED.with_alpha(0.5 + 0.5 * (age_s * 10.0).sin().abs())
    }
}

fn shape(points: &[(f32, f32)], center: Vec2, size: f32, rotation: f32) -> Vec<Vec2> {
    let rot = Vec2::from_angle(rotation);
    points
        .iter()
        .map(|&(x, y)| center + rot.rotate(Vec2::new(x, y) * size))
        .collect()
}

struct SpeedBoostItem;
struct JumpBoostItem;
struct ShieldItem;
struct MagnetItem;
struct DoubleJumpItem;
struct CoinItem;

impl ItemBehavior for SpeedBoostItem {
    fn display_name(&self) -> &'static str {
        "Speed Boost"
    }

    fn description(&self) -> &'static str {
        "Run faster for a short while"
    }

    fn colors(&self) -> (Rgba, Rgba) {
        (Rgba::from_rgb8(0xff, 0xc1, 0x07), Rgba::from_rgb8(0xff, 0xeb, 0x3b))
    }

    fn default_effect(&self) -> Option<ItemEffect> {
        Some(ItemEffect::of(EffectKind::SpeedBoost))
    }

    fn draw_icon(&self, surface: &mut dyn DrawSurface, center: Vec2, size: f32, rotation: f32) {
        let bolt = [
            (0.08, -0.4),
            (-0.2, 0.05),
            (0.0, 0.05),
            (-0.08, 0.4),
            (0.2, -0.05),
            (0.0, -0.05),
        ];
        surface.fill_polygon(&shape(&bolt, center, size, rotation.sin() * 0.2), self.colors().0);
    }
}

impl ItemBehavior for JumpBoostItem {
    fn display_name(&self) -> &'static str {
        "Super Jump"
    }

    fn description(&self) -> &'static str {
        "Jump higher"
    }

    fn colors(&self) -> (Rgba, Rgba) {
        (Rgba::from_rgb8(0x4c, 0xaf, 0x50), Rgba::from_rgb8(0x8b, 0xc3, 0x4a))
    }

    fn default_effect(&self) -> Option<ItemEffect> {
        Some(ItemEffect::of(EffectKind::JumpBoost))
    }

    fn draw_icon(&self, surface: &mut dyn DrawSurface, center: Vec2, size: f32, _rotation: f32) {
        let arrow = [
            (0.0, -0.4),
            (0.3, -0.05),
            (0.1, -0.05),
            (0.1, 0.35),
            (-0.1, 0.35),
            (-0.1, -0.05),
            (-0.3, -0.05),
        ];
        surface.fill_polygon(&shape(&arrow, center, size, 0.0), self.colors().0);
    }
}

impl ItemBehavior for ShieldItem {
    fn display_name(&self) -> &'static str {
        "Shield"
    }

    fn description(&self) -> &'static str {
        "Survive one hit"
    }

    fn colors(&self) -> (Rgba, Rgba) {
        (Rgba::from_rgb8(0x21, 0x96, 0xf3), Rgba::from_rgb8(0x03, 0xa9, 0xf4))
    }

    fn default_effect(&self) -> Option<ItemEffect> {
        Some(ItemEffect::of(EffectKind::Shield))
    }

    fn draw_icon(&self, surface: &mut dyn DrawSurface, center: Vec2, size: f32, rotation: f32) {
        let crest = [
            (-0.3, -0.35),
            (0.3, -0.35),
            (0.3, 0.0),
            (0.0, 0.4),
            (-0.3, 0.0),
        ];
        surface.fill_polygon(&shape(&crest, center, size, 0.0), self.colors().0);
        surface.stroke_circle(center, size * (0.45 + 0.03 * rotation.sin()), Rgba::WHITE, 1.5);
    }
}

impl ItemBehavior for MagnetItem {
    fn display_name(&self) -> &'static str {
        "Magnet"
    }

    fn description(&self) -> &'static str {
        "Pull nearby items in"
    }

    fn colors(&self) -> (Rgba, Rgba) {
        (Rgba::from_rgb8(0xe9, 0x1e, 0x63), Rgba::from_rgb8(0xf4, 0x8f, 0xb1))
    }

    fn default_effect(&self) -> Option<ItemEffect> {
        Some(ItemEffect::of(EffectKind::Magnet))
    }

    fn draw_icon(&self, surface: &mut dyn DrawSurface, center: Vec2, size: f32, rotation: f32) {
        let (primary, _) = self.colors();
        surface.stroke_circle(center, size * 0.25, primary, size * 0.12);
        let tips = [(-0.3, 0.0), (-0.15, 0.0), (-0.15, 0.3), (-0.3, 0.3)];
        surface.fill_polygon(&shape(&tips, center, size, rotation * 0.1), Rgba::WHITE);
        let tips = [(0.15, 0.0), (0.3, 0.0), (0.3, 0.3), (0.15, 0.3)];
        surface.fill_polygon(&shape(&tips, center, size, rotation * 0.1), Rgba::WHITE);
    }
}

impl ItemBehavior for DoubleJumpItem {
    fn display_name(&self) -> &'static str {
        "Double Jump"
    }

    fn description(&self) -> &'static str {
        "Jump again in mid-air"
    }

    fn colors(&self) -> (Rgba, Rgba) {
        (Rgba::from_rgb8(0x9c, 0x27, 0xb0), Rgba::from_rgb8(0xce, 0x93, 0xd8))
    }

    fn default_effect(&self) -> Option<ItemEffect> {
        Some(ItemEffect::of(EffectKind::DoubleJump))
    }

    fn draw_icon(&self, surface: &mut dyn DrawSurface, center: Vec2, size: f32, _rotation: f32) {
        let chevron = [
            (0.0, -0.2),
            (0.3, 0.05),
            (0.18, 0.05),
            (0.0, -0.08),
            (-0.18, 0.05),
            (-0.3, 0.05),
        ];
        let color = self.colors().0;
        let offset = Vec2::new(0.0, size * 0.15);
        surface.fill_polygon(&shape(&chevron, center - offset, size, 0.0), color);
        surface.fill_polygon(&shape(&chevron, center + offset, size, 0.0), color);
    }
}

impl ItemBehavior for CoinItem {
    fn display_name(&self) -> &'static str {
        "Coin"
    }

    fn description(&self) -> &'static str {
        "Worth a point"
    }

    fn colors(&self) -> (Rgba, Rgba) {
        (Rgba::from_rgb8(0xff, 0xd7, 0x00), Rgba::from_rgb8(0xff, 0xf1, 0x76))
    }

    fn default_effect(&self) -> Option<ItemEffect> {
        None
    }

    fn draw_icon(&self, surface: &mut dyn DrawSurface, center: Vec2, size: f32, rotation: f32) {
        // Spin reads as a horizontal squash of the face.
        let squash = rotation.cos().abs().max(0.15);
        let face: Vec<Vec2> = (0..16)
            .map(|i| {
                let a = i as f32 / 16.0 * std::f32::consts::TAU;
                center + Vec2::new(a.cos() * squash, a.sin()) * size * 0.35
            })
            .collect();
        surface.fill_polygon(&face, self.colors().0);
    }

    fn apply_effect(&self, _effect: Option<&ItemEffect>, _effects: &mut EffectManager) {
        tracing::trace!("Coin pickup has no player effect");
    }
}
