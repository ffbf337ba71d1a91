//! Layered visual effects on world platforms.
//!
//! Unlike player effects, a platform can carry any number of effects at once,
//! including several of the same type. All timing runs on the manager's own
//! clock, so an un-ticked manager holds every effect exactly where it was.

use std::collections::{BTreeMap, HashMap};
use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sparkrun_core::render::{Camera, DrawSurface, Rect, Rgba};
use sparkrun_core::time::{Millis, SimClock};

use crate::config::RenderTuning;

pub type PlatformId = u32;

/// Platform geometry in world units. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: PlatformId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Resolves platform ids to geometry.
pub trait PlatformLookup {
    fn platform_by_id(&self, id: PlatformId) -> Option<Platform>;
}

impl PlatformLookup for HashMap<PlatformId, Platform> {
    fn platform_by_id(&self, id: PlatformId) -> Option<Platform> {
        self.get(&id).copied()
    }
}

impl PlatformLookup for Vec<Platform> {
    fn platform_by_id(&self, id: PlatformId) -> Option<Platform> {
        self.iter().find(|p| p.id == id).copied()
    }
}

/// A visual effect and the parameters that kind uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlatformEffectKind {
    /// Flat tinted fill with an outline.
    Highlight { color: Rgba, intensity: f32 },
    /// Tinted fill whose alpha follows a sine wave, `speed` cycles per second.
    Pulse {
        color: Rgba,
        intensity: f32,
        speed: f32,
    },
    /// Blurred outline with a breathing blur radius.
    Glow {
        color: Rgba,
        intensity: f32,
        speed: f32,
    },
    /// Hue-cycling fill.
    Rainbow { intensity: f32, speed: f32 },
    /// Positional jitter, read through [`PlatformEffectManager::shake_offset`].
    Shake { intensity: f32, speed: f32 },
    /// Script-defined effect. Tracked and expired, never drawn here.
    Custom {
        name: String,
        #[serde(default)]
        extras: Map<String, Value>,
    },
}

impl PlatformEffectKind {
    pub fn highlight(color: Rgba) -> Self {
        Self::Highlight {
            color,
            intensity: 0.5,
        }
    }

    pub fn pulse(color: Rgba) -> Self {
        Self::Pulse {
            color,
            intensity: 0.8,
            speed: 1.0,
        }
    }

    pub fn glow(color: Rgba) -> Self {
        Self::Glow {
            color,
            intensity: 1.0,
            speed: 0.5,
        }
    }

    pub fn rainbow() -> Self {
        Self::Rainbow {
            intensity: 0.7,
            speed: 1.0,
        }
    }

    pub fn shake(intensity: f32) -> Self {
        Self::Shake {
            intensity,
            speed: 1.0,
        }
    }

    pub fn effect_type(&self) -> PlatformEffectType {
        match self {
            Self::Highlight { .. } => PlatformEffectType::Highlight,
            Self::Pulse { .. } => PlatformEffectType::Pulse,
            Self::Glow { .. } => PlatformEffectType::Glow,
            Self::Rainbow { .. } => PlatformEffectType::Rainbow,
            Self::Shake { .. } => PlatformEffectType::Shake,
            Self::Custom { name, .. } => PlatformEffectType::Custom(name.clone()),
        }
    }
}

/// Discriminant of [`PlatformEffectKind`], used for lookups and removal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformEffectType {
    Highlight,
    Pulse,
    Glow,
    Rainbow,
    Shake,
    Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectInstanceId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformEffect {
    pub id: EffectInstanceId,
    pub platform_id: PlatformId,
    pub kind: PlatformEffectKind,
    /// `None` marks a permanent effect.
    pub duration: Option<Millis>,
    /// Start time on the manager clock.
    pub start_time: Millis,
}

impl PlatformEffect {
    pub fn is_permanent(&self) -> bool {
        self.duration.is_none()
    }

    pub fn elapsed(&self, global_time: Millis) -> Millis {
        (global_time - self.start_time).max(0.0)
    }

    pub fn is_expired(&self, global_time: Millis) -> bool {
        self.duration
            .is_some_and(|d| self.elapsed(global_time) >= d)
    }

    pub fn effect_type(&self) -> PlatformEffectType {
        self.kind.effect_type()
    }
}

/// One or many platforms to apply an effect to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformTargets {
    One(PlatformId),
    Many(Vec<PlatformId>),
}

impl PlatformTargets {
    pub fn ids(&self) -> &[PlatformId] {
        match self {
            Self::One(id) => std::slice::from_ref(id),
            Self::Many(ids) => ids,
        }
    }
}

impl From<PlatformId> for PlatformTargets {
    fn from(id: PlatformId) -> Self {
        Self::One(id)
    }
}

impl From<Vec<PlatformId>> for PlatformTargets {
    fn from(ids: Vec<PlatformId>) -> Self {
        Self::Many(ids)
    }
}

impl From<&[PlatformId]> for PlatformTargets {
    fn from(ids: &[PlatformId]) -> Self {
        Self::Many(ids.to_vec())
    }
}

impl<const N: usize> From<[PlatformId; N]> for PlatformTargets {
    fn from(ids: [PlatformId; N]) -> Self {
        Self::Many(ids.to_vec())
    }
}

/// Device class, which picks the culling margin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    #[default]
    Desktop,
    Mobile,
}

impl DeviceClass {
    pub fn cull_margin(self, tuning: &RenderTuning) -> f32 {
        match self {
            DeviceClass::Desktop => tuning.desktop_cull_margin,
            DeviceClass::Mobile => tuning.mobile_cull_margin,
        }
    }
}

pub struct PlatformEffectManager {
    /// Ordered so render and iteration order are stable across runs.
    effects: BTreeMap<PlatformId, Vec<PlatformEffect>>,
    clock: SimClock,
    next_id: u64,
    cull_margin: f32,
}

impl PlatformEffectManager {
    pub fn new(device: DeviceClass, tuning: &RenderTuning) -> Self {
        Self {
            effects: BTreeMap::new(),
            clock: SimClock::new(),
            next_id: 1,
            cull_margin: device.cull_margin(tuning),
        }
    }

    /// Append `kind` to every target platform. Never replaces existing effects.
    pub fn add_effect(
        &mut self,
        targets: impl Into<PlatformTargets>,
        kind: PlatformEffectKind,
        duration: Option<Millis>,
    ) -> Vec<EffectInstanceId> {
        let targets = targets.into();
        let start_time = self.clock.now();
        let mut ids = Vec::with_capacity(targets.ids().len());
        for &platform_id in targets.ids() {
            let id = EffectInstanceId(self.next_id);
            self.next_id += 1;
            self.effects.entry(platform_id).or_default().push(PlatformEffect {
                id,
                platform_id,
                kind: kind.clone(),
                duration: duration.map(|d| d.max(0.0)),
                start_time,
            });
            ids.push(id);
        }
        tracing::trace!(
            effect = ?kind.effect_type(),
            platforms = ids.len(),
            "Platform effect added"
        );
        ids
    }

    /// Remove every effect of `effect_type` from the platform.
    pub fn remove_effect(&mut self, platform_id: PlatformId, effect_type: &PlatformEffectType) {
        if let Some(list) = self.effects.get_mut(&platform_id) {
            list.retain(|e| &e.effect_type() != effect_type);
            if list.is_empty() {
                self.effects.remove(&platform_id);
            }
        }
    }

    /// Remove one effect instance wherever it lives.
    pub fn remove_instance(&mut self, id: EffectInstanceId) -> bool {
        let mut found = false;
        self.effects.retain(|_, list| {
            let before = list.len();
            list.retain(|e| e.id != id);
            found |= list.len() != before;
            !list.is_empty()
        });
        found
    }

    pub fn remove_all_effects(&mut self, platform_id: PlatformId) {
        self.effects.remove(&platform_id);
    }

    pub fn clear_all_effects(&mut self) {
        self.effects.clear();
    }

    /// Advance the manager clock and prune expired, non-permanent effects.
    pub fn update(&mut self, delta: Millis) {
        let now = self.clock.advance(delta);
        self.effects.retain(|_, list| {
            if list.iter().any(|e| e.is_expired(now)) {
                list.retain(|e| !e.is_expired(now));
            }
            !list.is_empty()
        });
    }

    /// Draw every visible platform's effects. Returns how many platforms
    /// survived culling.
    pub fn render(
        &self,
        surface: &mut dyn DrawSurface,
        camera: &dyn Camera,
        platforms: &dyn PlatformLookup,
    ) -> usize {
        let bounds = camera.visible_bounds();
        let mut drawn = 0;
        for (&platform_id, list) in &self.effects {
            let Some(platform) = platforms.platform_by_id(platform_id) else {
                tracing::trace!(platform_id, "Effect on unknown platform, skipping");
                continue;
            };
            if !bounds.overlaps(
                platform.x,
                platform.y,
                platform.width,
                platform.height,
                self.cull_margin,
            ) {
                continue;
            }
            let top_left = camera.transform_coordinates(Vec2::new(platform.x, platform.y));
            let rect = Rect::new(
                top_left.x,
                top_left.y,
                camera.transform_x(platform.width),
                camera.transform_y(platform.height),
            );
            for effect in list {
                self.render_effect(surface, rect, &platform, effect);
            }
            drawn += 1;
        }
        drawn
    }

    fn render_effect(
        &self,
        surface: &mut dyn DrawSurface,
        rect: Rect,
        platform: &Platform,
        effect: &PlatformEffect,
    ) {
        let t = (effect.elapsed(self.clock.now()) / 1000.0) as f32;
        match &effect.kind {
            PlatformEffectKind::Highlight { color, intensity } => {
                surface.fill_rect(rect, color.with_alpha(intensity * 0.4));
                surface.stroke_rect(rect, color.with_alpha(*intensity), 2.0);
            },
            PlatformEffectKind::Pulse {
                color,
                intensity,
                speed,
            } => {
                let wave = 0.5 + 0.5 * (t * speed * TAU).sin();
                surface.fill_rect(
                    rect.inflate(wave * 4.0),
                    color.with_alpha(intensity * wave * 0.6),
                );
            },
            PlatformEffectKind::Glow {
                color,
                intensity,
                speed,
            } => {
                let breath = 0.5 + 0.5 * (t * speed * TAU).sin();
                surface.save();
                surface.set_shadow(*color, 10.0 + 10.0 * intensity * breath);
                surface.stroke_rect(rect, color.with_alpha(*intensity), 3.0);
                surface.restore();
            },
            PlatformEffectKind::Rainbow { intensity, speed } => {
                let hue = t * speed * 120.0 + platform.x * 10.0;
                surface.fill_rect(
                    rect,
                    Rgba::from_hsl(hue, 0.9, 0.6).with_alpha(intensity * 0.5),
                );
                surface.stroke_rect(
                    rect,
                    Rgba::from_hsl(hue + 60.0, 0.9, 0.6).with_alpha(*intensity),
                    2.0,
                );
            },
            // Shake moves the platform instead; see `shake_offset`.
            PlatformEffectKind::Shake { .. } => {},
            PlatformEffectKind::Custom { name, .. } => {
                tracing::trace!(effect = %name, "No renderer for custom platform effect");
            },
        }
    }

    /// Positional jitter (world units) from every shake effect on the platform.
    /// Timed shakes decay linearly to zero over their duration.
    pub fn shake_offset(&self, platform_id: PlatformId) -> Vec2 {
        let now = self.clock.now();
        self.effects(platform_id)
            .iter()
            .filter_map(|e| match e.kind {
                PlatformEffectKind::Shake { intensity, speed } => {
                    let elapsed = e.elapsed(now);
                    let decay = match e.duration {
                        Some(d) if d > 0.0 => (1.0 - elapsed / d).max(0.0) as f32,
                        Some(_) => 0.0,
                        None => 1.0,
                    };
                    let t = (elapsed / 1000.0) as f32 * speed;
                    let amp = intensity * decay;
                    Some(Vec2::new(
                        amp * (t * 50.0).sin(),
                        amp * 0.5 * (t * 37.0).cos(),
                    ))
                },
                _ => None,
            })
            .sum()
    }

    pub fn effects(&self, platform_id: PlatformId) -> &[PlatformEffect] {
        self.effects
            .get(&platform_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_effect(&self, platform_id: PlatformId, effect_type: &PlatformEffectType) -> bool {
        self.effects(platform_id)
            .iter()
            .any(|e| &e.effect_type() == effect_type)
    }

    /// Number of platforms carrying at least one effect.
    pub fn platform_count(&self) -> usize {
        self.effects.len()
    }

    pub fn global_time(&self) -> Millis {
        self.clock.now()
    }

    pub fn cull_margin(&self) -> f32 {
        self.cull_margin
    }
}

impl Default for PlatformEffectManager {
    fn default() -> Self {
        Self::new(DeviceClass::Desktop, &RenderTuning::default())
    }
}
