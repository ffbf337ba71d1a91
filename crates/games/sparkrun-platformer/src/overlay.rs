//! Active-effect indicator list.
//!
//! The overlay only ever learns about effects through `EffectAdded` and
//! `EffectRemoved` notifications; it never reads the effect manager. Its
//! timers (countdown refresh, exit transition) run on whatever clock the host
//! passes to [`EffectOverlay::poll`].

use glam::Vec2;

use sparkrun_core::render::{DrawSurface, Rect, Rgba};
use sparkrun_core::{EventQueue, Millis};

use crate::config::OverlayTuning;
use crate::effects::{EffectKind, PlayerEffect};
use crate::events::{GameBus, GameEvent};

const ROW_WIDTH: f32 = 180.0;
const ROW_HEIGHT: f32 = 36.0;
const ROW_GAP: f32 = 6.0;

/// One indicator row.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayEntry {
    pub kind: EffectKind,
    pub name: String,
    pub icon: String,
    pub color: Rgba,
    /// Remaining fraction shown by the progress bar, `1.0` when fresh.
    pub progress: f64,
    pub countdown: String,
    pub exiting: bool,
    effect: PlayerEffect,
    remove_at: Option<Millis>,
    last_refresh: Option<Millis>,
}

impl OverlayEntry {
    fn from_effect(effect: &PlayerEffect) -> Self {
        Self {
            kind: effect.kind.clone(),
            name: effect.name.clone(),
            icon: effect.icon.clone(),
            color: effect.color,
            progress: 1.0,
            countdown: format_countdown(effect.duration),
            exiting: false,
            effect: effect.clone(),
            remove_at: None,
            last_refresh: None,
        }
    }

    fn refresh(&mut self, now: Millis) {
        self.progress = self.effect.remaining_fraction(now);
        self.countdown = format_countdown(self.effect.remaining(now));
        self.last_refresh = Some(now);
    }
}

pub struct EffectOverlay {
    queue: EventQueue<GameEvent>,
    entries: Vec<OverlayEntry>,
    tuning: OverlayTuning,
}

impl EffectOverlay {
    /// Subscribe to `bus`. The overlay stays subscribed until detached or dropped.
    pub fn attach(bus: &GameBus, tuning: OverlayTuning) -> Self {
        Self {
            queue: bus.queue(),
            entries: Vec::new(),
            tuning,
        }
    }

    /// Apply pending notifications, refresh countdowns that are due, and drop
    /// entries whose exit transition has finished.
    pub fn poll(&mut self, now: Millis) {
        for event in self.queue.drain() {
            match event {
                GameEvent::EffectAdded(effect) => {
                    self.entries.retain(|e| e.kind != effect.kind);
                    self.entries.push(OverlayEntry::from_effect(&effect));
                },
                GameEvent::EffectRemoved(effect) => {
                    let exit_at = now + self.tuning.exit_transition_ms;
                    if let Some(entry) = self
                        .entries
                        .iter_mut()
                        .find(|e| e.kind == effect.kind && !e.exiting)
                    {
                        entry.exiting = true;
                        entry.remove_at = Some(exit_at);
                    }
                },
                GameEvent::ItemCollected(_) => {},
            }
        }

        self.entries.retain(|e| e.remove_at.is_none_or(|at| now < at));

        let interval = self.tuning.poll_interval_ms;
        for entry in self.entries.iter_mut().filter(|e| !e.exiting) {
            if entry.last_refresh.is_none_or(|last| now - last >= interval) {
                entry.refresh(now);
            }
        }
    }

    pub fn entries(&self) -> &[OverlayEntry] {
        &self.entries
    }

    pub fn is_attached(&self) -> bool {
        self.queue.is_attached()
    }

    /// Unsubscribe. Existing entries stay until the host drops the overlay.
    pub fn detach(&mut self) {
        self.queue.detach();
    }

    /// Draw the indicator list in screen space, stacked down from `origin`.
    pub fn render(&self, surface: &mut dyn DrawSurface, origin: Vec2) {
        for (i, entry) in self.entries.iter().enumerate() {
            let top = origin + Vec2::new(0.0, i as f32 * (ROW_HEIGHT + ROW_GAP));
            surface.save();
            surface.set_global_alpha(if entry.exiting { 0.4 } else { 1.0 });
            surface.fill_rect(
                Rect::new(top.x, top.y, ROW_WIDTH, ROW_HEIGHT),
                Rgba::new(0.0, 0.0, 0.0, 0.6),
            );
            surface.fill_text(&entry.icon, top + Vec2::new(8.0, 22.0), 16.0, entry.color);
            surface.fill_text(&entry.name, top + Vec2::new(32.0, 16.0), 12.0, Rgba::WHITE);
            surface.fill_text(
                &entry.countdown,
                top + Vec2::new(ROW_WIDTH - 40.0, 16.0),
                12.0,
                Rgba::WHITE,
            );
            surface.fill_rect(
                Rect::new(
                    top.x + 32.0,
                    top.y + ROW_HEIGHT - 10.0,
                    (ROW_WIDTH - 40.0) * entry.progress as f32,
                    4.0,
                ),
                entry.color,
            );
            surface.restore();
        }
    }
}

/// `Ns` under a minute, `M:SS` from a minute up. Seconds round up, so a
/// timer shows `1s` until it actually hits zero.
pub fn format_countdown(remaining: Millis) -> String {
    let secs = (remaining.max(0.0) / 1000.0).ceil() as u64;
    if secs < 60 {
        format!("{secs}s")
    } else {
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}
