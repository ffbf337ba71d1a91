//! Gameplay runtime for the sparkrun platformer: collectible items, timed
//! player effects, decorative platform effects and the active-effect overlay.
//!
//! Everything here is single-threaded and driven by explicit `delta`
//! milliseconds from the host loop. Components talk to each other through a
//! [`GameBus`]; the [`GameSession`] wires them together.

pub mod config;
pub mod effects;
pub mod error;
pub mod events;
pub mod item;
pub mod overlay;
pub mod particles;
pub mod platform_effects;
pub mod session;
pub mod stats;

pub use config::PlatformerConfig;
pub use effects::{
    EffectKind, EffectManager, EffectSpec, Modifier, PlayerEffect, PlayerModifiers,
};
pub use error::ConfigError;
pub use events::{GameBus, GameEvent, ItemCollected};
pub use item::{Item, ItemBehavior, ItemContext, ItemEffect, ItemKind, ItemLifecycle};
pub use overlay::{EffectOverlay, OverlayEntry};
pub use particles::ParticleSystem;
pub use platform_effects::{
    DeviceClass, EffectInstanceId, Platform, PlatformEffect, PlatformEffectKind,
    PlatformEffectManager, PlatformEffectType, PlatformId, PlatformLookup,
};
pub use session::{GameSession, PlayerBody};
pub use stats::CollectionStats;
