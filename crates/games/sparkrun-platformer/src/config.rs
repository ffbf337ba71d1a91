use std::path::Path;

use serde::{Deserialize, Serialize};

use sparkrun_core::Millis;

use crate::error::ConfigError;

/// Speed multiplier granted by a speed boost.
pub const SPEED_BOOST_MULTIPLIER: f32 = 1.5;
/// Jump multiplier granted by a jump boost.
pub const JUMP_BOOST_MULTIPLIER: f32 = 1.3;
/// Distance (world units) between item and player centers that triggers pickup.
pub const COLLECT_RADIUS: f32 = 1.0;
/// Pickup radius multiplier while the player has a magnet.
pub const MAGNET_RADIUS_SCALE: f32 = 3.0;
/// Fade-out window before an item's lifespan ends.
pub const ITEM_FADE_OUT_MS: Millis = 1000.0;
/// Delay between an overlay entry being flagged for exit and its removal.
pub const OVERLAY_EXIT_TRANSITION_MS: Millis = 300.0;
/// How often overlay entries refresh their countdown.
pub const OVERLAY_POLL_INTERVAL_MS: Millis = 100.0;

const CONFIG_ENV: &str = "SPARKRUN_PLATFORMER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/platformer.toml";

/// Per-kind player effect tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectTuning {
    pub speed_boost_multiplier: f32,
    pub jump_boost_multiplier: f32,
    pub speed_boost_ms: Millis,
    pub jump_boost_ms: Millis,
    pub shield_ms: Millis,
    pub magnet_ms: Millis,
    pub double_jump_ms: Millis,
    /// Duration for custom effect kinds that do not specify one.
    pub custom_ms: Millis,
}

impl Default for EffectTuning {
    fn default() -> Self {
        Self {
            speed_boost_multiplier: SPEED_BOOST_MULTIPLIER,
            jump_boost_multiplier: JUMP_BOOST_MULTIPLIER,
            speed_boost_ms: 5000.0,
            jump_boost_ms: 5000.0,
            shield_ms: 8000.0,
            magnet_ms: 6000.0,
            double_jump_ms: 10_000.0,
            custom_ms: 5000.0,
        }
    }
}

/// Collectible item tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemTuning {
    pub size: f32,
    pub collect_radius: f32,
    pub fade_out_ms: Millis,
    /// Lifespan applied to newly spawned items. `None` means they never expire.
    pub default_lifespan_ms: Option<Millis>,
    pub show_lifespan_bar: bool,
    pub burst_particles: usize,
    pub magnet_radius_scale: f32,
}

impl Default for ItemTuning {
    fn default() -> Self {
        Self {
            size: 1.0,
            collect_radius: COLLECT_RADIUS,
            fade_out_ms: ITEM_FADE_OUT_MS,
            default_lifespan_ms: None,
            show_lifespan_bar: true,
            burst_particles: 14,
            magnet_radius_scale: MAGNET_RADIUS_SCALE,
        }
    }
}

/// Culling margins, in world units, around the camera's visible bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderTuning {
    pub desktop_cull_margin: f32,
    /// Touch devices scroll faster, so they cull with a wider margin.
    pub mobile_cull_margin: f32,
}

impl Default for RenderTuning {
    fn default() -> Self {
        Self {
            desktop_cull_margin: 2.0,
            mobile_cull_margin: 4.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayTuning {
    pub poll_interval_ms: Millis,
    pub exit_transition_ms: Millis,
}

impl Default for OverlayTuning {
    fn default() -> Self {
        Self {
            poll_interval_ms: OVERLAY_POLL_INTERVAL_MS,
            exit_transition_ms: OVERLAY_EXIT_TRANSITION_MS,
        }
    }
}

/// Top-level platformer configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformerConfig {
    pub effects: EffectTuning,
    pub items: ItemTuning,
    pub render: RenderTuning,
    pub overlay: OverlayTuning,
}

impl PlatformerConfig {
    /// Load config from the path in `SPARKRUN_PLATFORMER_CONFIG`, or
    /// `config/platformer.toml`. Falls back to defaults if the file is missing
    /// or unparseable.
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        match Self::from_file(&path) {
            Ok(cfg) => cfg,
            Err(ConfigError::Io { .. }) => {
                tracing::debug!("No config at {path}, using defaults");
                Self::default()
            },
            Err(e) => {
                tracing::warn!("{e}, using defaults");
                Self::default()
            },
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: "<inline>".to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = PlatformerConfig::from_toml_str(
            r#"
            [effects]
            speed_boost_multiplier = 2.0

            [items]
            default_lifespan_ms = 8000.0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.effects.speed_boost_multiplier, 2.0);
        assert_eq!(cfg.effects.jump_boost_multiplier, JUMP_BOOST_MULTIPLIER);
        assert_eq!(cfg.items.default_lifespan_ms, Some(8000.0));
        assert_eq!(cfg.items.collect_radius, COLLECT_RADIUS);
        assert_eq!(cfg.overlay.exit_transition_ms, OVERLAY_EXIT_TRANSITION_MS);
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let err = PlatformerConfig::from_toml_str("effects = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("<inline>"));
    }

    #[test]
    fn shipped_config_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../../config/platformer.toml");
        let cfg = PlatformerConfig::from_file(path).unwrap();
        assert_eq!(cfg.items.magnet_radius_scale, MAGNET_RADIUS_SCALE);
        assert_eq!(cfg.items.default_lifespan_ms, None);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = PlatformerConfig::from_file("definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn defaults_roundtrip_through_toml() {
        let text = toml::to_string(&PlatformerConfig::default()).unwrap();
        let back = PlatformerConfig::from_toml_str(&text).unwrap();
        assert_eq!(back.render.mobile_cull_margin, 4.0);
    }
}
