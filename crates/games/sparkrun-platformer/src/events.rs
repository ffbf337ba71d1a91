use serde::{Deserialize, Serialize};

use sparkrun_core::EventBus;

use crate::effects::PlayerEffect;
use crate::item::{ItemEffect, ItemKind};

/// Notifications published by the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// A player effect was added or replaced. Carries the full record.
    EffectAdded(PlayerEffect),
    /// A player effect expired, was removed, or was cleared.
    EffectRemoved(PlayerEffect),
    ItemCollected(ItemCollected),
}

/// Payload of [`GameEvent::ItemCollected`], consumed by statistics listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCollected {
    pub kind: ItemKind,
    pub name: String,
    pub effect: Option<ItemEffect>,
}

/// The bus a game session hands to every component that publishes.
pub type GameBus = EventBus<GameEvent>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_collected_json_shape() {
        let event = GameEvent::ItemCollected(ItemCollected {
            kind: ItemKind::Coin,
            name: "Coin".to_string(),
            effect: None,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "item_collected");
        assert_eq!(json["kind"], "coin");
        assert!(json["effect"].is_null());
    }

    #[test]
    fn event_json_roundtrip() {
        let event = GameEvent::ItemCollected(ItemCollected {
            kind: ItemKind::SpeedBoost,
            name: "Speed Boost".to_string(),
            effect: ItemKind::SpeedBoost.behavior().default_effect(),
        });
        let json = serde_json::to_string(&event).unwrap();
        let back: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
