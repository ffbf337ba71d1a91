use std::collections::BTreeMap;

use sparkrun_core::EventQueue;

use crate::events::{GameBus, GameEvent};
use crate::item::ItemKind;

/// Running pickup tally, fed from the game bus.
pub struct CollectionStats {
    queue: EventQueue<GameEvent>,
    counts: BTreeMap<ItemKind, u32>,
    total: u32,
}

impl CollectionStats {
    pub fn attach(bus: &GameBus) -> Self {
        Self {
            queue: bus.queue(),
            counts: BTreeMap::new(),
            total: 0,
        }
    }

    /// Fold in every `ItemCollected` seen since the last poll.
    pub fn poll(&mut self) {
        for event in self.queue.drain() {
            if let GameEvent::ItemCollected(collected) = event {
                *self.counts.entry(collected.kind).or_default() += 1;
                self.total += 1;
            }
        }
    }

    pub fn count(&self, kind: ItemKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn counts(&self) -> &BTreeMap<ItemKind, u32> {
        &self.counts
    }
}
