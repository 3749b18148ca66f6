//! One-shot opacity resets keyed by timer identity.

use std::{collections::BTreeMap, time::Duration};

use tilecraft_core::{TileCoord, TimerId};
use tilecraft_world::Layer;

#[derive(Clone, Debug)]
struct PendingReset {
    due: Duration,
    tiles: Vec<TileCoord>,
}

/// Queue of debounced resets that restore faded tiles to full opacity.
///
/// Each tile carries at most one outstanding reset; firing a reset whose tile
/// has since been removed or replaced does nothing.
#[derive(Clone, Debug)]
pub struct ResetScheduler {
    delay: Duration,
    next_id: u64,
    pending: BTreeMap<TimerId, PendingReset>,
}

impl ResetScheduler {
    /// Creates an empty scheduler whose resets fire `delay` after scheduling.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_id: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Delay between scheduling and firing.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of resets that have not fired yet.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Time at which the earliest outstanding reset fires.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.values().map(|reset| reset.due).min()
    }

    /// Queues a single reset covering `tiles` and returns its identity.
    pub fn schedule(&mut self, now: Duration, tiles: Vec<TileCoord>) -> TimerId {
        let timer = TimerId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let _ = self.pending.insert(
            timer,
            PendingReset {
                due: now.saturating_add(self.delay),
                tiles,
            },
        );
        timer
    }

    /// Drops `coord` from the reset identified by `timer`.
    ///
    /// The reset itself is cancelled once it covers no tiles.
    pub fn release(&mut self, timer: TimerId, coord: TileCoord) {
        let Some(reset) = self.pending.get_mut(&timer) else {
            return;
        };
        reset.tiles.retain(|tile| *tile != coord);
        if reset.tiles.is_empty() {
            let _ = self.pending.remove(&timer);
        }
    }

    /// Fires every reset due at or before `now` against `layer`.
    ///
    /// Restores opacity unconditionally on every tile that still carries the
    /// firing reset's marker. Returns the number of tiles restored.
    pub fn fire_due(&mut self, now: Duration, layer: &mut Layer) -> usize {
        let due: Vec<TimerId> = self
            .pending
            .iter()
            .filter(|(_, reset)| reset.due <= now)
            .map(|(timer, _)| *timer)
            .collect();

        let mut restored = 0;
        for timer in due {
            let Some(reset) = self.pending.remove(&timer) else {
                continue;
            };
            for coord in reset.tiles {
                let Some(tile) = layer.tile_at_mut(coord) else {
                    continue;
                };
                if tile.fade_timer() != Some(timer) {
                    continue;
                }
                tile.set_opacity(1.0);
                tile.clear_fade_pending();
                restored += 1;
            }
        }
        restored
    }
}
