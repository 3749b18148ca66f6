#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Roof visibility around each party member.
//!
//! Every tick the engine grows or shrinks two radii (one for the leader, one
//! shared by the followers) and fades roof tiles inside the resulting circles
//! so the party stays visible while standing under a roof. Faded tiles are
//! restored by a one-shot reset owned by [`ResetScheduler`].

use std::{collections::BTreeSet, time::Duration};

use glam::Vec2;
use log::trace;
use serde::{Deserialize, Serialize};
use tilecraft_core::{Party, TileCoord, TimerId};
use tilecraft_world::Layer;

mod scheduler;

pub use scheduler::ResetScheduler;

/// Fraction of the leader radius inside which tiles vanish completely.
const LEADER_INNER_FRACTION: f32 = 0.5;
/// Fraction of the follower radius inside which tiles vanish completely.
const FOLLOWER_INNER_FRACTION: f32 = 0.25;
/// Fraction of the follower radius at which the follower fade starts.
const FOLLOWER_FADE_START_FRACTION: f32 = 0.5;

/// Opacity of leader-circle tiles while editing the roof layer.
const BUILD_ROOF_OPACITY: f32 = 0.5;
/// Opacity of leader-circle tiles while editing any other layer.
const BUILD_OTHER_OPACITY: f32 = 0.1;
/// Opacity of follower-circle tiles while building.
const BUILD_FOLLOWER_OPACITY: f32 = 0.5;

/// Growth and decay rates of the visibility radii.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Cap of the leader radius.
    pub leader_max: f32,
    /// Leader radius added per tick while growing.
    pub leader_grow: f32,
    /// Leader radius removed per tick while shrinking.
    pub leader_shrink: f32,
    /// Cap of the follower radius.
    pub follower_max: f32,
    /// Follower radius added per tick while growing.
    pub follower_grow: f32,
    /// Follower radius removed per tick while shrinking.
    pub follower_shrink: f32,
    /// Follower radius never shrinks below this value once above it.
    pub follower_floor: f32,
    /// Delay before a faded tile is restored, in milliseconds.
    pub reset_delay_ms: u64,
}

impl VisibilityConfig {
    /// Delay before a faded tile is restored.
    #[must_use]
    pub const fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            leader_max: 200.0,
            leader_grow: 3.0,
            leader_shrink: 2.0,
            follower_max: 60.0,
            follower_grow: 2.0,
            follower_shrink: 1.0,
            follower_floor: 40.0,
            reset_delay_ms: 17,
        }
    }
}

/// Current visibility radii.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VisibilityRadii {
    /// Outer radius around the leader.
    pub leader: f32,
    /// Radius around each follower.
    pub follower: f32,
}

impl VisibilityRadii {
    fn advance(&mut self, growing: bool, config: &VisibilityConfig) {
        if growing {
            if self.leader < config.leader_max {
                self.leader = (self.leader + config.leader_grow).min(config.leader_max);
            }
            if self.follower < config.follower_max {
                self.follower = (self.follower + config.follower_grow).min(config.follower_max);
            }
        } else {
            if self.leader > 0.0 {
                self.leader = (self.leader - config.leader_shrink).max(0.0);
            }
            if self.follower > config.follower_floor {
                self.follower = (self.follower - config.follower_shrink).max(config.follower_floor);
            }
        }
    }
}

/// Session facts the engine needs each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisibilityInput {
    /// Build mode is active.
    pub building: bool,
    /// The roof layer is selected for editing.
    pub roof_selected: bool,
}

/// Per-tick roof fading driven by party positions.
#[derive(Clone, Debug)]
pub struct VisibilityEngine {
    config: VisibilityConfig,
    radii: VisibilityRadii,
    scheduler: ResetScheduler,
}

impl VisibilityEngine {
    /// Creates an engine with both radii collapsed.
    #[must_use]
    pub fn new(config: VisibilityConfig) -> Self {
        Self::with_radii(config, VisibilityRadii::default())
    }

    /// Creates an engine starting from the provided radii.
    #[must_use]
    pub fn with_radii(config: VisibilityConfig, radii: VisibilityRadii) -> Self {
        Self {
            scheduler: ResetScheduler::new(config.reset_delay()),
            config,
            radii,
        }
    }

    /// Current radii.
    #[must_use]
    pub const fn radii(&self) -> VisibilityRadii {
        self.radii
    }

    /// Rates the engine applies.
    #[must_use]
    pub const fn config(&self) -> &VisibilityConfig {
        &self.config
    }

    /// Outstanding opacity resets.
    #[must_use]
    pub const fn scheduler(&self) -> &ResetScheduler {
        &self.scheduler
    }

    /// Releases the pending reset of a tile that is leaving the roof layer.
    pub fn release(&mut self, coord: TileCoord, timer: Option<TimerId>) {
        if let Some(timer) = timer {
            self.scheduler.release(timer, coord);
        }
    }

    /// Fires resets due at or before `now`, returning the number of tiles restored.
    pub fn fire_due(&mut self, now: Duration, roof: &mut Layer) -> usize {
        self.scheduler.fire_due(now, roof)
    }

    /// Runs one visibility pass over the roof layer.
    ///
    /// `now` is the host clock used to schedule resets. An empty party leaves
    /// everything untouched.
    pub fn update(&mut self, roof: &mut Layer, party: &Party, input: VisibilityInput, now: Duration) {
        let Some(leader) = party.leader() else {
            return;
        };

        let under_roof = roof.tile_at_world(leader.position).is_some();
        let growing = under_roof || (input.building && input.roof_selected);
        self.radii.advance(growing, &self.config);
        trace!(
            "roof visibility: leader {:.1}, follower {:.1}, growing {growing}",
            self.radii.leader,
            self.radii.follower
        );

        let outer = self.radii.leader;
        let inner = outer * LEADER_INNER_FRACTION;
        let follower_radius = self.radii.follower;

        let leader_circle = circle(roof, leader.position, outer);
        let follower_circles: Vec<(Vec2, Vec<TileCoord>)> = party
            .followers()
            .map(|member| (member.position, circle(roof, member.position, follower_radius)))
            .collect();

        if input.building {
            let leader_opacity = if input.roof_selected {
                BUILD_ROOF_OPACITY
            } else {
                BUILD_OTHER_OPACITY
            };
            set_all(roof, &leader_circle, leader_opacity);
            for (_, tiles) in &follower_circles {
                set_all(roof, tiles, BUILD_FOLLOWER_OPACITY);
            }
        } else {
            // Followers first so the leader pass can only tighten their result.
            let fade_start = follower_radius * FOLLOWER_FADE_START_FRACTION;
            for (center, tiles) in &follower_circles {
                fade(roof, tiles, *center, fade_start, follower_radius - fade_start);
                let vanished = circle(roof, *center, follower_radius * FOLLOWER_INNER_FRACTION);
                set_all(roof, &vanished, 0.0);
            }

            fade(roof, &leader_circle, leader.position, inner, outer - inner);
            let vanished = circle(roof, leader.position, inner);
            set_all(roof, &vanished, 0.0);
        }

        let untimed: BTreeSet<TileCoord> = leader_circle
            .iter()
            .chain(follower_circles.iter().flat_map(|(_, tiles)| tiles.iter()))
            .copied()
            .filter(|coord| {
                roof.tile_at(*coord)
                    .is_some_and(|tile| tile.fade_timer().is_none())
            })
            .collect();
        if untimed.is_empty() {
            return;
        }

        let coords: Vec<TileCoord> = untimed.into_iter().collect();
        let timer = self.scheduler.schedule(now, coords.clone());
        for coord in coords {
            if let Some(tile) = roof.tile_at_mut(coord) {
                tile.mark_fade_pending(timer);
            }
        }
    }
}

fn circle(layer: &Layer, center: Vec2, radius: f32) -> Vec<TileCoord> {
    layer
        .tiles_within_radius(center, radius, |_| true)
        .into_iter()
        .map(|tile| tile.coord())
        .collect()
}

fn set_all(layer: &mut Layer, coords: &[TileCoord], opacity: f32) {
    for coord in coords {
        if let Some(tile) = layer.tile_at_mut(*coord) {
            tile.set_opacity(opacity);
        }
    }
}

/// Lowers each tile to `(distance - start) / span`, keeping lower opacities.
fn fade(layer: &mut Layer, coords: &[TileCoord], center: Vec2, start: f32, span: f32) {
    if !(span > 0.0) {
        return;
    }
    for coord in coords {
        let distance = layer.tile_center(*coord).distance(center);
        if let Some(tile) = layer.tile_at_mut(*coord) {
            let _ = tile.lower_opacity((distance - start) / span);
        }
    }
}
