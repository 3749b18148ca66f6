#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure placement rules deciding whether the cursor cell may be built on or
//! cleared.
//!
//! Rejections are ordinary outcomes of moving the cursor around, so nothing
//! here returns an error: callers read the predicates and suppress the action.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tilecraft_core::{Aabb, LayerName, PartyMember};

/// Maximum building distance from the party leader, in world units.
pub const DEFAULT_REACH: f32 = 125.0;

/// Tunable placement rules.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Maximum straight-line distance between the leader and the target cell.
    pub reach: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            reach: DEFAULT_REACH,
        }
    }
}

/// Predicates computed for a placement attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementCheck {
    /// The target lies within reach of the leader.
    pub within_radius: bool,
    /// The target cell does not overlap the leader's collision body.
    pub not_on_player: bool,
    /// Layer selected when the check ran.
    pub layer: Option<LayerName>,
}

impl PlacementCheck {
    /// Whether the placement cursors should be shown.
    ///
    /// Floor and roof tiles sit below or above the party and are exempt from
    /// the self-overlap rule.
    #[must_use]
    pub fn shows_cursor(&self) -> bool {
        let exempt = self.layer.is_some_and(LayerName::is_overlap_exempt);
        self.within_radius && (exempt || self.not_on_player)
    }

    /// Whether a placement may be committed this frame.
    ///
    /// Walls are never dropped onto the leader's own collision body.
    #[must_use]
    pub fn may_commit(&self, pointer_down: bool) -> bool {
        if !(pointer_down && self.within_radius) {
            return false;
        }
        self.layer != Some(LayerName::Wall) || self.not_on_player
    }
}

/// Predicates computed for a removal attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemovalCheck {
    /// The target lies within reach of the leader.
    pub within_radius: bool,
}

impl RemovalCheck {
    /// Whether the removal cursor should be shown.
    #[must_use]
    pub const fn shows_cursor(&self) -> bool {
        self.within_radius
    }

    /// Whether a removal may be committed this frame.
    #[must_use]
    pub const fn may_commit(&self, pointer_down: bool) -> bool {
        pointer_down && self.within_radius
    }
}

/// Evaluates placement and removal rules against the party leader.
#[derive(Clone, Copy, Debug, Default)]
pub struct Validator {
    config: PlacementConfig,
}

impl Validator {
    /// Creates a validator using the supplied rules.
    #[must_use]
    pub const fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    /// Rules the validator applies.
    #[must_use]
    pub const fn config(&self) -> PlacementConfig {
        self.config
    }

    /// Checks a placement at the cell whose upper-left corner is `target`.
    #[must_use]
    pub fn can_place(
        &self,
        leader: &PartyMember,
        target: Vec2,
        tile_size: Vec2,
        layer: Option<LayerName>,
    ) -> PlacementCheck {
        let cell = Aabb::new(target, tile_size);
        PlacementCheck {
            within_radius: self.within_reach(leader.position, target),
            not_on_player: !cell.overlaps(&leader.body),
            layer,
        }
    }

    /// Checks a removal at the cell whose upper-left corner is `target`.
    #[must_use]
    pub fn can_remove(&self, leader: &PartyMember, target: Vec2) -> RemovalCheck {
        RemovalCheck {
            within_radius: self.within_reach(leader.position, target),
        }
    }

    /// Whether `target` lies within reach of `origin`; the boundary is inclusive.
    #[must_use]
    pub fn within_reach(&self, origin: Vec2, target: Vec2) -> bool {
        let delta = (origin - target).abs();
        delta.x.hypot(delta.y) <= self.config.reach
    }
}
