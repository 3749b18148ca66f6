//! Aggregated configuration for the tilemap builder.

use serde::{Deserialize, Serialize};
use tilecraft_system_placement::PlacementConfig;
use tilecraft_system_tagging::SpecialConfig;
use tilecraft_system_visibility::VisibilityConfig;
use tilecraft_world::{LayerDepths, TileSetConfig};

use crate::BuilderError;

/// Every tunable of the building subsystem. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Tile-sets bound to the four building layers.
    pub tile_sets: Vec<TileSetConfig>,
    /// Rendering depths of layers and cursors.
    pub depths: LayerDepths,
    /// Placement reach.
    pub placement: PlacementConfig,
    /// Roof visibility rates.
    pub visibility: VisibilityConfig,
    /// Special-layer placement settings.
    pub special: SpecialConfig,
}

impl BuilderConfig {
    /// Rejects distances and rates that are negative or not finite.
    pub(crate) fn validate(&self) -> Result<(), BuilderError> {
        let reach = self.placement.reach;
        if !is_distance(reach) {
            return Err(BuilderError::InvalidReach { reach });
        }

        let visibility = &self.visibility;
        for (field, value) in [
            ("leader_max", visibility.leader_max),
            ("leader_grow", visibility.leader_grow),
            ("leader_shrink", visibility.leader_shrink),
            ("follower_max", visibility.follower_max),
            ("follower_grow", visibility.follower_grow),
            ("follower_shrink", visibility.follower_shrink),
            ("follower_floor", visibility.follower_floor),
        ] {
            if !is_distance(value) {
                return Err(BuilderError::InvalidVisibility { field, value });
            }
        }
        Ok(())
    }
}

fn is_distance(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            tile_sets: TileSetConfig::defaults(),
            depths: LayerDepths::default(),
            placement: PlacementConfig::default(),
            visibility: VisibilityConfig::default(),
            special: SpecialConfig::default(),
        }
    }
}
