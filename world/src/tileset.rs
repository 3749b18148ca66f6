//! Tile-set tables bound to individual layers.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tilecraft_core::LayerName;

use crate::RegistryError;

/// Declared metadata value attached to a tile-set index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean flag.
    Bool(bool),
    /// Whole number.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Free-form text.
    Text(String),
}

/// Named properties declared for a single tile-set index.
pub type TileProperties = BTreeMap<String, PropertyValue>;

/// Properties declared for one local index of a tile-set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileDefinition {
    /// Local index within the tile-set.
    pub index: u32,
    /// Properties attached to tiles placed with this index.
    #[serde(default)]
    pub properties: TileProperties,
}

/// Configuration describing the tile-set bound to one layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileSetConfig {
    /// Layer the tile-set is bound to.
    pub layer: LayerName,
    /// Asset key of the tile-set image.
    pub key: String,
    /// Global index of the first tile in the set.
    pub first_gid: u32,
    /// Number of tiles contained in the set.
    pub tile_count: u32,
    /// Width of a single tile in world units.
    #[serde(default = "default_tile_edge")]
    pub tile_width: u32,
    /// Height of a single tile in world units.
    #[serde(default = "default_tile_edge")]
    pub tile_height: u32,
    /// Per-index metadata declared by the tile-set.
    #[serde(default)]
    pub tiles: Vec<TileDefinition>,
}

impl TileSetConfig {
    /// Creates a configuration with square tiles and no declared properties.
    #[must_use]
    pub fn new(layer: LayerName, key: impl Into<String>, first_gid: u32, tile_count: u32) -> Self {
        Self {
            layer,
            key: key.into(),
            first_gid,
            tile_count,
            tile_width: DEFAULT_TILE_EDGE,
            tile_height: DEFAULT_TILE_EDGE,
            tiles: Vec::new(),
        }
    }

    /// Default tile-sets used by the building layers.
    ///
    /// Each set holds 64 tiles of 16×16 units and the global index ranges are
    /// allocated in floor, wall, roof, special order.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        const COUNT: u32 = 64;
        vec![
            Self::new(LayerName::Floor, "floorTiles", 1, COUNT),
            Self::new(LayerName::Wall, "wallTiles", 1 + COUNT, COUNT),
            Self::new(LayerName::Roof, "roofTiles", 1 + 2 * COUNT, COUNT),
            Self::new(LayerName::Special, "specialTiles", 1 + 3 * COUNT, COUNT),
        ]
    }
}

const DEFAULT_TILE_EDGE: u32 = 16;

fn default_tile_edge() -> u32 {
    DEFAULT_TILE_EDGE
}

/// Table mapping global tile indices to per-index metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct TileSet {
    key: String,
    first_gid: u32,
    tile_count: u32,
    tile_size: Vec2,
    properties: BTreeMap<u32, TileProperties>,
}

impl TileSet {
    /// Builds a tile-set from its configuration.
    pub fn from_config(config: &TileSetConfig) -> Result<Self, RegistryError> {
        if config.tile_width == 0 || config.tile_height == 0 {
            return Err(RegistryError::EmptyTileSize {
                key: config.key.clone(),
            });
        }

        let mut properties = BTreeMap::new();
        for definition in &config.tiles {
            if definition.index >= config.tile_count {
                return Err(RegistryError::PropertyIndexOutOfRange {
                    key: config.key.clone(),
                    index: definition.index,
                });
            }
            let _ = properties.insert(definition.index, definition.properties.clone());
        }

        Ok(Self {
            key: config.key.clone(),
            first_gid: config.first_gid,
            tile_count: config.tile_count,
            tile_size: Vec2::new(config.tile_width as f32, config.tile_height as f32),
            properties,
        })
    }

    /// Asset key of the tile-set.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Global index of the first tile in the set.
    #[must_use]
    pub const fn first_gid(&self) -> u32 {
        self.first_gid
    }

    /// Number of tiles contained in the set.
    #[must_use]
    pub const fn tile_count(&self) -> u32 {
        self.tile_count
    }

    /// Dimensions of a single tile in world units.
    #[must_use]
    pub const fn tile_size(&self) -> Vec2 {
        self.tile_size
    }

    /// Global index of the tile at `offset` within this set.
    #[must_use]
    pub const fn global_index(&self, offset: u32) -> u32 {
        self.first_gid.saturating_add(offset)
    }

    /// Reports whether the global index belongs to this set.
    #[must_use]
    pub fn contains_gid(&self, gid: u32) -> bool {
        gid >= self.first_gid && gid - self.first_gid < self.tile_count
    }

    /// Properties declared for the given global index, if any.
    #[must_use]
    pub fn properties_for(&self, gid: u32) -> Option<&TileProperties> {
        if !self.contains_gid(gid) {
            return None;
        }
        self.properties.get(&(gid - self.first_gid))
    }

    pub(crate) fn gid_range_overlaps(&self, other: &TileSet) -> bool {
        let self_end = u64::from(self.first_gid) + u64::from(self.tile_count);
        let other_end = u64::from(other.first_gid) + u64::from(other.tile_count);
        u64::from(self.first_gid) < other_end && u64::from(other.first_gid) < self_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_are_looked_up_by_global_index() {
        let mut config = TileSetConfig::new(LayerName::Wall, "wallTiles", 65, 8);
        let mut properties = TileProperties::new();
        let _ = properties.insert("material".to_owned(), PropertyValue::Text("stone".to_owned()));
        config.tiles.push(TileDefinition {
            index: 4,
            properties: properties.clone(),
        });

        let tile_set = TileSet::from_config(&config).expect("tile-set builds");
        assert_eq!(tile_set.global_index(4), 69);
        assert_eq!(tile_set.properties_for(69), Some(&properties));
        assert_eq!(tile_set.properties_for(68), None);
        assert_eq!(tile_set.properties_for(4), None, "local indices are not global");
    }

    #[test]
    fn zero_sized_tiles_are_rejected() {
        let mut config = TileSetConfig::new(LayerName::Floor, "floorTiles", 1, 8);
        config.tile_width = 0;
        assert_eq!(
            TileSet::from_config(&config),
            Err(RegistryError::EmptyTileSize {
                key: "floorTiles".to_owned(),
            })
        );
    }

    #[test]
    fn default_tile_sets_do_not_overlap() {
        let sets: Vec<TileSet> = TileSetConfig::defaults()
            .iter()
            .map(|config| TileSet::from_config(config).expect("default builds"))
            .collect();
        for (index, set) in sets.iter().enumerate() {
            for other in sets.iter().skip(index + 1) {
                assert!(!set.gid_range_overlaps(other), "{} overlaps {}", set.key(), other.key());
            }
        }
    }

    #[test]
    fn tile_set_config_parses_from_toml() {
        let config: TileSetConfig = toml::from_str(
            r#"
            layer = "wall"
            key = "wallTiles"
            first_gid = 65
            tile_count = 16

            [[tiles]]
            index = 2
            properties = { material = "brick", sturdy = true, weight = 3 }
            "#,
        )
        .expect("config parses");

        assert_eq!(config.layer, LayerName::Wall);
        assert_eq!(config.tile_width, 16);
        let properties = &config.tiles[0].properties;
        assert_eq!(properties.get("sturdy"), Some(&PropertyValue::Bool(true)));
        assert_eq!(properties.get("weight"), Some(&PropertyValue::Integer(3)));
    }
}
