#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative layer registry for the Tilecraft building subsystem.
//!
//! The registry owns the four building layers, their tile-set bindings and
//! the sparse tile grids. It performs the world/tile coordinate snapping that
//! every other system relies on and never emits events itself.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tilecraft_core::{LayerName, Rotation, TileCoord, TimerId};

mod tileset;

pub use tileset::{PropertyValue, TileDefinition, TileProperties, TileSet, TileSetConfig};

/// Errors raised while binding tile-sets to layers.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A layer was never bound to a tile-set.
    #[error("layer `{0}` has no tile-set binding")]
    UnboundLayer(LayerName),
    /// A tile-set declared a zero tile width or height.
    #[error("tile-set `{key}` declares an empty tile size")]
    EmptyTileSize {
        /// Key of the offending tile-set.
        key: String,
    },
    /// Tile properties were declared for an index outside the tile-set.
    #[error("tile-set `{key}` declares properties for index {index} beyond its tile count")]
    PropertyIndexOutOfRange {
        /// Key of the offending tile-set.
        key: String,
        /// Local index that was out of range.
        index: u32,
    },
    /// Two tile-sets claim overlapping global index ranges.
    #[error("tile-sets `{first}` and `{second}` share global indices")]
    OverlappingTileSets {
        /// Key of the tile-set bound first.
        first: String,
        /// Key of the tile-set bound second.
        second: String,
    },
}

/// Sides of a tile that block movement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CollisionFlags {
    /// Blocks entry from the left.
    pub left: bool,
    /// Blocks entry from the right.
    pub right: bool,
    /// Blocks entry from above.
    pub up: bool,
    /// Blocks entry from below.
    pub down: bool,
}

impl CollisionFlags {
    /// Blocked on all four sides.
    pub const ALL_SIDES: Self = Self {
        left: true,
        right: true,
        up: true,
        down: true,
    };
}

/// Single occupied grid cell owned by a layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    coord: TileCoord,
    index: u32,
    rotation: Rotation,
    opacity: f32,
    collision: Option<CollisionFlags>,
    properties: TileProperties,
    fade_timer: Option<TimerId>,
}

impl Tile {
    fn new(coord: TileCoord, index: u32, rotation: Rotation) -> Self {
        Self {
            coord,
            index,
            rotation,
            opacity: 1.0,
            collision: None,
            properties: TileProperties::new(),
            fade_timer: None,
        }
    }

    /// Cell occupied by the tile.
    #[must_use]
    pub const fn coord(&self) -> TileCoord {
        self.coord
    }

    /// Global tile-set index.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Rotation captured when the tile was placed.
    #[must_use]
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Current opacity in `0.0..=1.0`.
    #[must_use]
    pub const fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Collision flags, present only for collidable tiles.
    #[must_use]
    pub const fn collision(&self) -> Option<CollisionFlags> {
        self.collision
    }

    /// Tile-set properties attached at placement.
    #[must_use]
    pub fn properties(&self) -> &TileProperties {
        &self.properties
    }

    /// Outstanding opacity reset, if one is scheduled.
    #[must_use]
    pub const fn fade_timer(&self) -> Option<TimerId> {
        self.fade_timer
    }

    /// Overwrites the opacity, clamped into `0.0..=1.0`.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    /// Applies `opacity` only when it is strictly lower than the current value.
    ///
    /// Returns `true` when the tile changed.
    pub fn lower_opacity(&mut self, opacity: f32) -> bool {
        if opacity < self.opacity {
            self.set_opacity(opacity);
            true
        } else {
            false
        }
    }

    /// Records the reset that will restore this tile's opacity.
    pub fn mark_fade_pending(&mut self, timer: TimerId) {
        self.fade_timer = Some(timer);
    }

    /// Clears the pending reset marker.
    pub fn clear_fade_pending(&mut self) {
        self.fade_timer = None;
    }
}

/// Rendering depth configuration for the building layers and cursors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerDepths {
    /// Base depth for layers drawn below the party.
    pub lower: f32,
    /// Base depth for layers drawn above the party.
    pub upper: f32,
    /// Base depth for the cursors.
    pub cursor: f32,
}

impl LayerDepths {
    /// Depth assigned to the given layer.
    ///
    /// floor < wall < special < roof holds for every configuration.
    #[must_use]
    pub fn layer(&self, layer: LayerName) -> f32 {
        match layer {
            LayerName::Floor => self.lower + 0.1,
            LayerName::Wall => self.lower + 0.2,
            LayerName::Special => self.lower + 0.3,
            LayerName::Roof => self.upper.max(self.lower + 0.4),
        }
    }

    /// Depth of the tool cursor.
    #[must_use]
    pub fn tool_cursor(&self) -> f32 {
        self.cursor + 0.1
    }

    /// Depth of the tile cursor.
    #[must_use]
    pub fn tile_cursor(&self) -> f32 {
        self.cursor + 0.2
    }
}

/// Sparse tile grid bound to a single tile-set.
#[derive(Clone, Debug)]
pub struct Layer {
    name: LayerName,
    tile_set: TileSet,
    tiles: BTreeMap<TileCoord, Tile>,
}

impl Layer {
    fn new(name: LayerName, tile_set: TileSet) -> Self {
        Self {
            name,
            tile_set,
            tiles: BTreeMap::new(),
        }
    }

    /// Name of the layer.
    #[must_use]
    pub const fn name(&self) -> LayerName {
        self.name
    }

    /// Tile-set bound to the layer.
    #[must_use]
    pub const fn tile_set(&self) -> &TileSet {
        &self.tile_set
    }

    /// Snaps a world position to the cell containing it.
    #[must_use]
    pub fn world_to_tile(&self, world: Vec2) -> TileCoord {
        let size = self.tile_set.tile_size();
        TileCoord::new(
            (world.x / size.x).floor() as i32,
            (world.y / size.y).floor() as i32,
        )
    }

    /// Upper-left world position of a cell.
    #[must_use]
    pub fn tile_to_world(&self, coord: TileCoord) -> Vec2 {
        let size = self.tile_set.tile_size();
        Vec2::new(coord.x() as f32 * size.x, coord.y() as f32 * size.y)
    }

    /// World position of a cell's centre.
    #[must_use]
    pub fn tile_center(&self, coord: TileCoord) -> Vec2 {
        self.tile_to_world(coord) + self.tile_set.tile_size() * 0.5
    }

    /// Tile occupying the cell, if any.
    #[must_use]
    pub fn tile_at(&self, coord: TileCoord) -> Option<&Tile> {
        self.tiles.get(&coord)
    }

    /// Mutable access to the tile occupying the cell, if any.
    pub fn tile_at_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        self.tiles.get_mut(&coord)
    }

    /// Tile containing the world position, if any.
    #[must_use]
    pub fn tile_at_world(&self, world: Vec2) -> Option<&Tile> {
        self.tile_at(self.world_to_tile(world))
    }

    /// Returns every tile whose centre lies within the circle and satisfies
    /// `predicate`.
    ///
    /// A non-positive radius yields no tiles.
    pub fn tiles_within_radius<P>(&self, center: Vec2, radius: f32, predicate: P) -> Vec<&Tile>
    where
        P: Fn(&Tile) -> bool,
    {
        if !(radius > 0.0) {
            return Vec::new();
        }

        let reach = Vec2::splat(radius);
        let min = self.world_to_tile(center - reach);
        let max = self.world_to_tile(center + reach);
        let radius_squared = radius * radius;

        let inside = |tile: &Tile| {
            self.tile_center(tile.coord).distance_squared(center) <= radius_squared
                && predicate(tile)
        };

        // Scanning the box costs its area; large circles walk the tiles instead.
        let columns = i64::from(max.x()) - i64::from(min.x()) + 1;
        let rows = i64::from(max.y()) - i64::from(min.y()) + 1;
        if columns.saturating_mul(rows) > self.tiles.len() as i64 {
            return self.tiles.values().filter(|tile| inside(*tile)).collect();
        }

        let mut found = Vec::new();
        for y in min.y()..=max.y() {
            for x in min.x()..=max.x() {
                if let Some(tile) = self.tiles.get(&TileCoord::new(x, y)) {
                    if inside(tile) {
                        found.push(tile);
                    }
                }
            }
        }
        found
    }

    /// Iterator over all tiles in deterministic cell order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Reports whether the layer has no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    fn put(&mut self, tile: Tile) -> (&Tile, Option<Tile>) {
        let coord = tile.coord;
        let replaced = self.tiles.insert(coord, tile);
        let placed = &self.tiles[&coord];
        (placed, replaced)
    }

    fn take(&mut self, coord: TileCoord) -> Option<Tile> {
        self.tiles.remove(&coord)
    }
}

/// Result of writing a tile into a layer.
#[derive(Debug)]
pub struct Placement<'a> {
    /// Tile now occupying the cell.
    pub tile: &'a Tile,
    /// Tile that previously occupied the cell, if any.
    pub replaced: Option<Tile>,
}

/// Collects tile-set bindings before the registry is usable.
#[derive(Debug, Default)]
pub struct LayerRegistryBuilder {
    bindings: BTreeMap<LayerName, TileSet>,
    depths: LayerDepths,
}

impl LayerRegistryBuilder {
    /// Associates the layer with a tile-set, replacing any earlier binding.
    pub fn bind_layer(&mut self, layer: LayerName, tile_set: TileSet) -> &mut Self {
        let _ = self.bindings.insert(layer, tile_set);
        self
    }

    /// Sets the depth configuration used by the registry.
    pub fn depths(&mut self, depths: LayerDepths) -> &mut Self {
        self.depths = depths;
        self
    }

    /// Validates the bindings and produces the registry.
    ///
    /// Every layer must be bound and no two tile-sets may share global indices.
    pub fn build(&self) -> Result<LayerRegistry, RegistryError> {
        let mut layers = Vec::with_capacity(LayerName::ALL.len());
        for name in LayerName::ALL {
            let tile_set = self
                .bindings
                .get(&name)
                .ok_or(RegistryError::UnboundLayer(name))?;
            if let Some(existing) = layers
                .iter()
                .map(Layer::tile_set)
                .find(|existing: &&TileSet| existing.gid_range_overlaps(tile_set))
            {
                return Err(RegistryError::OverlappingTileSets {
                    first: existing.key().to_owned(),
                    second: tile_set.key().to_owned(),
                });
            }
            layers.push(Layer::new(name, tile_set.clone()));
        }

        Ok(LayerRegistry {
            layers,
            depths: self.depths,
        })
    }
}

/// Owns the four building layers and their tile-set bindings.
#[derive(Clone, Debug)]
pub struct LayerRegistry {
    layers: Vec<Layer>,
    depths: LayerDepths,
}

impl LayerRegistry {
    /// Starts collecting tile-set bindings.
    #[must_use]
    pub fn builder() -> LayerRegistryBuilder {
        LayerRegistryBuilder::default()
    }

    /// Builds a registry from tile-set configurations.
    pub fn from_configs(
        configs: &[TileSetConfig],
        depths: LayerDepths,
    ) -> Result<Self, RegistryError> {
        let mut builder = Self::builder();
        let _ = builder.depths(depths);
        for config in configs {
            let _ = builder.bind_layer(config.layer, TileSet::from_config(config)?);
        }
        builder.build()
    }

    /// Read-only access to a layer.
    #[must_use]
    pub fn layer(&self, name: LayerName) -> &Layer {
        &self.layers[slot(name)]
    }

    /// Mutable access to a layer.
    pub fn layer_mut(&mut self, name: LayerName) -> &mut Layer {
        &mut self.layers[slot(name)]
    }

    /// Snaps a world position to a cell of the named layer.
    #[must_use]
    pub fn world_to_tile(&self, layer: LayerName, world: Vec2) -> TileCoord {
        self.layer(layer).world_to_tile(world)
    }

    /// Upper-left world position of a cell of the named layer.
    #[must_use]
    pub fn tile_to_world(&self, layer: LayerName, coord: TileCoord) -> Vec2 {
        self.layer(layer).tile_to_world(coord)
    }

    /// Tile occupying the cell of the named layer, if any.
    #[must_use]
    pub fn tile_at(&self, layer: LayerName, coord: TileCoord) -> Option<&Tile> {
        self.layer(layer).tile_at(coord)
    }

    /// Writes a tile into the named layer, replacing any existing tile.
    ///
    /// Wall tiles become collidable on all four sides and carry the
    /// properties their tile-set declares for `index`.
    pub fn place(
        &mut self,
        layer: LayerName,
        coord: TileCoord,
        index: u32,
        rotation: Rotation,
    ) -> Placement<'_> {
        let target = self.layer_mut(layer);
        let mut tile = Tile::new(coord, index, rotation);
        if layer == LayerName::Wall {
            tile.collision = Some(CollisionFlags::ALL_SIDES);
            if let Some(properties) = target.tile_set.properties_for(index) {
                tile.properties = properties.clone();
            }
        }
        let (tile, replaced) = target.put(tile);
        Placement { tile, replaced }
    }

    /// Clears the cell of the named layer, returning the removed tile.
    pub fn remove(&mut self, layer: LayerName, coord: TileCoord) -> Option<Tile> {
        self.layer_mut(layer).take(coord)
    }

    /// Tiles of the named layer whose centre lies within the circle.
    pub fn tiles_within_radius<P>(
        &self,
        layer: LayerName,
        center: Vec2,
        radius: f32,
        predicate: P,
    ) -> Vec<&Tile>
    where
        P: Fn(&Tile) -> bool,
    {
        self.layer(layer).tiles_within_radius(center, radius, predicate)
    }

    /// Current depth configuration.
    #[must_use]
    pub const fn depths(&self) -> LayerDepths {
        self.depths
    }

    /// Moves the layers drawn below the party.
    pub fn set_lower_depth(&mut self, depth: f32) {
        self.depths.lower = depth;
    }

    /// Moves the layers drawn above the party.
    pub fn set_upper_depth(&mut self, depth: f32) {
        self.depths.upper = depth;
    }

    /// Moves the cursors.
    pub fn set_cursor_depth(&mut self, depth: f32) {
        self.depths.cursor = depth;
    }

    /// Layers the host must register as colliders for every party member.
    #[must_use]
    pub const fn collidable_layers(&self) -> [LayerName; 2] {
        [LayerName::Wall, LayerName::Special]
    }
}

const fn slot(name: LayerName) -> usize {
    match name {
        LayerName::Floor => 0,
        LayerName::Wall => 1,
        LayerName::Roof => 2,
        LayerName::Special => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> LayerRegistry {
        LayerRegistry::from_configs(&TileSetConfig::defaults(), LayerDepths::default())
            .expect("default registry builds")
    }

    #[test]
    fn snapping_floors_negative_positions() {
        let registry = registry();
        assert_eq!(
            registry.world_to_tile(LayerName::Floor, Vec2::new(-0.5, 31.9)),
            TileCoord::new(-1, 1)
        );
        assert_eq!(
            registry.tile_to_world(LayerName::Floor, TileCoord::new(-1, 1)),
            Vec2::new(-16.0, 16.0)
        );
    }

    #[test]
    fn missing_binding_is_fatal() {
        let mut builder = LayerRegistry::builder();
        for config in TileSetConfig::defaults()
            .iter()
            .filter(|config| config.layer != LayerName::Roof)
        {
            let tile_set = TileSet::from_config(config).expect("tile-set builds");
            let _ = builder.bind_layer(config.layer, tile_set);
        }
        assert_eq!(
            builder.build().map(|_| ()),
            Err(RegistryError::UnboundLayer(LayerName::Roof))
        );
    }

    #[test]
    fn overlapping_index_ranges_are_rejected() {
        let mut configs = TileSetConfig::defaults();
        configs[1].first_gid = 10;
        let error = LayerRegistry::from_configs(&configs, LayerDepths::default())
            .map(|_| ())
            .expect_err("overlap must be rejected");
        assert_eq!(
            error,
            RegistryError::OverlappingTileSets {
                first: "floorTiles".to_owned(),
                second: "wallTiles".to_owned(),
            }
        );
    }

    #[test]
    fn place_replaces_existing_tile() {
        let mut registry = registry();
        let coord = TileCoord::new(2, 3);
        let first = registry.place(LayerName::Floor, coord, 3, Rotation::ZERO);
        assert!(first.replaced.is_none());
        let second = registry.place(LayerName::Floor, coord, 5, Rotation::from_degrees(90));
        assert_eq!(second.tile.index(), 5);
        assert_eq!(second.replaced.map(|tile| tile.index()), Some(3));
        assert_eq!(registry.layer(LayerName::Floor).len(), 1);
    }

    #[test]
    fn radius_query_uses_tile_centres() {
        let mut registry = registry();
        for x in -3..=3 {
            let _ = registry.place(LayerName::Roof, TileCoord::new(x, 0), 129, Rotation::ZERO);
        }
        // centres sit at x*16+8; a radius of 24 around (8, 8) reaches x in -1..=1.
        let mut hits: Vec<i32> = registry
            .tiles_within_radius(LayerName::Roof, Vec2::new(8.0, 8.0), 24.0, |_| true)
            .into_iter()
            .map(|tile| tile.coord().x())
            .collect();
        hits.sort_unstable();
        assert_eq!(hits, vec![-1, 0, 1]);

        assert!(registry
            .tiles_within_radius(LayerName::Roof, Vec2::new(8.0, 8.0), 0.0, |_| true)
            .is_empty());
        assert!(registry
            .tiles_within_radius(LayerName::Roof, Vec2::new(8.0, 8.0), 40.0, |tile| tile
                .coord()
                .x()
                > 5)
            .is_empty());
    }

    #[test]
    fn huge_radius_on_sparse_layer_returns_promptly() {
        let mut registry = registry();
        let _ = registry.place(LayerName::Roof, TileCoord::new(4, -2), 129, Rotation::ZERO);
        let _ = registry.place(LayerName::Roof, TileCoord::new(9000, 0), 129, Rotation::ZERO);

        let hits = registry.tiles_within_radius(LayerName::Roof, Vec2::ZERO, 1.0e9, |_| true);
        assert_eq!(hits.len(), 2, "every tile lies inside a circle this large");

        let empty = registry.tiles_within_radius(LayerName::Floor, Vec2::ZERO, 1.0e9, |_| true);
        assert!(empty.is_empty(), "an empty layer is not scanned cell by cell");
    }

    #[test]
    fn wall_placement_copies_declared_properties() {
        let mut configs = TileSetConfig::defaults();
        let wall = configs
            .iter_mut()
            .find(|config| config.layer == LayerName::Wall)
            .expect("wall tile-set configured");
        let mut properties = TileProperties::new();
        let _ = properties.insert("material".to_owned(), PropertyValue::Text("stone".to_owned()));
        wall.tiles.push(TileDefinition {
            index: 3,
            properties: properties.clone(),
        });
        let mut registry = LayerRegistry::from_configs(&configs, LayerDepths::default())
            .expect("registry with wall properties builds");

        let placed = registry.place(LayerName::Wall, TileCoord::new(1, 1), 65 + 3, Rotation::ZERO);
        assert_eq!(placed.tile.properties(), &properties);
        assert_eq!(placed.tile.collision(), Some(CollisionFlags::ALL_SIDES));

        let plain = registry.place(LayerName::Wall, TileCoord::new(2, 1), 65 + 4, Rotation::ZERO);
        assert!(
            plain.tile.properties().is_empty(),
            "indices without declarations carry no properties"
        );
    }

    #[test]
    fn only_walls_receive_collision() {
        let mut registry = registry();
        for (layer, index) in [
            (LayerName::Floor, 1),
            (LayerName::Roof, 129),
            (LayerName::Special, 193),
        ] {
            let placed = registry.place(layer, TileCoord::new(0, 0), index, Rotation::ZERO);
            assert_eq!(placed.tile.collision(), None, "{layer} tiles must not collide");
        }
    }

    #[test]
    fn lower_opacity_never_raises() {
        let mut tile = Tile::new(TileCoord::new(0, 0), 1, Rotation::ZERO);
        assert!(tile.lower_opacity(0.6));
        assert!(!tile.lower_opacity(0.8));
        assert!((tile.opacity() - 0.6).abs() < f32::EPSILON);
        assert!(tile.lower_opacity(-0.4));
        assert_eq!(tile.opacity(), 0.0);
    }

    #[test]
    fn depth_ordering_holds_for_any_offsets() {
        for (lower, upper) in [(0.0, 0.0), (5.0, 1.0), (-2.0, 10.0)] {
            let depths = LayerDepths {
                lower,
                upper,
                cursor: 0.0,
            };
            let floor = depths.layer(LayerName::Floor);
            let wall = depths.layer(LayerName::Wall);
            let special = depths.layer(LayerName::Special);
            let roof = depths.layer(LayerName::Roof);
            assert!(floor < wall && wall < special && special < roof);
        }
    }
}
