#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tilecraft building subsystem.
//!
//! This crate defines the message surface that connects the configuration UI,
//! the authoritative layer registry, and the pure building systems. The menu UI
//! submits [`Command`] values describing selection changes, the tilemap builder
//! applies them to its session, and then broadcasts [`Event`] values describing
//! what changed. Per-frame inputs (pointer, [`Party`]) are supplied separately
//! by the host each tick.

use std::{fmt, str::FromStr};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the four independent tile grids composing the authored map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerName {
    /// Ground tiles drawn below the party.
    Floor,
    /// Blocking tiles that collide with the party.
    Wall,
    /// Overhead tiles that fade around the party.
    Roof,
    /// Free-standing tagged entities such as doors.
    Special,
}

impl LayerName {
    /// Every layer in registry order.
    pub const ALL: [LayerName; 4] = [Self::Floor, Self::Wall, Self::Roof, Self::Special];

    /// Canonical lowercase name used by the configuration UI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Floor => "floor",
            Self::Wall => "wall",
            Self::Roof => "roof",
            Self::Special => "special",
        }
    }

    /// Reports whether tiles on this layer sit below or above the party rather
    /// than blocking movement.
    #[must_use]
    pub const fn is_overlap_exempt(self) -> bool {
        matches!(self, Self::Floor | Self::Roof)
    }
}

impl fmt::Display for LayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerName {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|layer| layer.as_str() == value)
            .ok_or_else(|| ParseError::UnknownLayer(value.to_owned()))
    }
}

/// Building tools offered by the build menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Places the selected tile.
    Hammer,
    /// Removes tiles from the selected layer.
    Pick,
}

impl Tool {
    /// Canonical lowercase name used by the configuration UI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hammer => "hammer",
            Self::Pick => "pick",
        }
    }

    /// Texture key of the icon shown by the tool cursor.
    #[must_use]
    pub const fn icon_key(self) -> &'static str {
        match self {
            Self::Hammer => "hammerIcon",
            Self::Pick => "pickIcon",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "hammer" => Ok(Self::Hammer),
            "pick" => Ok(Self::Pick),
            other => Err(ParseError::UnknownTool(other.to_owned())),
        }
    }
}

/// Location of a single grid cell expressed in whole tiles.
///
/// Tile space is unbounded in both directions, so coordinates are signed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    x: i32,
    y: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column index of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row index of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }
}

/// Tile rotation in degrees.
///
/// The stored value is unbounded; consumers normalise it with
/// [`Rotation::normalized`] before rendering or collision use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rotation(i32);

impl Rotation {
    /// Unrotated orientation.
    pub const ZERO: Self = Self(0);

    /// Step applied by a single clockwise or counter-clockwise rotation.
    pub const QUARTER_TURN: i32 = 90;

    /// Creates a rotation from raw degrees.
    #[must_use]
    pub const fn from_degrees(degrees: i32) -> Self {
        Self(degrees)
    }

    /// Raw, unnormalised degrees.
    #[must_use]
    pub const fn degrees(&self) -> i32 {
        self.0
    }

    /// Rotation advanced by a quarter turn clockwise.
    #[must_use]
    pub const fn clockwise(self) -> Self {
        Self(self.0.wrapping_add(Self::QUARTER_TURN))
    }

    /// Rotation advanced by a quarter turn counter-clockwise.
    #[must_use]
    pub const fn counter_clockwise(self) -> Self {
        Self(self.0.wrapping_sub(Self::QUARTER_TURN))
    }

    /// Degrees folded into `0..360`.
    #[must_use]
    pub const fn normalized(&self) -> u16 {
        self.0.rem_euclid(360) as u16
    }

    /// Normalised rotation converted to radians.
    #[must_use]
    pub fn radians(&self) -> f32 {
        f32::from(self.normalized()).to_radians()
    }
}

/// Tile currently selected in the build menu.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileDescriptor {
    /// Key of the tile-set the tile belongs to.
    pub tile_set_key: String,
    /// Local index of the tile within its tile-set.
    pub tile_set_offset: u32,
}

impl TileDescriptor {
    /// Creates a new descriptor.
    #[must_use]
    pub fn new(tile_set_key: impl Into<String>, tile_set_offset: u32) -> Self {
        Self {
            tile_set_key: tile_set_key.into(),
            tile_set_offset,
        }
    }
}

impl FromStr for TileDescriptor {
    type Err = ParseError;

    /// Parses the `key:offset` form used by scripted signals.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (key, offset) = value
            .split_once(':')
            .ok_or_else(|| ParseError::InvalidDescriptor(value.to_owned()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ParseError::InvalidDescriptor(value.to_owned()));
        }
        let offset = offset
            .trim()
            .parse::<u32>()
            .map_err(|_| ParseError::InvalidDescriptor(value.to_owned()))?;
        Ok(Self::new(key, offset))
    }
}

/// Axis-aligned rectangle in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    min: Vec2,
    size: Vec2,
}

impl Aabb {
    /// Creates a rectangle from its upper-left corner and size.
    #[must_use]
    pub const fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    /// Creates a rectangle of the given size centred on `center`.
    #[must_use]
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self {
            min: center - size * 0.5,
            size,
        }
    }

    /// Upper-left corner.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Lower-right corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// Width and height.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// Reports whether the two rectangles share interior area.
    ///
    /// Rectangles that merely touch along an edge do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let a_max = self.max();
        let b_max = other.max();
        self.min.x < b_max.x && a_max.x > other.min.x && self.min.y < b_max.y && a_max.y > other.min.y
    }
}

/// Immutable snapshot of a single party member supplied by the host each tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartyMember {
    /// World position of the character sprite.
    pub position: Vec2,
    /// Collision body of the character in world units.
    pub body: Aabb,
}

impl PartyMember {
    /// Creates a member whose collision body is centred on its position.
    #[must_use]
    pub fn centered(position: Vec2, body_size: Vec2) -> Self {
        Self {
            position,
            body: Aabb::from_center(position, body_size),
        }
    }
}

/// Ordered party of characters; element zero is the leader.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Party {
    members: Vec<PartyMember>,
}

impl Party {
    /// Creates a party from the provided members, leader first.
    #[must_use]
    pub fn new(members: Vec<PartyMember>) -> Self {
        Self { members }
    }

    /// Leader of the party, if any member is present.
    #[must_use]
    pub fn leader(&self) -> Option<&PartyMember> {
        self.members.first()
    }

    /// Iterator over every non-leader member in party order.
    pub fn followers(&self) -> impl Iterator<Item = &PartyMember> {
        self.members.iter().skip(1)
    }

    /// Iterator over all members, leader first.
    pub fn iter(&self) -> impl Iterator<Item = &PartyMember> {
        self.members.iter()
    }

    /// Number of members in the party.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Reports whether the party has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Identifier assigned to a free-standing special entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identity of a scheduled one-shot opacity reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Creates a new timer identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Whether pointer input is interpreted as building.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BuildMode {
    /// Normal gameplay; pointer input is ignored by the builder.
    #[default]
    Idle,
    /// Pointer input places and removes tiles.
    Building,
}

/// Configuration commands pushed by the build menu.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// A new tile was picked in the menu.
    SelectTile {
        /// Tile chosen for placement.
        descriptor: TileDescriptor,
    },
    /// Rotates the placement a quarter turn clockwise.
    RotateClockwise,
    /// Rotates the placement a quarter turn counter-clockwise.
    RotateCounterClockwise,
    /// Switches pointer input into building.
    EnterBuildMode,
    /// Returns pointer input to normal gameplay.
    ExitBuildMode,
    /// A tool was picked in the menu.
    SelectTool {
        /// Tool chosen for subsequent pointer actions.
        tool: Tool,
    },
    /// A layer was picked in the menu.
    SelectLayer {
        /// Layer chosen for subsequent pointer actions.
        layer: LayerName,
    },
    /// The layer selection was cleared.
    ClearLayer,
    /// The tool selection was cleared.
    ClearTool,
}

impl Command {
    /// Signal name used by the configuration UI for this command.
    #[must_use]
    pub const fn signal_name(&self) -> &'static str {
        match self {
            Self::SelectTile { .. } => "newTileSelected",
            Self::RotateClockwise => "rotate-right",
            Self::RotateCounterClockwise => "rotate-left",
            Self::EnterBuildMode => "enterBuildMode",
            Self::ExitBuildMode => "exitBuildMode",
            Self::SelectTool { .. } => "toolSelected",
            Self::SelectLayer { .. } => "layerSelected",
            Self::ClearLayer => "layerCleared",
            Self::ClearTool => "toolCleared",
        }
    }

    /// Decodes a named signal and its optional textual payload.
    pub fn from_signal(name: &str, payload: Option<&str>) -> Result<Self, ParseError> {
        let command = match name {
            "newTileSelected" => Self::SelectTile {
                descriptor: payload
                    .ok_or(ParseError::MissingPayload("newTileSelected"))?
                    .parse()?,
            },
            "rotate-right" => Self::RotateClockwise,
            "rotate-left" => Self::RotateCounterClockwise,
            "enterBuildMode" => Self::EnterBuildMode,
            "exitBuildMode" => Self::ExitBuildMode,
            "toolSelected" => Self::SelectTool {
                tool: payload
                    .ok_or(ParseError::MissingPayload("toolSelected"))?
                    .parse()?,
            },
            "layerSelected" => Self::SelectLayer {
                layer: payload
                    .ok_or(ParseError::MissingPayload("layerSelected"))?
                    .parse()?,
            },
            "layerCleared" => Self::ClearLayer,
            "toolCleared" => Self::ClearTool,
            other => return Err(ParseError::UnknownSignal(other.to_owned())),
        };
        Ok(command)
    }
}

/// Events broadcast by the tilemap builder after applying commands or frames.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Construction finished; the menu should push its current selection.
    BuilderReady,
    /// The session entered or left build mode.
    BuildModeChanged {
        /// Mode active after the transition.
        mode: BuildMode,
    },
    /// A tile was written into a layer grid.
    TilePlaced {
        /// Layer that received the tile.
        layer: LayerName,
        /// Cell the tile occupies.
        coord: TileCoord,
        /// Global tile-set index of the tile.
        index: u32,
    },
    /// A tile was cleared from a layer grid.
    TileRemoved {
        /// Layer the tile was removed from.
        layer: LayerName,
        /// Cell that was cleared.
        coord: TileCoord,
    },
    /// A free-standing special entity was created and tagged.
    SpecialPlaced {
        /// Identifier assigned to the entity.
        entity: EntityId,
        /// World position of the entity centre.
        position: Vec2,
    },
}

/// Errors raised while decoding the string-named signal surface.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The layer name is not one of floor, wall, roof or special.
    #[error("unknown layer `{0}`")]
    UnknownLayer(String),
    /// The tool name is not hammer or pick.
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    /// The signal name is not part of the builder contract.
    #[error("unknown signal `{0}`")]
    UnknownSignal(String),
    /// The signal requires a payload but none was supplied.
    #[error("signal `{0}` requires a payload")]
    MissingPayload(&'static str),
    /// The tile descriptor was not of the form `key:offset`.
    #[error("could not parse tile descriptor `{0}`")]
    InvalidDescriptor(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_names_round_trip_through_strings() {
        for layer in LayerName::ALL {
            assert_eq!(layer.as_str().parse::<LayerName>(), Ok(layer));
        }
        assert_eq!(
            "ceiling".parse::<LayerName>(),
            Err(ParseError::UnknownLayer("ceiling".to_owned()))
        );
    }

    #[test]
    fn rotation_normalizes_negative_and_large_values() {
        assert_eq!(Rotation::ZERO.counter_clockwise().normalized(), 270);
        assert_eq!(Rotation::from_degrees(450).normalized(), 90);
        assert_eq!(Rotation::from_degrees(-720).normalized(), 0);
        let half_turn = Rotation::ZERO.clockwise().clockwise();
        assert_eq!(half_turn.degrees(), 180);
        assert!((half_turn.radians() - std::f32::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn touching_rectangles_do_not_overlap() {
        let tile = Aabb::new(Vec2::new(16.0, 16.0), Vec2::splat(16.0));
        let left = Aabb::new(Vec2::new(0.0, 16.0), Vec2::splat(16.0));
        let inside = Aabb::new(Vec2::new(20.0, 20.0), Vec2::splat(4.0));
        assert!(!tile.overlaps(&left));
        assert!(tile.overlaps(&inside));
        assert!(inside.overlaps(&tile));
    }

    #[test]
    fn party_splits_leader_from_followers() {
        let members = vec![
            PartyMember::centered(Vec2::ZERO, Vec2::splat(12.0)),
            PartyMember::centered(Vec2::new(20.0, 0.0), Vec2::splat(12.0)),
            PartyMember::centered(Vec2::new(40.0, 0.0), Vec2::splat(12.0)),
        ];
        let party = Party::new(members);
        assert_eq!(party.leader().map(|leader| leader.position), Some(Vec2::ZERO));
        assert_eq!(party.followers().count(), 2);
        assert!(Party::default().leader().is_none());
    }

    #[test]
    fn signals_decode_into_commands() {
        assert_eq!(
            Command::from_signal("newTileSelected", Some("wallTiles:4")),
            Ok(Command::SelectTile {
                descriptor: TileDescriptor::new("wallTiles", 4),
            })
        );
        assert_eq!(
            Command::from_signal("toolSelected", Some("pick")),
            Ok(Command::SelectTool { tool: Tool::Pick })
        );
        assert_eq!(
            Command::from_signal("layerSelected", None),
            Err(ParseError::MissingPayload("layerSelected"))
        );
        assert_eq!(
            Command::from_signal("rotate-left", None).map(|command| command.signal_name()),
            Ok("rotate-left")
        );
        assert!(Command::from_signal("jump", None).is_err());
    }

    #[test]
    fn descriptor_requires_key_and_numeric_offset() {
        assert!("wallTiles".parse::<TileDescriptor>().is_err());
        assert!(":3".parse::<TileDescriptor>().is_err());
        assert!("wallTiles:x".parse::<TileDescriptor>().is_err());
    }
}
