//! Declarative cursor state rendered by the host while building.

use glam::Vec2;
use tilecraft_core::{TileDescriptor, Tool};

/// Alpha of the tile cursor sprite.
pub const TILE_CURSOR_ALPHA: f32 = 0.7;

/// Offset from the pointer to the tool icon's upper-left corner.
pub const TOOL_CURSOR_OFFSET: Vec2 = Vec2::splat(10.0);

/// Preview sprite of the tile about to be placed.
#[derive(Clone, Debug, PartialEq)]
pub struct TileCursor {
    /// Tile the preview draws.
    pub descriptor: TileDescriptor,
    /// World position of the sprite centre.
    pub position: Vec2,
    /// Rotation applied to the sprite, in radians.
    pub rotation: f32,
    /// Whether the sprite is drawn.
    pub visible: bool,
    /// Constant sprite alpha.
    pub alpha: f32,
    /// Whether the pulsing highlight animation runs.
    pub pulsing: bool,
}

impl TileCursor {
    fn new(descriptor: TileDescriptor, rotation: f32) -> Self {
        Self {
            descriptor,
            position: Vec2::ZERO,
            rotation,
            visible: false,
            alpha: TILE_CURSOR_ALPHA,
            pulsing: true,
        }
    }
}

/// Icon following the pointer while building.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCursor {
    /// Texture key of the icon.
    pub icon: &'static str,
    /// World position of the icon's upper-left corner.
    pub position: Vec2,
    /// Whether the icon is drawn.
    pub visible: bool,
    /// Whether the hammering animation plays this frame.
    pub hammering: bool,
}

impl Default for ToolCursor {
    fn default() -> Self {
        Self {
            icon: Tool::Hammer.icon_key(),
            position: Vec2::ZERO,
            visible: false,
            hammering: false,
        }
    }
}

/// Both cursors as the host should draw them after the latest update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CursorFeedback {
    /// Tile preview, created on the first tile selection.
    pub tile: Option<TileCursor>,
    /// Tool icon.
    pub tool: ToolCursor,
}

impl CursorFeedback {
    /// Whether the tile preview is currently drawn.
    #[must_use]
    pub fn tile_visible(&self) -> bool {
        self.tile.as_ref().is_some_and(|tile| tile.visible)
    }

    pub(crate) fn select_tile(&mut self, descriptor: TileDescriptor, rotation: f32) {
        match self.tile.as_mut() {
            Some(tile) => tile.descriptor = descriptor,
            None => self.tile = Some(TileCursor::new(descriptor, rotation)),
        }
    }

    pub(crate) fn rotate(&mut self, rotation: f32) {
        if let Some(tile) = self.tile.as_mut() {
            tile.rotation = rotation;
        }
    }

    pub(crate) fn set_pulsing(&mut self, pulsing: bool) {
        if let Some(tile) = self.tile.as_mut() {
            tile.pulsing = pulsing;
        }
    }

    pub(crate) fn set_tile_visible(&mut self, visible: bool) {
        if let Some(tile) = self.tile.as_mut() {
            tile.visible = visible;
        }
    }

    pub(crate) fn move_tile(&mut self, position: Vec2) {
        if let Some(tile) = self.tile.as_mut() {
            tile.position = position;
        }
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.set_tile_visible(visible);
        self.tool.visible = visible;
    }

    pub(crate) fn hide_all(&mut self) {
        self.set_visible(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reselecting_keeps_cursor_state() {
        let mut cursor = CursorFeedback::default();
        cursor.select_tile(TileDescriptor::new("wallTiles", 1), 0.0);
        cursor.set_visible(true);
        cursor.move_tile(Vec2::new(24.0, 24.0));

        cursor.select_tile(TileDescriptor::new("wallTiles", 2), 1.0);
        let tile = cursor.tile.as_ref().expect("tile cursor exists");
        assert_eq!(tile.descriptor.tile_set_offset, 2);
        assert_eq!(tile.position, Vec2::new(24.0, 24.0));
        assert_eq!(tile.rotation, 0.0, "reselection does not reset rotation");
        assert!(cursor.tile_visible());
        assert_eq!(tile.alpha, TILE_CURSOR_ALPHA);
    }

    #[test]
    fn hiding_without_tile_cursor_only_touches_tool() {
        let mut cursor = CursorFeedback::default();
        cursor.tool.visible = true;
        cursor.hide_all();
        assert!(!cursor.tool.visible);
        assert!(cursor.tile.is_none());
        assert_eq!(cursor.tool.icon, "hammerIcon");
    }
}
