#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Build session state machine driven by configuration commands.
//!
//! The session tracks whether pointer input is interpreted as building, which
//! tool and layer the menu selected, the tile chosen for placement and the
//! accumulated rotation. Every setter is total: any command may be applied in
//! any state.

use log::debug;
use tilecraft_core::{BuildMode, Command, LayerName, Rotation, TileDescriptor, Tool};

/// Observable outcome of applying a command to the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEffect {
    /// The build mode toggled.
    ModeChanged {
        /// Mode active after the command.
        mode: BuildMode,
    },
    /// A tile descriptor was selected.
    TileSelected {
        /// Descriptor now current.
        descriptor: TileDescriptor,
    },
    /// The accumulated rotation changed.
    Rotated {
        /// Rotation after the command.
        rotation: Rotation,
    },
    /// The tool selection changed.
    ToolChanged {
        /// Tool after the command, if any.
        tool: Option<Tool>,
    },
    /// The layer selection changed and the tile descriptor was cleared.
    LayerChanged {
        /// Layer after the command, if any.
        layer: Option<LayerName>,
    },
    /// The command left the session untouched.
    Unchanged,
}

/// Mutable building state owned by the tilemap builder.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    mode: BuildMode,
    tool: Option<Tool>,
    layer: Option<LayerName>,
    rotation: Rotation,
    tile: Option<TileDescriptor>,
}

impl Session {
    /// Creates an idle session with nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current build mode.
    #[must_use]
    pub const fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Reports whether pointer input is interpreted as building.
    #[must_use]
    pub fn is_building(&self) -> bool {
        self.mode == BuildMode::Building
    }

    /// Selected tool, if any.
    #[must_use]
    pub const fn tool(&self) -> Option<Tool> {
        self.tool
    }

    /// Selected layer, if any.
    #[must_use]
    pub const fn layer(&self) -> Option<LayerName> {
        self.layer
    }

    /// Accumulated rotation; unbounded.
    #[must_use]
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Tile chosen for placement, if any.
    #[must_use]
    pub fn tile(&self) -> Option<&TileDescriptor> {
        self.tile.as_ref()
    }

    /// Applies a configuration command and reports what changed.
    pub fn apply(&mut self, command: Command) -> SessionEffect {
        match command {
            Command::EnterBuildMode => self.enter_build_mode(),
            Command::ExitBuildMode => self.exit_build_mode(),
            Command::SelectTool { tool } => self.select_tool(tool),
            Command::ClearTool => self.clear_tool(),
            Command::SelectLayer { layer } => self.select_layer(layer),
            Command::ClearLayer => self.clear_layer(),
            Command::SelectTile { descriptor } => self.select_tile(descriptor),
            Command::RotateClockwise => self.rotate_clockwise(),
            Command::RotateCounterClockwise => self.rotate_counter_clockwise(),
        }
    }

    /// Switches into building; idempotent.
    pub fn enter_build_mode(&mut self) -> SessionEffect {
        self.set_mode(BuildMode::Building)
    }

    /// Returns to idle; idempotent.
    ///
    /// The caller must hide all cursor feedback when the mode changes.
    pub fn exit_build_mode(&mut self) -> SessionEffect {
        self.set_mode(BuildMode::Idle)
    }

    /// Selects the tool used by subsequent pointer actions.
    pub fn select_tool(&mut self, tool: Tool) -> SessionEffect {
        debug!("tool selected: {tool}");
        self.tool = Some(tool);
        SessionEffect::ToolChanged { tool: self.tool }
    }

    /// Clears the tool selection.
    pub fn clear_tool(&mut self) -> SessionEffect {
        self.tool = None;
        SessionEffect::ToolChanged { tool: None }
    }

    /// Selects a layer and invalidates the current tile descriptor, even when
    /// the layer is unchanged.
    pub fn select_layer(&mut self, layer: LayerName) -> SessionEffect {
        debug!("layer selected: {layer}");
        self.layer = Some(layer);
        self.tile = None;
        SessionEffect::LayerChanged { layer: self.layer }
    }

    /// Clears the layer selection and the current tile descriptor.
    pub fn clear_layer(&mut self) -> SessionEffect {
        self.layer = None;
        self.tile = None;
        SessionEffect::LayerChanged { layer: None }
    }

    /// Sets the tile chosen for placement.
    pub fn select_tile(&mut self, descriptor: TileDescriptor) -> SessionEffect {
        self.tile = Some(descriptor.clone());
        SessionEffect::TileSelected { descriptor }
    }

    /// Adds a quarter turn.
    pub fn rotate_clockwise(&mut self) -> SessionEffect {
        self.rotation = self.rotation.clockwise();
        SessionEffect::Rotated {
            rotation: self.rotation,
        }
    }

    /// Subtracts a quarter turn.
    pub fn rotate_counter_clockwise(&mut self) -> SessionEffect {
        self.rotation = self.rotation.counter_clockwise();
        SessionEffect::Rotated {
            rotation: self.rotation,
        }
    }

    fn set_mode(&mut self, mode: BuildMode) -> SessionEffect {
        if self.mode == mode {
            return SessionEffect::Unchanged;
        }
        debug!("build mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        SessionEffect::ModeChanged { mode }
    }
}
