#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tilemap builder that turns pointer input and menu commands into tile edits.
//!
//! The builder owns the layer registry, the build session, the roof visibility
//! engine and the special entities it spawned. Hosts drive it with two calls:
//! [`TilemapBuilder::apply`] for menu commands and [`TilemapBuilder::update`]
//! once per frame. Both append the resulting [`Event`]s to a caller-provided
//! buffer.

use std::time::Duration;

use glam::Vec2;
use log::{debug, info, warn};
use thiserror::Error;
use tilecraft_core::{BuildMode, Command, EntityId, Event, LayerName, Party, PartyMember, TileCoord, Tool};
use tilecraft_system_placement::Validator;
use tilecraft_system_session::{Session, SessionEffect};
use tilecraft_system_tagging::{SpecialConfig, SpecialEntity, TagRegistry};
use tilecraft_system_visibility::{VisibilityEngine, VisibilityInput, VisibilityRadii};
use tilecraft_world::{Layer, LayerDepths, LayerRegistry, RegistryError};

mod config;
mod cursor;

pub use config::BuilderConfig;
pub use cursor::{CursorFeedback, TileCursor, ToolCursor, TILE_CURSOR_ALPHA, TOOL_CURSOR_OFFSET};

/// Errors raised while constructing a tilemap builder.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum BuilderError {
    /// The tile-set bindings are invalid.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The placement reach is negative or not finite.
    #[error("placement reach must be a finite non-negative distance, got {reach}")]
    InvalidReach {
        /// Rejected reach value.
        reach: f32,
    },
    /// A visibility radius or rate is negative or not finite.
    #[error("visibility `{field}` must be a finite non-negative value, got {value}")]
    InvalidVisibility {
        /// Name of the rejected setting.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
}

/// Something the pointer can hover that suppresses building underneath it.
pub trait TileProbe {
    /// Whether a tile occupies the world position.
    fn has_tile_at_world(&self, world: Vec2) -> bool;
}

impl TileProbe for Layer {
    fn has_tile_at_world(&self, world: Vec2) -> bool {
        self.tile_at_world(world).is_some()
    }
}

/// Input snapshot for a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Time elapsed since the previous frame.
    pub dt: Duration,
    /// Pointer position in world coordinates.
    pub pointer: Vec2,
    /// Whether the primary pointer button is held.
    pub pointer_down: bool,
}

impl FrameInput {
    /// Creates a new frame snapshot.
    #[must_use]
    pub const fn new(dt: Duration, pointer: Vec2, pointer_down: bool) -> Self {
        Self {
            dt,
            pointer,
            pointer_down,
        }
    }
}

/// Orchestrates building on top of the four tile layers.
#[derive(Debug)]
pub struct TilemapBuilder {
    registry: LayerRegistry,
    session: Session,
    validator: Validator,
    visibility: VisibilityEngine,
    tags: TagRegistry,
    special: SpecialConfig,
    entities: Vec<SpecialEntity>,
    next_entity: u32,
    cursor: CursorFeedback,
    clock: Duration,
}

impl TilemapBuilder {
    /// Binds the layers and announces readiness with [`Event::BuilderReady`].
    pub fn new(
        config: BuilderConfig,
        tags: TagRegistry,
        out: &mut Vec<Event>,
    ) -> Result<Self, BuilderError> {
        config.validate()?;
        let registry = LayerRegistry::from_configs(&config.tile_sets, config.depths)?;
        if !tags.contains(&config.special.tag) {
            warn!(
                "special tag `{}` has no registered handler; special entities stay untagged",
                config.special.tag
            );
        }

        let builder = Self {
            registry,
            session: Session::new(),
            validator: Validator::new(config.placement),
            visibility: VisibilityEngine::new(config.visibility),
            tags,
            special: config.special,
            entities: Vec::new(),
            next_entity: 0,
            cursor: CursorFeedback::default(),
            clock: Duration::ZERO,
        };
        info!("tilemap builder ready");
        out.push(Event::BuilderReady);
        Ok(builder)
    }

    /// Layers and their tiles.
    #[must_use]
    pub const fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    /// Current build session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Cursor state to draw.
    #[must_use]
    pub const fn cursor(&self) -> &CursorFeedback {
        &self.cursor
    }

    /// Current roof visibility radii.
    #[must_use]
    pub const fn visibility_radii(&self) -> VisibilityRadii {
        self.visibility.radii()
    }

    /// Number of roof resets that have not fired yet.
    #[must_use]
    pub fn outstanding_resets(&self) -> usize {
        self.visibility.scheduler().outstanding()
    }

    /// Special entities spawned so far, in creation order.
    #[must_use]
    pub fn entities(&self) -> &[SpecialEntity] {
        &self.entities
    }

    /// Time accumulated from frame deltas.
    #[must_use]
    pub const fn clock(&self) -> Duration {
        self.clock
    }

    /// Current depth configuration.
    #[must_use]
    pub const fn depths(&self) -> LayerDepths {
        self.registry.depths()
    }

    /// Moves the layers drawn below the party.
    pub fn set_lower_depth(&mut self, depth: f32) {
        self.registry.set_lower_depth(depth);
    }

    /// Moves the layers drawn above the party.
    pub fn set_upper_depth(&mut self, depth: f32) {
        self.registry.set_upper_depth(depth);
    }

    /// Moves both cursors.
    pub fn set_cursor_depth(&mut self, depth: f32) {
        self.registry.set_cursor_depth(depth);
    }

    /// Layers the host registers as colliders for every party member.
    #[must_use]
    pub const fn collidable_layers(&self) -> [LayerName; 2] {
        self.registry.collidable_layers()
    }

    /// Applies a menu command to the session and refreshes the cursors.
    pub fn apply(&mut self, command: Command, out: &mut Vec<Event>) {
        match self.session.apply(command) {
            SessionEffect::ModeChanged { mode } => {
                match mode {
                    BuildMode::Building => self.cursor.set_pulsing(true),
                    BuildMode::Idle => {
                        self.cursor.hide_all();
                        self.cursor.set_pulsing(false);
                    }
                }
                out.push(Event::BuildModeChanged { mode });
            }
            SessionEffect::TileSelected { descriptor } => {
                let rotation = self.session.rotation().radians();
                self.cursor.select_tile(descriptor, rotation);
            }
            SessionEffect::Rotated { rotation } => self.cursor.rotate(rotation.radians()),
            SessionEffect::ToolChanged { tool: Some(tool) } => {
                self.cursor.tool.icon = tool.icon_key();
            }
            SessionEffect::ToolChanged { tool: None }
            | SessionEffect::LayerChanged { .. }
            | SessionEffect::Unchanged => {}
        }
    }

    /// Advances one frame.
    ///
    /// While building, the cursors follow the pointer and a held pointer
    /// commits placements or removals. Pointer input over any tile reported by
    /// `check_layers` is ignored. Roof visibility runs every frame regardless
    /// of the build mode.
    ///
    /// Due resets fire after the visibility pass, so on a firing frame the
    /// restored roof tiles are drawn fully opaque for one frame even while the
    /// party still stands beneath them. The next pass fades them again. Keep
    /// the two calls in this order.
    pub fn update(
        &mut self,
        frame: FrameInput,
        party: &Party,
        check_layers: &[&dyn TileProbe],
        out: &mut Vec<Event>,
    ) {
        self.clock = self.clock.saturating_add(frame.dt);
        self.cursor.tool.hammering = false;

        if self.session.is_building() {
            self.handle_pointer(frame, party, check_layers, out);
        }

        let input = VisibilityInput {
            building: self.session.is_building(),
            roof_selected: self.session.layer() == Some(LayerName::Roof),
        };
        let roof = self.registry.layer_mut(LayerName::Roof);
        self.visibility.update(roof, party, input, self.clock);
        let _ = self.visibility.fire_due(self.clock, roof);
    }

    fn handle_pointer(
        &mut self,
        frame: FrameInput,
        party: &Party,
        check_layers: &[&dyn TileProbe],
        out: &mut Vec<Event>,
    ) {
        let floor = self.registry.layer(LayerName::Floor);
        let cell = floor.world_to_tile(frame.pointer);
        let origin = floor.tile_to_world(cell);
        let tile_size = floor.tile_set().tile_size();

        if self.session.tile().is_some() {
            self.cursor.move_tile(origin + tile_size * 0.5);
        }
        self.cursor.tool.position = frame.pointer - TOOL_CURSOR_OFFSET;

        if check_layers
            .iter()
            .any(|probe| probe.has_tile_at_world(frame.pointer))
        {
            self.cursor.hide_all();
            return;
        }
        let Some(leader) = party.leader() else {
            self.cursor.hide_all();
            return;
        };

        match self.session.tool() {
            Some(Tool::Hammer) if self.session.tile().is_some() => {
                self.check_build(leader, party, cell, origin, tile_size, frame.pointer_down, out);
            }
            Some(Tool::Pick) => self.check_remove(leader, cell, origin, frame.pointer_down, out),
            _ => self.cursor.tool.visible = false,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn check_build(
        &mut self,
        leader: &PartyMember,
        party: &Party,
        cell: TileCoord,
        origin: Vec2,
        tile_size: Vec2,
        pointer_down: bool,
        out: &mut Vec<Event>,
    ) {
        let layer = self.session.layer();
        let check = self.validator.can_place(leader, origin, tile_size, layer);
        self.cursor.set_visible(check.shows_cursor());
        if !check.may_commit(pointer_down) {
            return;
        }
        let Some(descriptor) = self.session.tile().cloned() else {
            return;
        };

        match layer {
            None => {}
            Some(LayerName::Special) => {
                let position = origin + tile_size * 0.5;
                let mut entity = SpecialEntity::new(
                    EntityId::new(self.next_entity),
                    position,
                    self.special.footprint(),
                    descriptor,
                );
                self.next_entity = self.next_entity.wrapping_add(1);
                let _ = self.tags.apply(&self.special.tag, &mut entity, party);
                debug!("special entity {:?} placed at {position}", entity.id());
                out.push(Event::SpecialPlaced {
                    entity: entity.id(),
                    position,
                });
                self.entities.push(entity);
                self.cursor.tool.hammering = true;
            }
            Some(name) => {
                let index = self
                    .registry
                    .layer(name)
                    .tile_set()
                    .global_index(descriptor.tile_set_offset);
                let rotation = self.session.rotation();
                let placement = self.registry.place(name, cell, index, rotation);
                if let Some(replaced) = placement.replaced {
                    self.visibility.release(cell, replaced.fade_timer());
                }
                debug!("placed tile {index} on {name} at {cell:?}");
                out.push(Event::TilePlaced {
                    layer: name,
                    coord: cell,
                    index,
                });
                self.cursor.tool.hammering = true;
            }
        }
    }

    fn check_remove(
        &mut self,
        leader: &PartyMember,
        cell: TileCoord,
        origin: Vec2,
        pointer_down: bool,
        out: &mut Vec<Event>,
    ) {
        self.cursor.set_tile_visible(false);
        let check = self.validator.can_remove(leader, origin);
        self.cursor.tool.visible = check.shows_cursor();
        if !check.may_commit(pointer_down) {
            return;
        }
        self.cursor.tool.hammering = true;

        let Some(name) = self.session.layer() else {
            return;
        };
        if let Some(removed) = self.registry.remove(name, cell) {
            self.visibility.release(cell, removed.fade_timer());
            debug!("removed tile from {name} at {cell:?}");
            out.push(Event::TileRemoved {
                layer: name,
                coord: cell,
            });
        }
    }
}
