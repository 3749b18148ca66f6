#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Free-standing special entities and the tag handlers that give them behaviour.
//!
//! Placing on the special layer never writes into a tile grid. The builder
//! spawns a collidable [`SpecialEntity`] instead and hands it to the
//! [`TagRegistry`], which looks up the handler registered under the tag name.

use std::{collections::BTreeMap, fmt};

use glam::Vec2;
use log::warn;
use serde::{Deserialize, Serialize};
use tilecraft_core::{Aabb, EntityId, Party, TileDescriptor};
use tilecraft_world::{PropertyValue, TileProperties};

/// Tag name applied to special placements by default.
pub const DOOR_TAG: &str = "door";

/// Settings for special-layer placements.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialConfig {
    /// Tag applied to every special entity.
    pub tag: String,
    /// Width of the collision footprint in world units.
    pub footprint_width: f32,
    /// Height of the collision footprint in world units.
    pub footprint_height: f32,
}

impl SpecialConfig {
    /// Collision footprint size.
    #[must_use]
    pub fn footprint(&self) -> Vec2 {
        Vec2::new(self.footprint_width, self.footprint_height)
    }
}

impl Default for SpecialConfig {
    fn default() -> Self {
        Self {
            tag: DOOR_TAG.to_owned(),
            footprint_width: 48.0,
            footprint_height: 48.0,
        }
    }
}

/// Collidable entity spawned by a special-layer placement.
#[derive(Clone, Debug, PartialEq)]
pub struct SpecialEntity {
    id: EntityId,
    position: Vec2,
    footprint: Vec2,
    descriptor: TileDescriptor,
    data: TileProperties,
}

impl SpecialEntity {
    /// Creates an untagged entity centred on `position`.
    #[must_use]
    pub fn new(id: EntityId, position: Vec2, footprint: Vec2, descriptor: TileDescriptor) -> Self {
        Self {
            id,
            position,
            footprint,
            descriptor,
            data: TileProperties::new(),
        }
    }

    /// Identifier assigned by the builder.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// World position of the entity centre.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Collision body centred on the entity.
    #[must_use]
    pub fn body(&self) -> Aabb {
        Aabb::from_center(self.position, self.footprint)
    }

    /// Tile the entity was drawn from.
    #[must_use]
    pub const fn descriptor(&self) -> &TileDescriptor {
        &self.descriptor
    }

    /// Data attached by tag handlers.
    #[must_use]
    pub fn data(&self) -> &TileProperties {
        &self.data
    }

    /// Attaches a named value, replacing any earlier one.
    pub fn set_data(&mut self, key: impl Into<String>, value: PropertyValue) {
        let _ = self.data.insert(key.into(), value);
    }
}

/// Behaviour attached to special entities under a tag name.
pub trait TagHandler: fmt::Debug {
    /// Attaches behaviour to a freshly spawned entity.
    fn apply(&self, entity: &mut SpecialEntity, party: &Party);
}

/// Closed door that the party can later open.
#[derive(Clone, Copy, Debug, Default)]
pub struct DoorTag;

impl TagHandler for DoorTag {
    fn apply(&self, entity: &mut SpecialEntity, _party: &Party) {
        entity.set_data("tag", PropertyValue::Text(DOOR_TAG.to_owned()));
        entity.set_data("open", PropertyValue::Bool(false));
    }
}

/// Capability map from tag names to handlers.
#[derive(Debug, Default)]
pub struct TagRegistry {
    handlers: BTreeMap<String, Box<dyn TagHandler>>,
}

impl TagRegistry {
    /// Creates a registry without handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in door handler.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let _ = registry.register(DOOR_TAG, Box::new(DoorTag));
        registry
    }

    /// Registers `handler` under `tag`, returning the handler it replaced.
    pub fn register(
        &mut self,
        tag: impl Into<String>,
        handler: Box<dyn TagHandler>,
    ) -> Option<Box<dyn TagHandler>> {
        self.handlers.insert(tag.into(), handler)
    }

    /// Reports whether a handler is registered under `tag`.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// Applies the handler registered under `tag` to `entity`.
    ///
    /// Returns `false` when no handler is registered; the entity stays untagged.
    pub fn apply(&self, tag: &str, entity: &mut SpecialEntity, party: &Party) -> bool {
        match self.handlers.get(tag) {
            Some(handler) => {
                handler.apply(entity, party);
                true
            }
            None => {
                warn!("no handler registered for special tag `{tag}`");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[derive(Debug, Default)]
    struct CountingTag {
        calls: Cell<u32>,
    }

    impl TagHandler for std::rc::Rc<CountingTag> {
        fn apply(&self, entity: &mut SpecialEntity, _party: &Party) {
            self.calls.set(self.calls.get() + 1);
            entity.set_data("counted", PropertyValue::Bool(true));
        }
    }

    fn entity() -> SpecialEntity {
        SpecialEntity::new(
            EntityId::new(0),
            Vec2::new(24.0, 24.0),
            SpecialConfig::default().footprint(),
            TileDescriptor::new("specialTiles", 2),
        )
    }

    #[test]
    fn door_handler_marks_entity_closed() {
        let registry = TagRegistry::with_defaults();
        let mut door = entity();
        assert!(registry.apply(DOOR_TAG, &mut door, &Party::default()));
        assert_eq!(
            door.data().get("open"),
            Some(&PropertyValue::Bool(false))
        );
        assert_eq!(door.body().min(), Vec2::ZERO);
        assert_eq!(door.body().size(), Vec2::splat(48.0));
    }

    #[test]
    fn unknown_tag_leaves_entity_untouched() {
        let registry = TagRegistry::with_defaults();
        let mut plain = entity();
        assert!(!registry.apply("chest", &mut plain, &Party::default()));
        assert!(plain.data().is_empty());
    }

    #[test]
    fn registered_handlers_are_called_once_per_apply() {
        let counter = std::rc::Rc::new(CountingTag::default());
        let mut registry = TagRegistry::new();
        assert!(registry
            .register("chest", Box::new(std::rc::Rc::clone(&counter)))
            .is_none());
        assert!(registry.contains("chest"));

        let mut chest = entity();
        assert!(registry.apply("chest", &mut chest, &Party::default()));
        assert_eq!(counter.calls.get(), 1);
        assert_eq!(chest.data().get("counted"), Some(&PropertyValue::Bool(true)));
    }
}
