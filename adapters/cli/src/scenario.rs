//! Scripted building sessions decoded from TOML.

use std::{fmt, time::Duration};

use anyhow::{Context, Result};
use glam::Vec2;
use log::{debug, info};
use serde::Deserialize;
use tilecraft_core::{Command, LayerName, Party, PartyMember, Rotation, TileCoord};
use tilecraft_system_builder::{BuilderConfig, FrameInput, TileProbe, TilemapBuilder};
use tilecraft_system_tagging::TagRegistry;
use tilecraft_world::{LayerDepths, LayerRegistry, TileSetConfig};

const DEFAULT_FRAME_MS: u64 = 16;
const DEFAULT_BODY: [f32; 2] = [12.0, 12.0];

/// Party member placement within a scenario.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct MemberEntry {
    /// Centre of the member in world units.
    pub(crate) position: Vec2,
    /// Collision body size.
    #[serde(default = "default_body")]
    pub(crate) body: Vec2,
}

fn default_body() -> Vec2 {
    Vec2::from(DEFAULT_BODY)
}

/// A single scripted action.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Step {
    /// Menu signal forwarded to the builder.
    Signal {
        /// Signal name such as `layerSelected`.
        signal: String,
        /// Optional textual payload.
        #[serde(default)]
        payload: Option<String>,
    },
    /// One or more identical frames.
    Frames {
        /// Number of frames to advance.
        #[serde(default = "one")]
        frames: u32,
        /// Pointer position in world units.
        pointer: Vec2,
        /// Whether the pointer is held.
        #[serde(default)]
        pointer_down: bool,
        /// Frame delta in milliseconds.
        #[serde(default = "default_frame_ms")]
        dt_ms: u64,
    },
}

const fn one() -> u32 {
    1
}

const fn default_frame_ms() -> u64 {
    DEFAULT_FRAME_MS
}

/// Complete scripted session.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Scenario {
    /// Party members; the first one leads.
    pub(crate) party: Vec<MemberEntry>,
    /// Cells covered by scenery that blocks building underneath the pointer.
    #[serde(default)]
    pub(crate) blocked: Vec<[i32; 2]>,
    /// Actions replayed in order.
    #[serde(default)]
    pub(crate) steps: Vec<Step>,
}

impl Scenario {
    /// Parses a scenario script.
    pub(crate) fn from_toml(text: &str) -> Result<Self> {
        let scenario = toml::from_str(text)?;
        Ok(scenario)
    }

    /// Replays every step against a fresh builder.
    pub(crate) fn run(&self, config: BuilderConfig) -> Result<Summary> {
        let mut events = Vec::new();
        let scenery = self.scenery(&config.tile_sets)?;
        let mut builder = TilemapBuilder::new(config, TagRegistry::with_defaults(), &mut events)
            .context("failed to construct tilemap builder")?;
        let party = Party::new(
            self.party
                .iter()
                .map(|member| PartyMember::centered(member.position, member.body))
                .collect(),
        );
        let probes: [&dyn TileProbe; 1] = [scenery.layer(LayerName::Floor)];

        for (index, step) in self.steps.iter().enumerate() {
            match step {
                Step::Signal { signal, payload } => {
                    let command = Command::from_signal(signal, payload.as_deref())
                        .with_context(|| format!("step {index}: invalid signal"))?;
                    debug!("step {index}: {}", command.signal_name());
                    builder.apply(command, &mut events);
                }
                Step::Frames {
                    frames,
                    pointer,
                    pointer_down,
                    dt_ms,
                } => {
                    let input =
                        FrameInput::new(Duration::from_millis(*dt_ms), *pointer, *pointer_down);
                    for _ in 0..*frames {
                        builder.update(input, &party, &probes, &mut events);
                    }
                }
            }
        }

        for event in &events {
            debug!("{event:?}");
        }
        info!(
            "replayed {} steps, {} events",
            self.steps.len(),
            events.len()
        );
        Ok(Summary::capture(&builder, events.len()))
    }

    fn scenery(&self, tile_sets: &[TileSetConfig]) -> Result<LayerRegistry> {
        let mut scenery = LayerRegistry::from_configs(tile_sets, LayerDepths::default())
            .context("failed to bind scenery layers")?;
        let index = scenery.layer(LayerName::Floor).tile_set().global_index(0);
        for [x, y] in &self.blocked {
            let _ = scenery.place(LayerName::Floor, TileCoord::new(*x, *y), index, Rotation::ZERO);
        }
        Ok(scenery)
    }
}

/// Builder state reported once a scenario finishes.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Summary {
    /// Whether build mode was still active.
    pub(crate) building: bool,
    /// Leader visibility radius.
    pub(crate) leader_radius: f32,
    /// Follower visibility radius.
    pub(crate) follower_radius: f32,
    /// Tile count per layer.
    pub(crate) tiles: Vec<(LayerName, usize)>,
    /// Roof resets still pending.
    pub(crate) outstanding_resets: usize,
    /// Special entities spawned.
    pub(crate) entities: usize,
    /// Events emitted, including readiness.
    pub(crate) events: usize,
    /// Simulated time.
    pub(crate) clock: Duration,
}

impl Summary {
    fn capture(builder: &TilemapBuilder, events: usize) -> Self {
        let radii = builder.visibility_radii();
        Self {
            building: builder.session().is_building(),
            leader_radius: radii.leader,
            follower_radius: radii.follower,
            tiles: LayerName::ALL
                .into_iter()
                .map(|name| (name, builder.registry().layer(name).len()))
                .collect(),
            outstanding_resets: builder.outstanding_resets(),
            entities: builder.entities().len(),
            events,
            clock: builder.clock(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "building: {}", self.building)?;
        writeln!(
            f,
            "visibility radii: leader {:.1}, follower {:.1}",
            self.leader_radius, self.follower_radius
        )?;
        for (name, count) in &self.tiles {
            writeln!(f, "{name} tiles: {count}")?;
        }
        writeln!(f, "pending roof resets: {}", self.outstanding_resets)?;
        writeln!(f, "special entities: {}", self.entities)?;
        writeln!(f, "events: {}", self.events)?;
        write!(f, "elapsed: {} ms", self.clock.as_millis())
    }
}
