//! Area descriptors.
//!
//! An area is authored as a JSON file holding the grid size, the tile types,
//! one list of cells per layer, per-tile overrides, area hooks and the
//! entities placed at load time:
//!
//! ```json
//! {
//!   "width": 3, "height": 2, "tile_width": 16, "tile_height": 16,
//!   "tile_types": [
//!     { "frames": ["grass"] },
//!     { "frames": ["water0", "water1"], "frame_ms": 250, "flags": ["nowalk"] }
//!   ],
//!   "layers": [ { "depth": 0.0, "cells": [0, 0, 1, 0, 0, 1] } ],
//!   "tiles": [
//!     { "x": 2, "y": 0, "depth": 0.0,
//!       "exits": [ { "slot": "normal", "area": "cave", "x": 0, "y": 0, "z": 0.0 } ] }
//!   ],
//!   "scripts": { "on_load": { "file": "intro.lua" } },
//!   "npcs": [ { "descriptor": "villager", "x": 1, "y": 1, "wander": { "interval_ms": 1000 } } ]
//! }
//! ```
//!
//! [`AreaDescriptor::build`] validates the whole descriptor before anything is
//! spawned, so a bad file never produces a half-built area.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::area::Area;
use crate::components::actor::ActorKind;
use crate::components::animation::AnimationClock;
use crate::components::entityscripts::EntityScripts;
use crate::components::sprite::Sprite;
use crate::components::wander::Wander;
use crate::coords::{ICoord, IVec2, VICoord};
use crate::error::AreaError;
use crate::game::AreaLoader;
use crate::resources::areascripts::AreaScripts;
use crate::resources::engineconfig::EngineConfig;
use crate::resources::script::ScriptBinding;
use crate::resources::tile::{
    Exit, ExitSlot, TileFlag, TileFlags, TileScripts, TileSet, TileTrigger, TileType, TileTypeId,
};
use crate::resources::tilegrid::TileGrid;
use crate::systems::spawn::ActorSpawn;

fn default_tile_size() -> i32 {
    16
}

fn default_speed() -> f64 {
    1.0
}

fn default_move_chance() -> u32 {
    4
}

/// Where a script comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptDesc {
    /// Lua file, relative to the script root.
    File(PathBuf),
    /// Lua chunk.
    Inline(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerDesc {
    pub on_enter: Option<ScriptDesc>,
    pub on_leave: Option<ScriptDesc>,
    pub on_use: Option<ScriptDesc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileTypeDesc {
    pub frames: Vec<String>,
    pub frame_ms: u64,
    pub flags: Vec<String>,
    pub scripts: TriggerDesc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDesc {
    pub depth: f64,
    /// Tile type index per cell, row-major. `null` leaves the cell untyped.
    pub cells: Vec<Option<u32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitDesc {
    pub slot: ExitSlot,
    pub area: String,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayermodDesc {
    pub slot: ExitSlot,
    pub depth: f64,
}

/// Per-tile overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDesc {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub depth: f64,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub scripts: TriggerDesc,
    #[serde(default)]
    pub exits: Vec<ExitDesc>,
    #[serde(default)]
    pub layermods: Vec<LayermodDesc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSetDesc {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub types: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaScriptsDesc {
    pub on_load: Option<ScriptDesc>,
    pub on_focus: Option<ScriptDesc>,
    pub on_tick: Option<ScriptDesc>,
    pub on_turn: Option<ScriptDesc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityScriptsDesc {
    pub on_update: Option<ScriptDesc>,
    pub on_tile_entry: Option<ScriptDesc>,
    pub on_tile_exit: Option<ScriptDesc>,
    pub on_delete: Option<ScriptDesc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDesc {
    pub name: String,
    pub frames: Vec<String>,
    #[serde(default)]
    pub frame_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WanderDesc {
    pub interval_ms: u64,
    #[serde(default = "default_move_chance")]
    pub move_chance: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundDesc {
    pub event: String,
    pub sound: String,
}

/// An entity placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorDesc {
    pub descriptor: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub phase: Option<String>,
    /// Tiles per second.
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default)]
    pub phases: Vec<PhaseDesc>,
    #[serde(default)]
    pub wander: Option<WanderDesc>,
    #[serde(default)]
    pub scripts: EntityScriptsDesc,
    #[serde(default)]
    pub sounds: Vec<SoundDesc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaDescriptor {
    pub width: i32,
    pub height: i32,
    #[serde(default = "default_tile_size")]
    pub tile_width: i32,
    #[serde(default = "default_tile_size")]
    pub tile_height: i32,
    #[serde(default)]
    pub loop_x: bool,
    #[serde(default)]
    pub loop_y: bool,
    #[serde(default)]
    pub tile_types: Vec<TileTypeDesc>,
    pub layers: Vec<LayerDesc>,
    #[serde(default)]
    pub tiles: Vec<TileDesc>,
    #[serde(default)]
    pub tilesets: Vec<TileSetDesc>,
    #[serde(default)]
    pub scripts: AreaScriptsDesc,
    #[serde(default)]
    pub npcs: Vec<ActorDesc>,
    #[serde(default)]
    pub overlays: Vec<ActorDesc>,
}

/// Binds script descriptions for one area, resolving files against a root.
struct ScriptResolver<'a> {
    area: &'a str,
    root: &'a Path,
}

impl ScriptResolver<'_> {
    fn bind(&self, desc: &Option<ScriptDesc>, what: &str) -> Result<Option<ScriptBinding>, AreaError> {
        let Some(desc) = desc else {
            return Ok(None);
        };
        let binding = match desc {
            ScriptDesc::File(path) => ScriptBinding::file(self.root.join(path)),
            ScriptDesc::Inline(source) => {
                ScriptBinding::inline(format!("{}:{}", self.area, what), source.as_str())
            }
        };
        binding
            .validate()
            .map_err(|source| AreaError::InvalidTrigger {
                area: self.area.to_string(),
                what: what.to_string(),
                source,
            })?;
        Ok(Some(binding))
    }

    fn bind_triggers(&self, desc: &TriggerDesc, what: &str) -> Result<TileScripts, AreaError> {
        let mut scripts = TileScripts::default();
        for (trigger, script) in [
            (TileTrigger::Enter, &desc.on_enter),
            (TileTrigger::Leave, &desc.on_leave),
            (TileTrigger::Use, &desc.on_use),
        ] {
            *scripts.slot_mut(trigger) = self.bind(script, what)?;
        }
        Ok(scripts)
    }

    fn bind_entity(&self, desc: &EntityScriptsDesc, what: &str) -> Result<EntityScripts, AreaError> {
        Ok(EntityScripts {
            on_update: self.bind(&desc.on_update, what)?,
            on_tile_entry: self.bind(&desc.on_tile_entry, what)?,
            on_tile_exit: self.bind(&desc.on_tile_exit, what)?,
            on_delete: self.bind(&desc.on_delete, what)?,
        })
    }
}

fn malformed(area: &str, reason: impl Into<String>) -> AreaError {
    AreaError::Malformed {
        area: area.to_string(),
        reason: reason.into(),
    }
}

fn parse_flags(area: &str, names: &[String]) -> Result<TileFlags, AreaError> {
    let mut flags = TileFlags::default();
    for name in names {
        let flag: TileFlag = name.parse().map_err(|e: String| malformed(area, e))?;
        flags.manip().set(flag, true);
    }
    Ok(flags)
}

fn clock(frames: &[String], frame_ms: u64) -> AnimationClock {
    match frames {
        [] => AnimationClock::default(),
        [single] => AnimationClock::still(single.as_str()),
        _ => AnimationClock::cycling(frames.iter().map(String::as_str), frame_ms),
    }
}

impl AreaDescriptor {
    pub fn from_json(text: &str) -> Result<Self, AreaError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, AreaError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Build the area named `name`. Script files are looked up under
    /// `script_root`.
    pub fn build(
        &self,
        name: &str,
        config: &EngineConfig,
        script_root: &Path,
    ) -> Result<Area, AreaError> {
        let grid = self.build_grid(name, script_root)?;
        let resolver = ScriptResolver {
            area: name,
            root: script_root,
        };

        let mut scripts = AreaScripts::named(name);
        scripts.on_load = resolver.bind(&self.scripts.on_load, "on_load")?;
        scripts.on_focus = resolver.bind(&self.scripts.on_focus, "on_focus")?;
        scripts.on_tick = resolver.bind(&self.scripts.on_tick, "on_tick")?;
        scripts.on_turn = resolver.bind(&self.scripts.on_turn, "on_turn")?;

        let mut spawns = Vec::with_capacity(self.npcs.len() + self.overlays.len());
        for (kind, list) in [(ActorKind::Npc, &self.npcs), (ActorKind::Overlay, &self.overlays)] {
            for desc in list {
                let position = VICoord::new(desc.x, desc.y, desc.z);
                if grid.try_index_of(desc.z).is_none() || !grid.in_bounds_virt(position) {
                    return Err(malformed(
                        name,
                        format!("'{}' placed outside the map at {}", desc.descriptor, position),
                    ));
                }
                spawns.push(actor_spawn(desc, kind, &resolver)?);
            }
        }

        let mut area = Area::new(name, grid, config);
        *area.scripts_mut() = scripts;
        for spawn in spawns {
            area.spawn(spawn);
        }
        info!(
            "built area '{}' ({}x{}, {} layers)",
            name,
            self.width,
            self.height,
            self.layers.len()
        );
        Ok(area)
    }

    fn build_grid(&self, name: &str, script_root: &Path) -> Result<TileGrid, AreaError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(malformed(name, "zero-sized map"));
        }
        if self.tile_width <= 0 || self.tile_height <= 0 {
            return Err(malformed(name, "zero-sized tiles"));
        }
        if self.layers.is_empty() {
            return Err(malformed(name, "no layers"));
        }
        let fits = i32::try_from(self.layers.len())
            .ok()
            .and_then(|depth| self.width.checked_mul(self.height)?.checked_mul(depth))
            .and(self.width.checked_mul(self.tile_width))
            .and(self.height.checked_mul(self.tile_height))
            .is_some();
        if !fits {
            return Err(malformed(name, "map is too large"));
        }
        let resolver = ScriptResolver {
            area: name,
            root: script_root,
        };

        let mut grid = TileGrid::new(
            self.width,
            self.height,
            IVec2::new(self.tile_width, self.tile_height),
        )
        .with_looping(self.loop_x, self.loop_y);

        for (i, desc) in self.tile_types.iter().enumerate() {
            let mut ty = TileType::new(clock(&desc.frames, desc.frame_ms));
            ty.flags = parse_flags(name, &desc.flags)?;
            ty.scripts = resolver.bind_triggers(&desc.scripts, &format!("tile type {i}"))?;
            grid.add_type(ty);
        }
        let type_count = self.tile_types.len() as u32;

        let cells = (self.width * self.height) as usize;
        for layer in &self.layers {
            let Some(z) = grid.push_layer(layer.depth) else {
                return Err(AreaError::DuplicateDepth {
                    area: name.to_string(),
                    depth: layer.depth,
                });
            };
            if layer.cells.len() != cells {
                return Err(malformed(
                    name,
                    format!(
                        "layer {} has {} cells, expected {}",
                        layer.depth,
                        layer.cells.len(),
                        cells
                    ),
                ));
            }
            for (i, cell) in layer.cells.iter().enumerate() {
                let Some(id) = cell else { continue };
                if *id >= type_count {
                    return Err(malformed(name, format!("unknown tile type {id}")));
                }
                let at = ICoord::new(i as i32 % self.width, i as i32 / self.width, z);
                if let Some(tile) = grid.tile_mut(at) {
                    tile.type_id = Some(TileTypeId(*id));
                }
            }
        }

        for desc in &self.tiles {
            let what = format!("tile ({}, {}, {})", desc.x, desc.y, desc.depth);
            let Some(z) = grid.try_index_of(desc.depth) else {
                return Err(malformed(name, format!("{what} is on an unknown layer")));
            };
            let at = ICoord::new(desc.x, desc.y, z);
            if desc.x < 0 || desc.x >= self.width || desc.y < 0 || desc.y >= self.height {
                return Err(malformed(name, format!("{what} is outside the map")));
            }
            for lm in &desc.layermods {
                if grid.try_index_of(lm.depth).is_none() {
                    return Err(malformed(
                        name,
                        format!("{what} switches to unknown layer {}", lm.depth),
                    ));
                }
            }
            let flags = parse_flags(name, &desc.flags)?;
            let scripts = resolver.bind_triggers(&desc.scripts, &what)?;
            let Some(tile) = grid.tile_mut(at) else {
                return Err(malformed(name, format!("{what} is outside the map")));
            };
            tile.flags = flags;
            tile.scripts = scripts;
            for exit in &desc.exits {
                tile.set_exit(
                    exit.slot,
                    Some(Exit::new(&exit.area, VICoord::new(exit.x, exit.y, exit.z))),
                );
            }
            for lm in &desc.layermods {
                tile.set_layermod(lm.slot, Some(lm.depth));
            }
        }

        for set in &self.tilesets {
            if let Some(bad) = set.types.iter().find(|id| **id >= type_count) {
                return Err(malformed(
                    name,
                    format!("tileset '{}' names unknown tile type {bad}", set.name),
                ));
            }
            let types = set.types.iter().copied().map(TileTypeId).collect();
            let Some(tileset) = TileSet::new(set.width, set.height, types) else {
                return Err(malformed(
                    name,
                    format!("tileset '{}' size does not match its type list", set.name),
                ));
            };
            grid.add_tileset(&set.name, tileset);
        }

        debug!("grid for '{}' has {} tile types", name, type_count);
        Ok(grid)
    }
}

fn actor_spawn(
    desc: &ActorDesc,
    kind: ActorKind,
    resolver: &ScriptResolver<'_>,
) -> Result<ActorSpawn, AreaError> {
    let sprite = Sprite::new(
        desc.phases
            .iter()
            .map(|p| (p.name.clone(), clock(&p.frames, p.frame_ms))),
    );
    let mut spawn = ActorSpawn::new(kind, &desc.descriptor, VICoord::new(desc.x, desc.y, desc.z))
        .with_sprite(sprite)
        .with_speed(desc.speed)
        .with_scripts(resolver.bind_entity(&desc.scripts, &desc.descriptor)?);
    spawn.phase = desc.phase.clone();
    if let Some(w) = &desc.wander {
        spawn = spawn.with_wander(Wander::new(w.interval_ms, w.move_chance));
    }
    for s in &desc.sounds {
        spawn = spawn.with_sound(&s.event, &s.sound);
    }
    Ok(spawn)
}

/// Loads `<root>/<name>.json`. Script files resolve against `<root>/scripts`.
#[derive(Debug, Clone)]
pub struct JsonAreaLoader {
    root: PathBuf,
}

impl JsonAreaLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The player's spawn, from `<root>/player.json`.
    ///
    /// The position is set by the game from the configured start.
    pub fn load_player(&self, config: &EngineConfig) -> Result<ActorSpawn, AreaError> {
        let path = self.root.join("player.json");
        let desc: ActorDesc = if path.is_file() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            info!("no {}, using a bare player", path.display());
            ActorDesc {
                descriptor: "player".to_string(),
                x: 0,
                y: 0,
                z: 0.0,
                phase: None,
                speed: config.player_speed,
                phases: Vec::new(),
                wander: None,
                scripts: EntityScriptsDesc::default(),
                sounds: Vec::new(),
            }
        };
        let resolver = ScriptResolver {
            area: "player",
            root: &self.root.join("scripts"),
        };
        actor_spawn(&desc, ActorKind::Player, &resolver)
    }
}

impl AreaLoader for JsonAreaLoader {
    fn load(&mut self, name: &str, config: &EngineConfig) -> Result<Area, AreaError> {
        let path = self.root.join(format!("{name}.json"));
        if !path.is_file() {
            return Err(AreaError::NotFound(name.to_string()));
        }
        info!("loading area '{}' from {}", name, path.display());
        let desc = AreaDescriptor::load_from_file(&path)?;
        desc.build(name, config, &self.root.join("scripts"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::tile::TileFlag;

    fn base() -> AreaDescriptor {
        AreaDescriptor::from_json(
            r#"{
                "width": 3, "height": 2,
                "tile_types": [
                    { "frames": ["grass"] },
                    { "frames": ["w0", "w1"], "frame_ms": 100, "flags": ["nowalk"] }
                ],
                "layers": [ { "depth": 0.0, "cells": [0, 0, 1, 0, null, 1] } ]
            }"#,
        )
        .unwrap()
    }

    fn build(desc: &AreaDescriptor) -> Result<Area, AreaError> {
        desc.build("test", &EngineConfig::default(), Path::new("."))
    }

    #[test]
    fn oversized_maps_are_malformed() {
        let mut desc = base();
        desc.width = i32::MAX;
        desc.height = 2;
        assert!(matches!(build(&desc), Err(AreaError::Malformed { .. })));

        let mut desc = base();
        desc.tile_width = i32::MAX;
        assert!(matches!(build(&desc), Err(AreaError::Malformed { .. })));
    }

    #[test]
    fn builds_grid_from_cells() {
        let area = build(&base()).unwrap();
        assert_eq!(area.dimensions(), ICoord::new(3, 2, 1));
        assert_eq!(area.tile_dimensions(), IVec2::new(16, 16));
        let grid = area.grid();
        assert!(grid.has_flag(ICoord::new(2, 0, 0), TileFlag::Nowalk));
        assert!(!grid.has_flag(ICoord::new(0, 0, 0), TileFlag::Nowalk));
        assert_eq!(grid.tile(ICoord::new(1, 1, 0)).unwrap().type_id, None);
    }

    #[test]
    fn rejects_bad_descriptors() {
        let mut d = base();
        d.width = 0;
        assert!(matches!(build(&d), Err(AreaError::Malformed { .. })));

        let mut d = base();
        d.layers.push(d.layers[0].clone());
        assert!(matches!(build(&d), Err(AreaError::DuplicateDepth { .. })));

        let mut d = base();
        d.layers[0].cells.pop();
        assert!(matches!(build(&d), Err(AreaError::Malformed { .. })));

        let mut d = base();
        d.layers[0].cells[0] = Some(9);
        assert!(matches!(build(&d), Err(AreaError::Malformed { .. })));

        let mut d = base();
        d.tile_types[0].flags.push("slippery".into());
        assert!(matches!(build(&d), Err(AreaError::Malformed { .. })));
    }

    #[test]
    fn applies_tile_overrides() {
        let mut d = base();
        d.layers.push(LayerDesc {
            depth: 1.0,
            cells: vec![None; 6],
        });
        d.tiles.push(
            serde_json::from_str(
                r#"{ "x": 1, "y": 0, "flags": ["player_event"],
                     "exits": [ { "slot": "right", "area": "east", "x": 0, "y": 1 } ],
                     "layermods": [ { "slot": "up", "depth": 1.0 } ] }"#,
            )
            .unwrap(),
        );
        let area = build(&d).unwrap();
        let tile = area.tile(ICoord::new(1, 0, 0)).unwrap();
        assert!(tile.flags.contains(TileFlag::PlayerEvent));
        assert_eq!(
            tile.exit(ExitSlot::Right),
            Some(&Exit::new("east", VICoord::new(0, 1, 0.0)))
        );
        assert_eq!(tile.layermod(ExitSlot::Up), Some(1.0));
    }

    #[test]
    fn rejects_layermod_to_unknown_depth() {
        let mut d = base();
        d.tiles.push(TileDesc {
            x: 0,
            y: 0,
            depth: 0.0,
            flags: Vec::new(),
            scripts: TriggerDesc::default(),
            exits: Vec::new(),
            layermods: vec![LayermodDesc {
                slot: ExitSlot::Down,
                depth: 5.0,
            }],
        });
        assert!(matches!(build(&d), Err(AreaError::Malformed { .. })));
    }

    #[test]
    fn rejects_missing_script_file() {
        let mut d = base();
        d.scripts.on_load = Some(ScriptDesc::File("does/not/exist.lua".into()));
        assert!(matches!(build(&d), Err(AreaError::InvalidTrigger { .. })));
    }

    #[test]
    fn spawns_npcs_and_checks_their_position() {
        let mut d = base();
        d.npcs.push(
            serde_json::from_str(r#"{ "descriptor": "cat", "x": 1, "y": 1, "wander": { "interval_ms": 500 } }"#)
                .unwrap(),
        );
        let area = build(&d).unwrap();
        assert_eq!(area.roster().characters().len(), 1);

        d.npcs[0].x = 7;
        assert!(matches!(build(&d), Err(AreaError::Malformed { .. })));
    }

    #[test]
    fn tilesets_must_match_their_size() {
        let mut d = base();
        d.tilesets.push(TileSetDesc {
            name: "outdoor".into(),
            width: 2,
            height: 1,
            types: vec![0, 1],
        });
        let area = build(&d).unwrap();
        assert_eq!(area.tileset("outdoor").unwrap().at(1, 0), Some(TileTypeId(1)));

        d.tilesets[0].types.pop();
        assert!(matches!(build(&d), Err(AreaError::Malformed { .. })));
    }

    #[test]
    fn loader_reports_unknown_area() {
        let mut loader = JsonAreaLoader::new("/nonexistent/tilewalk");
        let err = loader.load("nowhere", &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, AreaError::NotFound(name) if name == "nowhere"));
    }
}
