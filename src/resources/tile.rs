//! Tiles and tile types.
//!
//! Properties live on two tiers. A [`TileType`] is a template shared by every
//! tile drawn from the same tileset cell; a [`Tile`] is one grid cell. Flags on
//! both tiers are independent bitmasks and a query ORs them: the instance is
//! checked first, then its type. Scripts on both tiers fire for the same
//! event, instance first.
//!
//! Flag bits are private. Callers change them through a [`FlagManip`], which
//! only knows named flags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::components::animation::AnimationClock;
use crate::coords::{IVec2, VICoord};
use crate::resources::script::ScriptBinding;

/// Named tile behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileFlag {
    /// Nothing may walk here.
    Nowalk,
    /// The player may not walk here.
    NowalkPlayer,
    /// NPCs may not walk here.
    NowalkNpc,
    /// Scripts on this tile fire for the player.
    PlayerEvent,
    /// Scripts on this tile fire for NPCs.
    NpcEvent,
    /// Scripts on this tile are unbound after they fire once.
    TempEvent,
}

impl TileFlag {
    pub const ALL: [TileFlag; 6] = [
        TileFlag::Nowalk,
        TileFlag::NowalkPlayer,
        TileFlag::NowalkNpc,
        TileFlag::PlayerEvent,
        TileFlag::NpcEvent,
        TileFlag::TempEvent,
    ];

    fn mask(self) -> u16 {
        match self {
            TileFlag::Nowalk => 0x0001,
            TileFlag::NowalkPlayer => 0x0002,
            TileFlag::NowalkNpc => 0x0004,
            TileFlag::PlayerEvent => 0x0008,
            TileFlag::NpcEvent => 0x0010,
            TileFlag::TempEvent => 0x0020,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TileFlag::Nowalk => "nowalk",
            TileFlag::NowalkPlayer => "nowalk_player",
            TileFlag::NowalkNpc => "nowalk_npc",
            TileFlag::PlayerEvent => "player_event",
            TileFlag::NpcEvent => "npc_event",
            TileFlag::TempEvent => "temp_event",
        }
    }
}

impl FromStr for TileFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TileFlag::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("unknown tile flag '{s}'"))
    }
}

/// A set of [`TileFlag`]s.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct TileFlags(u16);

impl TileFlags {
    pub fn contains(self, flag: TileFlag) -> bool {
        self.0 & flag.mask() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Mutate this set through named flags only.
    pub fn manip(&mut self) -> FlagManip<'_> {
        FlagManip { bits: &mut self.0 }
    }
}

impl fmt::Debug for TileFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(TileFlag::ALL.into_iter().filter(|fl| self.contains(*fl)).map(TileFlag::name))
            .finish()
    }
}

impl FromIterator<TileFlag> for TileFlags {
    fn from_iter<I: IntoIterator<Item = TileFlag>>(iter: I) -> Self {
        let mut flags = TileFlags::default();
        for flag in iter {
            flags.manip().set(flag, true);
        }
        flags
    }
}

/// Narrow mutator over a flag set.
pub struct FlagManip<'a> {
    bits: &'a mut u16,
}

impl FlagManip<'_> {
    pub fn set(&mut self, flag: TileFlag, on: bool) -> &mut Self {
        if on {
            *self.bits |= flag.mask();
        } else {
            *self.bits &= !flag.mask();
        }
        self
    }

    pub fn set_nowalk(&mut self, on: bool) -> &mut Self {
        self.set(TileFlag::Nowalk, on)
    }

    pub fn set_nowalk_player(&mut self, on: bool) -> &mut Self {
        self.set(TileFlag::NowalkPlayer, on)
    }

    pub fn set_nowalk_npc(&mut self, on: bool) -> &mut Self {
        self.set(TileFlag::NowalkNpc, on)
    }

    pub fn set_player_event(&mut self, on: bool) -> &mut Self {
        self.set(TileFlag::PlayerEvent, on)
    }

    pub fn set_npc_event(&mut self, on: bool) -> &mut Self {
        self.set(TileFlag::NpcEvent, on)
    }

    pub fn set_temp_event(&mut self, on: bool) -> &mut Self {
        self.set(TileFlag::TempEvent, on)
    }

    /// Clear every flag.
    pub fn clear(&mut self) -> &mut Self {
        *self.bits = 0;
        self
    }
}

/// The five exit / layer-modifier slots of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitSlot {
    /// Taken when arriving on the tile.
    Normal,
    Up,
    Down,
    Left,
    Right,
}

impl ExitSlot {
    pub const ALL: [ExitSlot; 5] = [
        ExitSlot::Normal,
        ExitSlot::Up,
        ExitSlot::Down,
        ExitSlot::Left,
        ExitSlot::Right,
    ];

    /// Slot for a facing vector. Diagonals have no slot.
    pub fn from_facing(facing: IVec2) -> Option<ExitSlot> {
        match (facing.x, facing.y) {
            (0, 0) => Some(ExitSlot::Normal),
            (0, -1) => Some(ExitSlot::Up),
            (0, 1) => Some(ExitSlot::Down),
            (-1, 0) => Some(ExitSlot::Left),
            (1, 0) => Some(ExitSlot::Right),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            ExitSlot::Normal => 0,
            ExitSlot::Up => 1,
            ExitSlot::Down => 2,
            ExitSlot::Left => 3,
            ExitSlot::Right => 4,
        }
    }
}

/// Teleport binding to a coordinate in another (or the same) area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exit {
    pub area: String,
    pub coords: VICoord,
}

impl Exit {
    pub fn new(area: impl Into<String>, coords: VICoord) -> Self {
        Self {
            area: area.into(),
            coords,
        }
    }
}

/// Which trigger a script is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileTrigger {
    Enter,
    Leave,
    Use,
}

/// Scripts bound on one tier of a tile.
#[derive(Debug, Clone, Default)]
pub struct TileScripts {
    pub on_enter: Option<ScriptBinding>,
    pub on_leave: Option<ScriptBinding>,
    pub on_use: Option<ScriptBinding>,
}

impl TileScripts {
    pub fn get(&self, trigger: TileTrigger) -> Option<&ScriptBinding> {
        match trigger {
            TileTrigger::Enter => self.on_enter.as_ref(),
            TileTrigger::Leave => self.on_leave.as_ref(),
            TileTrigger::Use => self.on_use.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, trigger: TileTrigger) -> &mut Option<ScriptBinding> {
        match trigger {
            TileTrigger::Enter => &mut self.on_enter,
            TileTrigger::Leave => &mut self.on_leave,
            TileTrigger::Use => &mut self.on_use,
        }
    }
}

/// Index of a [`TileType`] in the area's type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileTypeId(pub u32);

/// Properties shared by every tile of one type.
#[derive(Debug, Clone, Default)]
pub struct TileType {
    pub anim: AnimationClock,
    pub flags: TileFlags,
    pub scripts: TileScripts,
}

impl TileType {
    pub fn new(anim: AnimationClock) -> Self {
        Self {
            anim,
            ..Self::default()
        }
    }
}

/// One grid cell.
#[derive(Debug, Clone, Default)]
pub struct Tile {
    /// Type this tile is drawn from. Owned by the area's type table.
    pub type_id: Option<TileTypeId>,
    pub flags: TileFlags,
    pub scripts: TileScripts,
    exits: [Option<Exit>; 5],
    layermods: [Option<f64>; 5],
}

impl Tile {
    pub fn with_type(type_id: TileTypeId) -> Self {
        Self {
            type_id: Some(type_id),
            ..Self::default()
        }
    }

    /// Instance flag, falling back to the type's flag.
    pub fn has_flag(&self, flag: TileFlag, ty: Option<&TileType>) -> bool {
        self.flags.contains(flag) || ty.is_some_and(|t| t.flags.contains(flag))
    }

    pub fn exit(&self, slot: ExitSlot) -> Option<&Exit> {
        self.exits[slot.index()].as_ref()
    }

    pub fn set_exit(&mut self, slot: ExitSlot, exit: Option<Exit>) {
        self.exits[slot.index()] = exit;
    }

    /// Exit taken when leaving in direction `facing`, or arriving for `(0, 0)`.
    pub fn exit_at(&self, facing: IVec2) -> Option<&Exit> {
        ExitSlot::from_facing(facing).and_then(|slot| self.exit(slot))
    }

    pub fn layermod(&self, slot: ExitSlot) -> Option<f64> {
        self.layermods[slot.index()]
    }

    pub fn set_layermod(&mut self, slot: ExitSlot, depth: Option<f64>) {
        self.layermods[slot.index()] = depth;
    }

    /// Depth to switch to when leaving in direction `facing`.
    pub fn layermod_at(&self, facing: IVec2) -> Option<f64> {
        ExitSlot::from_facing(facing).and_then(|slot| self.layermod(slot))
    }
}

/// Lookup table from a tileset image's cells to tile types.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSet {
    /// Width of the tileset image in tiles.
    pub width: u32,
    /// Height of the tileset image in tiles.
    pub height: u32,
    types: Vec<TileTypeId>,
}

impl TileSet {
    /// `types` is in row-major order and must hold `width * height` entries.
    pub fn new(width: u32, height: u32, types: Vec<TileTypeId>) -> Option<Self> {
        let cells = width.checked_mul(height)?;
        (types.len() as u64 == u64::from(cells)).then_some(Self {
            width,
            height,
            types,
        })
    }

    /// Type for the tileset cell at column `x`, row `y`.
    pub fn at(&self, x: u32, y: u32) -> Option<TileTypeId> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.types.get((y * self.width + x) as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
