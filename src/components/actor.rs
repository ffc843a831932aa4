//! Identity and walk rules of a map entity.

use bevy_ecs::prelude::Component;
use rustc_hash::FxHashMap;

use crate::resources::tile::{TileFlag, TileFlags};

/// What an entity is. Decides collision, which tile flags block it and what
/// taking an exit means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorKind {
    Player,
    Npc,
    /// Decorative. Never collides, never occupies a tile, never triggers.
    Overlay,
}

#[derive(Component, Debug, Clone)]
pub struct Actor {
    pub kind: ActorKind,
    /// Name of the descriptor the entity was built from.
    pub descriptor: String,
    /// Frozen entities refuse every move attempt.
    pub frozen: bool,
    /// Walk-blocking flags this entity ignores.
    pub exempt: TileFlags,
    /// Sound names by event, e.g. `"step"`.
    pub sounds: FxHashMap<String, String>,
}

impl Actor {
    pub fn new(kind: ActorKind, descriptor: impl Into<String>) -> Self {
        Self {
            kind,
            descriptor: descriptor.into(),
            frozen: false,
            exempt: TileFlags::default(),
            sounds: FxHashMap::default(),
        }
    }

    pub fn with_sound(mut self, event: impl Into<String>, sound: impl Into<String>) -> Self {
        self.sounds.insert(event.into(), sound.into());
        self
    }

    /// Flags that stop this entity, before exemptions.
    pub fn nowalk_flags(&self) -> &'static [TileFlag] {
        match self.kind {
            ActorKind::Player => &[TileFlag::Nowalk, TileFlag::NowalkPlayer],
            ActorKind::Npc => &[TileFlag::Nowalk, TileFlag::NowalkNpc],
            ActorKind::Overlay => &[],
        }
    }

    /// True if `flag` stops this entity.
    pub fn is_blocked_by(&self, flag: TileFlag) -> bool {
        self.nowalk_flags().contains(&flag) && !self.exempt.contains(flag)
    }

    /// Event filter flag that lets this entity's moves fire tile scripts.
    pub fn event_flag(&self) -> Option<TileFlag> {
        match self.kind {
            ActorKind::Player => Some(TileFlag::PlayerEvent),
            ActorKind::Npc => Some(TileFlag::NpcEvent),
            ActorKind::Overlay => None,
        }
    }

    pub fn collides(&self) -> bool {
        self.kind != ActorKind::Overlay
    }

    pub fn sound(&self, event: &str) -> Option<&str> {
        self.sounds.get(event).map(String::as_str)
    }
}
