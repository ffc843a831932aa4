//! Insertion-ordered entity collection of an area.
//!
//! Update order is fixed: overlays, then characters, then the player. Within a
//! group entities are visited in the order they were spawned, which keeps
//! every run of the same inputs deterministic.

use bevy_ecs::prelude::{Entity, Resource};

use crate::components::actor::ActorKind;

#[derive(Resource, Debug, Clone, Default)]
pub struct Roster {
    overlays: Vec<Entity>,
    characters: Vec<Entity>,
    player: Option<Entity>,
}

impl Roster {
    /// Record a spawned entity. A second player replaces the first.
    pub fn register(&mut self, kind: ActorKind, entity: Entity) {
        match kind {
            ActorKind::Overlay => self.overlays.push(entity),
            ActorKind::Npc => self.characters.push(entity),
            ActorKind::Player => self.player = Some(entity),
        }
    }

    /// Forget an entity. Returns false if it was not registered.
    pub fn deregister(&mut self, entity: Entity) -> bool {
        if self.player == Some(entity) {
            self.player = None;
            return true;
        }
        for group in [&mut self.overlays, &mut self.characters] {
            if let Some(pos) = group.iter().position(|e| *e == entity) {
                group.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.player == Some(entity)
            || self.overlays.contains(&entity)
            || self.characters.contains(&entity)
    }

    pub fn overlays(&self) -> &[Entity] {
        &self.overlays
    }

    pub fn characters(&self) -> &[Entity] {
        &self.characters
    }

    pub fn player(&self) -> Option<Entity> {
        self.player
    }

    /// Every entity in update order.
    pub fn update_order(&self) -> Vec<Entity> {
        self.overlays
            .iter()
            .chain(self.characters.iter())
            .chain(self.player.iter())
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.overlays.len() + self.characters.len() + usize::from(self.player.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
