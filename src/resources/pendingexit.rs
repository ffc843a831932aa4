use bevy_ecs::prelude::{Entity, Resource};

use crate::coords::RCoord;
use crate::resources::tile::Exit;

/// An exit the player took during a step, waiting for the game to switch areas.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitRequest {
    pub entity: Entity,
    pub exit: Exit,
    /// Where the player stood before the move, restored if the target fails to load.
    pub rollback: RCoord,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct PendingExit(pub Option<ExitRequest>);

impl PendingExit {
    pub fn take(&mut self) -> Option<ExitRequest> {
        self.0.take()
    }
}
