use bevy_ecs::prelude::*;

use crate::components::motion::Motion;
use crate::components::wander::Wander;
use crate::coords::IVec2;
use crate::systems::movement::move_by_tile;

/// Roll the wander die for an idle NPC once its interval has elapsed.
///
/// Returns true if a step was started.
pub fn wander_step(world: &mut World, entity: Entity, dt_ms: u64) -> bool {
    let gliding = world.get::<Motion>(entity).is_some_and(Motion::is_gliding);
    let Some(mut wander) = world.get_mut::<Wander>(entity) else {
        return false;
    };
    if !wander.enabled {
        return false;
    }
    let interval = wander.interval_ms;
    let elapsed = wander.elapsed_ms.saturating_add(dt_ms);
    if elapsed < interval {
        wander.elapsed_ms = elapsed;
        return false;
    }
    // A roll that comes due mid-glide waits for the glide to finish.
    if gliding {
        wander.elapsed_ms = interval;
        return false;
    }
    wander.elapsed_ms = elapsed % interval;

    let chance = wander.move_chance;
    if wander.rng.u32(0..chance) != 0 {
        return false;
    }
    let sign = if wander.rng.bool() { 1 } else { -1 };
    let delta = if wander.rng.bool() {
        IVec2::new(sign, 0)
    } else {
        IVec2::new(0, sign)
    };
    move_by_tile(world, entity, delta)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::area::Area;
    use crate::components::actor::ActorKind;
    use crate::components::motion::MotionState;
    use crate::coords::VICoord;
    use crate::descriptor::AreaDescriptor;
    use crate::resources::engineconfig::{EngineConfig, MovementMode};
    use crate::systems::spawn::ActorSpawn;

    fn field() -> Area {
        let desc = AreaDescriptor::from_json(
            r#"{
                "width": 5, "height": 5,
                "tile_types": [ { "frames": ["grass"] } ],
                "layers": [ { "depth": 0.0, "cells": [
                    0, 0, 0, 0, 0,  0, 0, 0, 0, 0,  0, 0, 0, 0, 0,
                    0, 0, 0, 0, 0,  0, 0, 0, 0, 0
                ] } ]
            }"#,
        )
        .unwrap();
        let mut config = EngineConfig::default();
        config.movement_mode = MovementMode::Tile;
        desc.build("field", &config, Path::new(".")).unwrap()
    }

    fn npc(area: &mut Area, wander: Wander) -> Entity {
        area.spawn(
            ActorSpawn::new(ActorKind::Npc, "villager", VICoord::new(2, 2, 0.0))
                .with_speed(62.5)
                .with_wander(wander),
        )
    }

    #[test]
    fn rolls_only_once_the_interval_has_passed() {
        let mut area = field();
        let e = npc(&mut area, Wander::seeded(100, 1, 7));
        assert!(!wander_step(area.world_mut(), e, 99));
        assert!(wander_step(area.world_mut(), e, 1));
        assert_eq!(area.world().get::<Wander>(e).unwrap().elapsed_ms, 0);
    }

    #[test]
    fn roll_due_during_a_glide_waits_for_arrival() {
        let mut area = field();
        let e = npc(&mut area, Wander::seeded(100, 1, 7));
        assert!(move_by_tile(area.world_mut(), e, IVec2::RIGHT));

        assert!(!wander_step(area.world_mut(), e, 150));
        assert_eq!(area.world().get::<Wander>(e).unwrap().elapsed_ms, 100);

        area.world_mut().get_mut::<Motion>(e).unwrap().state = MotionState::Idle;
        assert!(wander_step(area.world_mut(), e, 0));
    }

    #[test]
    fn disabled_wander_never_moves() {
        let mut area = field();
        let mut wander = Wander::seeded(10, 1, 7);
        wander.enabled = false;
        let e = npc(&mut area, wander);
        assert!(!wander_step(area.world_mut(), e, 1000));
    }
}
