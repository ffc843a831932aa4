//! Time update system.
//!
//! Advances the area's [`WorldTime`](crate::resources::worldtime::WorldTime)
//! and the script [`Timers`](crate::resources::timer::Timers) once per step.
use bevy_ecs::prelude::*;

use crate::resources::timer::Timers;
use crate::resources::worldtime::WorldTime;

/// Advance `now_ms` by `dt_ms` scaled by `time_scale`, and return the scaled delta.
pub fn update_world_time(world: &mut World, dt_ms: u64) -> u64 {
    let mut wt = world.resource_mut::<WorldTime>();
    let scaled = (dt_ms as f64 * wt.time_scale).round().max(0.0) as u64;
    wt.now_ms += scaled;
    wt.delta_ms = scaled;
    scaled
}

/// Jump the clock to an externally supplied "now". Never moves backwards.
pub fn sync_world_time(world: &mut World, now_ms: u64) -> u64 {
    let mut wt = world.resource_mut::<WorldTime>();
    let delta = now_ms.saturating_sub(wt.now_ms);
    wt.now_ms = wt.now_ms.max(now_ms);
    wt.delta_ms = delta;
    delta
}

/// Feed the last delta into every running timer.
pub fn update_timers(time: Res<WorldTime>, mut timers: ResMut<Timers>) {
    timers.advance(time.delta_ms);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_scale_applies_to_delta() {
        let mut world = World::new();
        world.insert_resource(WorldTime {
            time_scale: 0.5,
            ..Default::default()
        });
        assert_eq!(update_world_time(&mut world, 100), 50);
        assert_eq!(world.resource::<WorldTime>().now_ms, 50);
    }

    #[test]
    fn sync_never_rewinds() {
        let mut world = World::new();
        world.insert_resource(WorldTime::starting_at(500));
        assert_eq!(sync_world_time(&mut world, 400), 0);
        assert_eq!(world.resource::<WorldTime>().now_ms, 500);
        assert_eq!(sync_world_time(&mut world, 530), 30);
    }
}
