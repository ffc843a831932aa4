use bevy_ecs::prelude::Resource;

/// Simulation clock of an area, in milliseconds.
///
/// `now_ms` is the monotonic "now" animations are polled against. It only
/// moves forward.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct WorldTime {
    pub now_ms: u64,
    pub delta_ms: u64,
    pub time_scale: f64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            now_ms: 0,
            delta_ms: 0,
            time_scale: 1.0,
        }
    }
}

impl WorldTime {
    pub fn starting_at(now_ms: u64) -> Self {
        WorldTime {
            now_ms,
            ..Default::default()
        }
    }
}
