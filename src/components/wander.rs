use bevy_ecs::prelude::Component;

/// Random walk for NPCs.
///
/// Every `interval_ms` of world time an idle NPC rolls a 1-in-`move_chance`
/// die. On success it attempts a single step along one random axis.
#[derive(Component, Clone, Debug)]
pub struct Wander {
    pub interval_ms: u64,
    pub move_chance: u32,
    pub enabled: bool,
    pub(crate) elapsed_ms: u64,
    pub(crate) rng: fastrand::Rng,
}

impl Wander {
    pub fn new(interval_ms: u64, move_chance: u32) -> Self {
        Self::with_rng(interval_ms, move_chance, fastrand::Rng::new())
    }

    /// Deterministic wander for tests and replays.
    pub fn seeded(interval_ms: u64, move_chance: u32, seed: u64) -> Self {
        Self::with_rng(interval_ms, move_chance, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(interval_ms: u64, move_chance: u32, rng: fastrand::Rng) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            move_chance: move_chance.max(1),
            enabled: true,
            elapsed_ms: 0,
            rng,
        }
    }
}
