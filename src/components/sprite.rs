use bevy_ecs::prelude::Component;
use log::debug;
use rustc_hash::FxHashMap;

use crate::components::animation::{AnimationClock, INFINITE_CYCLES, ImageKey};
use crate::coords::IVec2;

/// Named animation phases of an entity and the one currently shown.
///
/// Phase names follow the facing: `"down"`, `"up-left"`, … for standing and
/// `"moving down"`, … for walking. `"stance"` is used when there is no facing.
#[derive(Component, Clone, Debug, Default)]
pub struct Sprite {
    phases: FxHashMap<String, AnimationClock>,
    current: String,
}

impl Sprite {
    pub fn new<I, S>(phases: I) -> Self
    where
        I: IntoIterator<Item = (S, AnimationClock)>,
        S: Into<String>,
    {
        Self {
            phases: phases.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            current: String::new(),
        }
    }

    pub fn phase(&self) -> &str {
        &self.current
    }

    pub fn has_phase(&self, name: &str) -> bool {
        self.phases.contains_key(name)
    }

    /// Switch to `name` and restart its animation at `now`.
    ///
    /// Returns true if the shown phase changed. Unknown phases are ignored.
    pub fn set_phase(&mut self, name: &str, now: u64) -> bool {
        if self.current == name {
            return false;
        }
        match self.phases.get_mut(name) {
            Some(clock) => {
                clock.start_over(now, INFINITE_CYCLES);
                self.current = name.to_string();
                true
            }
            None => {
                debug!("sprite has no phase '{}'", name);
                false
            }
        }
    }

    pub fn clock(&self) -> Option<&AnimationClock> {
        self.phases.get(&self.current)
    }

    pub fn frame(&mut self, now: u64) -> Option<&ImageKey> {
        self.phases.get_mut(&self.current)?.frame(now)
    }

    pub fn needs_redraw(&self, now: u64) -> bool {
        self.clock().is_some_and(|c| c.needs_redraw(now))
    }
}

/// Phase name for standing while facing `facing`.
pub fn standing_phase(facing: IVec2) -> String {
    facing.direction_name().to_string()
}

/// Phase name for walking while facing `facing`.
pub fn moving_phase(facing: IVec2) -> String {
    if facing.is_zero() {
        return facing.direction_name().to_string();
    }
    format!("moving {}", facing.direction_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprite() -> Sprite {
        Sprite::new([
            ("down", AnimationClock::still("hero_down")),
            ("moving down", AnimationClock::cycling(["w1", "w2"], 100)),
        ])
    }

    #[test]
    fn switching_restarts_the_clock() {
        let mut s = sprite();
        assert!(s.set_phase("moving down", 1000));
        assert_eq!(s.frame(1150).map(|k| &**k), Some("w2"));
        assert!(!s.set_phase("moving down", 2000));
        assert!(s.set_phase("down", 2000));
        assert_eq!(s.frame(9999).map(|k| &**k), Some("hero_down"));
    }

    #[test]
    fn unknown_phases_are_ignored() {
        let mut s = sprite();
        s.set_phase("down", 0);
        assert!(!s.set_phase("swimming", 0));
        assert_eq!(s.phase(), "down");
    }

    #[test]
    fn phase_names_follow_facing() {
        assert_eq!(standing_phase(IVec2::new(-1, 1)), "down-left");
        assert_eq!(moving_phase(IVec2::UP), "moving up");
        assert_eq!(moving_phase(IVec2::ZERO), "stance");
    }
}
