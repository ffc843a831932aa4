//! Held movement keys of the player.
//!
//! Key presses are stacked: the most recently pressed direction that is still
//! held wins. Releasing it falls back to the previous one, which is what makes
//! "hold right, tap down, keep walking right" work.

use arrayvec::ArrayVec;
use bevy_ecs::prelude::Component;

use crate::coords::IVec2;

#[derive(Component, Clone, Debug, Default)]
pub struct InputControlled {
    held: ArrayVec<IVec2, 4>,
}

impl InputControlled {
    /// Register a held direction. Returns false if it was already held.
    pub fn press(&mut self, dir: IVec2) -> bool {
        if dir.is_zero() || self.held.contains(&dir) {
            return false;
        }
        if self.held.is_full() {
            self.held.remove(0);
        }
        self.held.push(dir);
        true
    }

    /// Release a direction. Returns false if it was not held.
    pub fn release(&mut self, dir: IVec2) -> bool {
        match self.held.iter().position(|d| *d == dir) {
            Some(pos) => {
                self.held.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Direction the player is asking to move in.
    pub fn current(&self) -> Option<IVec2> {
        self.held.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_held_key_wins() {
        let mut input = InputControlled::default();
        input.press(IVec2::RIGHT);
        input.press(IVec2::DOWN);
        assert_eq!(input.current(), Some(IVec2::DOWN));
        input.release(IVec2::DOWN);
        assert_eq!(input.current(), Some(IVec2::RIGHT));
        input.release(IVec2::RIGHT);
        assert_eq!(input.current(), None);
    }

    #[test]
    fn stack_drops_the_oldest_when_full() {
        let mut input = InputControlled::default();
        for d in [IVec2::UP, IVec2::DOWN, IVec2::LEFT, IVec2::RIGHT, IVec2::new(1, 1)] {
            input.press(d);
        }
        assert!(!input.release(IVec2::UP));
        assert_eq!(input.current(), Some(IVec2::new(1, 1)));
        assert!(!input.press(IVec2::ZERO));
    }
}
