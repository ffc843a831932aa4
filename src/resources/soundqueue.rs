//! Sounds requested by the simulation, drained by the host audio backend.

use bevy_ecs::prelude::Resource;
use log::debug;

#[derive(Resource, Debug, Clone, Default)]
pub struct SoundQueue {
    pending: Vec<String>,
}

impl SoundQueue {
    pub fn play(&mut self, sound: impl Into<String>) {
        let sound = sound.into();
        debug!("queued sound '{}'", sound);
        self.pending.push(sound);
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    /// Hand every queued sound to the caller, oldest first.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }
}
