use bevy_ecs::prelude::Resource;

/// Explicit redraw request for the next frame.
///
/// Set by scripts and by state changes the animation clocks cannot see
/// (phase switches, teleports). Cleared when the area is drawn.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedrawRequest(pub bool);

impl RedrawRequest {
    pub fn request(&mut self) {
        self.0 = true;
    }

    pub fn is_requested(&self) -> bool {
        self.0
    }

    /// Return the flag and clear it.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.0)
    }
}
