//! World-wide services.
//!
//! A service is a singleton system owned by the [`World`](crate::World)
//! (physics, audio, AI managers and the like). Services are added before the
//! world is initialized and receive every lifecycle call before the
//! entities do.

use std::any::type_name;

use crate::component::AsAny;
use crate::debug_draw::DebugDraw;

/// A world-wide singleton receiving lifecycle calls.
pub trait Service: AsAny {
    /// Name used in logs.
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    /// Called once when the world is initialized, before any entity exists.
    fn initialize(&mut self) {}

    /// Called once when the world terminates, after every entity is gone.
    fn terminate(&mut self) {}

    /// Called each frame before entity components update.
    fn update(&mut self, _delta_time: f32) {}

    /// Called each rendered frame before entity components render.
    fn render(&self) {}

    /// Record debug shapes into `draw`.
    fn debug_ui(&self, _draw: &mut DebugDraw) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Audio;

    impl Service for Audio {}

    #[test]
    fn name_defaults_to_the_type_name() {
        let audio = Audio;
        assert!(audio.name().ends_with("Audio"));
    }
}
