//! Input intent.
//!
//! The windowing layer samples the keyboard and pre-computes velocity deltas
//! (already scaled by the player's speed) and a zoom multiplier. The core
//! treats these as opaque; it never sees raw device state.

use stellar_shared::physics::PlayerState;

/// One frame's worth of input intent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputIntent {
    /// Velocity delta along x, already speed-scaled.
    pub dvx: f32,
    /// Velocity delta along y, already speed-scaled.
    pub dvy: f32,
    /// Multiplier applied to the render zoom scalar.
    pub zoom_factor: f32,
    /// Cooperative quit request.
    pub quit: bool,
}

impl Default for InputIntent {
    fn default() -> Self {
        Self {
            dvx: 0.0,
            dvy: 0.0,
            zoom_factor: 1.0,
            quit: false,
        }
    }
}

/// Applies the intent's velocity deltas to the player.
pub fn apply_intent(player: &mut PlayerState, intent: InputIntent) {
    player.vel.x += intent.dvx;
    player.vel.y += intent.dvy;
}
