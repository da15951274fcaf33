//! Gravity simulation.
//!
//! A pure step function: given the immutable body list, the player's current
//! state, and elapsed time, produce the next player state. Attraction is
//! additive and independent per body, with a hard influence cutoff and no
//! damping or velocity cap.

use serde::{Deserialize, Serialize};

use crate::{math::Vec2, world::Body};

/// Gravitational constant, tuned for feel rather than realism.
pub const GRAVITATIONAL_CONSTANT: f32 = 300_000.0;

/// Local player state. Created once at session start, mutated every frame by
/// input application and gravity, never destroyed during the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Scalar translating input intent into velocity deltas.
    pub speed: f32,
    /// Used only for self-rendering.
    pub size: i32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            speed: 100.0,
            size: 1000,
        }
    }
}

/// Advances the player by `dt` seconds under the gravity of `bodies`.
///
/// Bodies beyond their influence radius contribute nothing. A body exactly at
/// the player's position is skipped; the force term divides by distance and a
/// zero-distance body would otherwise produce NaN velocity.
pub fn advance(mut player: PlayerState, bodies: &[Body], dt: f32) -> PlayerState {
    for body in bodies {
        let d = Vec2::new(body.x as f32, body.y as f32) - player.pos;
        let distance = d.len();
        if distance == 0.0 || distance >= body.influence_radius() {
            continue;
        }
        let force = (GRAVITATIONAL_CONSTANT * body.size as f32) / distance;
        player.vel.x += force * (d.x / distance) * dt;
        player.vel.y += force * (d.y / distance) * dt;
    }
    player.pos.x += player.vel.x * dt;
    player.pos.y += player.vel.y * dt;
    // No damping: velocity persists until a body pulls it elsewhere.
    player
}
