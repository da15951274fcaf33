//! `stellar_shared`
//!
//! Libraries shared by the client pieces of the Stellar multiplayer game.
//!
//! Design goals:
//! - Deterministic and modular where practical.
//! - Clear separation of concerns (net, world, physics, config).
//! - Explicit wire format: two fixed binary payload shapes, no type tags.
//! - No `unsafe`.

pub mod config;
pub mod error;
pub mod math;
pub mod net;
pub mod physics;
pub mod world;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::math::*;
    pub use crate::net::*;
    pub use crate::physics::*;
    pub use crate::world::*;
}
