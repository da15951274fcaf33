//! `stellar_client`
//!
//! Client-side systems:
//! - Session: connection lifecycle, world fetch, position exchange
//! - Remote peer registry keyed by address-derived identity
//! - Input intent application (deltas computed by the windowing layer)
//! - Frame driver sequencing one cooperative step per frame

pub mod frame;
pub mod input;
pub mod registry;
pub mod session;

pub use frame::FrameDriver;
pub use session::Session;
