//! World data model.
//!
//! The world is a bounded set of gravitating bodies sent by the authority in
//! one bulk transfer at session start. The list is immutable for the life of
//! the session.

use serde::{Deserialize, Serialize};

/// A gravitating world body.
///
/// Coordinates and size are integers; `index` selects a visual variant and is
/// opaque to the simulation (the renderer resolves it to an asset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    pub x: i32,
    pub y: i32,
    pub size: i32,
    pub index: i32,
}

impl Body {
    /// Distance threshold beyond which this body's gravity is ignored.
    pub fn influence_radius(&self) -> f32 {
        self.size as f32 * 100.0
    }
}
