//! Remote peer registry.
//!
//! Last-known state for every remote endpoint that has sent a position
//! update, keyed by address-derived identity. Mutated only from the frame
//! loop; read by the render boundary.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use stellar_shared::net::PeerId;
use tracing::debug;

/// RGBA color assigned to newly seen peers. Every peer currently gets the
/// same color; see `DESIGN.md` for the per-peer alternative.
pub const DEFAULT_PEER_COLOR: [u8; 4] = [255, 0, 0, 255];

/// Last-known state of one remote player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemotePlayer {
    pub x: f32,
    pub y: f32,
    pub color: [u8; 4],
    last_seen: Instant,
}

/// Registry of remote players. At most one entry per identity.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    players: HashMap<PeerId, RemotePlayer>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new entry with the default color, or overwrites position
    /// only, preserving the color assigned at first sight. Either way the
    /// entry's freshness is renewed.
    pub fn upsert(&mut self, id: PeerId, x: f32, y: f32) {
        let now = Instant::now();
        self.players
            .entry(id)
            .and_modify(|p| {
                p.x = x;
                p.y = y;
                p.last_seen = now;
            })
            .or_insert_with(|| {
                debug!(id = id.0, "new remote peer");
                RemotePlayer {
                    x,
                    y,
                    color: DEFAULT_PEER_COLOR,
                    last_seen: now,
                }
            });
    }

    /// Iterates all entries; order is not meaningful.
    pub fn snapshot(&self) -> impl Iterator<Item = (PeerId, &RemotePlayer)> {
        self.players.iter().map(|(id, p)| (*id, p))
    }

    /// Drops entries unseen for longer than `max_age`. Returns the number of
    /// entries removed.
    pub fn evict_stale(&mut self, max_age: Duration) -> usize {
        let before = self.players.len();
        self.players.retain(|_, p| p.last_seen.elapsed() <= max_age);
        before - self.players.len()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> PeerId {
        PeerId(n)
    }

    #[test]
    fn upsert_is_idempotent_per_identity() {
        let mut reg = PeerRegistry::new();
        reg.upsert(id(1), 10.0, 20.0);
        reg.upsert(id(1), 10.0, 20.0);
        assert_eq!(reg.len(), 1);
        let (_, p) = reg.snapshot().next().unwrap();
        assert_eq!((p.x, p.y), (10.0, 20.0));
        assert_eq!(p.color, DEFAULT_PEER_COLOR);
    }

    #[test]
    fn update_preserves_color() {
        let mut reg = PeerRegistry::new();
        reg.upsert(id(1), 0.0, 0.0);
        reg.upsert(id(1), 5.0, -5.0);
        let (_, p) = reg.snapshot().next().unwrap();
        assert_eq!((p.x, p.y), (5.0, -5.0));
        assert_eq!(p.color, DEFAULT_PEER_COLOR);
    }

    #[test]
    fn new_identity_creates_one_entry() {
        let mut reg = PeerRegistry::new();
        reg.upsert(id(1), 0.0, 0.0);
        reg.upsert(id(2), 1.0, 1.0);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn eviction_drops_only_stale_entries() {
        let mut reg = PeerRegistry::new();
        reg.upsert(id(1), 0.0, 0.0);
        // A generous age keeps the fresh entry.
        assert_eq!(reg.evict_stale(Duration::from_secs(60)), 0);
        assert_eq!(reg.len(), 1);
        // Zero age evicts everything not touched this instant.
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(reg.evict_stale(Duration::ZERO), 1);
        assert!(reg.is_empty());
    }
}
