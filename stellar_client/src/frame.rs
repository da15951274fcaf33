//! Frame driver.
//!
//! The sole orchestrator of the steady-state loop. One step per frame:
//! poll transport -> ingest into the registry -> apply input intent ->
//! gravity advance -> conditionally push outbound state. Rendering sits
//! behind the `RenderSink` seam and receives a read-only view after each
//! step.

use std::time::Duration;

use stellar_shared::{
    config::ClientConfig,
    physics::{self, PlayerState},
    world::Body,
};
use tracing::{debug, warn};

use crate::{
    input::{apply_intent, InputIntent},
    registry::PeerRegistry,
    session::Session,
};

/// Housekeeping interval: stats refresh and stale-peer eviction.
const HOUSEKEEPING_INTERVAL: f32 = 1.0;

/// Per-second frame statistics for the HUD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub fps: u32,
    /// Connected players including the local one.
    pub players: usize,
    pub average_dt: f32,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            fps: 0,
            players: 1,
            average_dt: 0.0,
        }
    }
}

/// Receives one read-only view per frame. The graphics backend implements
/// this; the core never draws.
pub trait RenderSink {
    fn frame(
        &mut self,
        player: &PlayerState,
        bodies: &[Body],
        zoom: f32,
        peers: &PeerRegistry,
        stats: &FrameStats,
    );
}

/// A no-op sink useful for headless runs and tests.
#[derive(Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn frame(
        &mut self,
        _player: &PlayerState,
        _bodies: &[Body],
        _zoom: f32,
        _peers: &PeerRegistry,
        _stats: &FrameStats,
    ) {
    }
}

/// Owns the per-session state and sequences one cooperative step per frame.
pub struct FrameDriver {
    session: Session,
    pub registry: PeerRegistry,
    pub player: PlayerState,
    bodies: Vec<Body>,
    zoom: f32,
    stats: FrameStats,

    send_interval: f32,
    send_accum: f32,
    housekeeping_accum: f32,
    frames_since_stats: u32,
    peer_max_age: Duration,
    quit_requested: bool,
}

impl FrameDriver {
    /// Takes ownership of a connected session and the immutable body list.
    pub fn new(session: Session, bodies: Vec<Body>, cfg: &ClientConfig) -> Self {
        Self {
            session,
            registry: PeerRegistry::new(),
            player: PlayerState::default(),
            bodies,
            zoom: 1.0,
            stats: FrameStats::default(),
            send_interval: cfg.send_interval(),
            send_accum: 0.0,
            housekeeping_accum: 0.0,
            frames_since_stats: 0,
            peer_max_age: cfg.peer_max_age(),
            quit_requested: false,
        }
    }

    /// Advances one frame. `dt` is the elapsed time in seconds since the
    /// previous step. Send failures are logged and superseded by the next
    /// push; they never abort the loop.
    pub async fn step(&mut self, intent: InputIntent, dt: f32) {
        if intent.quit {
            self.quit_requested = true;
        }

        for (id, x, y) in self.session.poll_inbound() {
            self.registry.upsert(id, x, y);
        }

        apply_intent(&mut self.player, intent);
        self.zoom *= intent.zoom_factor;

        self.player = physics::advance(self.player, &self.bodies, dt);

        self.send_accum += dt;
        if self.send_accum >= self.send_interval {
            if let Err(e) = self
                .session
                .push_outbound(self.player.pos.x, self.player.pos.y)
                .await
            {
                warn!(error = %e, "dropped outbound position update");
            }
            self.send_accum = 0.0;
        }

        self.housekeeping_accum += dt;
        self.frames_since_stats += 1;
        if self.housekeeping_accum >= HOUSEKEEPING_INTERVAL {
            self.housekeep();
        }
    }

    fn housekeep(&mut self) {
        let frames = self.frames_since_stats.max(1);
        self.stats = FrameStats {
            fps: frames,
            players: self.registry.len() + 1,
            average_dt: self.housekeeping_accum / frames as f32,
        };
        let evicted = self.registry.evict_stale(self.peer_max_age);
        if evicted > 0 {
            debug!(evicted, "evicted stale peers");
        }
        self.housekeeping_accum = 0.0;
        self.frames_since_stats = 0;
    }

    /// Hands the frame's read-only view to the renderer.
    pub fn render_to(&self, sink: &mut dyn RenderSink) {
        sink.frame(&self.player, &self.bodies, self.zoom, &self.registry, &self.stats);
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// True once any frame's intent carried a quit request. The loop owner
    /// observes this flag and runs graceful teardown.
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Tears the session down gracefully. Consumes the driver; the session's
    /// endpoints are released on every path out of this call.
    pub async fn shutdown(self, drain_timeout: Duration) {
        self.session.disconnect_gracefully(drain_timeout).await;
    }
}
