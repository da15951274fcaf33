//! Configuration system.
//!
//! Loads client configuration from JSON strings/files (file IO left to app).
//! The connection target is injected here rather than compiled in.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Authority address, e.g. `127.0.0.1:16383`.
    pub server_addr: String,
    /// Connection acknowledgment timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Number of one-second service slices to wait for world data.
    #[serde(default = "default_fetch_attempts")]
    pub fetch_attempts: u32,
    /// Outbound position push interval in milliseconds.
    #[serde(default = "default_send_interval_ms")]
    pub send_interval_ms: u64,
    /// Frame loop rate.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
    /// Registry entries unseen for this many seconds are evicted.
    #[serde(default = "default_peer_max_age_secs")]
    pub peer_max_age_secs: u64,
    /// Player name (display only).
    #[serde(default = "default_player_name")]
    pub player_name: String,
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_fetch_attempts() -> u32 {
    10
}

fn default_send_interval_ms() -> u64 {
    100
}

fn default_tick_hz() -> u32 {
    64
}

fn default_peer_max_age_secs() -> u64 {
    30
}

fn default_player_name() -> String {
    "Player".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:16383".to_string(),
            connect_timeout_ms: default_connect_timeout_ms(),
            fetch_attempts: default_fetch_attempts(),
            send_interval_ms: default_send_interval_ms(),
            tick_hz: default_tick_hz(),
            peer_max_age_secs: default_peer_max_age_secs(),
            player_name: default_player_name(),
        }
    }
}

impl ClientConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn send_interval(&self) -> f32 {
        self.send_interval_ms as f32 / 1000.0
    }

    pub fn peer_max_age(&self) -> Duration {
        Duration::from_secs(self.peer_max_age_secs)
    }
}
