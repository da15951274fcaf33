//! Session error taxonomy.
//!
//! Startup errors (connect, initial fetch) are fatal to the session and
//! propagate to the caller. Steady-state errors (send, codec) are per-message
//! and never abort the frame loop.

use std::fmt;

/// Connection establishment failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectError {
    /// No connection acknowledgment arrived within the timeout.
    Unreachable,
    /// The local transport endpoint could not be allocated.
    HostCreateFailed,
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::Unreachable => write!(f, "server unreachable within timeout"),
            ConnectError::HostCreateFailed => write!(f, "could not allocate local endpoint"),
        }
    }
}

impl std::error::Error for ConnectError {}

/// Initial world transfer failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    /// No bulk body message arrived within the attempt budget.
    Timeout,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Timeout => write!(f, "timed out waiting for world data"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Outbound position push failure. Non-fatal: the next tick's update
/// supersedes a dropped one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    QueueFull,
    NotConnected,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::QueueFull => write!(f, "transmit queue full"),
            SendError::NotConnected => write!(f, "not connected"),
        }
    }
}

impl std::error::Error for SendError {}
