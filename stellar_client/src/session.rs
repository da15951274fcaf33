//! Session implementation.
//!
//! The session owns the transport endpoints for one connection to the
//! simulation authority:
//! - A reliable framed stream for the handshake, the one-shot bulk world
//!   transfer, outbound position pushes, and the disconnect notice.
//! - A UDP socket, bound to the same local port as the stream, on which
//!   remote position updates arrive as raw datagrams. The source address of
//!   each datagram is what peer identity is derived from.
//!
//! Startup (connect + world fetch) is allowed to block within bounded
//! timeouts; the client has nothing to render before it owns the world.
//! Steady-state servicing is non-blocking and driven once per frame.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use stellar_shared::{
    config::ClientConfig,
    error::{ConnectError, FetchError, SendError},
    net::{decode_bodies, decode_position, encode_position, is_bulk_body_payload, FramedConn, PeerId},
    world::Body,
};
use tokio::net::{TcpSocket, UdpSocket};
use tokio::time;
use tracing::{debug, info, warn};

/// Duration of one bounded service slice during the initial world fetch.
const FETCH_SLICE: Duration = Duration::from_secs(1);

/// A connected session with the authority.
pub struct Session {
    reliable: FramedConn,
    udp: UdpSocket,
    server: SocketAddr,
}

impl Session {
    /// Opens a client endpoint and connects to the authority, waiting up to
    /// the configured timeout for the connection to be established.
    ///
    /// The UDP socket is bound first so the stream can claim the same local
    /// port; the authority learns both from the one connection it accepts.
    pub async fn connect(server: SocketAddr, cfg: &ClientConfig) -> Result<Self, ConnectError> {
        let udp = match UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "udp bind failed");
                return Err(ConnectError::HostCreateFailed);
            }
        };
        let local = match udp.local_addr() {
            Ok(a) => a,
            Err(e) => {
                warn!(error = %e, "udp local_addr failed");
                return Err(ConnectError::HostCreateFailed);
            }
        };

        let socket = match Self::stream_socket(local) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "tcp socket setup failed");
                return Err(ConnectError::HostCreateFailed);
            }
        };

        info!(server = %server, local_port = local.port(), "connecting");
        let stream = match time::timeout(cfg.connect_timeout(), socket.connect(server)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                info!(server = %server, error = %e, "connection failed");
                return Err(ConnectError::Unreachable);
            }
            Err(_) => {
                info!(server = %server, timeout_ms = cfg.connect_timeout_ms, "connection timed out");
                return Err(ConnectError::Unreachable);
            }
        };

        info!(server = %server, "connection established");
        Ok(Self {
            reliable: FramedConn::new(stream),
            udp,
            server,
        })
    }

    fn stream_socket(local: SocketAddr) -> io::Result<TcpSocket> {
        let socket = TcpSocket::new_v4()?;
        socket.set_reuseaddr(true)?;
        socket.bind(local)?;
        Ok(socket)
    }

    /// Blocks through up to `max_attempts` one-second service slices until a
    /// frame decodable as a bulk body message arrives. Frames of any other
    /// shape are discarded; only silent slices consume an attempt.
    pub async fn fetch_initial_world(&mut self, max_attempts: u32) -> Result<Vec<Body>, FetchError> {
        let mut attempts = 0;
        while attempts < max_attempts {
            match self.reliable.recv_timeout(FETCH_SLICE).await {
                Ok(Some(frame)) if is_bulk_body_payload(frame.len()) => {
                    match decode_bodies(&frame) {
                        Ok(bodies) => {
                            info!(count = bodies.len(), "received world bodies");
                            return Ok(bodies);
                        }
                        Err(e) => debug!(error = %e, "discarding undecodable frame"),
                    }
                }
                Ok(Some(frame)) => {
                    debug!(len = frame.len(), "discarding non-world frame during fetch");
                }
                Ok(None) => {
                    attempts += 1;
                    info!(attempt = attempts, max = max_attempts, "waiting for world data");
                }
                Err(e) => {
                    warn!(error = %e, "reliable channel failed during world fetch");
                    return Err(FetchError::Timeout);
                }
            }
        }
        Err(FetchError::Timeout)
    }

    /// Drains all currently-available inbound datagrams without blocking.
    /// Malformed payloads are dropped per message; arrival order is kept.
    pub fn poll_inbound(&self) -> Vec<(PeerId, f32, f32)> {
        let mut updates = Vec::new();
        let mut buf = [0u8; 2048];
        loop {
            match self.udp.try_recv_from(&mut buf) {
                Ok((n, from)) => match decode_position(&buf[..n]) {
                    Ok((x, y)) => updates.push((PeerId::from_addr(from), x, y)),
                    Err(e) => {
                        debug!(from = %from, len = n, error = %e, "dropping malformed datagram");
                    }
                },
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!(error = %e, "udp recv failed");
                    break;
                }
            }
        }
        updates
    }

    /// Encodes and reliably transmits the local position.
    pub async fn push_outbound(&mut self, x: f32, y: f32) -> Result<(), SendError> {
        let payload = encode_position(x, y);
        self.reliable.send(&payload).await.map_err(|e| {
            match e.downcast_ref::<io::Error>() {
                Some(cause) if cause.kind() == io::ErrorKind::WouldBlock => SendError::QueueFull,
                _ => SendError::NotConnected,
            }
        })
    }

    /// Signals disconnect intent, then services in-flight traffic up to the
    /// drain timeout before releasing the endpoints. Best-effort: teardown
    /// errors are logged, never propagated.
    pub async fn disconnect_gracefully(mut self, drain_timeout: Duration) {
        info!(server = %self.server, "disconnecting");
        if let Err(e) = self.reliable.shutdown().await {
            debug!(error = %e, "disconnect notice failed");
        }
        let deadline = Instant::now() + drain_timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                break;
            }
            match self.reliable.recv_timeout(left).await {
                Ok(Some(frame)) => debug!(len = frame.len(), "drained in-flight frame"),
                // Quiet slice or peer closed: either way we are done.
                Ok(None) => break,
                Err(_) => break,
            }
        }
        // Endpoints are released on drop, on this path and every early one.
    }

    /// The authority's address.
    pub fn server_addr(&self) -> SocketAddr {
        self.server
    }

    /// Local port shared by the stream and the datagram socket.
    pub fn local_port(&self) -> anyhow::Result<u16> {
        Ok(self.udp.local_addr()?.port())
    }
}
