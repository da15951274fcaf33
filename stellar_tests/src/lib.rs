//! Test harness: a fake simulation authority.
//!
//! Good enough to exercise the client session end to end — accepts one
//! connection, serves the bulk world transfer, receives position pushes, and
//! fans out position datagrams. It is not a game server and simulates
//! nothing.

use std::net::{Ipv4Addr, SocketAddr};

use anyhow::Context;
use stellar_shared::{
    net::{encode_bodies, encode_position, FramedConn},
    world::Body,
};
use tokio::net::{TcpListener, UdpSocket};

/// A minimal authority endpoint on an ephemeral loopback port.
///
/// The UDP socket shares the listener's numeric port, matching the client's
/// expectation that the authority's stream and datagram planes coincide.
pub struct FakeAuthority {
    listener: TcpListener,
    udp: UdpSocket,
}

impl FakeAuthority {
    pub async fn bind() -> anyhow::Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .context("tcp bind")?;
        let port = listener.local_addr().context("local_addr")?.port();
        let udp = UdpSocket::bind((Ipv4Addr::LOCALHOST, port))
            .await
            .context("udp bind")?;
        Ok(Self { listener, udp })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts one client; returns the framed stream and the client's
    /// address. The client listens for datagrams on that same port.
    pub async fn accept(&self) -> anyhow::Result<(FramedConn, SocketAddr)> {
        let (stream, peer) = self.listener.accept().await.context("accept")?;
        Ok((FramedConn::new(stream), peer))
    }

    /// Sends the one-shot bulk world transfer on an accepted stream.
    pub async fn send_world(conn: &mut FramedConn, bodies: &[Body]) -> anyhow::Result<()> {
        conn.send(&encode_bodies(bodies)).await
    }

    /// Fans out one position datagram to a client endpoint. The client will
    /// key it under this authority's identity.
    pub async fn fan_out_position(&self, to: SocketAddr, x: f32, y: f32) -> anyhow::Result<()> {
        self.udp
            .send_to(&encode_position(x, y), to)
            .await
            .context("udp send_to")?;
        Ok(())
    }

    /// Sends a raw datagram, malformed or otherwise.
    pub async fn fan_out_raw(&self, to: SocketAddr, payload: &[u8]) -> anyhow::Result<()> {
        self.udp.send_to(payload, to).await.context("udp send_to")?;
        Ok(())
    }
}

/// A small deterministic world for tests.
pub fn sample_world() -> Vec<Body> {
    vec![
        Body { x: 0, y: 0, size: 50, index: 0 },
        Body { x: 4_000, y: -2_500, size: 10, index: 2 },
        Body { x: -12_000, y: 8_000, size: 25, index: 4 },
    ]
}
