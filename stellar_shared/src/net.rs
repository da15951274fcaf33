//! Networking primitives.
//!
//! The wire protocol carries exactly two application message shapes,
//! distinguished only by payload length (no type tag byte):
//! - a bulk body message: a flat array of fixed-size body records, and
//! - a position update: two little-endian `f32` values, x then y.
//!
//! A message is accepted whole or rejected whole; there are no partial
//! decodes. The reliable channel adds its own u32 length-prefix framing on
//! top of TCP; the unreliable plane relies on UDP datagram boundaries.

use anyhow::Context;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::{fmt, net::{IpAddr, SocketAddr}, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time,
};

use crate::world::Body;

/// Size in bytes of one encoded body record.
pub const BODY_RECORD_SIZE: usize = 16;

/// Size in bytes of an encoded position update.
pub const POSITION_UPDATE_SIZE: usize = 8;

/// Upper bound on a single reliable frame. Generous for any sane body count.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Codec validation failure for an inbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Payload length does not match either message shape.
    MalformedLength { len: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::MalformedLength { len } => {
                write!(f, "malformed payload length {len}")
            }
        }
    }
}

impl std::error::Error for CodecError {}

/// Identifies a remote endpoint for the lifetime of its connection.
///
/// Packs the peer's host address into the high 32 bits and its port into the
/// low bits. Address-based identity, not a session token: a peer that
/// reconnects from a new ephemeral port gets a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(pub u64);

impl PeerId {
    pub fn from_addr(addr: SocketAddr) -> Self {
        let host: u32 = match addr.ip() {
            IpAddr::V4(v4) => u32::from(v4),
            // Fold an IPv6 address down to 32 bits so the packing stays
            // uniform. Collisions are possible but identity only has to be
            // unique among concurrently connected endpoints.
            IpAddr::V6(v6) => v6
                .octets()
                .chunks(4)
                .fold(0u32, |acc, chunk| {
                    acc ^ u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
                }),
        };
        PeerId(u64::from(host) << 32 | u64::from(addr.port()))
    }
}

/// Returns true if a payload of this length is shaped like a bulk body
/// message: a non-zero multiple of the record size, larger than a position
/// update.
pub fn is_bulk_body_payload(len: usize) -> bool {
    len > POSITION_UPDATE_SIZE && len % BODY_RECORD_SIZE == 0
}

/// Encodes a body list into a flat record array.
pub fn encode_bodies(bodies: &[Body]) -> Bytes {
    let mut buf = BytesMut::with_capacity(bodies.len() * BODY_RECORD_SIZE);
    for b in bodies {
        buf.put_i32_le(b.x);
        buf.put_i32_le(b.y);
        buf.put_i32_le(b.size);
        buf.put_i32_le(b.index);
    }
    buf.freeze()
}

/// Decodes a bulk body message. The payload must be a non-zero exact
/// multiple of the record size.
pub fn decode_bodies(payload: &[u8]) -> Result<Vec<Body>, CodecError> {
    if !is_bulk_body_payload(payload.len()) {
        return Err(CodecError::MalformedLength {
            len: payload.len(),
        });
    }
    let mut buf = payload;
    let count = payload.len() / BODY_RECORD_SIZE;
    let mut bodies = Vec::with_capacity(count);
    for _ in 0..count {
        bodies.push(Body {
            x: buf.get_i32_le(),
            y: buf.get_i32_le(),
            size: buf.get_i32_le(),
            index: buf.get_i32_le(),
        });
    }
    Ok(bodies)
}

/// Encodes a position update: two little-endian floats, x then y.
pub fn encode_position(x: f32, y: f32) -> Bytes {
    let mut buf = BytesMut::with_capacity(POSITION_UPDATE_SIZE);
    buf.put_f32_le(x);
    buf.put_f32_le(y);
    buf.freeze()
}

/// Decodes a position update. Any length other than exactly two floats is
/// malformed.
pub fn decode_position(payload: &[u8]) -> Result<(f32, f32), CodecError> {
    if payload.len() != POSITION_UPDATE_SIZE {
        return Err(CodecError::MalformedLength {
            len: payload.len(),
        });
    }
    let mut buf = payload;
    let x = buf.get_f32_le();
    let y = buf.get_f32_le();
    Ok((x, y))
}

/// Reliable channel over TCP with u32 length-prefixed frames.
///
/// Frame payloads are the raw wire shapes above; the prefix is transport
/// framing, not part of the application protocol.
#[derive(Debug)]
pub struct FramedConn {
    stream: TcpStream,
}

impl FramedConn {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    pub async fn send(&mut self, payload: &[u8]) -> anyhow::Result<()> {
        let mut buf = BytesMut::with_capacity(4 + payload.len());
        buf.put_u32(payload.len() as u32);
        buf.extend_from_slice(payload);
        self.stream.write_all(&buf).await.context("tcp write")?;
        Ok(())
    }

    pub async fn recv(&mut self) -> anyhow::Result<Bytes> {
        let mut len_buf = [0u8; 4];
        self.stream
            .read_exact(&mut len_buf)
            .await
            .context("tcp read len")?;
        let len = u32::from_be_bytes(len_buf) as usize;
        anyhow::ensure!(len <= MAX_FRAME_SIZE, "frame length {len} over limit");
        let mut payload = vec![0u8; len];
        self.stream
            .read_exact(&mut payload)
            .await
            .context("tcp read payload")?;
        Ok(Bytes::from(payload))
    }

    /// Receives one frame within the given timeout.
    pub async fn recv_timeout(&mut self, timeout: Duration) -> anyhow::Result<Option<Bytes>> {
        match time::timeout(timeout, self.recv()).await {
            Ok(Ok(frame)) => Ok(Some(frame)),
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(None),
        }
    }

    /// Signals disconnect intent by closing the write half.
    pub async fn shutdown(&mut self) -> anyhow::Result<()> {
        self.stream.shutdown().await.context("tcp shutdown")?;
        Ok(())
    }

    pub fn peer_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.stream.peer_addr()?)
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.stream.local_addr()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddrV4};

    fn sample_bodies() -> Vec<Body> {
        vec![
            Body { x: 0, y: 0, size: 50, index: 0 },
            Body { x: -1200, y: 900, size: 10, index: 3 },
            Body { x: 70_000, y: -70_000, size: 1, index: 4 },
        ]
    }

    #[test]
    fn bodies_roundtrip() {
        for n in 0..=3 {
            let bodies = sample_bodies()[..n].to_vec();
            let encoded = encode_bodies(&bodies);
            assert_eq!(encoded.len(), n * BODY_RECORD_SIZE);
            if n == 0 {
                // Empty list is not a valid bulk message on the wire.
                assert!(decode_bodies(&encoded).is_err());
            } else {
                assert_eq!(decode_bodies(&encoded).unwrap(), bodies);
            }
        }
    }

    #[test]
    fn position_roundtrip_bit_exact() {
        let (x, y) = (123.456_f32, -0.000_123_f32);
        let encoded = encode_position(x, y);
        let (dx, dy) = decode_position(&encoded).unwrap();
        assert_eq!(x.to_bits(), dx.to_bits());
        assert_eq!(y.to_bits(), dy.to_bits());
    }

    #[test]
    fn malformed_lengths_rejected() {
        assert_eq!(
            decode_bodies(&[0u8; BODY_RECORD_SIZE - 1]),
            Err(CodecError::MalformedLength { len: 15 })
        );
        assert_eq!(
            decode_position(&[0u8; 7]),
            Err(CodecError::MalformedLength { len: 7 })
        );
        assert_eq!(
            decode_position(&[0u8; 9]),
            Err(CodecError::MalformedLength { len: 9 })
        );
    }

    #[test]
    fn payload_shape_discrimination() {
        // A position update is never mistaken for a bulk message.
        assert!(!is_bulk_body_payload(POSITION_UPDATE_SIZE));
        assert!(is_bulk_body_payload(BODY_RECORD_SIZE));
        assert!(is_bulk_body_payload(BODY_RECORD_SIZE * 7));
        assert!(!is_bulk_body_payload(0));
        assert!(!is_bulk_body_payload(BODY_RECORD_SIZE + 1));
    }

    #[test]
    fn peer_id_is_address_derived() {
        let a = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 7), 40_000));
        let b = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 7), 40_000));
        let c = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 7), 40_001));
        assert_eq!(PeerId::from_addr(a), PeerId::from_addr(b));
        assert_ne!(PeerId::from_addr(a), PeerId::from_addr(c));
    }

    #[test]
    fn peer_id_packs_host_high_port_low() {
        let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 16_383));
        let id = PeerId::from_addr(addr);
        assert_eq!(id.0 & 0xFFFF, 16_383);
        assert_eq!((id.0 >> 32) as u32, u32::from(Ipv4Addr::new(127, 0, 0, 1)));
    }
}
