//! Socket-based integration tests for the client session lifecycle.

use std::net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener};
use std::time::{Duration, Instant};

use stellar_client::session::Session;
use stellar_shared::config::ClientConfig;
use stellar_shared::error::{ConnectError, FetchError};
use stellar_shared::net::{decode_position, encode_position, FramedConn, PeerId};
use stellar_tests::{sample_world, FakeAuthority};

fn test_cfg(addr: SocketAddr) -> ClientConfig {
    ClientConfig {
        server_addr: addr.to_string(),
        connect_timeout_ms: 1_000,
        ..ClientConfig::default()
    }
}

/// Connects a session to a fake authority, returning both ends.
async fn connect_pair() -> anyhow::Result<(FakeAuthority, FramedConn, SocketAddr, Session)> {
    let auth = FakeAuthority::bind().await?;
    let addr = auth.addr()?;
    let accept = tokio::spawn(async move {
        let accepted = auth.accept().await;
        (auth, accepted)
    });
    let session = Session::connect(addr, &test_cfg(addr)).await?;
    let (auth, accepted) = accept.await?;
    let (conn, peer) = accepted?;
    Ok((auth, conn, peer, session))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn connect_without_peer_is_unreachable_and_bounded() -> anyhow::Result<()> {
    // Grab a port with no listener on it.
    let unused = StdTcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
    let addr = unused.local_addr()?;
    drop(unused);

    let mut cfg = test_cfg(addr);
    cfg.connect_timeout_ms = 100;

    let start = Instant::now();
    let result = Session::connect(addr, &cfg).await;
    assert!(matches!(result, Err(ConnectError::Unreachable)));
    assert!(
        start.elapsed() < Duration::from_secs(3),
        "connect must not block indefinitely"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn world_fetch_skips_position_frames() -> anyhow::Result<()> {
    let (_auth, mut conn, _peer, mut session) = connect_pair().await?;

    // A position frame arriving first must be discarded, not misread as the
    // world.
    conn.send(&encode_position(1.0, 2.0)).await?;
    FakeAuthority::send_world(&mut conn, &sample_world()).await?;

    let bodies = session.fetch_initial_world(5).await?;
    assert_eq!(bodies, sample_world());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn world_fetch_times_out_on_silence() -> anyhow::Result<()> {
    let (_auth, _conn, _peer, mut session) = connect_pair().await?;

    let start = Instant::now();
    let result = session.fetch_initial_world(1).await;
    assert!(matches!(result, Err(FetchError::Timeout)));
    // One slice is one second.
    assert!(start.elapsed() >= Duration::from_millis(900));
    assert!(start.elapsed() < Duration::from_secs(5));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn poll_keys_updates_by_peer_and_drops_malformed() -> anyhow::Result<()> {
    let (auth, _conn, peer, session) = connect_pair().await?;
    let client_udp = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), peer.port());

    // Two distinct peers sending directly, plus a malformed datagram.
    let peer_a = tokio::net::UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    let peer_b = tokio::net::UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    peer_a.send_to(&encode_position(10.0, 20.0), client_udp).await?;
    peer_b.send_to(&encode_position(-3.0, 4.5), client_udp).await?;
    auth.fan_out_raw(client_udp, &[0u8; 7]).await?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    let updates = session.poll_inbound();
    assert_eq!(updates.len(), 2, "malformed datagram must be dropped");
    assert_ne!(updates[0].0, updates[1].0, "distinct ports, distinct ids");

    let expected_a = PeerId::from_addr(peer_a.local_addr()?);
    assert!(updates.iter().any(|&(id, x, y)| {
        id == expected_a && x == 10.0 && y == 20.0
    }));

    // Same endpoint again maps to the same identity.
    peer_a.send_to(&encode_position(11.0, 21.0), client_udp).await?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let updates = session.poll_inbound();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, expected_a);

    // And the well is dry afterwards.
    assert!(session.poll_inbound().is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn session_reports_shared_port_and_server() -> anyhow::Result<()> {
    let (auth, _conn, peer, session) = connect_pair().await?;

    // The stream and the datagram socket share one local port; the authority
    // fans out to the port it saw the connection come from.
    assert_eq!(session.local_port()?, peer.port());
    assert_eq!(session.server_addr(), auth.addr()?);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn push_outbound_reaches_authority() -> anyhow::Result<()> {
    let (_auth, mut conn, _peer, mut session) = connect_pair().await?;

    session.push_outbound(3.5, -7.25).await.expect("push");
    let frame = conn.recv().await?;
    assert_eq!(decode_position(&frame)?, (3.5, -7.25));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn graceful_disconnect_is_observed() -> anyhow::Result<()> {
    let (_auth, mut conn, _peer, session) = connect_pair().await?;

    session.disconnect_gracefully(Duration::from_millis(200)).await;

    // The authority sees the stream close.
    assert!(conn.recv().await.is_err());
    Ok(())
}
