//! Loopback smoke runner.
//!
//! Spins up the fake authority and a real client session in one process,
//! drives the frame loop for a few seconds while the authority echoes
//! position pushes back as datagrams, then reports what happened.

use std::net::SocketAddr;
use std::time::Duration;

use stellar_client::frame::{FrameDriver, NullSink};
use stellar_client::input::InputIntent;
use stellar_client::session::Session;
use stellar_shared::config::ClientConfig;
use stellar_shared::net::decode_position;
use stellar_tests::{sample_world, FakeAuthority};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let auth = FakeAuthority::bind().await?;
    let addr = auth.addr()?;
    info!(addr = %addr, "fake authority listening");

    let authority = tokio::spawn(async move {
        let (mut conn, peer) = auth.accept().await?;
        FakeAuthority::send_world(&mut conn, &sample_world()).await?;
        let client_udp = SocketAddr::new(peer.ip(), peer.port());
        loop {
            match conn.recv_timeout(Duration::from_millis(500)).await {
                Ok(Some(frame)) => {
                    // Echo each push back, offset so it reads as a second
                    // ship flying alongside.
                    if let Ok((x, y)) = decode_position(&frame) {
                        auth.fan_out_position(client_udp, x + 250.0, y).await?;
                    }
                }
                Ok(None) => {}
                // Stream closed: the client disconnected.
                Err(_) => break,
            }
        }
        Ok::<_, anyhow::Error>(())
    });

    let cfg = ClientConfig {
        server_addr: addr.to_string(),
        ..ClientConfig::default()
    };
    let mut session = Session::connect(addr, &cfg).await?;
    let bodies = session.fetch_initial_world(cfg.fetch_attempts).await?;
    info!(bodies = bodies.len(), "world received");

    let mut driver = FrameDriver::new(session, bodies, &cfg);
    let mut sink = NullSink;
    let dt = 1.0 / cfg.tick_hz as f32;

    for _ in 0..(cfg.tick_hz * 3) {
        driver
            .step(
                InputIntent {
                    dvx: 20.0 * dt,
                    ..InputIntent::default()
                },
                dt,
            )
            .await;
        driver.render_to(&mut sink);
        tokio::time::sleep(Duration::from_secs_f32(dt)).await;
    }

    info!(
        players = driver.stats().players,
        fps = driver.stats().fps,
        x = driver.player.pos.x,
        y = driver.player.pos.y,
        "loopback run complete"
    );

    driver.shutdown(Duration::from_millis(300)).await;
    authority.await??;
    Ok(())
}
